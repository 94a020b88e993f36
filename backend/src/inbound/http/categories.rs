//! Category HTTP handlers.
//!
//! ```text
//! GET    /api/v1/categories
//! GET    /api/v1/categories/{id}
//! POST   /api/v1/categories
//! PUT    /api/v1/categories/{id}
//! DELETE /api/v1/categories/{id}
//! ```

use actix_web::http::header;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Category, CategoryDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_entity_id};

const CATEGORIES_PATH: &str = "/api/v1/categories";

/// Request payload for creating or replacing a category.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CategoryRequestBody {
    #[schema(example = "Parks")]
    pub name: String,
    /// Position in listings; zero is rejected.
    #[schema(example = 1)]
    pub order: i8,
}

impl From<CategoryRequestBody> for CategoryDraft {
    fn from(value: CategoryRequestBody) -> Self {
        Self {
            name: value.name,
            order: value.order,
        }
    }
}

/// Response payload for category creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct CreatedCategoryResponse {
    #[schema(format = "uuid")]
    pub id: String,
}

/// Category representation returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct CategoryResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub order: i8,
}

impl From<&Category> for CategoryResponseBody {
    fn from(value: &Category) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().to_owned(),
            order: value.order(),
        }
    }
}

/// Envelope for category listings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct CategoryListResponse {
    pub data: Vec<CategoryResponseBody>,
}

/// List every category in display order.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "All categories", body = CategoryListResponse),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["categories"],
    operation_id = "listCategories"
)]
#[get("/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<CategoryListResponse>> {
    let categories = state.places_query.list_categories().await?;
    Ok(web::Json(CategoryListResponse {
        data: categories.iter().map(CategoryResponseBody::from).collect(),
    }))
}

/// Fetch one category.
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category identifier")),
    responses(
        (status = 200, description = "The category", body = CategoryResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Category not found", body = ErrorSchema)
    ),
    tags = ["categories"],
    operation_id = "getCategory"
)]
#[get("/categories/{id}")]
pub async fn get_category(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<CategoryResponseBody>> {
    let id = parse_entity_id(&path, FieldName::new("id"))?;
    let category = state.places_query.find_category(id).await?;
    Ok(web::Json(CategoryResponseBody::from(&category)))
}

/// Create a category.
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CategoryRequestBody,
    responses(
        (
            status = 201,
            description = "Category created",
            headers(("Location" = String, description = "URL of the new category")),
            body = CreatedCategoryResponse
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["categories"],
    operation_id = "createCategory"
)]
#[post("/categories")]
pub async fn create_category(
    state: web::Data<HttpState>,
    payload: web::Json<CategoryRequestBody>,
) -> ApiResult<HttpResponse> {
    let ctx = state.request_context();
    let id = state
        .categories
        .create(&ctx, CategoryDraft::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("{CATEGORIES_PATH}/{id}")))
        .json(CreatedCategoryResponse { id: id.to_string() }))
}

/// Replace a category.
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category identifier")),
    request_body = CategoryRequestBody,
    responses(
        (status = 204, description = "Category updated"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Category not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["categories"],
    operation_id = "updateCategory"
)]
#[put("/categories/{id}")]
pub async fn update_category(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<CategoryRequestBody>,
) -> ApiResult<HttpResponse> {
    let id = parse_entity_id(&path, FieldName::new("id"))?;
    let ctx = state.request_context();
    state
        .categories
        .update(&ctx, id, CategoryDraft::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete a category.
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category identifier")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Category not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["categories"],
    operation_id = "deleteCategory"
)]
#[delete("/categories/{id}")]
pub async fn delete_category(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_entity_id(&path, FieldName::new("id"))?;
    let ctx = state.request_context();
    state.categories.delete(&ctx, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

//! Place HTTP handlers.
//!
//! ```text
//! GET    /api/v1/places
//! GET    /api/v1/places/search?q=
//! GET    /api/v1/places/{id}
//! POST   /api/v1/places
//! PUT    /api/v1/places/{id}
//! DELETE /api/v1/places/{id}
//! ```
//!
//! Mutations answer only after the change is written and the broker has
//! confirmed the reindex request.

use actix_web::http::header;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Place, PlaceDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_entity_id, require_text};

const PLACES_PATH: &str = "/api/v1/places";

/// Request payload for creating or replacing a place.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequestBody {
    #[schema(example = "Harbour Walk")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(format = "uuid")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<PlaceRequestBody> for PlaceDraft {
    fn from(value: PlaceRequestBody) -> Self {
        Self {
            name: value.name,
            description: value.description,
            category: value.category,
            tags: value.tags,
        }
    }
}

/// Place representation returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub name_slug: String,
    pub description: String,
    #[schema(format = "uuid")]
    pub category: String,
    pub tags: Vec<String>,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl From<&Place> for PlaceResponseBody {
    fn from(value: &Place) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().to_owned(),
            name_slug: value.name_slug().to_owned(),
            description: value.description().to_owned(),
            category: value.category().to_string(),
            tags: value.tags().to_vec(),
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().map(|at| at.to_rfc3339()),
        }
    }
}

/// Response payload for place creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct CreatedPlaceResponse {
    #[schema(format = "uuid")]
    pub id: String,
}

/// Envelope for place listings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct PlaceListResponse {
    pub data: Vec<PlaceResponseBody>,
}

/// Query parameters for place search.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free text matched against names, descriptions, and tags.
    pub q: Option<String>,
}

fn to_listing(places: &[Place]) -> PlaceListResponse {
    PlaceListResponse {
        data: places.iter().map(PlaceResponseBody::from).collect(),
    }
}

/// List every place.
#[utoipa::path(
    get,
    path = "/api/v1/places",
    responses(
        (status = 200, description = "All places", body = PlaceListResponse),
        (status = 503, description = "Service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["places"],
    operation_id = "listPlaces"
)]
#[get("/places")]
pub async fn list_places(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<PlaceListResponse>> {
    let places = state.places_query.list_places().await?;
    Ok(web::Json(to_listing(&places)))
}

/// Search places by free text.
#[utoipa::path(
    get,
    path = "/api/v1/places/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching places", body = PlaceListResponse),
        (status = 400, description = "Missing search text", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["places"],
    operation_id = "searchPlaces"
)]
#[get("/places/search")]
pub async fn search_places(
    state: web::Data<HttpState>,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<PlaceListResponse>> {
    let query = require_text(params.q.as_deref(), FieldName::new("q"))?;
    let places = state.places_query.search_places(query).await?;
    Ok(web::Json(to_listing(&places)))
}

/// Fetch one place.
#[utoipa::path(
    get,
    path = "/api/v1/places/{id}",
    params(("id" = String, Path, description = "Place identifier")),
    responses(
        (status = 200, description = "The place", body = PlaceResponseBody),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Place not found", body = ErrorSchema)
    ),
    tags = ["places"],
    operation_id = "getPlace"
)]
#[get("/places/{id}")]
pub async fn get_place(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PlaceResponseBody>> {
    let id = parse_entity_id(&path, FieldName::new("id"))?;
    let place = state.places_query.find_place(id).await?;
    Ok(web::Json(PlaceResponseBody::from(&place)))
}

/// Create a place and queue it for reindexing.
#[utoipa::path(
    post,
    path = "/api/v1/places",
    request_body = PlaceRequestBody,
    responses(
        (
            status = 201,
            description = "Place created",
            headers(("Location" = String, description = "URL of the new place")),
            body = CreatedPlaceResponse
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["places"],
    operation_id = "createPlace"
)]
#[post("/places")]
pub async fn create_place(
    state: web::Data<HttpState>,
    payload: web::Json<PlaceRequestBody>,
) -> ApiResult<HttpResponse> {
    let ctx = state.request_context();
    let id = state
        .places
        .create(&ctx, PlaceDraft::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("{PLACES_PATH}/{id}")))
        .json(CreatedPlaceResponse { id: id.to_string() }))
}

/// Replace a place and queue it for reindexing.
#[utoipa::path(
    put,
    path = "/api/v1/places/{id}",
    params(("id" = String, Path, description = "Place identifier")),
    request_body = PlaceRequestBody,
    responses(
        (status = 204, description = "Place updated"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Place not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["places"],
    operation_id = "updatePlace"
)]
#[put("/places/{id}")]
pub async fn update_place(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PlaceRequestBody>,
) -> ApiResult<HttpResponse> {
    let id = parse_entity_id(&path, FieldName::new("id"))?;
    let ctx = state.request_context();
    state
        .places
        .update(&ctx, id, PlaceDraft::from(payload.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Delete a place and queue its removal from the index.
#[utoipa::path(
    delete,
    path = "/api/v1/places/{id}",
    params(("id" = String, Path, description = "Place identifier")),
    responses(
        (status = 204, description = "Place deleted"),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 404, description = "Place not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["places"],
    operation_id = "deletePlace"
)]
#[delete("/places/{id}")]
pub async fn delete_place(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_entity_id(&path, FieldName::new("id"))?;
    let ctx = state.request_context();
    state.places.delete(&ctx, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "places_tests.rs"]
mod tests;

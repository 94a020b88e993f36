//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP endpoint of the inbound layer (places,
//! categories, health, version) together with the payload schemas they exchange.
//! Domain types stay free of utoipa derives; the error payload is described
//! by [`ErrorSchema`] and [`ErrorCodeSchema`].
//!
//! The generated document backs Swagger UI in debug builds and is exported
//! by `cargo run --bin openapi-dump` for external tooling.

use utoipa::OpenApi;

use crate::inbound::http::categories::{
    CategoryListResponse, CategoryRequestBody, CategoryResponseBody, CreatedCategoryResponse,
};
use crate::inbound::http::places::{
    CreatedPlaceResponse, PlaceListResponse, PlaceRequestBody, PlaceResponseBody,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::version::VersionResponse;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Walk places API",
        description = "Place directory with broker-confirmed search reindexing."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::places::list_places,
        crate::inbound::http::places::search_places,
        crate::inbound::http::places::get_place,
        crate::inbound::http::places::create_place,
        crate::inbound::http::places::update_place,
        crate::inbound::http::places::delete_place,
        crate::inbound::http::categories::list_categories,
        crate::inbound::http::categories::get_category,
        crate::inbound::http::categories::create_category,
        crate::inbound::http::categories::update_category,
        crate::inbound::http::categories::delete_category,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::version::version,
    ),
    components(schemas(
        PlaceRequestBody,
        PlaceResponseBody,
        PlaceListResponse,
        CreatedPlaceResponse,
        CategoryRequestBody,
        CategoryResponseBody,
        CategoryListResponse,
        CreatedCategoryResponse,
        VersionResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "places", description = "Place directory operations"),
        (name = "categories", description = "Place category maintenance"),
        (name = "health", description = "Health checks and release information")
    )
)]
pub struct ApiDoc;

//! Release identifier endpoint.

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `GET /version`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct VersionResponse {
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Release identifier configured at startup.
#[derive(Debug, Clone)]
pub struct VersionInfo(String);

impl VersionInfo {
    pub fn new(release: impl Into<String>) -> Self {
        Self(release.into())
    }
}

/// Report the running release.
#[utoipa::path(
    get,
    path = "/version",
    tags = ["health"],
    responses((status = 200, description = "Running release", body = VersionResponse))
)]
#[get("/version")]
pub async fn version(info: web::Data<VersionInfo>) -> web::Json<VersionResponse> {
    web::Json(VersionResponse {
        version: info.0.clone(),
    })
}

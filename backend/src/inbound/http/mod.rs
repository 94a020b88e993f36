//! HTTP inbound adapter exposing REST endpoints.

pub mod categories;
pub mod error;
pub mod health;
pub mod places;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;
pub mod version;

use actix_web::web;

pub use error::ApiResult;

use crate::domain::Error;

/// JSON body extractor settings that report malformed payloads as domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid JSON body: {err}")).into()
    })
}

/// Query string extractor settings that report malformed queries as domain errors.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    })
}

/// Register the `/api/v1` routes.
///
/// `search` is registered before `{id}` so it is not parsed as an identifier.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(query_config()).service(
        web::scope("/api/v1")
            .service(places::list_places)
            .service(places::search_places)
            .service(places::get_place)
            .service(places::create_place)
            .service(places::update_place)
            .service(places::delete_place)
            .service(categories::list_categories)
            .service(categories::get_category)
            .service(categories::create_category)
            .service(categories::update_category)
            .service(categories::delete_category),
    );
}

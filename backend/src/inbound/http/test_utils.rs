//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::ports::{MockCategoriesCommand, MockPlacesCommand, MockPlacesQuery};
use crate::inbound::http::configure;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Mocked driving ports behind the API routes.
pub struct TestPorts {
    pub places: MockPlacesCommand,
    pub places_query: MockPlacesQuery,
    pub categories: MockCategoriesCommand,
}

impl Default for TestPorts {
    fn default() -> Self {
        Self {
            places: MockPlacesCommand::new(),
            places_query: MockPlacesQuery::new(),
            categories: MockCategoriesCommand::new(),
        }
    }
}

/// Build an application serving the API routes over the given place mocks.
pub fn test_app(
    command: MockPlacesCommand,
    query: MockPlacesQuery,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    test_app_with(TestPorts {
        places: command,
        places_query: query,
        ..TestPorts::default()
    })
}

/// Build an application serving the API routes over every mocked port.
pub fn test_app_with(
    ports: TestPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(HttpStatePorts {
        places: Arc::new(ports.places),
        places_query: Arc::new(ports.places_query),
        categories: Arc::new(ports.categories),
    });
    App::new()
        .app_data(web::Data::new(state))
        .configure(configure)
}

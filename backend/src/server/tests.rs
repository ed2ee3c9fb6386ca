//! Bootstrap coverage: readiness signalling and in-memory wiring.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::web;
use rstest::{fixture, rstest};

use guide_backend::domain::dispatcher::Dispatcher;
use guide_backend::domain::PermissionsNotEnforced;
use guide_backend::domain::handlers::CreateEntity;
use guide_backend::domain::entities::Category;
use guide_backend::inbound::http::health::HealthState;
use guide_backend::inbound::http::state::{DiagnosticsMode, HttpState};
use guide_backend::settings::ServerSettings;

use super::{ServerConfig, build_http_state, create_server};

#[fixture]
fn health_state() -> web::Data<HealthState> {
    web::Data::new(HealthState::new())
}

#[fixture]
fn bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

fn memory_settings() -> ServerSettings {
    ServerSettings {
        bind_addr: None,
        database_url: None,
        pool_max_size: None,
        commit_attempts: None,
        expose_diagnostics: true,
        role_permissions_file: None,
    }
}

#[rstest]
#[actix_rt::test]
async fn create_server_marks_ready(health_state: web::Data<HealthState>, bind_address: SocketAddr) {
    assert!(!health_state.is_ready(), "state should start unready");
    let http_state = HttpState::new(Dispatcher::builder().build(), Arc::new(PermissionsNotEnforced));
    let config = ServerConfig::new(bind_address, http_state);
    assert_eq!(config.bind_addr(), bind_address);

    let _server = create_server(health_state.clone(), config).expect("server should build");

    assert!(health_state.is_ready(), "server creation should mark readiness");
}

#[rstest]
#[actix_rt::test]
async fn memory_deployment_registers_every_table() {
    let state = build_http_state(&memory_settings())
        .await
        .expect("in-memory wiring");
    assert_eq!(state.diagnostics, DiagnosticsMode::Exposed);
    assert!(state.dispatcher.handles::<CreateEntity<Category>>());
}

#[rstest]
#[actix_rt::test]
async fn missing_role_map_is_fatal() {
    let settings = ServerSettings {
        role_permissions_file: Some("/nonexistent/guide-roles.json".into()),
        ..memory_settings()
    };
    assert!(build_http_state(&settings).await.is_err());
}

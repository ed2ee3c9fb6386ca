//! Assemble adapters and the dispatcher from settings.
//!
//! A configured database URL selects the PostgreSQL adapters after the
//! embedded migrations have run; otherwise rows live in process memory.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultClock;
use tracing::{info, warn};

use guide_backend::domain::dispatcher::Dispatcher;
use guide_backend::domain::handlers::{EntityHandlerDeps, register_guide_entities};
use guide_backend::domain::ports::{
    FixtureUserDirectory, PermissionGate, RowStore, UserDirectory,
};
use guide_backend::domain::{DataContext, PermissionsNotEnforced, RolePermissionGate};
use guide_backend::inbound::http::state::{DiagnosticsMode, HttpState};
use guide_backend::outbound::messaging::LoggingMessagePublisher;
use guide_backend::outbound::persistence::{
    DbPool, DieselRowStore, DieselUserDirectory, MemoryRowStore, PoolConfig,
    run_pending_migrations,
};
use guide_backend::settings::ServerSettings;

async fn build_stores(
    settings: &ServerSettings,
) -> Result<(Arc<dyn RowStore>, Arc<dyn UserDirectory>)> {
    let Some(database_url) = settings.database_url.as_deref() else {
        warn!("no database URL configured; rows are kept in memory");
        return Ok((
            Arc::new(MemoryRowStore::new()),
            Arc::new(FixtureUserDirectory::default()),
        ));
    };

    let applied = run_pending_migrations(database_url)
        .await
        .wrap_err("failed to apply database migrations")?;
    info!(applied, "database migrations applied");

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.pool_max_size()))
        .await
        .wrap_err("failed to build database pool")?;
    Ok((
        Arc::new(DieselRowStore::new(pool.clone())),
        Arc::new(DieselUserDirectory::new(pool)),
    ))
}

fn build_permissions(settings: &ServerSettings) -> Result<Arc<dyn PermissionGate>> {
    match settings.role_permissions_file.as_deref() {
        Some(path) => {
            let gate = RolePermissionGate::from_json_file(path)
                .wrap_err("failed to load role permissions")?;
            info!(path = %path.display(), "role permissions enforced");
            Ok(Arc::new(gate))
        }
        None => {
            warn!("no role permission file configured; permissions are not enforced");
            Ok(Arc::new(PermissionsNotEnforced))
        }
    }
}

/// Build the HTTP state for the configured deployment.
///
/// # Errors
/// Migration, pool, role map and handler registration failures are fatal.
pub async fn build_http_state(settings: &ServerSettings) -> Result<HttpState> {
    let (store, directory) = build_stores(settings).await?;
    let deps = EntityHandlerDeps {
        data: DataContext::new(store, Arc::new(DefaultClock))
            .with_commit_attempts(settings.commit_attempts()),
        publisher: Arc::new(LoggingMessagePublisher),
        directory,
    };

    let mut builder = Dispatcher::builder();
    register_guide_entities(&mut builder, &deps)
        .map_err(|err| eyre!("handler registration failed: {err}"))?;

    Ok(
        HttpState::new(builder.build(), build_permissions(settings)?)
            .with_diagnostics(DiagnosticsMode::from_flag(settings.expose_diagnostics)),
    )
}

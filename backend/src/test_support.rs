//! Test utilities for the backend crate.
//!
//! Shared by unit tests in `src/` and the integration suites in `tests/`.
//! Compiled for tests and behind the `test-support` feature.

use std::sync::Arc;

use crate::domain::dispatcher::Dispatcher;
use crate::domain::handlers::{EntityHandlerDeps, register_guide_entities};
use crate::domain::ports::{FixtureUserDirectory, MessagePublisher, RowStore, UserDirectory};
use crate::domain::DataContext;

mod clock;
mod messaging;
mod row_store;

pub use clock::MutableClock;
pub use messaging::{FailingMessagePublisher, RecordingMessagePublisher};
pub use row_store::{FlakyRowStore, StallingRowStore};

/// Handler collaborators assembled from explicit doubles.
pub fn entity_deps(
    store: Arc<dyn RowStore>,
    publisher: Arc<dyn MessagePublisher>,
    directory: Arc<dyn UserDirectory>,
    clock: Arc<MutableClock>,
) -> EntityHandlerDeps {
    EntityHandlerDeps {
        data: DataContext::new(store, clock),
        publisher,
        directory,
    }
}

/// Dispatcher with every guide table registered.
///
/// # Panics
/// Panics when registration fails, which only happens if the guide tables
/// are registered twice.
pub fn guide_dispatcher(deps: &EntityHandlerDeps) -> Dispatcher {
    let mut builder = Dispatcher::builder();
    if let Err(err) = register_guide_entities(&mut builder, deps) {
        panic!("guide handlers failed to register: {err}");
    }
    builder.build()
}

/// Directory with no known users.
pub fn empty_directory() -> Arc<dyn UserDirectory> {
    Arc::new(FixtureUserDirectory::default())
}

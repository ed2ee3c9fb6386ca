//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod message_publisher;
mod permission_gate;
mod row_store;
mod user_directory;

#[cfg(test)]
pub use message_publisher::MockMessagePublisher;
pub use message_publisher::{MessageAck, MessagePublishError, MessagePublisher};
#[cfg(test)]
pub use permission_gate::MockPermissionGate;
pub use permission_gate::{PermissionCode, PermissionDenied, PermissionGate};
#[cfg(test)]
pub use row_store::MockRowStore;
pub use row_store::{RowFilter, RowStore, RowStoreError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{AuthUserDetails, FixtureUserDirectory, UserDirectory, UserDirectoryError};

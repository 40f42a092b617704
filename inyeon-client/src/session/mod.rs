/// Signed-in state
///
/// - `storage`: the local-storage file shared by every window
/// - `events`: auth-state notifications
/// - `store`: the global auth store following those notifications

pub mod events;
pub mod storage;
pub mod store;

pub use events::{AuthEvent, AuthEvents};
pub use storage::{LocalStorage, StorageError};
pub use store::{AuthState, AuthStore, Subscription};

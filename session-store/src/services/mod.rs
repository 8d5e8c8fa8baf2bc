//! Collaborators the session store is built from: the auth backend client,
//! durable storage, and the host navigation hook.

pub mod auth_client;
pub mod navigation;
pub mod storage;

pub use auth_client::{AuthBackend, AuthClient};
pub use navigation::{LoggingNavigator, Navigator, RecordingNavigator};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, TOKEN_KEY, USER_KEY};

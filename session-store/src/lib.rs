//! Client-side session gate for the H-1B portal.
//!
//! [`SessionStore`] holds the signed-in user and bearer token, mirrors them
//! to durable storage, and answers whether authenticated views may render.
//! Views and route guards read its snapshots and call its operations.

pub mod config;
pub mod dtos;
pub mod error;
pub mod guard;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use error::{SessionError, StorageError};
pub use store::{SessionState, SessionStore};

pub mod auth;

pub use auth::{Credentials, LoginResponse, Registration};

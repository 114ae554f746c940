#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]

pub mod auth;
pub mod errors;
pub mod models;
pub mod roles;
pub mod services;

pub use crate::auth::*;
pub use crate::errors::*;
pub use crate::models::*;
pub use crate::roles::*;
pub use crate::services::*;

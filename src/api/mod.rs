pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, ClientError};
pub use error::ApiError;
pub use types::*;

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, PixelaClient};
pub use error::PixelaError;

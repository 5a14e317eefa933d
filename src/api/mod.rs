pub mod client;
pub mod stream;

pub use client::{ApiClient, ApiClientBuilder, DEFAULT_BASE_URL};
pub use stream::{connect_updates, DEFAULT_WS_URL};

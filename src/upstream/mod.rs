pub mod client;
pub mod error;

pub use client::CompletionClient;
pub use error::UpstreamError;

pub mod client;
pub mod fetch;

pub use client::ClientError;
pub use fetch::FetchError;

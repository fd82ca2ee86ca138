//! Client for the standalone Object Store service (§4.8, §6.2).

pub mod client;
pub mod error;

pub use client::{PresignedUpload, StorageServiceClient};
pub use error::StorageClientError;

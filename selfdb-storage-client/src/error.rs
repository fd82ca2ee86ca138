use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageClientError {
    #[error("storage service unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("storage service returned {status}: {detail}")]
    Remote { status: u16, detail: String },
    #[error("bucket or object not found in storage service")]
    NotFound,
}

impl StorageClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageClientError::NotFound)
            || matches!(self, StorageClientError::Remote { status, .. } if *status == 404)
    }
}

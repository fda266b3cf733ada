use crate::app::RequestError;
use crate::config::ConfigPathError;
use crate::storage::StoreError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("cannot locate store file: {0}")]
    StorePath(#[from] ConfigPathError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode output")]
    Output(#[from] serde_json::Error),
}

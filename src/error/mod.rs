use crate::animation::AnimationError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Animation(#[from] AnimationError),
    #[error("could not export image to {path}: {source}")]
    Export {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
}

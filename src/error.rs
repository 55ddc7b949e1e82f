use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("the height field must contain at least one sample")]
    EmptyField,
    #[error("non-finite height sample at ({x}, {y})")]
    NonFiniteSample { x: usize, y: usize },
    #[error("missing metadata key `{0}`")]
    MissingMetadata(&'static str),
    #[error("invalid metadata value `{value}` for key `{key}`")]
    InvalidMetadata { key: &'static str, value: String },
}

pub type TerrainResult<T> = Result<T, TerrainError>;

impl TerrainError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    /// A parameter is out of its valid domain and has no safe default.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Field or mesh sizing invariant violated.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A background job panicked before producing its result.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl TerrainError {
    pub fn invalid_parameter<T: ToString>(msg: T) -> Self {
        TerrainError::InvalidParameter(msg.to_string())
    }

    pub fn invalid_dimension<T: ToString>(msg: T) -> Self {
        TerrainError::InvalidDimension(msg.to_string())
    }
}

impl From<toml::de::Error> for TerrainError {
    fn from(e: toml::de::Error) -> Self {
        TerrainError::Config(e.to_string())
    }
}

pub type Result<T, E = TerrainError> = std::result::Result<T, E>;

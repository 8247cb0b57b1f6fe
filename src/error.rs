//! Error types for ecovision.

/// Result type alias for ecovision operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for ecovision.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {path}")]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: std::path::PathBuf,
    },

    /// Failed to read labels file.
    #[error("failed to read labels file '{path}'")]
    LabelsRead {
        /// Path to the labels file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A label font could not be loaded.
    #[error("failed to load font '{path}': {reason}")]
    FontLoad {
        /// Path to the font file.
        path: std::path::PathBuf,
        /// Description of the load failure.
        reason: String,
    },

    /// The detection engine could not be loaded. Fatal at startup.
    #[error("failed to load detection model '{path}': {reason}")]
    ModelLoad {
        /// Path to the model file.
        path: std::path::PathBuf,
        /// Description of the load failure.
        reason: String,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// The engine returned a tensor that is not a detection table.
    #[error("unusable model output: {reason}")]
    UnusableOutput {
        /// Description of the shape problem.
        reason: String,
    },

    /// A candidate file never became ready within the retry budget.
    #[error("file not available after {attempts} checks: {path}")]
    FileUnavailable {
        /// Path to the candidate file.
        path: std::path::PathBuf,
        /// Number of readiness checks performed.
        attempts: u32,
    },

    /// A file exists but cannot be decoded as an image.
    #[error("unable to decode image '{path}'")]
    UnreadableImage {
        /// Path to the image file.
        path: std::path::PathBuf,
        /// Underlying decode error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to write a result document.
    #[error("failed to write result '{path}'")]
    ResultWrite {
        /// Path to the result document.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a result document.
    #[error("failed to serialize result document")]
    ResultSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to parse a result document.
    #[error("failed to parse result document '{path}'")]
    ResultParse {
        /// Path to the result document.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// No result matches the requested identifier prefix.
    #[error("result not found: {prefix}")]
    ResultNotFound {
        /// Identifier prefix that was looked up.
        prefix: String,
    },

    /// Network location lookup failed.
    #[error("location lookup failed: {reason}")]
    GeoLookup {
        /// Description of the lookup failure.
        reason: String,
    },

    /// A submitted file has no usable name.
    #[error("invalid upload file name: {name}")]
    InvalidFileName {
        /// The rejected name.
        name: String,
    },

    /// A background task panicked or was cancelled.
    #[error("worker task failed: {reason}")]
    TaskJoin {
        /// Description of the join failure.
        reason: String,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Whether this error only affects the current file.
    ///
    /// Skips are logged and the watcher moves on to the next file.
    pub const fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::FileUnavailable { .. } | Self::UnreadableImage { .. }
        )
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskJoin {
            reason: e.to_string(),
        }
    }
}

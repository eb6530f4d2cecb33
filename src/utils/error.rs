use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Gateway request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Gateway returned {status}: {message}")]
    GatewayError { status: u16, message: String },

    #[error("Send to {recipient} failed: {reason}")]
    TransportError { recipient: String, reason: String },

    #[error("Cannot resolve recipients for '{target}': {reason}")]
    ResolutionError { target: String, reason: String },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Invalid media payload: {0}")]
    MediaDecodeError(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            BotError::HttpError(_)
            | BotError::GatewayError { .. }
            | BotError::TransportError { .. } => ErrorCategory::Network,
            BotError::IoError(_) | BotError::ZipError(_) | BotError::StoreError { .. } => {
                ErrorCategory::Storage
            }
            BotError::CsvError(_)
            | BotError::SerializationError(_)
            | BotError::MediaDecodeError(_)
            | BotError::ResolutionError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// 依錯誤類別給出處理建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BotError::MissingConfigError { .. } | BotError::InvalidConfigValueError { .. } => {
                "Check the configuration file and environment variables"
            }
            BotError::ConfigError { .. } => "Make sure the config file exists and is valid TOML",
            BotError::HttpError(_) | BotError::GatewayError { .. } => {
                "Check that the chat gateway is running and the token is valid"
            }
            BotError::TransportError { .. } => "The recipient may be unreachable; retry later",
            BotError::ResolutionError { .. } => {
                "Verify the group id, invite link or uploaded file name"
            }
            BotError::IoError(_) | BotError::ZipError(_) | BotError::StoreError { .. } => {
                "Check permissions and free space of the data and uploads directories"
            }
            BotError::CsvError(_) | BotError::SerializationError(_) => {
                "The file content is malformed; re-upload or repair it"
            }
            BotError::MediaDecodeError(_) => "The gateway sent media that is not valid base64",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Chat gateway problem: {}", self),
            ErrorCategory::Storage => format!("Storage problem: {}", self),
            ErrorCategory::Data => format!("Data problem: {}", self),
        }
    }
}

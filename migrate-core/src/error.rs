use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Input format error: {0}")]
    InputFormat(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Identity lookup error: {0}")]
    IdentityLookup(anyhow::Error),

    #[error("Decision error: {0}")]
    Decision(anyhow::Error),

    #[error("Identifier {identifier} paired with both {first} and {second}")]
    PairingConflict {
        identifier: String,
        first: String,
        second: String,
    },

    #[error("Aborted by operator: {0}")]
    UserAbort(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn input_format(msg: impl Into<String>) -> Self {
        AppError::InputFormat(anyhow::anyhow!(msg.into()))
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        AppError::UserAbort(reason.into())
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, AppError::UserAbort(_))
    }

    /// Process exit code. An operator abort is a clean exit.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::UserAbort(_) => 0,
            _ => 1,
        }
    }
}

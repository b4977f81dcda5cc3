use boardmatch_client::ClientError;

/// CLI-level errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("observability setup failed: {0}")]
    Observability(String),

    #[error("demo failed: {0}")]
    Demo(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

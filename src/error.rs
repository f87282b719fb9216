#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("user not found or has no game archives: {username}")]
    UserNotFound { username: String },

    #[error("no games found for {username}")]
    NoGamesFound { username: String },

    #[error("opening code {} is not in the opening table", code.as_deref().unwrap_or("<missing>"))]
    LookupFailure { code: Option<String> },

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No more items in the requested direction.
    #[error("There are no more results")]
    Exhausted,
    /// The requested page has not been fetched (or never existed).
    #[error("Choices are out of range, try again")]
    OutOfRange,
    #[error("Invalid choice, try again")]
    InvalidChoice(String),
    #[error("{0}")]
    EmptySource(String),
    #[error("\"{0}\" is not a valid id or url")]
    InvalidIdentifier(String),
    #[error("{0}")]
    MissingOptionalDependency(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("You must login first (run `mangadex-cli login` or set MANGADEX_TOKEN)")]
    NotLoggedIn,
    #[error("MangaDex API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors the prompt reports and then keeps waiting for input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Exhausted | Error::OutOfRange | Error::InvalidChoice(_)
        )
    }
}

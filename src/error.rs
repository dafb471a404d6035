use thiserror::Error;

/// The public error surface. Three kinds: transient store I/O (`Store`),
/// polling exhaustion (`PollingTimeout`), and corrupt records
/// (`Encoding`/`Decoding`). `Internal` covers clock-arithmetic edge cases
/// that should never occur against a correctly-configured store (e.g. a
/// timestamp before the Unix epoch).
#[derive(Error, Debug)]
pub enum Error {
    #[error("store error: {0}")]
    Store(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    /// A peer held `Started` beyond `max_poll_duration` without timing
    /// out. Terminal for this call; retrying will likely observe
    /// `Timeout` and be allowed to reclaim.
    #[error("polling timed out waiting for an in-flight peer")]
    PollingTimeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<aws_sdk_dynamodb::Error> for Error {
    fn from(err: aws_sdk_dynamodb::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl<E> From<aws_sdk_dynamodb::error::SdkError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: aws_sdk_dynamodb::error::SdkError<E>) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

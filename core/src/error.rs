//! Error types for the postal client.
//!
//! # Design
//! Every failure a call can produce travels through `ClientError`, so the
//! caller awaits one `Result` regardless of where the failure happened:
//! preparing the request, inside the transport, or in a user processor.
//! Transport and processor failures keep their original payload as the
//! error source instead of being reinterpreted.

use thiserror::Error;

/// Boxed error payload produced outside this crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The resolved format name is not one of the known encoders. No
    /// transport call was made.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The client could not be constructed from the supplied options.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// A structured payload could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport failed to complete the round-trip.
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),

    /// A request pre-processor or response post-processor rejected the call.
    #[error("{0}")]
    Processor(BoxError),
}

impl ClientError {
    /// Reject a call from inside a processor, carrying `err` as the value
    /// the caller observes.
    pub fn processor(err: impl Into<BoxError>) -> Self {
        ClientError::Processor(err.into())
    }
}

/// Failure raised by a `Transport`. The payload is whatever the transport
/// produced; the builder never inspects it.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(BoxError);

impl TransportError {
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self(err.into())
    }

    /// Borrow the underlying transport error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_names_the_format() {
        let err = ClientError::UnsupportedFormat("blah".to_string());
        assert_eq!(err.to_string(), "Unsupported format: blah");
    }

    #[test]
    fn processor_error_displays_value_verbatim() {
        let err = ClientError::processor("Error");
        assert_eq!(err.to_string(), "Error");
    }

    #[test]
    fn transport_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ClientError::from(TransportError::new(io));
        assert_eq!(err.to_string(), "Transport error: refused");

        let ClientError::Transport(inner) = err else {
            panic!("expected transport error");
        };
        let io = inner.inner().downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
    }
}

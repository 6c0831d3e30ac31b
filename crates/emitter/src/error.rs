use thiserror::Error;

/// Error returned by a listener callback.
///
/// Transparent wrapper: the bus adds no context of its own, so the
/// listener's failure reaches the `emit`/`emit_to` caller unmodified.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct HandlerError(#[from] Box<dyn std::error::Error + Send + Sync>);

impl HandlerError {
    /// Wrap an underlying error.
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(err))
    }

    /// Build an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = HandlerError::msg("listener refused the payload");
        assert_eq!(error.to_string(), "listener refused the payload");
    }

    #[test]
    fn test_error_wraps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "sink closed");
        let error = HandlerError::new(io);
        assert!(error.to_string().contains("sink closed"));
    }
}

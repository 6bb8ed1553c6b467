/// Convenience result type used across Replaint.
pub type ReplaintResult<T> = Result<T, ReplaintError>;

/// Top-level error taxonomy used by decoder and engine APIs.
///
/// A command index past the end of the stream is deliberately *not* an error
/// variant: accessors return `Option::None` for it, since it is the normal
/// end-of-stream signal used by iteration and seek clamping.
#[derive(thiserror::Error, Debug)]
pub enum ReplaintError {
    /// The input buffer is shorter than the header or the declared command
    /// stream requires. Fatal; decoding aborts.
    #[error("truncated file: {0}")]
    Truncated(String),

    /// Invalid caller-provided data (layer indices, buffer sizes, canvas
    /// dimensions).
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReplaintError {
    /// Build a [`ReplaintError::Truncated`] value.
    pub fn truncated(msg: impl Into<String>) -> Self {
        Self::Truncated(msg.into())
    }

    /// Build a [`ReplaintError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_prefix() {
        let e = ReplaintError::truncated("header needs 320 bytes, got 12");
        assert_eq!(e.to_string(), "truncated file: header needs 320 bytes, got 12");

        let e = ReplaintError::validation("layer index 7 out of range");
        assert_eq!(e.to_string(), "validation error: layer index 7 out of range");
    }

    #[test]
    fn anyhow_passthrough_keeps_message() {
        let e: ReplaintError = anyhow::anyhow!("io went sideways").into();
        assert_eq!(e.to_string(), "io went sideways");
    }
}

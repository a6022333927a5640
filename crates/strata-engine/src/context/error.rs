use std::fmt;

/// Error kinds recorded by the rendering context.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VgError {
    /// A handle is stale, destroyed, or of the wrong kind.
    BadHandle,
    IllegalArgument,
    /// The path lacks a capability the operation requires.
    PathCapability,
    UnsupportedImageFormat,
    OutOfMemory,
}

impl fmt::Display for VgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            VgError::BadHandle => "bad handle",
            VgError::IllegalArgument => "illegal argument",
            VgError::PathCapability => "path capability missing",
            VgError::UnsupportedImageFormat => "unsupported image format",
            VgError::OutOfMemory => "out of memory",
        };
        write!(f, "vg error: {msg}")
    }
}

impl std::error::Error for VgError {}

/// Last-error slot: the first error recorded wins until it is taken.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct ErrorSlot(Option<VgError>);

impl ErrorSlot {
    /// Records `err` unless an earlier error is still pending.
    #[inline]
    pub fn record(&mut self, err: VgError) {
        if self.0.is_none() {
            log::debug!("context error recorded: {err}");
            self.0 = Some(err);
        }
    }

    /// Unwraps `result`, recording its error and returning `None` on failure.
    #[inline]
    pub fn check<T>(&mut self, result: Result<T, VgError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    #[inline]
    pub fn peek(&self) -> Option<VgError> {
        self.0
    }

    /// Reads and clears the pending error.
    #[inline]
    pub fn take(&mut self) -> Option<VgError> {
        self.0.take()
    }
}

//! Cooperative cancellation.
//!
//! Slow operations (neighborhood filters, 2D FFT) poll a [`CancelToken`]
//! between rows. Once cancelled, the running call returns
//! [`OpsError::Cancelled`] and its partial output is dropped.
//!
//! # Example
//!
//! ```rust
//! use xray_ops::{CancelToken, OpsError, Operation};
//! use xray_core::PixelBuffer;
//!
//! let token = CancelToken::new();
//! token.cancel();
//!
//! let src = PixelBuffer::filled(16, 16, [10, 10, 10, 255]);
//! let op = Operation::Median(Default::default());
//! assert!(matches!(op.apply_cancellable(&src, &token), Err(OpsError::Cancelled)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{OpsError, OpsResult};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called on any clone.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fails with [`OpsError::Cancelled`] if cancellation was requested.
    #[inline]
    pub fn check(&self) -> OpsResult<()> {
        if self.is_cancelled() {
            Err(OpsError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(a.check().is_ok());
        b.cancel();
        assert!(a.is_cancelled());
        assert!(matches!(a.check(), Err(OpsError::Cancelled)));
    }
}

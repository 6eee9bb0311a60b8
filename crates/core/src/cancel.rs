// Cooperative cancellation shared between a session and its workers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable one-way cancellation flag.
///
/// Once cancelled it stays cancelled. All clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token. Returns true only for the call that flipped it.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        assert!(token.cancel());
        assert!(clone.is_cancelled());
        // Second cancel is a no-op
        assert!(!clone.cancel());
    }
}

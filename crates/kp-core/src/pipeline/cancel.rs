//! Run-wide cancellation and first-error capture.

use kp_common::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Slot holding the first error reported by any stage.
///
/// Recording an error always cancels the run; only the first one is kept.
#[derive(Debug)]
pub struct FirstError {
    slot: OnceLock<Error>,
    cancel: CancelToken,
}

impl FirstError {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            slot: OnceLock::new(),
            cancel,
        }
    }

    /// Returns `true` if `err` became the run's error.
    pub fn record(&self, err: Error) -> bool {
        let first = self.slot.set(err).is_ok();
        self.cancel.cancel();
        first
    }

    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn into_inner(self) -> Option<Error> {
        self.slot.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kp_common::Stage;

    #[test]
    fn test_clones_share_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_first_error_wins_and_cancels() {
        let token = CancelToken::new();
        let first = FirstError::new(token.clone());
        assert!(first.record(Error::Cancelled.in_stage(Stage::Scan)));
        assert!(!first.record(Error::Encode("late".to_string())));
        assert!(token.is_cancelled());

        let err = first.into_inner().unwrap();
        assert_eq!(err.stage(), Some(Stage::Scan));
    }

    #[test]
    fn test_concurrent_record_keeps_exactly_one() {
        let first = FirstError::new(CancelToken::new());
        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let first = &first;
                    scope.spawn(move || first.record(Error::Encode(format!("worker {i}"))))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(winners, 1);
        assert!(first.is_set());
    }
}

use crate::db::executor::ExecutionError;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

///
/// CancelToken
///
/// Caller-driven cancellation flag shared between the caller and one or
/// more executions. The executor polls it between phases and while joining;
/// a cancelled execution returns no rows.
///

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn check(&self) -> Result<(), ExecutionError> {
        if self.is_cancelled() {
            Err(ExecutionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

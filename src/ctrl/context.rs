use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::base::OpStatus;

/// Re-usable component for signaling cancellation. Simple wrapper around an atomic flag.
///
/// The flag is monotonic (false to true only) and uses relaxed ordering on both ends:
/// it is a hint, not a synchronization barrier.
#[derive(Debug, Default)]
pub struct Cancellation {
    flag: AtomicBool,
}

impl Cancellation {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Thread-safe utility to store the first non-default value offered to it.
///
/// With at most shard-count concurrent writers and O(1) critical sections, a plain
/// mutex is all this needs. Candidates that lose the race are dropped; only one
/// value can be surfaced to the caller anyway.
#[derive(Debug, Default)]
pub struct FirstValue<T> {
    current: Mutex<T>,
}

impl<T: Default + PartialEq + Clone> FirstValue<T> {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(T::default()),
        }
    }

    /// Stores `val` if no non-default value has been captured yet.
    ///
    /// Returns whether `val` itself is non-default, *not* whether the store happened:
    /// callers use this as "was this candidate meaningful", while the persisted
    /// effect stays "first meaningful candidate wins".
    pub fn try_write(&self, val: T) -> bool {
        let mut current = self.current.lock();
        if *current == T::default() && val != T::default() {
            *current = val;
            return true;
        }
        val != T::default()
    }

    /// Returns a snapshot copy of the captured value.
    pub fn read(&self) -> T {
        self.current.lock().clone()
    }

    pub fn is_set(&self) -> bool {
        self.read() != T::default()
    }
}

pub type AggregateStatus = FirstValue<OpStatus>;
pub type AggregateError = FirstValue<OpError>;

/// One failure as an immutable status/details pair. Empty iff the status is
/// [`OpStatus::Ok`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpError {
    status: OpStatus,
    details: String,
}

impl OpError {
    pub fn new(status: OpStatus, details: impl Into<String>) -> Self {
        Self {
            status,
            details: details.into(),
        }
    }

    pub const fn status(&self) -> OpStatus {
        self.status
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn is_empty(&self) -> bool {
        self.status == OpStatus::Ok
    }

    /// Human readable rendering, combining the status meaning with the details.
    pub fn format(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        if self.details.is_empty() {
            return self.status.to_string();
        }
        format!("{}:{}", self.status, self.details)
    }
}

impl From<OpStatus> for OpError {
    fn from(status: OpStatus) -> Self {
        Self::new(status, "")
    }
}

/// The accept policy decides per candidate error: `false` means "this error is
/// expected, ignore it", `true` means "adopt it and cancel the operation".
pub type AcceptPolicy = Box<dyn Fn(&OpError) -> bool + Send + Sync>;

/// Combines [`Cancellation`] with first-error capture for one multi-shard operation.
///
/// Every shard participating in the operation may call [`error`]; the first candidate
/// the policy accepts is stored and cancels the operation, all later candidates are
/// silently discarded. Ignored candidates leave the context un-cancelled and leave
/// no trace.
///
/// The context is scoped to its operation and simply dropped when the call stack
/// unwinds; there is no explicit destruction protocol.
///
/// [`error`]: Self::error
#[derive(Debug, Default)]
pub struct OperationContext {
    cancellation: Cancellation,
    stored: Mutex<Option<OpError>>,
    #[debug(skip)]
    accept_policy: Option<AcceptPolicy>,
}

impl OperationContext {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_policy(policy: impl Fn(&OpError) -> bool + Send + Sync + 'static) -> Self {
        Self {
            cancellation: Cancellation::default(),
            stored: Mutex::new(None),
            accept_policy: Some(Box::new(policy)),
        }
    }

    /// Offers a candidate error to this context.
    ///
    /// Discarded silently when an error is already stored. An empty candidate
    /// (status `Ok`) is never adopted, so the stored slot can only ever hold a
    /// meaningful error.
    pub fn error(&self, status: OpStatus, details: impl Into<String>) {
        let mut stored = self.stored.lock();
        if stored.is_some() {
            return;
        }

        let candidate = OpError::new(status, details);
        if candidate.is_empty() {
            return;
        }

        match &self.accept_policy {
            Some(policy) if !policy(&candidate) => {
                trace!(status = %candidate.status(), "Ignoring expected error");
            }
            _ => {
                *stored = Some(candidate);
                self.cancellation.cancel();
            }
        }
    }

    /// The stored error, if any shard's candidate was adopted.
    pub fn get_error(&self) -> Option<OpError> {
        self.stored.lock().clone()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::tests::setup_tracing;

    use super::*;

    #[test]
    fn test_cancellation_is_idempotent() {
        let cancellation = Cancellation::default();
        assert!(!cancellation.is_cancelled());
        cancellation.cancel();
        cancellation.cancel();
        assert!(cancellation.is_cancelled());
    }

    #[test]
    fn test_first_value_keeps_first_meaningful_candidate() {
        let latch = AggregateStatus::new();
        assert!(!latch.is_set());

        // a default candidate is meaningless and never stored
        assert!(!latch.try_write(OpStatus::Ok));
        assert!(!latch.is_set());

        assert!(latch.try_write(OpStatus::KeyNotFound));
        // later candidates report as meaningful but do not replace the stored value
        assert!(latch.try_write(OpStatus::OutOfMemory));
        assert_eq!(latch.read(), OpStatus::KeyNotFound);
    }

    #[test]
    fn test_first_value_latch_under_concurrent_writes() {
        setup_tracing();
        let latch = Arc::new(AggregateError::new());

        let mut handles = Vec::new();
        for i in 0..8 {
            let latch = Arc::clone(&latch);
            handles.push(std::thread::spawn(move || {
                let status = if i % 2 == 0 {
                    OpStatus::KeyNotFound
                } else {
                    OpStatus::OutOfMemory
                };
                assert!(latch.try_write(OpError::new(status, format!("writer {i}"))));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // exactly one of the offered candidates must have won, and it must stick
        let stored = latch.read();
        assert!(latch.is_set());
        assert!(matches!(
            stored.status(),
            OpStatus::KeyNotFound | OpStatus::OutOfMemory
        ));
        latch.try_write(OpError::new(OpStatus::SyntaxErr, "late candidate"));
        assert_eq!(latch.read(), stored);
    }

    #[test]
    fn test_op_error_format() {
        assert_eq!(OpError::default().format(), "");
        assert_eq!(OpError::from(OpStatus::KeyNotFound).format(), "no such key");
        assert_eq!(
            OpError::new(OpStatus::OutOfMemory, "shard 2").format(),
            "out of memory:shard 2"
        );
    }

    #[test]
    fn test_context_stores_first_error_and_cancels() {
        let cntx = OperationContext::new();
        assert!(!cntx.is_cancelled());
        assert_eq!(cntx.get_error(), None);

        cntx.error(OpStatus::OutOfMemory, "first");
        assert!(cntx.is_cancelled());
        cntx.error(OpStatus::SyntaxErr, "second");

        let stored = cntx.get_error().unwrap();
        assert_eq!(stored.status(), OpStatus::OutOfMemory);
        assert_eq!(stored.details(), "first");
    }

    #[test]
    fn test_context_empty_candidate_is_never_adopted() {
        let cntx = OperationContext::new();
        cntx.error(OpStatus::Ok, "looks empty");
        assert!(!cntx.is_cancelled());
        assert_eq!(cntx.get_error(), None);
    }

    #[test]
    fn test_context_accept_policy() {
        setup_tracing();
        let cntx = OperationContext::with_policy(|err| err.status() != OpStatus::KeyNotFound);

        // ignorable errors never cancel and leave no trace
        for _ in 0..3 {
            cntx.error(OpStatus::KeyNotFound, "expected per-shard miss");
        }
        assert!(!cntx.is_cancelled());
        assert_eq!(cntx.get_error(), None);

        cntx.error(OpStatus::OutOfMemory, "real failure");
        assert!(cntx.is_cancelled());
        assert_eq!(cntx.get_error().unwrap().status(), OpStatus::OutOfMemory);

        // stored error stays put, accepted or not
        cntx.error(OpStatus::SyntaxErr, "after the fact");
        assert_eq!(cntx.get_error().unwrap().status(), OpStatus::OutOfMemory);
    }
}

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-round submission counters, shared by the dispatch workers.
#[derive(Clone, Default)]
pub struct RoundStats {
    inner: Arc<Mutex<Counters>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    /// Transactions admitted by the node.
    pub accepted: u64,
    /// Transactions refused by the node or the local encoder.
    pub rejected: u64,
    /// Invalid transactions the node admitted anyway.
    pub anomalies: u64,
    /// Rejection reasons and how often each was seen.
    pub reasons: BTreeMap<String, u64>,
}

impl RoundStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) {
        self.inner.lock().accepted += 1;
    }

    pub fn rejected(&self, reason: &str) {
        let mut c = self.inner.lock();
        c.rejected += 1;
        *c.reasons.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn anomaly(&self) {
        let mut c = self.inner.lock();
        c.accepted += 1;
        c.anomalies += 1;
    }

    pub fn snapshot(&self) -> Counters {
        self.inner.lock().clone()
    }

    /// Return the counters and start over.
    pub fn take(&self) -> Counters {
        std::mem::take(&mut *self.inner.lock())
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide memory accounting, passed explicitly to whoever needs it.
///
/// The counters are cached values updated from introspection passes, with
/// relaxed ordering on both ends: readers get a recent value, not a
/// synchronization point. The limits are fixed at construction.
#[derive(Debug, Default)]
pub struct SystemMetrics {
    used_mem_current: AtomicU64,
    used_mem_peak: AtomicU64,
    max_memory_limit: u64,
    kernel_version: u32,
}

impl SystemMetrics {
    pub fn new(max_memory_limit: u64, kernel_version: u32) -> Self {
        Self {
            max_memory_limit,
            kernel_version,
            ..Default::default()
        }
    }

    /// Publishes a fresh usage figure, ratcheting the peak.
    pub fn update_used(&self, used: u64) {
        self.used_mem_current.store(used, Ordering::Relaxed);
        self.used_mem_peak.fetch_max(used, Ordering::Relaxed);
    }

    pub fn used_current(&self) -> u64 {
        self.used_mem_current.load(Ordering::Relaxed)
    }

    pub fn used_peak(&self) -> u64 {
        self.used_mem_peak.load(Ordering::Relaxed)
    }

    pub const fn max_memory_limit(&self) -> u64 {
        self.max_memory_limit
    }

    pub const fn kernel_version(&self) -> u32 {
        self.kernel_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_only_ratchets_up() {
        let metrics = SystemMetrics::new(1 << 30, 511);
        metrics.update_used(100);
        metrics.update_used(40);

        assert_eq!(metrics.used_current(), 40);
        assert_eq!(metrics.used_peak(), 100);
        assert_eq!(metrics.max_memory_limit(), 1 << 30);
        assert_eq!(metrics.kernel_version(), 511);
    }
}

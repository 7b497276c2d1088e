//! Pipeline metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for one running pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Messages pulled off the queue
    received_count: AtomicU64,
    /// Messages dropped at decode
    decode_error_count: AtomicU64,
    /// Messages dropped at validation
    validation_error_count: AtomicU64,
    /// Successful sink deliveries
    delivered_count: AtomicU64,
    /// Deliveries that failed after all retries
    failure_count: AtomicU64,
    /// Individual retry attempts
    retry_count: AtomicU64,
    /// Messages dropped by the full queue
    dropped_count: AtomicU64,
    /// Current queue length
    queue_len: AtomicUsize,
}

impl PipelineMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received_count(&self) -> u64 {
        self.received_count.load(Ordering::Relaxed)
    }

    pub fn inc_received(&self) {
        self.received_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error_count(&self) -> u64 {
        self.decode_error_count.load(Ordering::Relaxed)
    }

    pub fn inc_decode_errors(&self) {
        self.decode_error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn validation_error_count(&self) -> u64 {
        self.validation_error_count.load(Ordering::Relaxed)
    }

    pub fn inc_validation_errors(&self) {
        self.validation_error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failures(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retry_count(&self) -> u64 {
        self.retry_count.load(Ordering::Relaxed)
    }

    pub fn inc_retries(&self) {
        self.retry_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            received_count: self.received_count(),
            decode_error_count: self.decode_error_count(),
            validation_error_count: self.validation_error_count(),
            delivered_count: self.delivered_count(),
            failure_count: self.failure_count(),
            retry_count: self.retry_count(),
            dropped_count: self.dropped_count(),
            queue_len: self.queue_len(),
        }
    }
}

/// Snapshot of pipeline metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineSnapshot {
    pub received_count: u64,
    pub decode_error_count: u64,
    pub validation_error_count: u64,
    pub delivered_count: u64,
    pub failure_count: u64,
    pub retry_count: u64,
    pub dropped_count: u64,
    pub queue_len: usize,
}

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::RecordFilterError;
use crate::types::{PrimitiveType, TargetColumnName};

/// How bad a failed run is, for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureSeverity {
    Warning,
    Error,
    Critical,
}

impl FailureSeverity {
    /// Classify a run failure: I/O is critical, cancellation a warning, everything else an error.
    pub fn for_error(error: &RecordFilterError) -> Self {
        match error {
            RecordFilterError::Cancelled => FailureSeverity::Warning,
            e if e.is_io() => FailureSeverity::Critical,
            _ => FailureSeverity::Error,
        }
    }
}

impl fmt::Display for FailureSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureSeverity::Warning => "warning",
            FailureSeverity::Error => "error",
            FailureSeverity::Critical => "critical",
        })
    }
}

/// Events emitted by [`super::FilterPipeline`].
#[derive(Debug)]
pub enum ExecutionEvent<'a> {
    RunStarted {
        column: &'a TargetColumnName,
        target_type: PrimitiveType,
    },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
    RunFailed {
        severity: FailureSeverity,
        error: &'a RecordFilterError,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent<'_>);
}

/// Logs execution events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_event(&self, event: &ExecutionEvent<'_>) {
        match event {
            ExecutionEvent::RunStarted {
                column,
                target_type,
            } => {
                tracing::info!(column = %column, target_type = %target_type, "filter run started");
            }
            ExecutionEvent::RunFinished { elapsed, metrics } => {
                tracing::info!(elapsed = ?elapsed, %metrics, "filter run finished");
            }
            ExecutionEvent::RunFailed {
                severity,
                error,
                metrics,
            } => match severity {
                FailureSeverity::Warning => {
                    tracing::warn!(%severity, %error, %metrics, "filter run stopped");
                }
                FailureSeverity::Error | FailureSeverity::Critical => {
                    tracing::error!(%severity, %error, %metrics, "filter run failed");
                }
            },
        }
    }
}

/// Fans each event out to several observers, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ExecutionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ExecutionObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Arc<dyn ExecutionObserver>) {
        self.observers.push(observer);
    }
}

impl ExecutionObserver for CompositeObserver {
    fn on_event(&self, event: &ExecutionEvent<'_>) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Real-time counters for a filter run.
///
/// The pipeline updates these while rows flow; callers holding the `Arc` can snapshot them at any
/// time, including from another thread.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    rows_read: AtomicU64,
    rows_matched: AtomicU64,
    rows_written: AtomicU64,
    elapsed_ns: AtomicU64,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_run(&self) {
        self.rows_read.store(0, Ordering::SeqCst);
        self.rows_matched.store(0, Ordering::SeqCst);
        self.rows_written.store(0, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_row_read(&self) {
        let _ = self.rows_read.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_row_matched(&self) {
        let _ = self.rows_matched.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_row_written(&self) {
        let _ = self.rows_written.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            rows_read: self.rows_read.load(Ordering::SeqCst),
            rows_matched: self.rows_matched.load(Ordering::SeqCst),
            rows_written: self.rows_written.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub rows_read: u64,
    pub rows_matched: u64,
    pub rows_written: u64,
    /// `None` while the run is in progress.
    pub elapsed: Option<Duration>,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows_read={}, rows_matched={}, rows_written={}, elapsed={:?}",
            self.rows_read, self.rows_matched, self.rows_written, self.elapsed
        )
    }
}

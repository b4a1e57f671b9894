//! Execution driver for filter runs.
//!
//! This module sits "above" [`crate::processing`] and wires a resolved [`Filter`] between a
//! decoder and an encoder:
//!
//! - cooperative cancellation through a shared [`CancellationToken`]
//! - real-time metrics (rows read / matched / written)
//! - observer hooks for monitoring ([`TracingObserver`], [`CompositeObserver`])
//!
//! A run is single-threaded and pull-based: the sink drives the filter, which drives the
//! decoder one row at a time.

mod cancel;
mod observer;

use std::sync::Arc;
use std::time::Instant;

use crate::error::RecordFilterResult;
use crate::output::{write_rows, RowSink};
use crate::processing::Filter;
use crate::types::Row;

pub use cancel::CancellationToken;
pub use observer::{
    CompositeObserver, ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot,
    ExecutionObserver, FailureSeverity, TracingObserver,
};

/// Runs one filter over one row stream into one sink.
pub struct FilterPipeline {
    filter: Filter,
    cancel: CancellationToken,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl FilterPipeline {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            cancel: CancellationToken::new(),
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Use `token` to stop the run; cancelling any clone of it ends the run with `Cancelled`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Filter `rows` into `sink`.
    ///
    /// The first error (decode, filter, cancellation or encode) ends the run, is reported
    /// through a `RunFailed` event and returned. The sink is finished either way, so rows
    /// written before the error stay readable.
    pub fn run<'a, I>(
        &self,
        rows: I,
        sink: Box<dyn RowSink + 'a>,
    ) -> RecordFilterResult<ExecutionMetricsSnapshot>
    where
        I: IntoIterator<Item = RecordFilterResult<Row>>,
    {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(&ExecutionEvent::RunStarted {
            column: self.filter.column(),
            target_type: self.filter.target_type(),
        });

        let read = rows.into_iter().inspect(|r| {
            if r.is_ok() {
                self.metrics.on_row_read();
            }
        });
        let matched = self.filter.apply(&self.cancel, read).inspect(|r| {
            if r.is_ok() {
                self.metrics.on_row_matched();
            }
        });
        let sink = CountingSink {
            inner: sink,
            metrics: Arc::clone(&self.metrics),
        };
        let result = write_rows(matched, Box::new(sink));

        self.metrics.end_run(start.elapsed());
        match result {
            Ok(_) => {
                let metrics = self.metrics.snapshot();
                self.emit(&ExecutionEvent::RunFinished {
                    elapsed: start.elapsed(),
                    metrics: metrics.clone(),
                });
                Ok(metrics)
            }
            Err(error) => {
                self.emit(&ExecutionEvent::RunFailed {
                    severity: FailureSeverity::for_error(&error),
                    error: &error,
                    metrics: self.metrics.snapshot(),
                });
                Err(error)
            }
        }
    }

    fn emit(&self, event: &ExecutionEvent<'_>) {
        if let Some(obs) = &self.observer {
            obs.on_event(event);
        }
    }
}

/// Counts rows as the wrapped sink accepts them.
struct CountingSink<'a> {
    inner: Box<dyn RowSink + 'a>,
    metrics: Arc<ExecutionMetrics>,
}

impl RowSink for CountingSink<'_> {
    fn write_row(&mut self, row: &Row) -> RecordFilterResult<()> {
        self.inner.write_row(row)?;
        self.metrics.on_row_written();
        Ok(())
    }

    fn finish(self: Box<Self>) -> RecordFilterResult<()> {
        self.inner.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use super::{
        CancellationToken, ExecutionEvent, ExecutionObserver, FailureSeverity, FilterPipeline,
    };
    use crate::error::{RecordFilterError, RecordFilterResult};
    use crate::output::RowSink;
    use crate::processing::resolve;
    use crate::types::{PrimitiveType, RawTargetConfig, Row, Value};

    #[derive(Clone, Default)]
    struct VecSink {
        rows: Rc<RefCell<Vec<Row>>>,
        finished: Rc<RefCell<bool>>,
    }

    impl RowSink for VecSink {
        fn write_row(&mut self, row: &Row) -> RecordFilterResult<()> {
            self.rows.borrow_mut().push(row.clone());
            Ok(())
        }

        fn finish(self: Box<Self>) -> RecordFilterResult<()> {
            *self.finished.borrow_mut() = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<String>>,
    }

    impl ExecutionObserver for RecordingObserver {
        fn on_event(&self, event: &ExecutionEvent<'_>) {
            let name = match event {
                ExecutionEvent::RunStarted { column, target_type } => {
                    format!("started:{column}:{target_type}")
                }
                ExecutionEvent::RunFinished { metrics, .. } => {
                    format!("finished:{}", metrics.rows_written)
                }
                ExecutionEvent::RunFailed { severity, .. } => format!("failed:{severity}"),
            };
            self.events.lock().unwrap().push(name);
        }
    }

    fn status_pipeline() -> FilterPipeline {
        let filter = resolve(
            PrimitiveType::String,
            &RawTargetConfig::new("status", "active"),
        )
        .unwrap();
        FilterPipeline::new(filter)
    }

    fn status_rows() -> Vec<RecordFilterResult<Row>> {
        vec![
            Ok(Row::new().with("status", "active")),
            Ok(Row::new().with("status", "inactive")),
            Ok(Row::new()),
            Ok(Row::new().with("status", Value::Null)),
            Ok(Row::new().with("status", "active").with("id", 2_i64)),
        ]
    }

    #[test]
    fn run_writes_matches_and_reports_metrics() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let pipeline = status_pipeline().with_observer(obs_trait);
        let sink = VecSink::default();

        let snap = pipeline.run(status_rows(), Box::new(sink.clone())).unwrap();

        assert_eq!(sink.rows.borrow().len(), 2);
        assert!(*sink.finished.borrow());
        assert_eq!(snap.rows_read, 5);
        assert_eq!(snap.rows_matched, 2);
        assert_eq!(snap.rows_written, 2);
        assert!(snap.elapsed.is_some());
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["started:status:string".to_string(), "finished:2".to_string()]
        );
    }

    #[test]
    fn type_mismatch_fails_run_and_still_finishes_sink() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let pipeline = status_pipeline().with_observer(obs_trait);
        let sink = VecSink::default();
        let rows = vec![
            Ok(Row::new().with("status", "active")),
            Ok(Row::new().with("status", 5_i32)),
            Ok(Row::new().with("status", "active")),
        ];

        let err = pipeline.run(rows, Box::new(sink.clone())).unwrap_err();

        assert!(matches!(err, RecordFilterError::InvalidInput { .. }));
        assert_eq!(sink.rows.borrow().len(), 1);
        assert!(*sink.finished.borrow());
        assert_eq!(pipeline.metrics().snapshot().rows_read, 2);
        assert_eq!(observer.events.lock().unwrap().last().unwrap(), "failed:error");
    }

    #[test]
    fn cancelled_run_is_a_warning() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = status_pipeline()
            .with_cancellation(token)
            .with_observer(obs_trait);
        let sink = VecSink::default();

        let err = pipeline.run(status_rows(), Box::new(sink.clone())).unwrap_err();

        assert!(matches!(err, RecordFilterError::Cancelled));
        assert!(sink.rows.borrow().is_empty());
        assert!(*sink.finished.borrow());
        assert_eq!(pipeline.metrics().snapshot().rows_read, 0);
        assert_eq!(
            observer.events.lock().unwrap().last().unwrap(),
            &format!("failed:{}", FailureSeverity::Warning)
        );
    }
}

use crate::metric::Metric;
use parking_lot::Mutex;

/// Receives [`Metric`] observations emitted by engines for counters the
/// Event Pipeline and Calculation Core name explicitly (dead-letter count,
/// CAS-conflict count, lease-timeout count, settlement-window-violation
/// count - spec.md §4.1/§5/§8), without coupling the emitting engine to a
/// concrete metrics sink.
pub trait MetricHook: Send + Sync {
    fn record(&self, metric: Metric);
}

/// Discards every observation. The default hook for engines constructed
/// without an explicit one.
#[derive(Debug, Default)]
pub struct NoopMetricHook;

impl MetricHook for NoopMetricHook {
    fn record(&self, _metric: Metric) {}
}

/// Collects observations in a vector behind a lock, for assertions in
/// tests.
#[derive(Default)]
pub struct VecMetricHook {
    pub metrics: Mutex<Vec<Metric>>,
}

impl MetricHook for VecMetricHook {
    fn record(&self, metric: Metric) {
        self.metrics.lock().push(metric);
    }
}

impl VecMetricHook {
    pub fn count(&self, name: &str) -> usize {
        self.metrics.lock().iter().filter(|m| m.name == name).count()
    }
}

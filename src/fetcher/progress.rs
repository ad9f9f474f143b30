use std::sync::Arc;

/// Receives the fraction of grid points completed so far, from `0.0` to `1.0`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Turns point completions into monotonic progress fractions.
///
/// Owned by the loop that drains the fetch stream, so counting needs no
/// shared state between workers.
pub(crate) struct ProgressReporter {
    total: usize,
    completed: usize,
    callback: Option<ProgressCallback>,
}

impl ProgressReporter {
    pub(crate) fn new(total: usize, callback: Option<ProgressCallback>) -> Self {
        Self {
            total,
            completed: 0,
            callback,
        }
    }

    /// Records one finished point and reports the new fraction. The last
    /// point reports exactly `1.0`.
    pub(crate) fn point_done(&mut self) -> f64 {
        self.completed = (self.completed + 1).min(self.total);
        let fraction = if self.completed == self.total {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        };
        self.emit(fraction);
        fraction
    }

    /// An empty grid is complete as soon as it starts.
    pub(crate) fn finish_empty(&mut self) {
        if self.total == 0 {
            self.emit(1.0);
        }
    }

    fn emit(&self, fraction: f64) {
        if let Some(callback) = &self.callback {
            callback(fraction);
        }
    }
}

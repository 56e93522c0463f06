use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};

use super::config::ForecastConfig;
use super::estimator::{estimate_next, ForecastResult};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Rolling window of observed interval lengths, oldest first.
///
/// Never holds more than `capacity` entries; appending past the cap evicts the oldest.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationWindow {
    intervals: Vec<f64>,
    capacity: usize,
}

impl DurationWindow {
    /// A capacity of zero is rejected, matching `ForecastConfig::validate`.
    pub fn new(capacity: usize) -> CoreResult<Self> {
        if capacity == 0 {
            return Err(CoreError::InvalidConfig {
                name: "capacity",
                reason: "must be at least 1".into(),
            });
        }
        Ok(Self::with_capacity(capacity))
    }

    pub fn from_config(config: &ForecastConfig) -> CoreResult<Self> {
        Self::new(config.capacity)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            intervals: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `interval`, evicting the oldest entry when the window is full.
    ///
    /// Returns the evicted interval, if any. A negative or non-finite interval is
    /// rejected and the window is left untouched.
    pub fn push(&mut self, interval: f64) -> CoreResult<Option<f64>> {
        if !interval.is_finite() || interval < 0.0 {
            return Err(CoreError::InvalidInput { value: interval });
        }

        self.intervals.push(interval);

        if self.intervals.len() > self.capacity {
            let evicted = self.intervals.remove(0);
            log_debug!("Window full ({}), evicted {evicted}", self.capacity);
            return Ok(Some(evicted));
        }

        Ok(None)
    }

    /// Push every interval in order, stopping at the first invalid one.
    pub fn extend<I>(&mut self, intervals: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = f64>,
    {
        for interval in intervals {
            self.push(interval)?;
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<f64> {
        self.intervals.last().copied()
    }

    /// Plain arithmetic mean, 0 for an empty window.
    pub fn mean(&self) -> f64 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        self.intervals.iter().sum::<f64>() / self.intervals.len() as f64
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
    }
}

impl Default for DurationWindow {
    fn default() -> Self {
        Self::with_capacity(ForecastConfig::default().capacity)
    }
}

/// A window shared between async producers and readers.
///
/// Pushes are serialized through the mutex, so the evict-then-append sequence stays
/// atomic even with several producers feeding the same dashboard session.
pub struct SharedWindow {
    inner: Arc<Mutex<DurationWindow>>,
}

impl SharedWindow {
    pub fn new(window: DurationWindow) -> Self {
        Self {
            inner: Arc::new(Mutex::new(window)),
        }
    }

    pub async fn push(&self, interval: f64) -> CoreResult<Option<f64>> {
        let mut window = self.inner.lock().await;
        window.push(interval)
    }

    pub async fn snapshot(&self) -> DurationWindow {
        self.inner.lock().await.clone()
    }

    pub async fn estimate(&self, config: &ForecastConfig) -> ForecastResult {
        let window = self.inner.lock().await;
        estimate_next(&window, config)
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}

impl Clone for SharedWindow {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

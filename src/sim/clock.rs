//! Simulated time
//!
//! Converts the host's frame timestamps into a monotonic simulated clock that
//! stands still while the session is paused.

/// Pause-aware simulated clock (milliseconds)
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    last_host_ms: Option<f64>,
    sim_ms: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `host_ms`; simulated time begins at zero
    pub fn anchored(host_ms: f64) -> Self {
        Self {
            last_host_ms: host_ms.is_finite().then_some(host_ms),
            sim_ms: 0.0,
        }
    }

    /// Feed a host timestamp. Elapsed time is added unless `frozen`.
    /// Backwards or non-finite timestamps add nothing.
    pub fn advance(&mut self, host_ms: f64, frozen: bool) -> f64 {
        if !host_ms.is_finite() {
            return self.sim_ms;
        }
        let elapsed = match self.last_host_ms {
            Some(last) => (host_ms - last).max(0.0),
            None => 0.0,
        };
        self.last_host_ms = Some(match self.last_host_ms {
            Some(last) => last.max(host_ms),
            None => host_ms,
        });
        if !frozen {
            self.sim_ms += elapsed;
        }
        self.sim_ms
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.sim_ms
    }
}

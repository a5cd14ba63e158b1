/// Single recurrence step: `(close - prev) * k + prev` with `k = 2 / (period + 1)`.
pub fn step_ema(close: f64, prev_ema: f64, period: usize) -> f64 {
    assert!(period > 0, "EMA period must be > 0");
    let k = smoothing(period);
    (close - prev_ema) * k + prev_ema
}

/// EMA over a full close series. Entries before the seed index are `None`;
/// the seed at `period - 1` is the mean of the first `period` closes.
pub fn batch_ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut ema = Ema::new(period);
    closes.iter().map(|&c| ema.push(c)).collect()
}

fn smoothing(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Exponential Moving Average.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    ema: Option<f64>,
    // Running sum for the seed mean; unused once `ema` is set.
    seed_sum: f64,
    seed_count: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "EMA period must be > 0");
        Self {
            period,
            ema: None,
            seed_sum: 0.0,
            seed_count: 0,
        }
    }

    /// Push a new value, return the current EMA if enough data.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        match self.ema {
            Some(prev) => {
                self.ema = Some(step_ema(value, prev, self.period));
            }
            None => {
                self.seed_sum += value;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.ema = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.ema
    }

    pub fn is_ready(&self) -> bool {
        self.ema.is_some()
    }
}

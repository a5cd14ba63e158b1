use crate::model::signal::SignalKind;

/// Relative half-width of the touch band around the slow EMA (0.015%).
pub const DEFAULT_TOUCH_BAND_RATIO: f64 = 0.00015;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaPair {
    pub fast: f64,
    pub slow: f64,
}

impl EmaPair {
    pub fn new(fast: f64, slow: f64) -> Self {
        Self { fast, slow }
    }

    /// Strict: equal EMAs are "not above".
    pub fn fast_above(&self) -> bool {
        self.fast > self.slow
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub is_touching: bool,
    pub kind: Option<SignalKind>,
}

pub fn is_touching(pair: EmaPair, band_ratio: f64) -> bool {
    (pair.fast - pair.slow).abs() <= pair.slow * band_ratio
}

/// Compares the EMA pair before and after a tick. A cross wins over a touch,
/// so at most one kind is reported.
pub fn detect(prev: EmaPair, new: EmaPair, band_ratio: f64) -> Detection {
    let touching = is_touching(new, band_ratio);
    let is_above = new.fast_above();
    let crossed = prev.fast_above() != is_above;

    let kind = if crossed {
        Some(if is_above {
            SignalKind::BullishCross
        } else {
            SignalKind::BearishCross
        })
    } else if touching {
        Some(SignalKind::Touch)
    } else {
        None
    };

    Detection {
        is_touching: touching,
        kind,
    }
}

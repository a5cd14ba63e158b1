use ema_sentinel::model::signal::SignalKind;
use ema_sentinel::signal_detector::{
    detect, is_touching, EmaPair, DEFAULT_TOUCH_BAND_RATIO,
};

fn pair(fast: f64, slow: f64) -> EmaPair {
    EmaPair::new(fast, slow)
}

#[test]
fn bullish_cross_when_fast_moves_above() {
    let d = detect(pair(100.0, 101.0), pair(102.0, 101.0), DEFAULT_TOUCH_BAND_RATIO);
    assert_eq!(d.kind, Some(SignalKind::BullishCross));
    assert!(!d.is_touching);
}

#[test]
fn swapping_sides_flips_cross_direction() {
    let bull = detect(pair(100.0, 101.0), pair(102.0, 101.0), DEFAULT_TOUCH_BAND_RATIO);
    let bear = detect(pair(101.0, 100.0), pair(101.0, 102.0), DEFAULT_TOUCH_BAND_RATIO);
    assert_eq!(bull.kind, Some(SignalKind::BullishCross));
    assert_eq!(bear.kind, Some(SignalKind::BearishCross));
}

#[test]
fn touch_inside_band_without_cross() {
    // threshold = 100 * 0.00015 = 0.015, diff = 0.01
    let d = detect(pair(100.02, 100.0), pair(100.01, 100.0), DEFAULT_TOUCH_BAND_RATIO);
    assert!(d.is_touching);
    assert_eq!(d.kind, Some(SignalKind::Touch));
}

#[test]
fn cross_inside_band_reports_only_cross() {
    let d = detect(pair(99.99, 100.0), pair(100.01, 100.0), DEFAULT_TOUCH_BAND_RATIO);
    assert!(d.is_touching);
    assert_eq!(d.kind, Some(SignalKind::BullishCross));
}

#[test]
fn no_signal_when_apart_and_same_side() {
    let d = detect(pair(105.0, 100.0), pair(104.0, 100.0), DEFAULT_TOUCH_BAND_RATIO);
    assert!(!d.is_touching);
    assert_eq!(d.kind, None);
}

#[test]
fn equality_counts_as_not_above() {
    // above -> equal is a bearish flip
    let d = detect(pair(101.0, 100.0), pair(100.0, 100.0), DEFAULT_TOUCH_BAND_RATIO);
    assert_eq!(d.kind, Some(SignalKind::BearishCross));

    // below -> equal keeps "not above", so it is only a touch
    let d = detect(pair(99.0, 100.0), pair(100.0, 100.0), DEFAULT_TOUCH_BAND_RATIO);
    assert_eq!(d.kind, Some(SignalKind::Touch));
}

#[test]
fn zero_slow_ema_degrades_to_exact_equality() {
    assert!(is_touching(pair(0.0, 0.0), DEFAULT_TOUCH_BAND_RATIO));
    assert!(!is_touching(pair(0.0001, 0.0), DEFAULT_TOUCH_BAND_RATIO));
}

#[test]
fn band_edge_is_inclusive() {
    assert!(is_touching(pair(150.0, 100.0), 0.5));
    assert!(is_touching(pair(50.0, 100.0), 0.5));
    assert!(!is_touching(pair(150.5, 100.0), 0.5));
}

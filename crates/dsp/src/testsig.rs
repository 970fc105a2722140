//! Signal generators shared by the detector tests.

/// `count` samples of a sine at `freq` Hz, `amp` peak, sampled at 8 kHz.
pub fn sine(freq: f64, amp: f64, count: usize) -> Vec<i16> {
    (0..count)
        .map(|i| {
            let t = 2.0 * std::f64::consts::PI * freq * i as f64 / 8000.0;
            (amp * t.sin()).round() as i16
        })
        .collect()
}

/// The sum of two equal-amplitude sines, sampled at 8 kHz.
pub fn dual_sine(f1: f64, f2: f64, amp: f64, count: usize) -> Vec<i16> {
    (0..count)
        .map(|i| {
            let w = 2.0 * std::f64::consts::PI * i as f64 / 8000.0;
            (amp * ((f1 * w).sin() + (f2 * w).sin())).round() as i16
        })
        .collect()
}

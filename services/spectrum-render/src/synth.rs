//! Synthetic 2D spectra for demo renders.

use contour_engine::Matrix;

/// `(row, col, width, height)` in fractions of the spectrum size; width is
/// relative to the shorter axis.
const PEAKS: &[(f64, f64, f64, f64)] = &[
    (0.18, 0.22, 0.012, 1000.0),
    (0.24, 0.61, 0.020, 640.0),
    (0.33, 0.40, 0.010, 820.0),
    (0.41, 0.78, 0.015, 300.0),
    (0.52, 0.15, 0.025, 450.0),
    (0.58, 0.52, 0.008, 900.0),
    (0.60, 0.55, 0.008, 880.0),
    (0.71, 0.33, 0.018, -520.0),
    (0.77, 0.70, 0.030, -260.0),
    (0.86, 0.45, 0.011, 700.0),
];

/// HSQC-like spectrum of `rows x cols` samples, with the peak list shifted
/// along columns by `shift` (fraction of the width) for overlays.
pub fn synthesize(rows: usize, cols: usize, shift: f64) -> Matrix {
    let (h, w) = (rows as f64, cols as f64);
    let scale = h.min(w);
    Matrix::from_fn(rows, cols, |r, c| {
        let mut v = 0.0;
        for &(pr, pc, width, height) in PEAKS {
            let dr = r as f64 - pr * h;
            let dc = c as f64 - (pc + shift) * w;
            let s = width * scale;
            v += height * (-(dr * dr + dc * dc) / (2.0 * s * s)).exp();
        }
        v as f32
    })
}

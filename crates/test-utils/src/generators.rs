//! Test data generators for creating synthetic spectra.
//!
//! These generators create predictable, verifiable intensity patterns
//! that can be used across the test suite.

use contour_engine::Matrix;

/// A single 2D Gaussian peak.
#[derive(Debug, Clone, Copy)]
pub struct Peak {
    /// Center row (fractional samples)
    pub row: f64,
    /// Center column (fractional samples)
    pub col: f64,
    /// Standard deviation in samples
    pub width: f64,
    /// Peak height; negative for inverted peaks
    pub height: f64,
}

impl Peak {
    pub fn new(row: f64, col: f64, width: f64, height: f64) -> Self {
        Self {
            row,
            col,
            width,
            height,
        }
    }

    fn value(&self, r: usize, c: usize) -> f64 {
        let dr = r as f64 - self.row;
        let dc = c as f64 - self.col;
        self.height * (-(dr * dr + dc * dc) / (2.0 * self.width * self.width)).exp()
    }
}

/// Sum of Gaussian peaks on a zero baseline.
pub fn gaussian_peaks(rows: usize, cols: usize, peaks: &[Peak]) -> Matrix {
    Matrix::from_fn(rows, cols, |r, c| {
        peaks.iter().map(|p| p.value(r, c)).sum::<f64>() as f32
    })
}

/// A small HSQC-like spectrum: several positive peaks and one negative.
///
/// Values peak around 1000 and dip to about -600.
pub fn create_spectrum(rows: usize, cols: usize) -> Matrix {
    let (h, w) = (rows as f64, cols as f64);
    let width = (h.min(w) / 20.0).max(1.0);
    gaussian_peaks(
        rows,
        cols,
        &[
            Peak::new(h * 0.25, w * 0.25, width, 1000.0),
            Peak::new(h * 0.30, w * 0.70, width * 1.5, 700.0),
            Peak::new(h * 0.70, w * 0.40, width, 400.0),
            Peak::new(h * 0.65, w * 0.80, width * 2.0, -600.0),
        ],
    )
}

/// Square grid whose outer ring is 0.0 and whose interior is `height`.
///
/// # Example
///
/// ```
/// use test_utils::create_plateau;
///
/// let m = create_plateau(4, 10.0);
/// assert_eq!(m.get(0, 0), Some(0.0));
/// assert_eq!(m.get(1, 2), Some(10.0));
/// ```
pub fn create_plateau(size: usize, height: f32) -> Matrix {
    Matrix::from_fn(size, size, |r, c| {
        if r == 0 || c == 0 || r + 1 == size || c + 1 == size {
            0.0
        } else {
            height
        }
    })
}

/// Values increasing left to right: `value = col`.
pub fn create_column_ramp(rows: usize, cols: usize) -> Matrix {
    Matrix::from_fn(rows, cols, |_, c| c as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_extremes() {
        let m = create_spectrum(100, 100);
        let max = m.as_slice().iter().cloned().fold(f32::MIN, f32::max);
        let min = m.as_slice().iter().cloned().fold(f32::MAX, f32::min);
        assert!(max > 900.0 && max < 1100.0);
        assert!(min < -500.0);
    }

    #[test]
    fn test_plateau_ring() {
        let m = create_plateau(5, 3.0);
        assert_eq!(m.get(4, 4), Some(0.0));
        assert_eq!(m.get(2, 2), Some(3.0));
    }

    #[test]
    fn test_column_ramp() {
        let m = create_column_ramp(3, 4);
        assert_eq!(m.get(2, 3), Some(3.0));
    }
}

use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Hamming coefficient for sample `n` of an `len`-sample window
#[inline]
pub fn hamming_coefficient(n: usize, len: usize) -> f32 {
    (0.54 - 0.46 * (2.0 * PI * n as f64 / (len - 1) as f64).cos()) as f32
}

/// Apply a Hamming taper to `segment`, returning a new vector.
pub fn hamming(segment: &[f32]) -> Result<Vec<f32>> {
    let window = HammingWindow::new(segment.len())?;
    let mut out = vec![0.0; segment.len()];
    window.apply(segment, &mut out)?;
    Ok(out)
}

/// Pre-computed Hamming coefficients for a fixed frame length
#[derive(Clone, Debug)]
pub struct HammingWindow {
    coeffs: Vec<f32>,
}

impl HammingWindow {
    pub fn new(len: usize) -> Result<Self> {
        if len < 2 {
            return Err(Error::InvalidWindowLength(len));
        }
        let coeffs = (0..len).map(|n| hamming_coefficient(n, len)).collect();
        Ok(Self { coeffs })
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coeffs
    }

    /// Multiply `input` by the window into `out`. Both must match the window length.
    pub fn apply(&self, input: &[f32], out: &mut [f32]) -> Result<()> {
        for len in [input.len(), out.len()] {
            if len != self.coeffs.len() {
                return Err(Error::BufferSizeMismatch {
                    expected: self.coeffs.len(),
                    got: len,
                });
            }
        }
        for ((o, &s), &w) in out.iter_mut().zip(input).zip(&self.coeffs) {
            *o = s * w;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_lengths() {
        assert!(matches!(hamming(&[]), Err(Error::InvalidWindowLength(0))));
        assert!(matches!(hamming(&[1.0]), Err(Error::InvalidWindowLength(1))));
    }

    #[test]
    fn edges_and_center() {
        let w = HammingWindow::new(5).unwrap();
        let c = w.coefficients();
        assert!((c[0] - 0.08).abs() < 1e-6);
        assert!((c[4] - 0.08).abs() < 1e-6);
        assert!((c[2] - 1.0).abs() < 1e-6);
        // symmetric
        assert!((c[1] - c[3]).abs() < 1e-6);
    }

    #[test]
    fn unwindowing_restores_segment() {
        let segment: Vec<f32> = (0..64).map(|i| ((i as f32) * 0.37).sin() * 0.8).collect();
        let windowed = hamming(&segment).unwrap();
        let w = HammingWindow::new(segment.len()).unwrap();
        for ((&x, &y), &c) in segment.iter().zip(&windowed).zip(w.coefficients()) {
            assert!((y / c - x).abs() < 1e-5, "{} vs {}", y / c, x);
        }
    }

    #[test]
    fn length_mismatch_is_reported() {
        let w = HammingWindow::new(4).unwrap();
        let mut out = [0.0; 4];
        let err = w.apply(&[1.0; 3], &mut out).unwrap_err();
        assert!(matches!(err, Error::BufferSizeMismatch { expected: 4, got: 3 }));
    }
}

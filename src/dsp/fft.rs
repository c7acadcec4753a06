//! In-place radix-2 Cooley-Tukey FFT over split real/imaginary arrays.
//!
//! Samples are stored as `f32`; butterflies and the running twiddle factor
//! are evaluated in `f64` and rounded back on store.

use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Smallest power of two that holds `n` samples
pub fn padded_len(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Forward transform of `re`/`im` in place.
///
/// Both slices must have the same power-of-two length.
pub fn transform(re: &mut [f32], im: &mut [f32]) -> Result<()> {
    check_lengths(re, im)?;
    forward_unchecked(re, im);
    Ok(())
}

/// Forward transform for buffers already known to have equal power-of-two lengths.
pub(crate) fn forward_unchecked(re: &mut [f32], im: &mut [f32]) {
    debug_assert!(re.len() == im.len() && re.len().is_power_of_two());
    bit_reverse(re, im);
    butterflies(re, im);
}

/// Inverse transform in place, scaled by `1/N`.
pub fn inverse(re: &mut [f32], im: &mut [f32]) -> Result<()> {
    check_lengths(re, im)?;
    im.iter_mut().for_each(|x| *x = -*x);
    bit_reverse(re, im);
    butterflies(re, im);
    let scale = 1.0 / re.len() as f64;
    for x in re.iter_mut() {
        *x = (*x as f64 * scale) as f32;
    }
    for x in im.iter_mut() {
        *x = (-(*x as f64) * scale) as f32;
    }
    Ok(())
}

/// Zero-pad a real signal to the next power of two and transform it.
pub fn real_spectrum(signal: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let n = padded_len(signal.len());
    let mut re = vec![0.0; n];
    let mut im = vec![0.0; n];
    re[..signal.len()].copy_from_slice(signal);
    forward_unchecked(&mut re, &mut im);
    (re, im)
}

fn check_lengths(re: &[f32], im: &[f32]) -> Result<()> {
    if re.len() != im.len() {
        return Err(Error::BufferSizeMismatch {
            expected: re.len(),
            got: im.len(),
        });
    }
    if !re.len().is_power_of_two() {
        return Err(Error::NotPowerOfTwo(re.len()));
    }
    Ok(())
}

fn bit_reverse(re: &mut [f32], im: &mut [f32]) {
    let n = re.len();
    let mut j = 0;
    for i in 0..n {
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
        let mut m = n >> 1;
        while m >= 1 && j >= m {
            j -= m;
            m >>= 1;
        }
        j += m;
    }
}

fn butterflies(re: &mut [f32], im: &mut [f32]) {
    let n = re.len();
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle = -2.0 * PI / len as f64;
        let (wlen_im, wlen_re) = angle.sin_cos();

        for start in (0..n).step_by(len) {
            let mut w_re = 1.0f64;
            let mut w_im = 0.0f64;

            for k in 0..half {
                let a = start + k;
                let b = a + half;

                let u_re = re[a] as f64;
                let u_im = im[a] as f64;
                let t_re = w_re * re[b] as f64 - w_im * im[b] as f64;
                let t_im = w_re * im[b] as f64 + w_im * re[b] as f64;

                re[a] = (u_re + t_re) as f32;
                im[a] = (u_im + t_im) as f32;
                re[b] = (u_re - t_re) as f32;
                im[b] = (u_im - t_im) as f32;

                // advance the twiddle multiplicatively
                let next_re = w_re * wlen_re - w_im * wlen_im;
                w_im = w_re * wlen_im + w_im * wlen_re;
                w_re = next_re;
            }
        }
        len <<= 1;
    }
}

//! Window function generation for FIR design.
//!
//! All windows are the symmetric variants used for filter design (not the
//! periodic spectral-analysis forms), so the resulting taps stay symmetric
//! about the center index.

use std::f64::consts::PI;

/// Symmetric Hamming window.
pub fn hamming(len: usize) -> Vec<f64> {
    if len == 0 {
        return vec![];
    }
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Symmetric Kaiser window with shape parameter `beta`.
pub fn kaiser(len: usize, beta: f64) -> Vec<f64> {
    if len == 0 {
        return vec![];
    }
    if len == 1 {
        return vec![1.0];
    }

    let half = (len - 1) as f64 / 2.0;
    let i0_beta = bessel_i0(beta);

    (0..len)
        .map(|i| {
            let x = (i as f64 - half) / half;
            bessel_i0(beta * (1.0 - x * x).sqrt()) / i0_beta
        })
        .collect()
}

/// Dolph-Chebyshev window with the given stop-band attenuation in dB.
///
/// Computed by sampling the Chebyshev polynomial around the unit circle and
/// taking the real inverse transform directly; the O(n^2) sum is fine at
/// filter-design sizes. Normalized to a peak of 1.
pub fn chebyshev(len: usize, attenuation_db: f64) -> Vec<f64> {
    if len == 0 {
        return vec![];
    }
    if len == 1 {
        return vec![1.0];
    }

    let m = len;
    let order = (m - 1) as f64;
    let ratio = 10f64.powf(attenuation_db.abs() / 20.0);
    let beta = (ratio.acosh() / order).cosh();

    let p: Vec<f64> = (0..m)
        .map(|k| cheb_poly(m - 1, beta * (PI * k as f64 / m as f64).cos()))
        .collect();

    let mut w = vec![0.0; m];
    if m % 2 == 1 {
        let half = (m + 1) / 2;
        let dft: Vec<f64> = (0..half)
            .map(|j| {
                p.iter()
                    .enumerate()
                    .map(|(k, &pk)| pk * (2.0 * PI * (j * k) as f64 / m as f64).cos())
                    .sum()
            })
            .collect();

        for i in 0..half - 1 {
            w[i] = dft[half - 1 - i];
        }
        w[half - 1..].copy_from_slice(&dft);
    } else {
        // Even lengths need a half-sample phase shift before the transform.
        let half = m / 2 + 1;
        let dft: Vec<f64> = (0..half)
            .map(|j| {
                p.iter()
                    .enumerate()
                    .map(|(k, &pk)| {
                        let phase = PI * k as f64 / m as f64;
                        let angle = 2.0 * PI * (j * k) as f64 / m as f64;
                        pk * (phase - angle).cos()
                    })
                    .sum()
            })
            .collect();

        for i in 0..half - 1 {
            w[i] = dft[half - 1 - i];
        }
        for i in 1..half {
            w[half - 2 + i] = dft[i];
        }
    }

    let peak = w.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    for v in &mut w {
        *v /= peak;
    }
    w
}

/// Chebyshev polynomial T_n evaluated at `x`, valid for |x| > 1.
fn cheb_poly(n: usize, x: f64) -> f64 {
    let nf = n as f64;
    if x.abs() <= 1.0 {
        (nf * x.acos()).cos()
    } else if x > 1.0 {
        (nf * x.acosh()).cosh()
    } else {
        let t = (nf * (-x).acosh()).cosh();
        if n % 2 == 0 {
            t
        } else {
            -t
        }
    }
}

/// Modified Bessel function of the first kind, order 0.
///
/// Polynomial approximation from Abramowitz & Stegun 9.8.
pub fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        1.0 + t
            * (3.5156229
                + t * (3.0899424
                    + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + t * (0.01328592
                    + t * (0.00225319
                        + t * (-0.00157565
                            + t * (0.00916281
                                + t * (-0.02057706
                                    + t * (0.02635537 + t * (-0.01647633 + t * 0.00392377))))))))
    }
}

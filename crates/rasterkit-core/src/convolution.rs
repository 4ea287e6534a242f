//! Convolution kernels and the convolution operator itself.

use crate::{
    error::{Error, Result},
    image::Image2D,
};

pub type Kernel = Image2D<1, false>;

fn wrap_or_clamp(coord: i64, dim: u32, wrap: bool) -> u32 {
    if wrap {
        coord.rem_euclid(dim as i64) as u32
    } else {
        coord.clamp(0, dim as i64 - 1) as u32
    }
}

/// `convolve(img, kernel, wrap_x, wrap_y)`. Kernel dimensions must both be odd; its
/// centre is `(kw/2, kh/2)` by integer division, matching the reference engine.
pub fn convolve<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, kernel: &Kernel, wrap_x: bool, wrap_y: bool) -> Result<Image2D<C, ALPHA>> {
    if kernel.width() % 2 == 0 || kernel.height() % 2 == 0 {
        return Err(Error::KernelShape(format!(
            "kernel must be odd x odd, got {}x{}",
            kernel.width(),
            kernel.height()
        )));
    }
    let kcx = (kernel.width() / 2) as i64;
    let kcy = (kernel.height() / 2) as i64;

    Ok(Image2D::make_from_fn(img.width(), img.height(), |x, y| {
        let mut acc = crate::colour::Colour::<C, ALPHA>::splat(0.0);
        for ky in 0..kernel.height() as i64 {
            for kx in 0..kernel.width() as i64 {
                let weight = kernel.get(kx as u32, ky as u32).colour()[0];
                if weight == 0.0 {
                    continue;
                }
                let sx = x as i64 + kx - kcx;
                let sy = y as i64 + ky - kcy;
                let (wrapped_x, wrapped_y) = (wrap_or_clamp(sx, img.width(), wrap_x), wrap_or_clamp(sy, img.height(), wrap_y));
                let sample = img.get(wrapped_x, wrapped_y);
                acc = acc.zip_map(sample, |a, b| a + b * weight);
            }
        }
        acc
    }))
}

/// Apply a `1xW` kernel horizontally, then its transpose vertically: a separable
/// convolution equivalent to the full 2D kernel `kernel outer kernel^T`.
pub fn convolve_sep<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, kernel_1xw: &Kernel, wrap_x: bool, wrap_y: bool) -> Result<Image2D<C, ALPHA>> {
    if kernel_1xw.height() != 1 {
        return Err(Error::KernelShape(format!("separable kernel must be Nx1, got {}x{}", kernel_1xw.width(), kernel_1xw.height())));
    }
    let horiz = convolve(img, kernel_1xw, wrap_x, wrap_y)?;

    let w = kernel_1xw.width();
    let vert_kernel = Kernel::make_from_fn(1, w, |_, y| kernel_1xw.get(y, 0));
    convolve(&horiz, &vert_kernel, wrap_x, wrap_y)
}

/// `gaussian(n)`: an `n x 1` kernel of normalised binomial coefficients, Pascal's row
/// `n-1`.
pub fn gaussian(n: u32) -> Kernel {
    assert!(n >= 1, "gaussian kernel size must be >= 1");
    let mut row = vec![1.0f64];
    for _ in 1..n {
        let mut next = vec![1.0f64; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    let sum: f64 = row.iter().sum();
    Kernel::make_from_fn(n, 1, |x, _| crate::colour::Colour::opaque([(row[x as usize] / sum) as f32]))
}

/// Scale positive and negative per-channel contributions separately so positives sum to
/// `+1` and negatives to `-1`, preserving the zero-mean structure of derivative kernels.
pub fn normalise<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>) -> Image2D<C, ALPHA> {
    let mut pos_sum = [0.0f32; C];
    let mut neg_sum = [0.0f32; C];
    img.for_each(|_, _, px| {
        for c in 0..C {
            let v = px.channel(c);
            if v > 0.0 {
                pos_sum[c] += v;
            } else {
                neg_sum[c] += v;
            }
        }
    });

    Image2D::make_from_fn(img.width(), img.height(), |x, y| {
        let mut out = img.get(x, y);
        for c in 0..C {
            let v = out.channel(c);
            let scaled = if v > 0.0 {
                if pos_sum[c] != 0.0 {
                    v / pos_sum[c]
                } else {
                    0.0
                }
            } else if neg_sum[c] != 0.0 {
                -(v / neg_sum[c])
            } else {
                0.0
            };
            out.set_channel(c, scaled);
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::Colour;
    use pretty_assertions::assert_eq;

    #[test]
    fn unit_kernel_is_identity() {
        let img = Image2D::<1, false>::make_from_fn(3, 3, |x, y| Colour::opaque([(y * 3 + x) as f32]));
        let unit = Kernel::make(1, 1, Colour::opaque([1.0]));
        let out = convolve(&img, &unit, false, false).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn gaussian_is_normalised() {
        for n in 1..=7 {
            let k = gaussian(n);
            let sum: f32 = k.pixels().iter().map(|c| c.colour()[0]).sum();
            assert!((sum - 1.0).abs() < 1e-5, "gaussian({n}) summed to {sum}");
        }
    }

    #[test]
    fn convolve_rejects_even_kernel() {
        let img = Image2D::<1, false>::make(3, 3, Colour::opaque([1.0]));
        let even = Kernel::make(2, 2, Colour::opaque([0.25]));
        assert!(matches!(convolve(&img, &even, false, false), Err(Error::KernelShape(_))));
    }

    #[test]
    fn wrap_averages_entire_image_at_constant_neighbourhood() {
        let img = Image2D::<1, false>::make(3, 3, Colour::opaque([1.0]));
        let kernel = gaussian(3);
        let square = Kernel::make_from_fn(3, 3, |x, y| Colour::opaque([kernel.get(x, 0).colour()[0] * kernel.get(y, 0).colour()[0]]));
        let out = convolve(&img, &square, true, true).unwrap();
        assert!((out.get(1, 1).colour()[0] - 1.0).abs() < 1e-5);
        assert!((out.get(0, 0).colour()[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalise_preserves_zero_mean_split() {
        let img = Image2D::<1, false>::make_from_fn(3, 1, |x, _| Colour::opaque([[-1.0, 2.0, -3.0][x as usize]]));
        let out = normalise(&img);
        let pos: f32 = out.pixels().iter().map(|c| c.colour()[0]).filter(|v| *v > 0.0).sum();
        let neg: f32 = out.pixels().iter().map(|c| c.colour()[0]).filter(|v| *v < 0.0).sum();
        assert!((pos - 1.0).abs() < 1e-5);
        assert!((neg + 1.0).abs() < 1e-5);
    }
}

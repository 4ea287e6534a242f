//! Crop, flip/mirror, scale, rotate, and drawing primitives.

use crate::{colour::Colour, image::Image2D};

/// `crop(img, (left, bottom), (w, h), fill?)`. The crop window may extend past the
/// source on any side; out-of-window pixels take `fill` if given, else zero (treating
/// the source as infinite-transparent).
pub fn crop<const C: usize, const ALPHA: bool>(
    img: &Image2D<C, ALPHA>,
    left: i64,
    bottom: i64,
    w: u32,
    h: u32,
    fill: Option<Colour<C, ALPHA>>,
) -> Image2D<C, ALPHA> {
    let fill = fill.unwrap_or_else(|| Colour::splat(0.0));
    Image2D::make_from_fn(w, h, |x, y| {
        let sx = left + x as i64;
        let sy = bottom + y as i64;
        img.try_get(sx, sy).unwrap_or(fill)
    })
}

pub fn crop_centre<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, w: u32, h: u32, fill: Option<Colour<C, ALPHA>>) -> Image2D<C, ALPHA> {
    let left = (img.width() as i64 - w as i64) / 2;
    let bottom = (img.height() as i64 - h as i64) / 2;
    crop(img, left, bottom, w, h, fill)
}

/// `clone(flip_x, flip_y)`: axis-aligned reflection, producing a fresh image.
pub fn clone_flipped<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, flip_x: bool, flip_y: bool) -> Image2D<C, ALPHA> {
    Image2D::make_from_fn(img.width(), img.height(), |x, y| {
        let sx = if flip_x { img.width() - 1 - x } else { x };
        let sy = if flip_y { img.height() - 1 - y } else { y };
        img.get(sx, sy)
    })
}

pub fn mirror_x<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>) -> Image2D<C, ALPHA> {
    clone_flipped(img, true, false)
}

pub fn mirror_y<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>) -> Image2D<C, ALPHA> {
    clone_flipped(img, false, true)
}

/// The six resampling filter kinds the scaler must preserve end-to-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Box,
    Bilinear,
    BSpline,
    Bicubic,
    CatmullRom,
    Lanczos3,
}

impl Filter {
    /// Support radius, in source-pixel units, of the filter's kernel.
    fn support(self) -> f64 {
        match self {
            Filter::Box => 0.5,
            Filter::Bilinear => 1.0,
            Filter::BSpline => 2.0,
            Filter::Bicubic => 2.0,
            Filter::CatmullRom => 2.0,
            Filter::Lanczos3 => 3.0,
        }
    }

    /// Kernel weight at distance `x` (in source-pixel units).
    fn weight(self, x: f64) -> f64 {
        let x = x.abs();
        match self {
            Filter::Box => {
                if x < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Filter::Bilinear => (1.0 - x).max(0.0),
            Filter::BSpline => cubic_bspline(x),
            Filter::Bicubic => catmull_rom_like(x, -1.0),
            Filter::CatmullRom => catmull_rom_like(x, -0.5),
            Filter::Lanczos3 => {
                if x == 0.0 {
                    1.0
                } else if x < 3.0 {
                    sinc(x) * sinc(x / 3.0)
                } else {
                    0.0
                }
            }
        }
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

fn cubic_bspline(x: f64) -> f64 {
    if x < 1.0 {
        (4.0 + x * x * (3.0 * x - 6.0)) / 6.0
    } else if x < 2.0 {
        let t = 2.0 - x;
        t * t * t / 6.0
    } else {
        0.0
    }
}

/// Mitchell-Netravali family; `b=1,c=0` gives the classic B-spline-shaped kernel used by
/// "bicubic", `b=0,c=0.5` gives Catmull-Rom. Parameterised by `a` following the
/// Keys cubic convolution convention (`a=-1` for bicubic, `a=-0.5` for Catmull-Rom).
fn catmull_rom_like(x: f64, a: f64) -> f64 {
    if x <= 1.0 {
        (a + 2.0) * x * x * x - (a + 3.0) * x * x + 1.0
    } else if x < 2.0 {
        a * x * x * x - 5.0 * a * x * x + 8.0 * a * x - 4.0 * a
    } else {
        0.0
    }
}

fn sample_edge_clamped<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, x: i64, y: i64) -> Colour<C, ALPHA> {
    let cx = x.clamp(0, img.width() as i64 - 1) as u32;
    let cy = y.clamp(0, img.height() as i64 - 1) as u32;
    img.get(cx, cy)
}

/// Separable resampling with one of the six filter kernels, delegated here to the
/// built-in kernel table rather than an external resampler crate (no suitable one ships
/// in the ambient stack); filter choice is threaded through unchanged.
pub fn scale<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, new_w: u32, new_h: u32, filter: Filter) -> Image2D<C, ALPHA> {
    let scale_x = img.width() as f64 / new_w as f64;
    let scale_y = img.height() as f64 / new_h as f64;

    // horizontal pass
    let horiz = Image2D::<C, ALPHA>::make_from_fn(new_w, img.height(), |dx, sy| {
        let centre = (dx as f64 + 0.5) * scale_x;
        resample_axis(filter, scale_x, centre, |ix| sample_edge_clamped(img, ix, sy as i64))
    });

    // vertical pass
    Image2D::make_from_fn(new_w, new_h, |dx, dy| {
        let centre = (dy as f64 + 0.5) * scale_y;
        resample_axis(filter, scale_y, centre, |iy| sample_edge_clamped(&horiz, dx as i64, iy))
    })
}

fn resample_axis<const C: usize, const ALPHA: bool>(filter: Filter, scale: f64, centre: f64, sample: impl Fn(i64) -> Colour<C, ALPHA>) -> Colour<C, ALPHA> {
    let support = filter.support() * scale.max(1.0);
    let lo = (centre - support).floor() as i64;
    let hi = (centre + support).ceil() as i64;

    let mut acc = Colour::<C, ALPHA>::splat(0.0);
    let mut weight_sum = 0.0;
    for i in lo..=hi {
        let dist = (i as f64 + 0.5 - centre) / scale.max(1.0);
        let weight = filter.weight(dist);
        if weight == 0.0 {
            continue;
        }
        acc = acc.zip_map(sample(i), |a, b| a + b * weight as f32);
        weight_sum += weight;
    }
    if weight_sum != 0.0 {
        acc.map(|v| v / weight_sum as f32)
    } else {
        acc
    }
}

/// Rotate by an arbitrary angle (radians) about the image centre; pixels newly exposed
/// by the rotation take `background`. Inverse-mapped nearest-sample rotation.
pub fn rotate<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, angle_radians: f64, background: Colour<C, ALPHA>) -> Image2D<C, ALPHA> {
    let (sin, cos) = angle_radians.sin_cos();
    let cx = img.width() as f64 / 2.0;
    let cy = img.height() as f64 / 2.0;
    Image2D::make_from_fn(img.width(), img.height(), |x, y| {
        let dx = x as f64 + 0.5 - cx;
        let dy = y as f64 + 0.5 - cy;
        let sx = cos * dx + sin * dy + cx;
        let sy = -sin * dx + cos * dy + cy;
        let sxi = sx.floor() as i64;
        let syi = sy.floor() as i64;
        img.try_get(sxi, syi).unwrap_or(background)
    })
}

/// Solid-colour line rasterisation (integer width), clipped to image bounds.
pub fn draw_line<const C: usize, const ALPHA: bool>(img: &mut Image2D<C, ALPHA>, x0: i64, y0: i64, x1: i64, y1: i64, colour: Colour<C, ALPHA>, width: u32) {
    let half = (width as i64 / 2).max(0);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        for wy in -half..=half {
            for wx in -half..=half {
                let (px, py) = (x + wx, y + wy);
                if img.in_bounds(px, py) {
                    img.set(px as u32, py as u32, colour);
                }
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Composite `src` onto `dest` at offset `(left, bottom)`. With wrap enabled on an axis,
/// source coordinates past the destination edge wrap modulo the destination dimension;
/// otherwise they're simply clipped.
pub fn draw_image<const C: usize, const ALPHA: bool>(dest: &mut Image2D<C, ALPHA>, src: &Image2D<C, ALPHA>, left: i64, bottom: i64, wrap_x: bool, wrap_y: bool) {
    let (dw, dh) = (dest.width() as i64, dest.height() as i64);
    for sy in 0..src.height() as i64 {
        for sx in 0..src.width() as i64 {
            let mut dx = left + sx;
            let mut dy = bottom + sy;
            if wrap_x {
                dx = dx.rem_euclid(dw);
            }
            if wrap_y {
                dy = dy.rem_euclid(dh);
            }
            if dx >= 0 && dx < dw && dy >= 0 && dy < dh {
                dest.set(dx as u32, dy as u32, src.get(sx as u32, sy as u32));
            }
        }
    }
}

/// Full mip chain down to 1x1, halving with `filter` at each step (`max(1, dim/2)` per
/// axis, matching the DDS mip-chain invariant). This halving primitive is deliberately
/// policy-free: callers choosing how many levels or which filter to use are outside this
/// function's concern.
pub fn mipmaps<const C: usize, const ALPHA: bool>(img: &Image2D<C, ALPHA>, filter: Filter) -> Vec<Image2D<C, ALPHA>> {
    let mut levels = vec![img.clone()];
    loop {
        let prev = levels.last().unwrap();
        if prev.width() == 1 && prev.height() == 1 {
            break;
        }
        let next_w = (prev.width() / 2).max(1);
        let next_h = (prev.height() / 2).max(1);
        levels.push(scale(prev, next_w, next_h, filter));
    }
    levels
}

/// One level of a volume mip chain: each output voxel is the average of the 2x2x2 source
/// neighbourhood it covers — 2x2 texels from `top` plus 2x2 from `bot`, each weighted
/// 1/8. `top`/`bot` are the same slice when the source volume has only one depth slice
/// left to pair against itself.
fn volume_box<const C: usize, const ALPHA: bool>(top: &Image2D<C, ALPHA>, bot: &Image2D<C, ALPHA>, w: u32, h: u32) -> Image2D<C, ALPHA> {
    Image2D::make_from_fn(w, h, |x, y| {
        let samples = [
            top.get(2 * x, 2 * y),
            top.get(2 * x, 2 * y + 1),
            top.get(2 * x + 1, 2 * y),
            top.get(2 * x + 1, 2 * y + 1),
            bot.get(2 * x, 2 * y),
            bot.get(2 * x, 2 * y + 1),
            bot.get(2 * x + 1, 2 * y),
            bot.get(2 * x + 1, 2 * y + 1),
        ];
        samples.into_iter().fold(Colour::<C, ALPHA>::splat(0.0), |acc, s| acc.zip_map(s, |a, b| a + b / 8.0))
    })
}

/// Full volume mip chain: unlike `mipmaps`, each level halves width, height, *and* depth
/// together, box-averaging each 2x2x2 voxel neighbourhood via `volume_box` rather than
/// filtering each depth slice independently. Stops once width, height, and depth have all
/// reached 1. Grounded on `volume_box`/`global_volume_mipmaps`: the per-level depth
/// pairing (`slices[2z]`/`slices[2z+1]`, or a slice paired with itself when only one
/// remains) matches that source exactly.
pub fn volume_mipmaps<const C: usize, const ALPHA: bool>(slices: &[Image2D<C, ALPHA>]) -> Vec<Vec<Image2D<C, ALPHA>>> {
    let mut levels: Vec<Vec<Image2D<C, ALPHA>>> = vec![slices.to_vec()];
    loop {
        let prev = levels.last().unwrap();
        let (pw, ph, pd) = (prev[0].width(), prev[0].height(), prev.len() as u32);
        if pw == 1 && ph == 1 && pd == 1 {
            break;
        }
        let nw = (pw / 2).max(1);
        let nh = (ph / 2).max(1);
        let nd = (pd / 2).max(1);
        let mut next = Vec::with_capacity(nd as usize);
        for z in 0..nd {
            let top = &prev[(2 * z) as usize];
            let bot = if prev.len() == 1 { top } else { &prev[(2 * z + 1) as usize] };
            next.push(volume_box(top, bot, nw, nh));
        }
        levels.push(next);
    }
    levels
}

/// Rec. 601 luminance collapse (`0.299 R + 0.587 G + 0.114 B`), matching the weights the
/// original greyscale reduction used. Alpha, if present, passes through unchanged.
pub fn to_luminance<const ALPHA: bool>(img: &Image2D<3, ALPHA>) -> Image2D<1, ALPHA> {
    Image2D::make_from_fn(img.width(), img.height(), |x, y| {
        let px = img.get(x, y);
        let c = px.colour();
        let luma = 0.299 * c[0] + 0.587 * c[1] + 0.114 * c[2];
        Colour::new([luma], px.alpha())
    })
}

pub fn draw_image_blended<const C: usize>(dest: &mut Image2D<C, true>, src: &Image2D<C, true>, left: i64, bottom: i64, wrap_x: bool, wrap_y: bool) {
    let (dw, dh) = (dest.width() as i64, dest.height() as i64);
    for sy in 0..src.height() as i64 {
        for sx in 0..src.width() as i64 {
            let mut dx = left + sx;
            let mut dy = bottom + sy;
            if wrap_x {
                dx = dx.rem_euclid(dw);
            }
            if wrap_y {
                dy = dy.rem_euclid(dh);
            }
            if dx >= 0 && dx < dw && dy >= 0 && dy < dh {
                let blended = crate::colour::blend(dest.get(dx as u32, dy as u32), src.get(sx as u32, sy as u32));
                dest.set(dx as u32, dy as u32, blended);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::Colour;
    use pretty_assertions::assert_eq;

    fn gradient(w: u32, h: u32) -> Image2D<1, false> {
        Image2D::make_from_fn(w, h, |x, y| Colour::opaque([(y * w + x) as f32]))
    }

    #[test]
    fn crop_negative_origin_fills_out_of_bounds() {
        let img = gradient(100, 100);
        let cropped = crop(&img, -10, -10, 20, 20, Some(Colour::opaque([0.0])));
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(cropped.get(x, y).colour()[0], 0.0);
            }
        }
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(cropped.get(10 + x, 10 + y).colour()[0], img.get(x, y).colour()[0]);
            }
        }
    }

    #[test]
    fn crop_centre_matches_manual_offset() {
        let img = gradient(10, 10);
        let auto = crop_centre(&img, 4, 4, None);
        let manual = crop(&img, 3, 3, 4, 4, None);
        assert_eq!(auto, manual);
    }

    #[test]
    fn mirror_round_trips() {
        let img = gradient(4, 3);
        let mirrored = mirror_x(&img);
        let back = mirror_x(&mirrored);
        assert_eq!(back, img);
    }

    #[test]
    fn scale_to_same_size_is_near_identity() {
        let img = gradient(4, 4);
        let out = scale(&img, 4, 4, Filter::Box);
        for y in 0..4 {
            for x in 0..4 {
                assert!((out.get(x, y).colour()[0] - img.get(x, y).colour()[0]).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn mipmaps_halve_to_one_by_one() {
        let img = Image2D::<1, false>::make(4, 4, Colour::opaque([1.0]));
        let chain = mipmaps(&img, Filter::Box);
        let dims: Vec<(u32, u32)> = chain.iter().map(|l| (l.width(), l.height())).collect();
        assert_eq!(dims, vec![(4, 4), (2, 2), (1, 1)]);
        for level in &chain {
            for px in level.pixels() {
                assert!((px.colour()[0] - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn volume_mipmaps_box_averages_eight_voxel_neighbourhoods() {
        // 4x4x4 single-channel volume, each slice filled with its depth index so the
        // box-averaged value at any level reduces to the average depth index it spans.
        let slices: Vec<Image2D<1, false>> = (0..4u32).map(|z| Image2D::make(4, 4, Colour::opaque([z as f32]))).collect();
        let levels = volume_mipmaps(&slices);
        let dims: Vec<(u32, u32, usize)> = levels.iter().map(|l| (l[0].width(), l[0].height(), l.len())).collect();
        assert_eq!(dims, vec![(4, 4, 4), (2, 2, 2), (1, 1, 1)]);

        assert!((levels[1][0].get(0, 0).colour()[0] - 0.5).abs() < 1e-5);
        assert!((levels[1][1].get(0, 0).colour()[0] - 2.5).abs() < 1e-5);
        assert!((levels[2][0].get(0, 0).colour()[0] - 1.5).abs() < 1e-5);
    }

    #[test]
    fn volume_mipmaps_single_slice_pairs_with_itself() {
        let slices = vec![Image2D::<1, false>::make(2, 2, Colour::opaque([1.0]))];
        let levels = volume_mipmaps(&slices);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[1].len(), 1);
        assert!((levels[1][0].get(0, 0).colour()[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn to_luminance_preserves_alpha() {
        let img = Image2D::<3, true>::make(1, 1, Colour::new([1.0, 0.0, 0.0], 0.5));
        let grey = to_luminance(&img);
        assert!((grey.get(0, 0).colour()[0] - 0.299).abs() < 1e-5);
        assert_eq!(grey.get(0, 0).alpha(), 0.5);
    }

    #[test]
    fn draw_line_clips_to_bounds() {
        let mut img = Image2D::<1, false>::make(4, 4, Colour::opaque([0.0]));
        draw_line(&mut img, -2, 0, 10, 0, Colour::opaque([1.0]), 1);
        for x in 0..4 {
            assert_eq!(img.get(x, 0).colour()[0], 1.0);
        }
    }

    #[test]
    fn draw_image_wraps_when_requested() {
        let mut dest = Image2D::<1, false>::make(4, 4, Colour::opaque([0.0]));
        let src = Image2D::<1, false>::make(2, 2, Colour::opaque([1.0]));
        draw_image(&mut dest, &src, 3, 3, true, true);
        assert_eq!(dest.get(0, 0).colour()[0], 1.0);
        assert_eq!(dest.get(3, 3).colour()[0], 1.0);
        assert_eq!(dest.get(1, 1).colour()[0], 0.0);
    }
}

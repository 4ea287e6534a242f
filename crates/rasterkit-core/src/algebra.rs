//! The pixel algebra engine: zip/reduce/map/blend over same-arity images, plus the
//! mask-broadcast and arity-compatibility checks used at the `ImageRef` boundary.

use crate::{
    colour::{Colour, Sample},
    error::{Error, Result},
    image::{Image2D, ImageRef},
};

/// A named primitive for the zip ops listed in the engine ("add, sub, mul, div, min,
/// max, pow, abs-diff, squared-diff"). Kept as an enum (rather than a bare closure) so
/// the `ImageRef` dispatcher can pick the op once, outside the pixel loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Pow,
    AbsDiff,
    SquaredDiff,
}

impl ZipOp {
    fn apply(self, a: Sample, b: Sample) -> Sample {
        match self {
            ZipOp::Add => a + b,
            ZipOp::Sub => a - b,
            ZipOp::Mul => a * b,
            ZipOp::Div => a / b,
            ZipOp::Min => a.min(b),
            ZipOp::Max => a.max(b),
            ZipOp::Pow => a.powf(b),
            ZipOp::AbsDiff => (a - b).abs(),
            ZipOp::SquaredDiff => (a - b) * (a - b),
        }
    }
}

/// Zip two same-shape, same-arity images pointwise.
pub fn zip<const C: usize, const ALPHA: bool>(
    lhs: &Image2D<C, ALPHA>,
    rhs: &Image2D<C, ALPHA>,
    op: ZipOp,
) -> Result<Image2D<C, ALPHA>> {
    lhs.same_size_as(rhs)?;
    Ok(Image2D::make_from_fn(lhs.width(), lhs.height(), |x, y| {
        lhs.get(x, y).zip_map(rhs.get(x, y), |a, b| op.apply(a, b))
    }))
}

/// Mask-broadcast a single scalar (no-alpha, 1-channel) colour across every channel of
/// `rhs`, per-pixel: `result[c] = f(mask, rhs[c])` including alpha if present.
pub fn zip_broadcast<const C: usize, const ALPHA: bool>(
    mask: Colour<1, false>,
    rhs: &Image2D<C, ALPHA>,
    op: ZipOp,
) -> Image2D<C, ALPHA> {
    let m = mask.colour()[0];
    Image2D::make_from_fn(rhs.width(), rhs.height(), |x, y| rhs.get(x, y).map(|v| op.apply(m, v)))
}

/// `zip_reduce(L, R, f_zip, f_reduce) -> Colour`: fold every pixel's zip result into an
/// accumulator with `f_reduce`, in row-major order (the order matters for non-associative
/// reducers, per the engine's definition).
pub fn zip_reduce<const C: usize, const ALPHA: bool>(
    lhs: &Image2D<C, ALPHA>,
    rhs: &Image2D<C, ALPHA>,
    zip_op: ZipOp,
    mut reduce: impl FnMut(Colour<C, ALPHA>, Colour<C, ALPHA>) -> Colour<C, ALPHA>,
    init: Colour<C, ALPHA>,
) -> Result<Colour<C, ALPHA>> {
    lhs.same_size_as(rhs)?;
    let mut acc = init;
    for y in 0..lhs.height() {
        for x in 0..lhs.width() {
            let zipped = lhs.get(x, y).zip_map(rhs.get(x, y), |a, b| zip_op.apply(a, b));
            acc = reduce(acc, zipped);
        }
    }
    Ok(acc)
}

pub fn blend_images<const C: usize>(base: &Image2D<C, true>, top: &Image2D<C, true>) -> Result<Image2D<C, true>> {
    base.same_size_as(top)?;
    Ok(Image2D::make_from_fn(base.width(), base.height(), |x, y| {
        crate::colour::blend(base.get(x, y), top.get(x, y))
    }))
}

pub fn blend_images_no_dest_alpha<const C: usize>(base: &Image2D<C, false>, top: &Image2D<C, true>) -> Result<Image2D<C, false>> {
    base.same_size_as(top)?;
    Ok(Image2D::make_from_fn(base.width(), base.height(), |x, y| {
        crate::colour::blend_no_dest_alpha(base.get(x, y), top.get(x, y))
    }))
}

/// Arity-compatibility verdict computed at the `ImageRef` boundary, before any pointwise
/// work happens. Mirrors the engine's three-rule checklist: same arity, mask-broadcast,
/// or `ChannelMismatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Operate channel-wise; `true` if the right side's missing alpha should be
    /// synthesised as `1.0` (promoted to match the left side's arity).
    Exact,
    /// The left side is a single, alpha-less channel broadcast across the right side.
    BroadcastLeft,
    /// The right side is a single, alpha-less channel broadcast across the left side.
    BroadcastRight,
}

pub fn check_arity(lhs: &ImageRef, rhs: &ImageRef) -> Result<Arity> {
    if lhs.total_channels() == rhs.total_channels() {
        return Ok(Arity::Exact);
    }
    if lhs.total_channels() == 1 && !lhs.has_alpha() {
        return Ok(Arity::BroadcastLeft);
    }
    if rhs.total_channels() == 1 && !rhs.has_alpha() {
        return Ok(Arity::BroadcastRight);
    }
    Err(Error::ChannelMismatch {
        left: lhs.total_channels(),
        right: rhs.total_channels(),
    })
}

pub fn check_size(lhs: &ImageRef, rhs: &ImageRef) -> Result<()> {
    if lhs.width() != rhs.width() || lhs.height() != rhs.height() {
        return Err(Error::SizeMismatch {
            left_w: lhs.width(),
            left_h: lhs.height(),
            right_w: rhs.width(),
            right_h: rhs.height(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::Colour;
    use pretty_assertions::assert_eq;

    #[test]
    fn zip_add_is_pointwise() {
        let a = Image2D::<1, false>::make(2, 1, Colour::opaque([1.0]));
        let b = Image2D::<1, false>::make(2, 1, Colour::opaque([2.0]));
        let out = zip(&a, &b, ZipOp::Add).unwrap();
        assert_eq!(out.get(0, 0).colour()[0], 3.0);
        assert_eq!(out.get(1, 0).colour()[0], 3.0);
    }

    #[test]
    fn zip_size_mismatch_errs() {
        let a = Image2D::<1, false>::make(2, 1, Colour::opaque([1.0]));
        let b = Image2D::<1, false>::make(1, 1, Colour::opaque([1.0]));
        assert!(matches!(zip(&a, &b, ZipOp::Add), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn zip_op_commutative_ops_are_symmetric() {
        let a = Image2D::<1, false>::make(2, 1, Colour::opaque([3.0]));
        let b = Image2D::<1, false>::make(2, 1, Colour::opaque([5.0]));
        assert_eq!(zip(&a, &b, ZipOp::Add).unwrap(), zip(&b, &a, ZipOp::Add).unwrap());
        assert_eq!(zip(&a, &b, ZipOp::Mul).unwrap(), zip(&b, &a, ZipOp::Mul).unwrap());
    }

    #[test]
    fn zip_broadcast_applies_mask_to_every_channel() {
        let mask = Colour::<1, false>::opaque([2.0]);
        let rhs = Image2D::<3, false>::make(1, 1, Colour::opaque([1.0, 2.0, 3.0]));
        let out = zip_broadcast(mask, &rhs, ZipOp::Mul);
        assert_eq!(out.get(0, 0).colour(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn zip_reduce_sums_in_row_major_order() {
        let a = Image2D::<1, false>::make_from_fn(2, 2, |x, y| Colour::opaque([(y * 2 + x) as f32]));
        let zero = Image2D::<1, false>::make(2, 2, Colour::opaque([0.0]));
        let sum = zip_reduce(&a, &zero, ZipOp::Add, |acc, px| acc.add(px), Colour::opaque([0.0])).unwrap();
        assert_eq!(sum.colour()[0], 0.0 + 1.0 + 2.0 + 3.0);
    }

    #[test]
    fn check_arity_exact_same_total_channels() {
        let a = ImageRef::C3A(Image2D::make(1, 1, Colour::new([0.0, 0.0, 0.0], 1.0)));
        let b = ImageRef::C3A(Image2D::make(1, 1, Colour::new([0.0, 0.0, 0.0], 1.0)));
        assert_eq!(check_arity(&a, &b).unwrap(), Arity::Exact);
    }

    #[test]
    fn check_arity_broadcasts_single_alphaless_channel() {
        let mask = ImageRef::C1(Image2D::make(1, 1, Colour::opaque([0.0])));
        let rgb = ImageRef::C3(Image2D::make(1, 1, Colour::opaque([0.0, 0.0, 0.0])));
        assert_eq!(check_arity(&mask, &rgb).unwrap(), Arity::BroadcastLeft);
        assert_eq!(check_arity(&rgb, &mask).unwrap(), Arity::BroadcastRight);
    }

    #[test]
    fn check_arity_mismatch_errs() {
        let a = ImageRef::C2(Image2D::make(1, 1, Colour::opaque([0.0, 0.0])));
        let b = ImageRef::C3(Image2D::make(1, 1, Colour::opaque([0.0, 0.0, 0.0])));
        assert!(matches!(check_arity(&a, &b), Err(Error::ChannelMismatch { .. })));
    }
}

//! The width×height pixel grid and its type-erased handle.

use crate::{
    colour::{Colour, Sample},
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Image2D<const C: usize, const ALPHA: bool> {
    width: u32,
    height: u32,
    pixels: Vec<Colour<C, ALPHA>>,
}

impl<const C: usize, const ALPHA: bool> Image2D<C, ALPHA> {
    pub fn make(width: u32, height: u32, init: Colour<C, ALPHA>) -> Self {
        assert!(width >= 1 && height >= 1, "zero-dimension images are not representable");
        Self {
            width,
            height,
            pixels: vec![init; (width as usize) * (height as usize)],
        }
    }

    pub fn make_from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Colour<C, ALPHA>) -> Self {
        assert!(width >= 1 && height >= 1, "zero-dimension images are not representable");
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    pub fn from_raw(width: u32, height: u32, pixels: Vec<Colour<C, ALPHA>>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(Error::SizeMismatch {
                left_w: width,
                left_h: height,
                right_w: 0,
                right_h: 0,
            });
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn colour_channels(&self) -> usize {
        C
    }

    pub fn has_alpha(&self) -> bool {
        ALPHA
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn idx(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Colour<C, ALPHA> {
        self.pixels[self.idx(x, y)]
    }

    pub fn try_get(&self, x: i64, y: i64) -> Result<Colour<C, ALPHA>> {
        if !self.in_bounds(x, y) {
            return Err(Error::IndexOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.get(x as u32, y as u32))
    }

    pub fn set(&mut self, x: u32, y: u32, value: Colour<C, ALPHA>) {
        let idx = self.idx(x, y);
        self.pixels[idx] = value;
    }

    pub fn pixels(&self) -> &[Colour<C, ALPHA>] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Colour<C, ALPHA>] {
        &mut self.pixels
    }

    /// Row-major side-effecting traversal, `(x, y, pixel)`.
    pub fn for_each(&self, mut f: impl FnMut(u32, u32, Colour<C, ALPHA>)) {
        for y in 0..self.height {
            for x in 0..self.width {
                f(x, y, self.get(x, y));
            }
        }
    }

    /// `map(img, fn)`: produce a fresh image of a possibly different arity.
    pub fn map<const C2: usize, const A2: bool>(&self, mut f: impl FnMut(Colour<C, ALPHA>, u32, u32) -> Colour<C2, A2>) -> Image2D<C2, A2> {
        Image2D::make_from_fn(self.width, self.height, |x, y| f(self.get(x, y), x, y))
    }

    pub fn same_size_as<const C2: usize, const A2: bool>(&self, other: &Image2D<C2, A2>) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::SizeMismatch {
                left_w: self.width,
                left_h: self.height,
                right_w: other.width,
                right_h: other.height,
            });
        }
        Ok(())
    }

    /// Reverse row order top<->bottom. Used at the DDS boundary: the container stores
    /// rows top-down while this grid's origin is top-left, so encode/decode each flip
    /// once to cross between the two conventions.
    pub fn flipped_vertical(&self) -> Self {
        Image2D::make_from_fn(self.width, self.height, |x, y| self.get(x, self.height - 1 - y))
    }

    /// Per-channel tolerance equality, for round-trip properties that only hold "within
    /// the format's LSB" rather than exactly.
    pub fn approx_eq(&self, other: &Self, epsilon: Sample) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        self.pixels.iter().zip(other.pixels.iter()).all(|(a, b)| {
            (0..C).all(|c| (a.channel(c) - b.channel(c)).abs() <= epsilon) && (!ALPHA || (a.alpha() - b.alpha()).abs() <= epsilon)
        })
    }
}

/// A polymorphic handle that erases `(C, A)`.
///
/// Only the combinations satisfying `C + A <= 4` and `C >= 1` exist: `(1,0) (1,1) (2,0)
/// (2,1) (3,0) (3,1) (4,0)`. Runtime code (the DDS/loader boundary) dispatches on the
/// variant; hot per-pixel loops stay inside one arm and never cross this switch.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    C1(Image2D<1, false>),
    C1A(Image2D<1, true>),
    C2(Image2D<2, false>),
    C2A(Image2D<2, true>),
    C3(Image2D<3, false>),
    C3A(Image2D<3, true>),
    C4(Image2D<4, false>),
}

impl ImageRef {
    pub fn width(&self) -> u32 {
        match self {
            ImageRef::C1(i) => i.width(),
            ImageRef::C1A(i) => i.width(),
            ImageRef::C2(i) => i.width(),
            ImageRef::C2A(i) => i.width(),
            ImageRef::C3(i) => i.width(),
            ImageRef::C3A(i) => i.width(),
            ImageRef::C4(i) => i.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            ImageRef::C1(i) => i.height(),
            ImageRef::C1A(i) => i.height(),
            ImageRef::C2(i) => i.height(),
            ImageRef::C2A(i) => i.height(),
            ImageRef::C3(i) => i.height(),
            ImageRef::C3A(i) => i.height(),
            ImageRef::C4(i) => i.height(),
        }
    }

    pub fn colour_channels(&self) -> usize {
        match self {
            ImageRef::C1(_) | ImageRef::C1A(_) => 1,
            ImageRef::C2(_) | ImageRef::C2A(_) => 2,
            ImageRef::C3(_) | ImageRef::C3A(_) => 3,
            ImageRef::C4(_) => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, ImageRef::C1A(_) | ImageRef::C2A(_) | ImageRef::C3A(_))
    }

    /// Total channel count including alpha, i.e. what the BCn/DDS layer calls "bpp / 32".
    pub fn total_channels(&self) -> usize {
        self.colour_channels() + self.has_alpha() as usize
    }

    /// Sample a pixel's channels into a flat `f32` buffer, colour-first then alpha.
    pub fn sample_flat(&self, x: u32, y: u32, out: &mut [Sample]) {
        macro_rules! fill {
            ($img:expr, $c:expr, $alpha:expr) => {{
                let px = $img.get(x, y);
                for c in 0..$c {
                    out[c] = px.channel(c);
                }
                if $alpha {
                    out[$c] = px.alpha();
                }
            }};
        }
        match self {
            ImageRef::C1(i) => fill!(i, 1, false),
            ImageRef::C1A(i) => fill!(i, 1, true),
            ImageRef::C2(i) => fill!(i, 2, false),
            ImageRef::C2A(i) => fill!(i, 2, true),
            ImageRef::C3(i) => fill!(i, 3, false),
            ImageRef::C3A(i) => fill!(i, 3, true),
            ImageRef::C4(i) => fill!(i, 4, false),
        }
    }

    /// Mip-chain dimension check: `dim_i == max(1, dim_{i-1}/2)`.
    pub fn is_next_mip_of(&self, prev: &ImageRef) -> bool {
        let expect = |d: u32| (d / 2).max(1);
        self.width() == expect(prev.width()) && self.height() == expect(prev.height())
    }

    /// See `Image2D::flipped_vertical`.
    pub fn flipped_vertical(&self) -> ImageRef {
        match self {
            ImageRef::C1(i) => ImageRef::C1(i.flipped_vertical()),
            ImageRef::C1A(i) => ImageRef::C1A(i.flipped_vertical()),
            ImageRef::C2(i) => ImageRef::C2(i.flipped_vertical()),
            ImageRef::C2A(i) => ImageRef::C2A(i.flipped_vertical()),
            ImageRef::C3(i) => ImageRef::C3(i.flipped_vertical()),
            ImageRef::C3A(i) => ImageRef::C3A(i.flipped_vertical()),
            ImageRef::C4(i) => ImageRef::C4(i.flipped_vertical()),
        }
    }

    /// Coerce to 3-channel-plus-alpha for the BC1/2/3 encoders: a single source channel
    /// mask-broadcasts across R/G/B, and a missing alpha is synthesised as `1.0`.
    pub fn map_to_rgba(&self) -> Image2D<3, true> {
        Image2D::make_from_fn(self.width(), self.height(), |x, y| {
            let mut flat = [0.0f32; 4];
            self.sample_flat(x, y, &mut flat[..self.total_channels()]);
            let (r, g, b) = match self.colour_channels() {
                1 => (flat[0], flat[0], flat[0]),
                2 => (flat[0], flat[1], 0.0),
                _ => (flat[0], flat[1], flat[2]),
            };
            let a = if self.has_alpha() { flat[self.colour_channels()] } else { 1.0 };
            Colour::new([r, g, b], a)
        })
    }
}

impl From<Image2D<1, false>> for ImageRef {
    fn from(i: Image2D<1, false>) -> Self {
        ImageRef::C1(i)
    }
}
impl From<Image2D<1, true>> for ImageRef {
    fn from(i: Image2D<1, true>) -> Self {
        ImageRef::C1A(i)
    }
}
impl From<Image2D<2, false>> for ImageRef {
    fn from(i: Image2D<2, false>) -> Self {
        ImageRef::C2(i)
    }
}
impl From<Image2D<2, true>> for ImageRef {
    fn from(i: Image2D<2, true>) -> Self {
        ImageRef::C2A(i)
    }
}
impl From<Image2D<3, false>> for ImageRef {
    fn from(i: Image2D<3, false>) -> Self {
        ImageRef::C3(i)
    }
}
impl From<Image2D<3, true>> for ImageRef {
    fn from(i: Image2D<3, true>) -> Self {
        ImageRef::C3A(i)
    }
}
impl From<Image2D<4, false>> for ImageRef {
    fn from(i: Image2D<4, false>) -> Self {
        ImageRef::C4(i)
    }
}

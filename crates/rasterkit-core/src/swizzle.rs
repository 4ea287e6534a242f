//! Swizzle views: build a new image by selecting/duplicating/constant-filling channels
//! of a source image, e.g. `"xyzw"`, `"xxxE"`, `"rgB"`.

use crate::{
    colour::Colour,
    error::{Error, Result},
    image::{Image2D, ImageRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selector {
    Channel(usize),
    Zero,
    One,
}

fn parse_selector(c: char) -> Option<Selector> {
    match c.to_ascii_lowercase() {
        'x' => Some(Selector::Channel(0)),
        'y' => Some(Selector::Channel(1)),
        'z' => Some(Selector::Channel(2)),
        'w' => Some(Selector::Channel(3)),
        'e' => Some(Selector::Zero),
        'f' => Some(Selector::One),
        _ => None,
    }
}

struct Parsed {
    selectors: Vec<Selector>,
    has_alpha: bool,
}

fn parse(spec: &str) -> Result<Parsed> {
    let chars: Vec<char> = spec.chars().collect();
    if chars.is_empty() || chars.len() > 4 {
        return Err(Error::FormatUnknown(format!("swizzle spec must be 1-4 selectors, got {:?}", spec)));
    }
    let has_alpha = chars.last().map(|c| c.is_ascii_uppercase()).unwrap_or(false);
    let selectors = chars
        .iter()
        .map(|&c| parse_selector(c).ok_or_else(|| Error::FormatUnknown(format!("unknown swizzle selector {c:?}"))))
        .collect::<Result<Vec<_>>>()?;
    Ok(Parsed { selectors, has_alpha })
}

fn sample_selector(sel: Selector, flat: &[f32], src_total: usize) -> Result<f32> {
    match sel {
        Selector::Zero => Ok(0.0),
        Selector::One => Ok(1.0),
        Selector::Channel(idx) => {
            if idx >= src_total {
                Err(Error::ChannelMismatch { left: idx + 1, right: src_total })
            } else {
                Ok(flat[idx])
            }
        }
    }
}

macro_rules! build {
    ($img:expr, $parsed:expr, $n_colour:expr, $alpha:expr, $variant:ident) => {{
        let src = $img;
        let parsed = $parsed;
        let out = Image2D::<$n_colour, $alpha>::make_from_fn(src.width(), src.height(), |x, y| {
            let mut flat = [0.0f32; 4];
            src.sample_flat(x, y, &mut flat[..src.total_channels()]);
            let mut colour = [0.0f32; $n_colour];
            for (i, sel) in parsed.selectors[..$n_colour].iter().enumerate() {
                colour[i] = sample_selector(*sel, &flat, src.total_channels()).unwrap_or(0.0);
            }
            let alpha = if $alpha {
                sample_selector(parsed.selectors[$n_colour], &flat, src.total_channels()).unwrap_or(1.0)
            } else {
                1.0
            };
            Colour::<$n_colour, $alpha>::new(colour, alpha)
        });
        ImageRef::$variant(out)
    }};
}

pub fn swizzle(src: &ImageRef, spec: &str) -> Result<ImageRef> {
    let parsed = parse(spec)?;
    // Validate every referenced channel exists before building the output image.
    for sel in &parsed.selectors {
        if let Selector::Channel(idx) = sel {
            if *idx >= src.total_channels() {
                return Err(Error::ChannelMismatch {
                    left: idx + 1,
                    right: src.total_channels(),
                });
            }
        }
    }

    let n_colour = if parsed.has_alpha { parsed.selectors.len() - 1 } else { parsed.selectors.len() };
    Ok(match (n_colour, parsed.has_alpha) {
        (1, false) => build!(src, &parsed, 1, false, C1),
        (1, true) => build!(src, &parsed, 1, true, C1A),
        (2, false) => build!(src, &parsed, 2, false, C2),
        (2, true) => build!(src, &parsed, 2, true, C2A),
        (3, false) => build!(src, &parsed, 3, false, C3),
        (3, true) => build!(src, &parsed, 3, true, C3A),
        (4, false) => build!(src, &parsed, 4, false, C4),
        _ => return Err(Error::FormatUnknown(format!("swizzle spec {:?} has no representable arity", spec))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image2D;
    use pretty_assertions::assert_eq;

    #[test]
    fn xyzw_on_a_four_channel_image_is_identity() {
        let src = ImageRef::C4(Image2D::make(1, 1, Colour::opaque([0.1, 0.2, 0.3, 0.4])));
        let out = swizzle(&src, "xyzw").unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn uppercase_last_selector_marks_alpha() {
        let src = ImageRef::C3(Image2D::make(1, 1, Colour::opaque([0.1, 0.2, 0.3])));
        let out = swizzle(&src, "xyZ").unwrap();
        assert!(out.has_alpha());
        match out {
            ImageRef::C2A(img) => {
                let px = img.get(0, 0);
                assert_eq!(px.colour(), &[0.1, 0.2]);
                assert_eq!(px.alpha(), 0.3);
            }
            other => panic!("expected C2A, got {other:?}"),
        }
    }

    #[test]
    fn constant_selectors_fill_zero_and_one() {
        let src = ImageRef::C1(Image2D::make(1, 1, Colour::opaque([0.5])));
        let out = swizzle(&src, "xEF").unwrap();
        match out {
            ImageRef::C3(img) => assert_eq!(img.get(0, 0).colour(), &[0.5, 0.0, 1.0]),
            other => panic!("expected C3, got {other:?}"),
        }
    }

    #[test]
    fn referencing_a_missing_channel_errs() {
        let src = ImageRef::C1(Image2D::make(1, 1, Colour::opaque([0.5])));
        assert!(swizzle(&src, "y").is_err());
    }

    #[test]
    fn empty_or_overlong_spec_errs() {
        let src = ImageRef::C1(Image2D::make(1, 1, Colour::opaque([0.5])));
        assert!(swizzle(&src, "").is_err());
        assert!(swizzle(&src, "xxxxx").is_err());
    }
}

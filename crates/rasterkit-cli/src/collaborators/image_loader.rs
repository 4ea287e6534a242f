//! The generic image loader: delegates to the `image` crate for every format that isn't
//! DDS or SFI (PNG, JPEG, BMP, TIFF, GIF's static frame). Maps its `DynamicImage`
//! variants onto the arities the engine can represent; anything higher-precision than
//! 8-bit-per-channel is rejected rather than silently downsampled.

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use rasterkit_core::{colour::Colour, Image2D, ImageRef};
use std::path::Path;

/// 8-bit bitmaps map to `(1,0)`; 24-bit to `(3,0)`; 32-bit to `(3,1)`. Palettised inputs
/// are accepted only at 8bpp (the `image` crate expands palettes itself, so they arrive
/// here as `Luma8`/`Rgb8`). 16-bit-per-channel sources are rejected: the source format
/// only ever treats genuine 16-bit-per-channel data as `(3,0)` by truncating precision,
/// which this loader does not do implicitly.
pub fn load(path: &Path) -> Result<ImageRef> {
    let dyn_img = image::open(path).with_context(|| format!("opening image at '{}'", path.display()))?;
    from_dynamic(dyn_img)
}

pub fn from_dynamic(dyn_img: DynamicImage) -> Result<ImageRef> {
    Ok(match dyn_img {
        DynamicImage::ImageLuma8(buf) => {
            let (w, h) = (buf.width(), buf.height());
            ImageRef::C1(Image2D::make_from_fn(w, h, |x, y| Colour::opaque([buf.get_pixel(x, y).0[0] as f32 / 255.0])))
        }
        DynamicImage::ImageRgb8(buf) => {
            let (w, h) = (buf.width(), buf.height());
            ImageRef::C3(Image2D::make_from_fn(w, h, |x, y| {
                let p = buf.get_pixel(x, y).0;
                Colour::opaque([p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0])
            }))
        }
        DynamicImage::ImageRgba8(buf) => {
            let (w, h) = (buf.width(), buf.height());
            ImageRef::C3A(Image2D::make_from_fn(w, h, |x, y| {
                let p = buf.get_pixel(x, y).0;
                Colour::new([p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0], p[3] as f32 / 255.0)
            }))
        }
        DynamicImage::ImageLumaA8(buf) => {
            let (w, h) = (buf.width(), buf.height());
            ImageRef::C1A(Image2D::make_from_fn(w, h, |x, y| {
                let p = buf.get_pixel(x, y).0;
                Colour::new([p[0] as f32 / 255.0], p[1] as f32 / 255.0)
            }))
        }
        other => bail!(
            "unsupported source pixel type {:?}: higher-precision (16/32-bit, float, complex) sources are rejected, not downsampled",
            other.color()
        ),
    })
}

/// Save any representable arity through the `image` crate's PNG/JPEG/BMP/TIFF encoders,
/// selected by `path`'s extension. Requires 1-4 channels with optional alpha, which
/// `ImageRef` always satisfies by construction.
pub fn save(img: &ImageRef, path: &Path) -> Result<()> {
    let (w, h) = (img.width(), img.height());
    let mut flat = [0.0f32; 4];
    let dyn_img = match (img.colour_channels(), img.has_alpha()) {
        (1, false) => {
            let mut buf = image::GrayImage::new(w, h);
            for y in 0..h {
                for x in 0..w {
                    img.sample_flat(x, y, &mut flat[..1]);
                    buf.put_pixel(x, y, image::Luma([to_u8(flat[0])]));
                }
            }
            DynamicImage::ImageLuma8(buf)
        }
        (1, true) => {
            let mut buf = image::GrayAlphaImage::new(w, h);
            for y in 0..h {
                for x in 0..w {
                    img.sample_flat(x, y, &mut flat[..2]);
                    buf.put_pixel(x, y, image::LumaA([to_u8(flat[0]), to_u8(flat[1])]));
                }
            }
            DynamicImage::ImageLumaA8(buf)
        }
        (3, false) | (2, false) => {
            let mut buf = image::RgbImage::new(w, h);
            for y in 0..h {
                for x in 0..w {
                    img.sample_flat(x, y, &mut flat[..img.colour_channels()]);
                    let b = if img.colour_channels() == 3 { flat[2] } else { 0.0 };
                    buf.put_pixel(x, y, image::Rgb([to_u8(flat[0]), to_u8(flat[1]), to_u8(b)]));
                }
            }
            DynamicImage::ImageRgb8(buf)
        }
        _ => {
            let rgba = img.map_to_rgba();
            let mut buf = image::RgbaImage::new(w, h);
            for y in 0..h {
                for x in 0..w {
                    let px = rgba.get(x, y);
                    let c = px.colour();
                    buf.put_pixel(x, y, image::Rgba([to_u8(c[0]), to_u8(c[1]), to_u8(c[2]), to_u8(px.alpha())]));
                }
            }
            DynamicImage::ImageRgba8(buf)
        }
    };
    dyn_img.save(path).with_context(|| format!("writing image to '{}'", path.display()))
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

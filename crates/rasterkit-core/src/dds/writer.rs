use super::{
    format::DdsFormat,
    header::{self, caps, caps2, flags, Header, PixelFormat},
    pixel, DdsFile,
};
use crate::{
    bcn::{self, EncodeFlags},
    colour::Colour,
    error::{Error, Result},
    image::{Image2D, ImageRef},
};

fn blocks_across(dim: u32) -> u32 {
    (dim + 3) / 4
}

pub(super) fn pitch_or_linear_size(format: DdsFormat, w: u32, h: u32) -> u32 {
    if format.is_compressed() {
        let block_bytes = match format {
            DdsFormat::Bc1 | DdsFormat::Bc4 => 8,
            _ => 16,
        };
        block_bytes * blocks_across(w) * blocks_across(h)
    } else {
        (w * format.bits_per_pixel() + 7) / 8
    }
}

fn to_rgba(img: &ImageRef) -> Image2D<3, true> {
    img.map_to_rgba()
}

fn to_single(img: &ImageRef) -> Image2D<1, false> {
    Image2D::make_from_fn(img.width(), img.height(), |x, y| {
        let mut flat = [0.0f32; 4];
        img.sample_flat(x, y, &mut flat[..img.total_channels()]);
        Colour::opaque([flat[0]])
    })
}

fn to_dual(img: &ImageRef) -> Image2D<2, false> {
    Image2D::make_from_fn(img.width(), img.height(), |x, y| {
        let mut flat = [0.0f32; 4];
        img.sample_flat(x, y, &mut flat[..img.total_channels()]);
        Colour::opaque([flat[0], flat.get(1).copied().unwrap_or(0.0)])
    })
}

/// Encodes one surface after flipping it to the DDS on-disk row order: the container
/// stores rows top-down, matching the legacy reader's `pixel(x, height-y-1)` indexing,
/// while this crate's `Image2D` origin is top-left.
fn encode_surface(img: &ImageRef, format: DdsFormat, flags: EncodeFlags) -> Result<Vec<u8>> {
    let img = &img.flipped_vertical();
    if format.is_float16() {
        return Err(Error::UnsupportedHeader("float16 sample encoding".into()));
    }
    Ok(match format {
        DdsFormat::Bc1 => bcn::encode_bc1(&to_rgba(img), flags),
        DdsFormat::Bc2 => bcn::encode_bc2(&to_rgba(img), flags),
        DdsFormat::Bc3 => bcn::encode_bc3(&to_rgba(img), flags),
        DdsFormat::Bc4 => bcn::encode_bc4(&to_single(img)),
        DdsFormat::Bc5 => bcn::encode_bc5(&to_dual(img)),
        f if f.is_float() => return Err(Error::UnsupportedHeader("float fourcc sample encoding not implemented".into())),
        f => {
            let masks = f.masks();
            let bpp = f.bits_per_pixel() as usize;
            let bytes_per_pixel = bpp / 8;
            let mut out = Vec::with_capacity(img.width() as usize * img.height() as usize * bytes_per_pixel);
            for y in 0..img.height() {
                for x in 0..img.width() {
                    let mut flat = [0.0f32; 4];
                    img.sample_flat(x, y, &mut flat[..img.total_channels()]);
                    let rgba = [flat[0], flat.get(1).copied().unwrap_or(0.0), flat.get(2).copied().unwrap_or(0.0), img_alpha(img, x, y, &flat)];
                    let word = pixel::pack_word(masks, rgba);
                    out.extend_from_slice(&word.to_le_bytes()[..bytes_per_pixel]);
                }
            }
            out
        }
    })
}

fn img_alpha(img: &ImageRef, _x: u32, _y: u32, flat: &[f32; 4]) -> f32 {
    if img.has_alpha() {
        flat[img.colour_channels()]
    } else {
        1.0
    }
}

fn header_for(format: DdsFormat, width: u32, height: u32, depth: u32, mip_count: u32, is_cube: bool, is_volume: bool) -> Header {
    let mut hflags = flags::CAPS | flags::HEIGHT | flags::WIDTH | flags::PIXELFORMAT;
    if mip_count > 1 {
        hflags |= flags::MIPMAPCOUNT;
    }
    hflags |= if format.is_compressed() { flags::LINEARSIZE } else { flags::PITCH };
    if is_volume {
        hflags |= flags::DEPTH;
    }

    let mut hcaps = caps::TEXTURE;
    if mip_count > 1 {
        hcaps |= caps::MIPMAP;
    }
    if mip_count > 1 || is_cube {
        hcaps |= caps::COMPLEX;
    }

    let hcaps2 = if is_cube {
        caps2::CUBEMAP | caps2::CUBEMAP_ALL_FACES
    } else if is_volume {
        caps2::VOLUME
    } else {
        0
    };

    let mut pf_flags = 0;
    if format.is_compressed() || format.is_float() {
        pf_flags |= header::pf_flags::FOURCC;
    } else {
        pf_flags |= header::pf_flags::RGB;
        if format.has_alpha() {
            pf_flags |= header::pf_flags::ALPHAPIXELS;
        }
    }

    let pixel_format = if format.is_compressed() || format.is_float() {
        PixelFormat {
            flags: pf_flags,
            fourcc: format.fourcc().map(u32::from_le_bytes).unwrap_or(0),
            rgb_bitcount: 0,
            r_mask: 0,
            g_mask: 0,
            b_mask: 0,
            a_mask: 0,
        }
    } else {
        let m = format.masks();
        PixelFormat {
            flags: pf_flags,
            fourcc: 0,
            rgb_bitcount: format.bits_per_pixel(),
            r_mask: m.r,
            g_mask: m.g,
            b_mask: m.b,
            a_mask: m.a,
        }
    };

    Header {
        flags: hflags,
        height,
        width,
        pitch_or_linear_size: pitch_or_linear_size(format, width, height),
        depth,
        mip_count,
        pixel_format,
        caps: hcaps,
        caps2: hcaps2,
    }
}

pub(super) fn write(file: &DdsFile, format: DdsFormat, encode_flags: EncodeFlags) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match file {
        DdsFile::Simple { mips } => {
            let top = &mips[0];
            header_for(format, top.width(), top.height(), 0, mips.len() as u32, false, false).write_to(&mut out);
            for mip in mips {
                out.extend_from_slice(&encode_surface(mip, format, encode_flags)?);
            }
        }
        DdsFile::Cube { faces } => {
            let top = &faces[0][0];
            header_for(format, top.width(), top.height(), 0, faces[0].len() as u32, true, false).write_to(&mut out);
            for face in faces {
                for mip in face {
                    out.extend_from_slice(&encode_surface(mip, format, encode_flags)?);
                }
            }
        }
        DdsFile::Volume { levels } => {
            let top = &levels[0][0];
            header_for(format, top.width(), top.height(), levels[0].len() as u32, levels.len() as u32, false, true).write_to(&mut out);
            for level in levels {
                for slice in level {
                    out.extend_from_slice(&encode_surface(slice, format, encode_flags)?);
                }
            }
        }
    }
    Ok(out)
}

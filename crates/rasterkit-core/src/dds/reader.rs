use super::{format::DdsFormat, header::Header, header::caps2, pixel, DdsFile};
use crate::{
    bcn,
    colour::Colour,
    error::{Error, Result},
    image::ImageRef,
};

/// Decodes one surface and flips it to the in-memory top-left origin: DDS stores rows
/// top-down on disk, matching the legacy writer's `pixel(x, height-y-1)` indexing.
fn decode_surface(data: &[u8], format: DdsFormat, w: u32, h: u32) -> Result<(ImageRef, usize)> {
    let (img, consumed) = decode_surface_raw(data, format, w, h)?;
    Ok((img.flipped_vertical(), consumed))
}

fn decode_surface_raw(data: &[u8], format: DdsFormat, w: u32, h: u32) -> Result<(ImageRef, usize)> {
    if format.is_float16() {
        return Err(Error::UnsupportedHeader("float16 sample decoding".into()));
    }
    let compressed_len = |block_bytes: u32| (block_bytes * ((w + 3) / 4) * ((h + 3) / 4)) as usize;
    Ok(match format {
        DdsFormat::Bc1 => {
            let len = compressed_len(8);
            (ImageRef::C3A(bcn::decode_bc1(&data[..len], w, h)), len)
        }
        DdsFormat::Bc2 => {
            let len = compressed_len(16);
            (ImageRef::C3A(bcn::decode_bc2(&data[..len], w, h)), len)
        }
        DdsFormat::Bc3 => {
            let len = compressed_len(16);
            (ImageRef::C3A(bcn::decode_bc3(&data[..len], w, h)), len)
        }
        DdsFormat::Bc4 => {
            let len = compressed_len(8);
            (ImageRef::C1(bcn::decode_bc4(&data[..len], w, h)), len)
        }
        DdsFormat::Bc5 => {
            let len = compressed_len(16);
            (ImageRef::C2(bcn::decode_bc5(&data[..len], w, h)), len)
        }
        f if f.is_float() => return Err(Error::UnsupportedHeader("float fourcc sample decoding not implemented".into())),
        f => {
            let masks = f.masks();
            let bpp = f.bits_per_pixel() as usize;
            let bytes_per_pixel = bpp / 8;
            let len = w as usize * h as usize * bytes_per_pixel;
            let img = match f.colour_channels() {
                1 if !f.has_alpha() => ImageRef::C1(crate::image::Image2D::make_from_fn(w, h, |x, y| {
                    let word = read_word(data, (y as usize * w as usize + x as usize) * bytes_per_pixel, bytes_per_pixel);
                    Colour::opaque([pixel::unpack_word(masks, word)[0]])
                })),
                1 => ImageRef::C1A(crate::image::Image2D::make_from_fn(w, h, |x, y| {
                    let word = read_word(data, (y as usize * w as usize + x as usize) * bytes_per_pixel, bytes_per_pixel);
                    let s = pixel::unpack_word(masks, word);
                    Colour::new([s[0]], s[3])
                })),
                2 => ImageRef::C2(crate::image::Image2D::make_from_fn(w, h, |x, y| {
                    let word = read_word(data, (y as usize * w as usize + x as usize) * bytes_per_pixel, bytes_per_pixel);
                    let s = pixel::unpack_word(masks, word);
                    Colour::opaque([s[0], s[1]])
                })),
                3 if !f.has_alpha() => ImageRef::C3(crate::image::Image2D::make_from_fn(w, h, |x, y| {
                    let word = read_word(data, (y as usize * w as usize + x as usize) * bytes_per_pixel, bytes_per_pixel);
                    let s = pixel::unpack_word(masks, word);
                    Colour::opaque([s[0], s[1], s[2]])
                })),
                _ => ImageRef::C3A(crate::image::Image2D::make_from_fn(w, h, |x, y| {
                    let word = read_word(data, (y as usize * w as usize + x as usize) * bytes_per_pixel, bytes_per_pixel);
                    let s = pixel::unpack_word(masks, word);
                    Colour::new([s[0], s[1], s[2]], s[3])
                })),
            };
            (img, len)
        }
    })
}

fn read_word(data: &[u8], offset: usize, width: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(&data[offset..offset + width]);
    u32::from_le_bytes(buf)
}

fn mip_dims(top_w: u32, top_h: u32, level: u32) -> (u32, u32) {
    let mut w = top_w;
    let mut h = top_h;
    for _ in 0..level {
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    (w, h)
}

pub(super) fn read(bytes: &[u8]) -> Result<(DdsFile, DdsFormat)> {
    let header = Header::read_from(bytes)?;
    let format = if header.pixel_format.flags & super::header::pf_flags::FOURCC != 0 {
        DdsFormat::from_fourcc(header.pixel_format.fourcc)?
    } else {
        from_masks(&header)?
    };

    let mut cursor = &bytes[4 + super::header::HEADER_SIZE as usize..];
    let mip_count = header.mip_count.max(1);

    if header.caps2 & caps2::CUBEMAP != 0 {
        let mut faces: [Vec<ImageRef>; 6] = Default::default();
        for face in faces.iter_mut() {
            for level in 0..mip_count {
                let (w, h) = mip_dims(header.width, header.height, level);
                let (img, consumed) = decode_surface(cursor, format, w, h)?;
                cursor = &cursor[consumed..];
                face.push(img);
            }
        }
        Ok((DdsFile::Cube { faces }, format))
    } else if header.caps2 & caps2::VOLUME != 0 {
        let mut levels = Vec::with_capacity(mip_count as usize);
        let mut depth = header.depth.max(1);
        for level in 0..mip_count {
            let (w, h) = mip_dims(header.width, header.height, level);
            let mut slices = Vec::with_capacity(depth as usize);
            for _ in 0..depth {
                let (img, consumed) = decode_surface(cursor, format, w, h)?;
                cursor = &cursor[consumed..];
                slices.push(img);
            }
            levels.push(slices);
            depth = (depth / 2).max(1);
        }
        Ok((DdsFile::Volume { levels }, format))
    } else {
        let mut mips = Vec::with_capacity(mip_count as usize);
        for level in 0..mip_count {
            let (w, h) = mip_dims(header.width, header.height, level);
            let (img, consumed) = decode_surface(cursor, format, w, h)?;
            cursor = &cursor[consumed..];
            mips.push(img);
        }
        Ok((DdsFile::Simple { mips }, format))
    }
}

fn from_masks(header: &Header) -> Result<DdsFormat> {
    let pf = &header.pixel_format;
    let m = (pf.r_mask, pf.g_mask, pf.b_mask, pf.a_mask, pf.rgb_bitcount);
    for &candidate in DdsFormat::all() {
        if candidate.is_compressed() || candidate.is_float() {
            continue;
        }
        let cm = candidate.masks();
        if (cm.r, cm.g, cm.b, cm.a, candidate.bits_per_pixel()) == m {
            return Ok(candidate);
        }
    }
    Err(Error::BadHeader(format!(
        "no catalogue format matches masks r=0x{:x} g=0x{:x} b=0x{:x} a=0x{:x} bitcount={}",
        pf.r_mask, pf.g_mask, pf.b_mask, pf.a_mask, pf.rgb_bitcount
    )))
}

//! SFI: a trivial lossless raw-float container, used to round-trip images that would
//! lose precision through any quantised DDS layout.
//!
//! Wire layout, little-endian: `width(u32) height(u32) channels(u8) alpha_marker(u8)
//! samples(f32 * w*h*channels)`, row-major, channel-interleaved, origin top-left.

use crate::{
    colour::Colour,
    error::{Error, Result},
    image::{Image2D, ImageRef},
};

const ALPHA_MARKER: u8 = b'A';
const NO_ALPHA_MARKER: u8 = b'a';

pub fn encode(img: &ImageRef) -> Vec<u8> {
    let channels = img.total_channels() as u8;
    let mut out = Vec::with_capacity(10 + img.width() as usize * img.height() as usize * channels as usize * 4);
    out.extend_from_slice(&img.width().to_le_bytes());
    out.extend_from_slice(&img.height().to_le_bytes());
    out.push(channels);
    out.push(if img.has_alpha() { ALPHA_MARKER } else { NO_ALPHA_MARKER });
    let mut flat = [0.0f32; 4];
    for y in 0..img.height() {
        for x in 0..img.width() {
            img.sample_flat(x, y, &mut flat[..channels as usize]);
            for s in &flat[..channels as usize] {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }
    out
}

pub fn decode(bytes: &[u8]) -> Result<ImageRef> {
    if bytes.len() < 10 {
        return Err(Error::BadHeader("SFI payload shorter than its fixed header".into()));
    }
    let width = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let height = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let channels = bytes[8];
    let has_alpha = match bytes[9] {
        ALPHA_MARKER => true,
        NO_ALPHA_MARKER => false,
        other => return Err(Error::BadHeader(format!("SFI alpha marker byte 0x{other:02x} is neither 'A' nor 'a'"))),
    };
    let colour_channels = channels as usize - has_alpha as usize;
    let pixel_count = width as usize * height as usize;
    let expected_len = 10 + pixel_count * channels as usize * 4;
    if bytes.len() != expected_len {
        return Err(Error::BadHeader(format!("SFI payload is {} bytes, expected {expected_len}", bytes.len())));
    }

    let mut samples = bytes[10..].chunks_exact(4).map(|c| f32::from_le_bytes(c.try_into().unwrap()));
    macro_rules! build {
        ($C:literal, $A:literal, $variant:ident) => {{
            ImageRef::$variant(Image2D::<$C, $A>::make_from_fn(width, height, |_, _| {
                let mut colour = [0.0f32; $C];
                for c in colour.iter_mut() {
                    *c = samples.next().unwrap();
                }
                let alpha = if $A { samples.next().unwrap() } else { 1.0 };
                Colour::new(colour, alpha)
            }))
        }};
    }
    Ok(match (colour_channels, has_alpha) {
        (1, false) => build!(1, false, C1),
        (1, true) => build!(1, true, C1A),
        (2, false) => build!(2, false, C2),
        (2, true) => build!(2, true, C2A),
        (3, false) => build!(3, false, C3),
        (3, true) => build!(3, true, C3A),
        (4, false) => build!(4, false, C4),
        (c, a) => return Err(Error::BadHeader(format!("SFI channel layout ({c}, alpha={a}) is not representable"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_through_bytes() {
        let img = ImageRef::C3A(Image2D::<3, true>::make_from_fn(2, 2, |x, y| Colour::new([x as f32, y as f32, 0.25], 0.75)));
        let bytes = encode(&img);
        let back = decode(&bytes).unwrap();
        assert_eq!(img, back);
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(decode(&[0u8; 4]).is_err());
    }

    #[test]
    fn rejects_bad_alpha_marker() {
        let mut bytes = encode(&ImageRef::C1(Image2D::<1, false>::make(1, 1, Colour::opaque([0.5]))));
        bytes[9] = b'Z';
        assert!(decode(&bytes).is_err());
    }
}

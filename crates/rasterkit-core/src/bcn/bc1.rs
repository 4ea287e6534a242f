//! BC1 (DXT1): two RGB565 endpoints + a 32-bit 2-bpp index map, 8 bytes/block.

use super::{
    fit::{block_to_rgba8, squish_params},
    EncodeFlags,
};
use crate::colour::Colour;

fn decode_565(word: u16) -> [f32; 3] {
    let r = ((word >> 11) & 0x1F) as f32 / 31.0;
    let g = ((word >> 5) & 0x3F) as f32 / 63.0;
    let b = (word & 0x1F) as f32 / 31.0;
    [r, g, b]
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t]
}

/// Shared BC1-style colour block decode used by BC1/BC2/BC3. `use_alpha_mask` selects
/// whether `c0 <= c1` switches to the 3-colour-plus-transparent palette (true, BC1 only)
/// or is ignored entirely and the 4-colour opaque palette is always used (false, BC2/BC3,
/// "no 1-bit alpha mode").
pub(crate) fn decode_colour_block(c0: u16, c1: u16, indices: u32, use_alpha_mask: bool) -> [([f32; 3], f32); 16] {
    let col0 = decode_565(c0);
    let col1 = decode_565(c1);

    let (palette, alpha): ([[f32; 3]; 4], [f32; 4]) = if c0 > c1 || !use_alpha_mask {
        (
            [col0, col1, lerp3(col0, col1, 1.0 / 3.0), lerp3(col0, col1, 2.0 / 3.0)],
            [1.0, 1.0, 1.0, 1.0],
        )
    } else {
        (
            [col0, col1, lerp3(col0, col1, 0.5), [0.0, 0.0, 0.0]],
            [1.0, 1.0, 1.0, 0.0],
        )
    };

    let mut out = [([0.0f32; 3], 1.0f32); 16];
    for yoff in 0..4u32 {
        for xoff in 0..4u32 {
            let idx = ((indices >> (2 * (yoff * 4 + xoff))) & 0x3) as usize;
            out[(yoff * 4 + xoff) as usize] = (palette[idx], alpha[idx]);
        }
    }
    out
}

/// Decode a full BC1 block (colour block doubles as the alpha source via the
/// transparent-black 4th palette entry).
pub(crate) fn decode_block(block: &[u8; 8]) -> [Colour<3, true>; 16] {
    let c0 = u16::from_le_bytes([block[0], block[1]]);
    let c1 = u16::from_le_bytes([block[2], block[3]]);
    let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    let raw = decode_colour_block(c0, c1, indices, true);
    raw.map(|(c, a)| Colour::new(c, a))
}

/// Encode via the squish-delegated fitter; any source pixel with `alpha < 0.5` in the
/// block pushes the fitter toward the 3-colour-plus-transparent mode, selection left to
/// the delegate.
pub(crate) fn encode_block(block: &[Colour<3, true>; 16], flags: EncodeFlags) -> [u8; 8] {
    let rgba = block_to_rgba8(block);
    let params = squish_params(flags.quality, flags.metric, flags.weight_colour_by_alpha);
    let mut output = [0u8; 8];
    squish::BC1::compress(&rgba, 4, 4, params, &mut output);
    output
}

//! BC3 (DXT5): interpolated 8-byte alpha block + BC1-style colour, 16 bytes/block.

use super::{
    bc1::decode_colour_block,
    bc45,
    fit::{block_to_rgba8, squish_params},
    EncodeFlags,
};
use crate::colour::Colour;

pub(crate) fn decode_block(block: &[u8; 16]) -> [Colour<3, true>; 16] {
    let alpha = bc45::decode_alpha_block(block[0..8].try_into().unwrap());
    let c0 = u16::from_le_bytes([block[8], block[9]]);
    let c1 = u16::from_le_bytes([block[10], block[11]]);
    let indices = u32::from_le_bytes([block[12], block[13], block[14], block[15]]);
    let colour = decode_colour_block(c0, c1, indices, false);

    let mut out = [Colour::<3, true>::splat(0.0); 16];
    for i in 0..16 {
        out[i] = Colour::new(colour[i].0, alpha[i]);
    }
    out
}

pub(crate) fn encode_block(block: &[Colour<3, true>; 16], flags: EncodeFlags) -> [u8; 16] {
    let rgba = block_to_rgba8(block);
    let params = squish_params(flags.quality, flags.metric, flags.weight_colour_by_alpha);
    let mut output = [0u8; 16];
    squish::BC3::compress(&rgba, 4, 4, params, &mut output);
    output
}

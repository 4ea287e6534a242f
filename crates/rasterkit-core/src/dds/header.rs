//! Raw DDS header bit layout: magic, the 124-byte header, and its 32-byte pixel-format
//! sub-header. Pure wire-format plumbing; no image semantics live here.

pub const MAGIC: [u8; 4] = *b"DDS ";
pub const HEADER_SIZE: u32 = 124;
pub const PIXELFORMAT_SIZE: u32 = 32;

pub mod flags {
    pub const CAPS: u32 = 0x1;
    pub const HEIGHT: u32 = 0x2;
    pub const WIDTH: u32 = 0x4;
    pub const PITCH: u32 = 0x8;
    pub const PIXELFORMAT: u32 = 0x1000;
    pub const MIPMAPCOUNT: u32 = 0x2_0000;
    pub const LINEARSIZE: u32 = 0x8_0000;
    pub const DEPTH: u32 = 0x80_0000;
}

pub mod caps {
    pub const COMPLEX: u32 = 0x8;
    pub const MIPMAP: u32 = 0x40_0000;
    pub const TEXTURE: u32 = 0x1000;
}

pub mod caps2 {
    pub const CUBEMAP: u32 = 0x200;
    pub const CUBEMAP_POSITIVEX: u32 = 0x400;
    pub const CUBEMAP_NEGATIVEX: u32 = 0x800;
    pub const CUBEMAP_POSITIVEY: u32 = 0x1000;
    pub const CUBEMAP_NEGATIVEY: u32 = 0x2000;
    pub const CUBEMAP_POSITIVEZ: u32 = 0x4000;
    pub const CUBEMAP_NEGATIVEZ: u32 = 0x8000;
    pub const CUBEMAP_ALL_FACES: u32 = CUBEMAP_POSITIVEX | CUBEMAP_NEGATIVEX | CUBEMAP_POSITIVEY | CUBEMAP_NEGATIVEY | CUBEMAP_POSITIVEZ | CUBEMAP_NEGATIVEZ;
    pub const VOLUME: u32 = 0x20_0000;
}

pub mod pf_flags {
    pub const ALPHAPIXELS: u32 = 0x1;
    pub const FOURCC: u32 = 0x4;
    pub const RGB: u32 = 0x40;
}

#[derive(Debug, Clone, Copy)]
pub struct PixelFormat {
    pub flags: u32,
    pub fourcc: u32,
    pub rgb_bitcount: u32,
    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
    pub a_mask: u32,
}

impl PixelFormat {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&PIXELFORMAT_SIZE.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.fourcc.to_le_bytes());
        out.extend_from_slice(&self.rgb_bitcount.to_le_bytes());
        out.extend_from_slice(&self.r_mask.to_le_bytes());
        out.extend_from_slice(&self.g_mask.to_le_bytes());
        out.extend_from_slice(&self.b_mask.to_le_bytes());
        out.extend_from_slice(&self.a_mask.to_le_bytes());
    }

    pub fn read_from(bytes: &[u8; 32]) -> crate::error::Result<Self> {
        let size = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if size != PIXELFORMAT_SIZE {
            return Err(crate::error::Error::BadHeader(format!("pixel format size {size} != 32")));
        }
        Ok(Self {
            flags: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            fourcc: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
            rgb_bitcount: u32::from_le_bytes(bytes[12..16].try_into().unwrap()),
            r_mask: u32::from_le_bytes(bytes[16..20].try_into().unwrap()),
            g_mask: u32::from_le_bytes(bytes[20..24].try_into().unwrap()),
            b_mask: u32::from_le_bytes(bytes[24..28].try_into().unwrap()),
            a_mask: u32::from_le_bytes(bytes[28..32].try_into().unwrap()),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_count: u32,
    pub pixel_format: PixelFormat,
    pub caps: u32,
    pub caps2: u32,
}

impl Header {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&HEADER_SIZE.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.pitch_or_linear_size.to_le_bytes());
        out.extend_from_slice(&self.depth.to_le_bytes());
        out.extend_from_slice(&self.mip_count.to_le_bytes());
        out.extend_from_slice(&[0u8; 11 * 4]); // reserved
        self.pixel_format.write_to(out);
        out.extend_from_slice(&self.caps.to_le_bytes());
        out.extend_from_slice(&self.caps2.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // caps3
        out.extend_from_slice(&0u32.to_le_bytes()); // caps4
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved2
    }

    pub fn read_from(bytes: &[u8]) -> crate::error::Result<Self> {
        use crate::error::Error;
        if bytes.len() < 128 || bytes[0..4] != MAGIC {
            return Err(Error::BadHeader("magic mismatch, expected \"DDS \"".into()));
        }
        let size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if size != HEADER_SIZE {
            return Err(Error::BadHeader(format!("header size {size} != 124")));
        }
        let flags = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let height = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let width = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
        let pitch_or_linear_size = u32::from_le_bytes(bytes[20..24].try_into().unwrap());
        let depth = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        let mut mip_count = u32::from_le_bytes(bytes[28..32].try_into().unwrap());
        if mip_count == 0 {
            mip_count = 1;
        }
        // bytes[32..76] reserved (11 u32s)
        let pixel_format = PixelFormat::read_from(bytes[76..108].try_into().unwrap())?;
        let caps = u32::from_le_bytes(bytes[108..112].try_into().unwrap());
        let caps2 = u32::from_le_bytes(bytes[112..116].try_into().unwrap());

        if pixel_format.fourcc == u32::from_le_bytes(*b"DX10") {
            return Err(Error::UnsupportedHeader("DX10 extended header".into()));
        }
        if pixel_format.flags & pf_flags::RGB != 0 && pixel_format.r_mask == 0 && pixel_format.g_mask == 0 && pixel_format.b_mask == 0 {
            return Err(Error::BadHeader("RGB pixel format with all-zero masks".into()));
        }
        if pixel_format.flags & pf_flags::RGB != 0 && !matches!(pixel_format.rgb_bitcount, 8 | 16 | 24 | 32) {
            return Err(Error::BadHeader(format!("unsupported rgb_bitcount {}", pixel_format.rgb_bitcount)));
        }

        Ok(Self {
            flags,
            height,
            width,
            pitch_or_linear_size,
            depth,
            mip_count,
            pixel_format,
            caps,
            caps2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_header() -> Header {
        Header {
            flags: flags::CAPS | flags::HEIGHT | flags::WIDTH | flags::PIXELFORMAT | flags::PITCH,
            height: 4,
            width: 8,
            pitch_or_linear_size: 24,
            depth: 0,
            mip_count: 1,
            pixel_format: PixelFormat {
                flags: pf_flags::RGB,
                fourcc: 0,
                rgb_bitcount: 24,
                r_mask: 0xFF0000,
                g_mask: 0x00FF00,
                b_mask: 0x0000FF,
                a_mask: 0,
            },
            caps: caps::TEXTURE,
            caps2: 0,
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let header = sample_header();
        let mut bytes = Vec::new();
        header.write_to(&mut bytes);
        assert_eq!(bytes.len(), 4 + HEADER_SIZE as usize);
        let back = Header::read_from(&bytes).unwrap();
        assert_eq!(back.width, header.width);
        assert_eq!(back.height, header.height);
        assert_eq!(back.pixel_format.r_mask, header.pixel_format.r_mask);
    }

    #[test]
    fn wrong_magic_is_bad_header() {
        let mut bytes = Vec::new();
        sample_header().write_to(&mut bytes);
        bytes[0..4].copy_from_slice(b"XXX ");
        assert!(matches!(Header::read_from(&bytes), Err(crate::error::Error::BadHeader(_))));
    }

    #[test]
    fn zero_mip_count_is_treated_as_one() {
        let mut header = sample_header();
        header.mip_count = 0;
        let mut bytes = Vec::new();
        header.write_to(&mut bytes);
        let back = Header::read_from(&bytes).unwrap();
        assert_eq!(back.mip_count, 1);
    }

    #[test]
    fn dx10_fourcc_is_rejected() {
        let mut header = sample_header();
        header.pixel_format.flags = pf_flags::FOURCC;
        header.pixel_format.fourcc = u32::from_le_bytes(*b"DX10");
        let mut bytes = Vec::new();
        header.write_to(&mut bytes);
        assert!(matches!(Header::read_from(&bytes), Err(crate::error::Error::UnsupportedHeader(_))));
    }

    #[test]
    fn all_zero_rgb_masks_with_rgb_flag_is_bad_header() {
        let mut header = sample_header();
        header.pixel_format.r_mask = 0;
        header.pixel_format.g_mask = 0;
        header.pixel_format.b_mask = 0;
        let mut bytes = Vec::new();
        header.write_to(&mut bytes);
        assert!(matches!(Header::read_from(&bytes), Err(crate::error::Error::BadHeader(_))));
    }
}

//! DDS container: header read/write, the pixel-layout catalogue, and the three surface
//! topologies (simple/cube/volume) with mip-chain enforcement.

pub mod format;
pub mod header;
mod pixel;
mod reader;
mod writer;

pub use format::DdsFormat;

use crate::{
    bcn::EncodeFlags,
    error::{Error, Result},
    image::ImageRef,
};

/// A DDS file's surface data, already split into its topology.
#[derive(Debug, Clone, PartialEq)]
pub enum DdsFile {
    Simple { mips: Vec<ImageRef> },
    Cube { faces: [Vec<ImageRef>; 6] },
    Volume { levels: Vec<Vec<ImageRef>> },
}

pub const CUBE_FACE_ORDER: [&str; 6] = ["+X", "-X", "+Y", "-Y", "+Z", "-Z"];

impl DdsFile {
    pub fn encode(&self, format: DdsFormat, flags: EncodeFlags) -> Result<Vec<u8>> {
        validate(self)?;
        writer::write(self, format, flags)
    }

    pub fn decode(bytes: &[u8]) -> Result<(Self, DdsFormat)> {
        reader::read(bytes)
    }
}

fn validate_mip_chain(mips: &[ImageRef]) -> Result<()> {
    if mips.is_empty() {
        return Err(Error::MipChainInvalid {
            level: 0,
            expected_w: 0,
            expected_h: 0,
            got_w: 0,
            got_h: 0,
        });
    }
    for (level, pair) in mips.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        if !cur.is_next_mip_of(prev) {
            return Err(Error::MipChainInvalid {
                level: level + 1,
                expected_w: (prev.width() / 2).max(1),
                expected_h: (prev.height() / 2).max(1),
                got_w: cur.width(),
                got_h: cur.height(),
            });
        }
    }
    Ok(())
}

fn validate(file: &DdsFile) -> Result<()> {
    match file {
        DdsFile::Simple { mips } => validate_mip_chain(mips),
        DdsFile::Cube { faces } => {
            for (i, face) in faces.iter().enumerate() {
                validate_mip_chain(face)?;
                let top = &face[0];
                if top.width() != top.height() {
                    return Err(Error::CubeShapeInvalid {
                        face: i,
                        w: top.width(),
                        h: top.height(),
                    });
                }
            }
            let (w0, h0, len0) = (faces[0][0].width(), faces[0][0].height(), faces[0].len());
            for (i, face) in faces.iter().enumerate().skip(1) {
                if face[0].width() != w0 || face[0].height() != h0 || face.len() != len0 {
                    return Err(Error::CubeShapeInvalid {
                        face: i,
                        w: face[0].width(),
                        h: face[0].height(),
                    });
                }
            }
            Ok(())
        }
        DdsFile::Volume { levels } => {
            if levels.is_empty() {
                return Err(Error::MipChainInvalid {
                    level: 0,
                    expected_w: 0,
                    expected_h: 0,
                    got_w: 0,
                    got_h: 0,
                });
            }
            let tops: Vec<ImageRef> = levels.iter().map(|slices| slices[0].clone()).collect();
            validate_mip_chain(&tops)?;
            let mut prev_depth = levels[0].len() as u32;
            for (level, slices) in levels.iter().enumerate().skip(1) {
                let expected = (prev_depth / 2).max(1);
                if slices.len() as u32 != expected {
                    return Err(Error::MipChainInvalid {
                        level,
                        expected_w: expected,
                        expected_h: expected,
                        got_w: slices.len() as u32,
                        got_h: slices.len() as u32,
                    });
                }
                prev_depth = expected;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bcn::EncodeFlags, colour::Colour, image::Image2D};
    use pretty_assertions::assert_eq;

    fn solid(w: u32, h: u32, c: [f32; 3]) -> ImageRef {
        ImageRef::C3(Image2D::make(w, h, Colour::opaque(c)))
    }

    #[test]
    fn r8_round_trip_matches_literal_scenario() {
        // make((2,1), 1, 0.5) -> R8 DDS body is [0x80, 0x80].
        let img = ImageRef::C1(Image2D::make(2, 1, Colour::opaque([0.5])));
        let file = DdsFile::Simple { mips: vec![img] };
        let bytes = file.encode(DdsFormat::R8, EncodeFlags::default()).unwrap();
        assert_eq!(bytes.len(), 4 + 124 + 2);
        let body = &bytes[4 + 124..];
        assert_eq!(body, &[0x80, 0x80]);

        let (decoded, format) = DdsFile::decode(&bytes).unwrap();
        assert_eq!(format, DdsFormat::R8);
        match decoded {
            DdsFile::Simple { mips } => assert_eq!(mips[0].width(), 2),
            other => panic!("expected Simple, got {other:?}"),
        }
    }

    #[test]
    fn encoder_writes_rows_top_down_flipping_the_in_memory_grid() {
        // top-left-origin row 0 is 0.2, row 1 (bottom) is 0.8; the legacy writer
        // emits file row 0 as the bottom in-memory row, so the body's first byte
        // must be 0.8's quantisation, not 0.2's.
        let img = ImageRef::C1(Image2D::make_from_fn(1, 2, |_x, y| Colour::opaque([if y == 0 { 0.2 } else { 0.8 }])));
        let file = DdsFile::Simple { mips: vec![img] };
        let bytes = file.encode(DdsFormat::R8, EncodeFlags::default()).unwrap();
        let body = &bytes[4 + 124..];
        assert_eq!(body, &[0xCC, 0x33]);

        let (decoded, _) = DdsFile::decode(&bytes).unwrap();
        match decoded {
            DdsFile::Simple { mips } => match &mips[0] {
                ImageRef::C1(img) => {
                    assert!((img.get(0, 0).colour()[0] - 0.2).abs() < 1.0 / 255.0);
                    assert!((img.get(0, 1).colour()[0] - 0.8).abs() < 1.0 / 255.0);
                }
                other => panic!("expected C1, got {other:?}"),
            },
            other => panic!("expected Simple, got {other:?}"),
        }
    }

    #[test]
    fn bc1_round_trip_preserves_colour_within_quantisation() {
        let img = ImageRef::C3A(Image2D::make(4, 4, Colour::new([1.0, 0.0, 0.0], 1.0)));
        let file = DdsFile::Simple { mips: vec![img] };
        let bytes = file.encode(DdsFormat::Bc1, EncodeFlags::default()).unwrap();
        let (decoded, format) = DdsFile::decode(&bytes).unwrap();
        assert_eq!(format, DdsFormat::Bc1);
        match decoded {
            DdsFile::Simple { mips } => {
                let px = match &mips[0] {
                    ImageRef::C3A(img) => img.get(0, 0),
                    other => panic!("expected C3A, got {other:?}"),
                };
                assert!(px.colour()[0] > 0.9);
                assert!(px.colour()[1] < 0.1);
                assert!(px.colour()[2] < 0.1);
                assert_eq!(px.alpha(), 1.0);
            }
            other => panic!("expected Simple, got {other:?}"),
        }
    }

    #[test]
    fn mip_chain_with_wrong_dimensions_is_rejected() {
        let file = DdsFile::Simple {
            mips: vec![solid(4, 4, [0.0; 3]), solid(3, 3, [0.0; 3])],
        };
        assert!(matches!(file.encode(DdsFormat::R8G8B8, EncodeFlags::default()), Err(Error::MipChainInvalid { .. })));
    }

    #[test]
    fn cube_faces_must_be_square_and_share_dimensions() {
        let good_face = || vec![solid(4, 4, [1.0, 0.0, 0.0])];
        let mut faces: [Vec<ImageRef>; 6] = Default::default();
        for f in faces.iter_mut() {
            *f = good_face();
        }
        let ok = DdsFile::Cube { faces: faces.clone() };
        assert!(ok.encode(DdsFormat::R8G8B8, EncodeFlags::default()).is_ok());

        faces[3] = vec![solid(4, 5, [1.0, 0.0, 0.0])];
        let bad = DdsFile::Cube { faces };
        assert!(matches!(bad.encode(DdsFormat::R8G8B8, EncodeFlags::default()), Err(Error::CubeShapeInvalid { .. })));
    }

    #[test]
    fn bad_magic_fails_to_decode() {
        let mut bytes = vec![0u8; 4 + 124];
        bytes[0..4].copy_from_slice(b"XXX ");
        assert!(matches!(DdsFile::decode(&bytes), Err(Error::BadHeader(_))));
    }

    #[test]
    fn volume_round_trip_preserves_depth_slices() {
        let levels = vec![
            vec![solid(4, 4, [0.1, 0.2, 0.3]), solid(4, 4, [0.4, 0.5, 0.6])],
            vec![solid(2, 2, [0.1, 0.2, 0.3])],
            vec![solid(1, 1, [0.1, 0.2, 0.3])],
        ];
        let file = DdsFile::Volume { levels };
        let bytes = file.encode(DdsFormat::R8G8B8, EncodeFlags::default()).unwrap();
        let (decoded, _) = DdsFile::decode(&bytes).unwrap();
        match decoded {
            DdsFile::Volume { levels } => {
                assert_eq!(levels.len(), 3);
                assert_eq!(levels[0].len(), 2);
                assert_eq!(levels[1].len(), 1);
                assert_eq!(levels[2].len(), 1);
            }
            other => panic!("expected Volume, got {other:?}"),
        }
    }
}

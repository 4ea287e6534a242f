//! The command dispatcher: turns a script-host call into a `rasterkit-core` call and
//! back (`script-host -> command dispatcher -> (Image2D x codec) -> bytes`). It is the
//! one piece of plumbing between the out-of-scope collaborators (script host, generic
//! loader) and the in-scope engine, so it carries real logic rather than being a stub.

use crate::collaborators::image_loader;
use anyhow::{bail, Context, Result};
use rasterkit_core::{
    bcn::EncodeFlags,
    colour::Colour,
    dds::{DdsFile, DdsFormat},
    geometry::{self, Filter},
    sfi, Image2D, ImageRef,
};
use std::path::Path;
use tracing::{debug, info};

/// Load any representable image by file extension: `.dds` and `.sfi` use the in-crate
/// container codecs, everything else delegates to the generic third-party-backed
/// loader. A `.dds` source with more than one top-level image (cube/volume) is an error
/// here; use [`load_dds_file`] to get the full topology.
pub fn load(path: &Path) -> Result<ImageRef> {
    match extension_of(path).as_deref() {
        Some("dds") => {
            let bytes = std::fs::read(path).with_context(|| format!("reading '{}'", path.display()))?;
            let (file, format) = DdsFile::decode(&bytes).with_context(|| format!("decoding DDS at '{}'", path.display()))?;
            debug!(?format, "decoded DDS container");
            match file {
                DdsFile::Simple { mips } => Ok(mips.into_iter().next().expect("mip chain is non-empty by construction")),
                DdsFile::Cube { .. } => bail!("'{}' is a cube map; use load_dds_file to inspect all six faces", path.display()),
                DdsFile::Volume { .. } => bail!("'{}' is a volume texture; use load_dds_file to inspect all depth slices", path.display()),
            }
        }
        Some("sfi") => {
            let bytes = std::fs::read(path).with_context(|| format!("reading '{}'", path.display()))?;
            sfi::decode(&bytes).map_err(anyhow::Error::from).with_context(|| format!("decoding SFI at '{}'", path.display()))
        }
        _ => image_loader::load(path),
    }
}

/// The full DDS topology (simple/cube/volume) plus the format it was stored as.
pub fn load_dds_file(path: &Path) -> Result<(DdsFile, DdsFormat)> {
    let bytes = std::fs::read(path).with_context(|| format!("reading '{}'", path.display()))?;
    DdsFile::decode(&bytes).with_context(|| format!("decoding DDS at '{}'", path.display()))
}

/// Save by file extension: `.sfi`/`.dds` use the in-crate codecs (`.dds` requires a
/// format tag, it has no default, since every DDS format is a deliberate choice about
/// precision and compression); everything else delegates to the generic loader's
/// encoders.
pub fn save(img: &ImageRef, path: &Path, dds_format: Option<&str>, flags: EncodeFlags) -> Result<()> {
    match extension_of(path).as_deref() {
        Some("dds") => {
            let tag = dds_format.context("saving to .dds requires a format tag, e.g. \"BC1\" or \"A8R8G8B8\"")?;
            let format = DdsFormat::from_tag(tag).map_err(anyhow::Error::from)?;
            let file = DdsFile::Simple { mips: vec![img.clone()] };
            let bytes = file.encode(format, flags).with_context(|| format!("encoding as {tag}"))?;
            std::fs::write(path, bytes).with_context(|| format!("writing '{}'", path.display()))?;
            info!(tag, path = %path.display(), "wrote DDS");
            Ok(())
        }
        Some("sfi") => {
            let bytes = sfi::encode(img);
            std::fs::write(path, bytes).with_context(|| format!("writing '{}'", path.display()))?;
            info!(path = %path.display(), "wrote SFI");
            Ok(())
        }
        _ => image_loader::save(img, path),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

pub fn make(width: u32, height: u32, channels: usize, alpha: bool, fill: &[f32]) -> Result<ImageRef> {
    macro_rules! build {
        ($C:literal, $variant:ident) => {{
            let mut colour = [0.0f32; $C];
            colour.copy_from_slice(&fill[..$C]);
            ImageRef::$variant(Image2D::<$C, false>::make(width, height, Colour::opaque(colour)))
        }};
    }
    macro_rules! build_alpha {
        ($C:literal, $variant:ident) => {{
            let mut colour = [0.0f32; $C];
            colour.copy_from_slice(&fill[..$C]);
            let a = fill.get($C).copied().unwrap_or(1.0);
            ImageRef::$variant(Image2D::<$C, true>::make(width, height, Colour::new(colour, a)))
        }};
    }
    if fill.len() < channels + alpha as usize {
        bail!("make() needs {} fill samples for {channels} channels + alpha={alpha}, got {}", channels + alpha as usize, fill.len());
    }
    Ok(match (channels, alpha) {
        (1, false) => build!(1, C1),
        (1, true) => build_alpha!(1, C1A),
        (2, false) => build!(2, C2),
        (2, true) => build_alpha!(2, C2A),
        (3, false) => build!(3, C3),
        (3, true) => build_alpha!(3, C3A),
        (4, false) => build!(4, C4),
        (c, a) => bail!("no representable image arity for ({c}, alpha={a})"),
    })
}

/// Applies a generic-arity geometry op across whichever `ImageRef` variant is present,
/// the small switch table design.rs's boundary note calls for, kept to one macro instead
/// of duplicating the match at every call site below.
macro_rules! for_variant {
    ($img:expr, |$i:ident| $body:expr) => {
        match $img {
            ImageRef::C1($i) => ImageRef::from($body),
            ImageRef::C1A($i) => ImageRef::from($body),
            ImageRef::C2($i) => ImageRef::from($body),
            ImageRef::C2A($i) => ImageRef::from($body),
            ImageRef::C3($i) => ImageRef::from($body),
            ImageRef::C3A($i) => ImageRef::from($body),
            ImageRef::C4($i) => ImageRef::from($body),
        }
    };
}

pub fn crop(img: &ImageRef, left: i64, bottom: i64, w: u32, h: u32) -> ImageRef {
    for_variant!(img, |i| geometry::crop(i, left, bottom, w, h, None))
}

pub fn flip_x(img: &ImageRef) -> ImageRef {
    for_variant!(img, |i| geometry::mirror_x(i))
}

pub fn flip_y(img: &ImageRef) -> ImageRef {
    for_variant!(img, |i| geometry::mirror_y(i))
}

pub fn scale(img: &ImageRef, w: u32, h: u32, filter: &str) -> Result<ImageRef> {
    let filter = parse_filter(filter)?;
    Ok(for_variant!(img, |i| geometry::scale(i, w, h, filter)))
}

pub fn rotate(img: &ImageRef, angle_radians: f64) -> ImageRef {
    for_variant!(img, |i| geometry::rotate(i, angle_radians, rasterkit_core::Colour::splat(0.0)))
}

pub fn mipmaps(img: &ImageRef, filter: &str) -> Result<Vec<ImageRef>> {
    let filter = parse_filter(filter)?;
    Ok(match img {
        ImageRef::C1(i) => geometry::mipmaps(i, filter).into_iter().map(ImageRef::from).collect(),
        ImageRef::C1A(i) => geometry::mipmaps(i, filter).into_iter().map(ImageRef::from).collect(),
        ImageRef::C2(i) => geometry::mipmaps(i, filter).into_iter().map(ImageRef::from).collect(),
        ImageRef::C2A(i) => geometry::mipmaps(i, filter).into_iter().map(ImageRef::from).collect(),
        ImageRef::C3(i) => geometry::mipmaps(i, filter).into_iter().map(ImageRef::from).collect(),
        ImageRef::C3A(i) => geometry::mipmaps(i, filter).into_iter().map(ImageRef::from).collect(),
        ImageRef::C4(i) => geometry::mipmaps(i, filter).into_iter().map(ImageRef::from).collect(),
    })
}

/// Full volume mip chain (`rasterkit_core::geometry::volume_mipmaps`) over a depth stack
/// of same-arity slices: each level halves width, height, *and* depth together via
/// 2x2x2 box averaging, unlike the per-slice [`mipmaps`] above.
pub fn volume_mipmaps(slices: &[ImageRef]) -> Result<Vec<Vec<ImageRef>>> {
    let Some(first) = slices.first() else {
        bail!("volume_mipmaps needs a non-empty depth stack");
    };

    macro_rules! build {
        ($variant:ident) => {{
            let imgs: Result<Vec<_>> = slices
                .iter()
                .map(|s| match s {
                    ImageRef::$variant(i) => Ok(i.clone()),
                    other => bail!(
                        "volume_mipmaps requires every slice to share one arity; got {} channels alpha={}",
                        other.colour_channels(),
                        other.has_alpha()
                    ),
                })
                .collect();
            geometry::volume_mipmaps(&imgs?)
                .into_iter()
                .map(|level| level.into_iter().map(ImageRef::from).collect())
                .collect()
        }};
    }

    Ok(match first {
        ImageRef::C1(_) => build!(C1),
        ImageRef::C1A(_) => build!(C1A),
        ImageRef::C2(_) => build!(C2),
        ImageRef::C2A(_) => build!(C2A),
        ImageRef::C3(_) => build!(C3),
        ImageRef::C3A(_) => build!(C3A),
        ImageRef::C4(_) => build!(C4),
    })
}

pub fn to_luminance(img: &ImageRef) -> Result<ImageRef> {
    Ok(match img {
        ImageRef::C3(i) => ImageRef::from(geometry::to_luminance(i)),
        ImageRef::C3A(i) => ImageRef::from(geometry::to_luminance(i)),
        other => bail!("to_luminance needs a 3-channel image, got {} channels", other.colour_channels()),
    })
}

pub fn swizzle(img: &ImageRef, spec: &str) -> Result<ImageRef> {
    rasterkit_core::swizzle::swizzle(img, spec).map_err(anyhow::Error::from)
}

fn parse_filter(name: &str) -> Result<Filter> {
    Ok(match name {
        "box" => Filter::Box,
        "bilinear" => Filter::Bilinear,
        "bspline" => Filter::BSpline,
        "bicubic" => Filter::Bicubic,
        "catmullrom" => Filter::CatmullRom,
        "lanczos3" => Filter::Lanczos3,
        other => bail!("unknown filter {other:?}, expected one of box/bilinear/bspline/bicubic/catmullrom/lanczos3"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn make_and_crop_round_trip_dimensions() {
        let img = make(4, 4, 3, false, &[1.0, 0.0, 0.0]).unwrap();
        let cropped = crop(&img, 1, 1, 2, 2);
        assert_eq!(cropped.width(), 2);
        assert_eq!(cropped.height(), 2);
    }

    #[test]
    fn save_and_load_sfi_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.sfi");
        let img = make(2, 2, 1, false, &[0.75]).unwrap();
        save(&img, &path, None, EncodeFlags::default()).unwrap();
        let back = load(&path).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn save_dds_without_format_tag_errs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.dds");
        let img = make(2, 2, 1, false, &[0.5]).unwrap();
        assert!(save(&img, &path, None, EncodeFlags::default()).is_err());
    }

    #[test]
    fn mipmaps_of_a_four_by_four_image_has_three_levels() {
        let img = make(4, 4, 1, false, &[1.0]).unwrap();
        let levels = mipmaps(&img, "box").unwrap();
        assert_eq!(levels.len(), 3);
    }

    #[test]
    fn volume_mipmaps_of_a_four_cubed_volume_has_three_levels_of_halved_depth() {
        let slices: Vec<ImageRef> = (0..4).map(|_| make(4, 4, 1, false, &[1.0]).unwrap()).collect();
        let levels = volume_mipmaps(&slices).unwrap();
        let shapes: Vec<(u32, u32, usize)> = levels.iter().map(|l| (l[0].width(), l[0].height(), l.len())).collect();
        assert_eq!(shapes, vec![(4, 4, 4), (2, 2, 2), (1, 1, 1)]);
        for level in &levels {
            for slice in level {
                match slice {
                    ImageRef::C1(i) => assert!((i.get(0, 0).colour()[0] - 1.0).abs() < 1e-5),
                    other => panic!("expected C1, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn volume_mipmaps_rejects_mismatched_arities() {
        let slices = vec![make(4, 4, 1, false, &[1.0]).unwrap(), make(4, 4, 3, false, &[1.0, 0.0, 0.0]).unwrap()];
        assert!(volume_mipmaps(&slices).is_err());
    }

    #[test]
    fn to_luminance_rejects_non_three_channel_input() {
        let img = make(2, 2, 1, false, &[0.5]).unwrap();
        assert!(to_luminance(&img).is_err());
    }
}

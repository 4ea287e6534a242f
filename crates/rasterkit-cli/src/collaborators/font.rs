//! TrueType rasterisation: an external collaborator. This crate does not implement font
//! shaping or glyph rasterisation: only the resource-lifetime contract a real
//! implementation would have to honour is captured here, per the process-wide library
//! handle and the per-call face handle described for the text subsystem.

use anyhow::bail;
use once_cell::sync::OnceCell;
use rasterkit_core::ImageRef;
use std::{path::Path, sync::Mutex};

/// Stands in for the process-wide font-library handle: a real rasteriser library is a
/// single process-global object, initialised once and torn down at exit. No such
/// library is linked here, so the cell only ever holds a placeholder.
static LIBRARY: OnceCell<Mutex<()>> = OnceCell::new();

fn library() -> &'static Mutex<()> {
    LIBRARY.get_or_init(|| Mutex::new(()))
}

/// A face handle scoped to a single text-render call. Its `Drop` releases the
/// process-wide library lock on every exit path, including an early `?` return, which
/// is the one invariant this contract exists to preserve.
pub struct FaceHandle<'a> {
    _lock: std::sync::MutexGuard<'a, ()>,
}

pub fn open_face(_path: &Path) -> anyhow::Result<FaceHandle<'static>> {
    bail!("TrueType rasterisation is not implemented by this crate; open_face exists to document the face-handle lifetime a real font-rasteriser collaborator must honour")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_singleton_is_lazily_shared() {
        assert!(std::ptr::eq(library(), library()));
    }

    #[test]
    fn open_face_reports_the_missing_collaborator() {
        assert!(open_face(Path::new("anything.ttf")).is_err());
    }
}

pub fn render_text(_face: &FaceHandle, _text: &str, _size_px: f32) -> anyhow::Result<ImageRef> {
    bail!("no face handle can be opened, see open_face")
}

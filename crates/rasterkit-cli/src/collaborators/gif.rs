//! GIF: only the static first frame is in scope (animated multi-frame GIF playback is a
//! documented non-goal). Delegates entirely to the `image` crate's GIF decoder, the same
//! one backing [`super::image_loader`] for every other raster format.

use anyhow::Result;
use rasterkit_core::ImageRef;
use std::path::Path;

pub fn load_first_frame(path: &Path) -> Result<ImageRef> {
    super::image_loader::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_errs_through_the_shared_loader() {
        assert!(load_first_frame(Path::new("/nonexistent/x.gif")).is_err());
    }
}

//! The legacy voxel renderer: an external collaborator the distilled spec treats as
//! contract-only, carried here so the command dispatcher has a call site to route to
//! once a real volume-rendering engine is wired in. No rendering happens in this crate.

use anyhow::bail;
use rasterkit_core::ImageRef;

pub struct Scene {
    pub voxels_path: std::path::PathBuf,
}

pub fn load_scene(path: &std::path::Path) -> anyhow::Result<Scene> {
    if !path.exists() {
        bail!("no voxel scene at '{}'", path.display());
    }
    Ok(Scene { voxels_path: path.to_owned() })
}

pub fn render(_scene: &Scene, _width: u32, _height: u32) -> anyhow::Result<ImageRef> {
    bail!("the legacy voxel renderer is not implemented by this crate; render() exists to document the collaborator's call shape")
}

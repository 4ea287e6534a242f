//! External collaborators: components the engine calls into but that carry no novel
//! design of their own: each module here documents the contract and delegates to a
//! real third-party crate rather than reimplementing the collaborator.

pub mod font;
pub mod gif;
pub mod image_loader;
pub mod script_host;
pub mod voxel;

//! Data module: file layout names, field selection, metadata and local pieces.

pub mod local_mesh;
pub mod metadata;
pub mod model;
pub mod selection;

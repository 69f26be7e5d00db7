// src/rendering_lib/mod.rs

pub mod geometry;
pub mod renderer;
pub mod shader;
pub mod vertex;

pub use geometry::Geometry;
pub use renderer::{FrameRenderer, GpuRenderer};
pub use shader::{FrameUniforms, FRAME_WGSL};
pub use vertex::Vertex;

// src/rendering_lib/shader.rs

use bytemuck::{Pod, Zeroable};

/// Per-frame data shared by every material. Matches `FrameUniforms` in `FRAME_WGSL`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub _padding: f32,
}

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// Bind group 0 and the vertex interface. Generated materials append their own
// `MaterialUniforms` (group 1) and entry points.
pub const FRAME_WGSL: &str = r#"struct FrameUniforms {
    view_proj: mat4x4<f32>,
    resolution: vec2<f32>,
    time: f32,
    _padding: f32,
}

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>, // object space, before displacement
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local_position: vec3<f32>,
    @location(1) uv: vec2<f32>,
}
"#;

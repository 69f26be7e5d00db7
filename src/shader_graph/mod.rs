// src/shader_graph/mod.rs

pub mod builders;
pub mod eval;
pub mod node;
pub mod typecheck;
pub mod uniform;
pub mod wgsl;

pub use builders::{
    canvas_graph, terrain_graph, CanvasGraph, CanvasPattern, TerrainColor, TerrainGraph,
    TerrainUniforms, AMPLITUDE_EPSILON,
};
pub use eval::{evaluate, EvalContext, Value};
pub use node::{Expr, Input, Node, ValueType};
pub use uniform::Uniform;
pub use wgsl::{compile_material, validate_wgsl, ShaderProgram, Space};

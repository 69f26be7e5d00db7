// src/error.rs

use thiserror::Error;

use crate::app::SessionState;
use crate::shader_graph::{Input, ValueType};

#[derive(Debug, Error)]
pub enum ShaderGraphError {
    #[error("type mismatch in {op}: {left} vs {right}")]
    TypeMismatch {
        op: &'static str,
        left: ValueType,
        right: ValueType,
    },
    #[error("cannot construct a vector from {0} components")]
    InvalidConstruct(usize),
    #[error("component {index} out of range for {ty}")]
    ComponentOutOfRange { index: usize, ty: ValueType },
    #[error("{input:?} is not available in the {stage} stage")]
    StageMismatch { input: Input, stage: &'static str },
    #[error("{expected} expected for {what}, got {found}")]
    UnexpectedType {
        what: &'static str,
        expected: &'static str,
        found: ValueType,
    },
    #[error("generated WGSL is invalid:\n{0}")]
    InvalidWgsl(String),
}

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("shader graph error: {0}")]
    Shader(#[from] ShaderGraphError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("unknown demo '{0}' (expected terrain, terrain-uv, squares or curves)")]
    UnknownDemo(String),
    #[error("cannot {action} a session that is {state:?}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
    #[error("failed to upload drawable: {0}")]
    Upload(String),
}

// src/engine_lib/mod.rs

pub mod camera;
pub mod controller;
pub mod frame_loop;
pub mod scene_types;
pub mod subscription;

pub use camera::PerspectiveCamera;
pub use controller::OrbitControls;
pub use frame_loop::FrameLoop;
pub use scene_types::{Drawable, DrawableId, Material, Scene};
pub use subscription::Subscription;

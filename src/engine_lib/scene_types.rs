// src/engine_lib/scene_types.rs

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::ShaderGraphError;
use crate::rendering_lib::geometry::Geometry;
use crate::shader_graph::{compile_material, Expr, ShaderProgram, Space, Uniform};
use crate::shader_graph::node::hex_to_linear;

pub type DrawableId = u32;

static NEXT_DRAWABLE_ID: AtomicU32 = AtomicU32::new(1);

/// A position expression and a color expression, compiled once at creation.
pub struct Material {
    space: Space,
    wireframe: Uniform<bool>,
    program: ShaderProgram,
}

impl Material {
    pub fn new(position: Expr, color: Expr, space: Space) -> Result<Self, ShaderGraphError> {
        let program = compile_material(&position, &color, space)?;
        Ok(Self {
            space,
            wireframe: Uniform::new("wireframe", false),
            program,
        })
    }

    pub fn space(&self) -> Space {
        self.space
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn wireframe(&self) -> &Uniform<bool> {
        &self.wireframe
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe.get()
    }
}

pub struct Drawable {
    id: DrawableId,
    label: String,
    pub geometry: Geometry,
    pub material: Material,
}

impl Drawable {
    pub fn new(label: &str, geometry: Geometry, material: Material) -> Self {
        Self {
            id: NEXT_DRAWABLE_ID.fetch_add(1, Ordering::Relaxed),
            label: label.to_string(),
            geometry,
            material,
        }
    }

    pub fn id(&self) -> DrawableId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Retained list of drawables plus the clear color.
pub struct Scene {
    /// Linear RGB.
    pub background: [f32; 3],
    drawables: Vec<Drawable>,
}

impl Scene {
    pub fn new(background_hex: u32) -> Self {
        Self {
            background: hex_to_linear(background_hex),
            drawables: Vec::new(),
        }
    }

    pub fn add(&mut self, drawable: Drawable) -> DrawableId {
        let id = drawable.id();
        log::debug!("Added '{}' ({id}) to scene", drawable.label());
        self.drawables.push(drawable);
        id
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.id() == id)
    }

    pub fn ids(&self) -> Vec<DrawableId> {
        self.drawables.iter().map(Drawable::id).collect()
    }

    pub fn clear(&mut self) {
        self.drawables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_graph::node::{color, position_local};

    fn quad() -> Drawable {
        let material = Material::new(position_local(), color(0xffffff), Space::Screen).unwrap();
        Drawable::new("quad", Geometry::plane(2.0, 2.0, 1, 1), material)
    }

    #[test]
    fn drawables_get_unique_ids() {
        let mut scene = Scene::new(0x111111);
        let a = scene.add(quad());
        let b = scene.add(quad());
        assert_ne!(a, b);
        assert_eq!(scene.ids(), vec![a, b]);
        assert_eq!(scene.get(b).map(Drawable::label), Some("quad"));
    }

    #[test]
    fn wireframe_flag_is_shared() {
        let d = quad();
        let flag = d.material.wireframe().clone();
        flag.set(true);
        assert!(d.material.is_wireframe());
    }

    #[test]
    fn background_is_linearized() {
        let scene = Scene::new(0x111111);
        assert!(scene.background[0] > 0.0 && scene.background[0] < 0.01);
    }
}

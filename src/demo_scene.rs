// src/demo_scene.rs

use crate::config::{Demo, SceneConfig, TerrainConfig};
use crate::engine_lib::scene_types::{Drawable, Material, Scene};
use crate::error::ShaderGraphError;
use crate::rendering_lib::geometry::Geometry;
use crate::shader_graph::{
    canvas_graph, terrain_graph, CanvasPattern, Space, TerrainColor, TerrainUniforms, Uniform,
};

/// Everything a session needs from the demo: the scene plus the handles the
/// parameter panel binds to (terrain demos only).
pub struct DemoScene {
    pub scene: Scene,
    pub terrain: Option<TerrainUniforms>,
    pub wireframe: Option<Uniform<bool>>,
}

/// Rippling terrain on a flat `size` x `size` grid in the XZ plane.
pub fn create_terrain(
    config: &TerrainConfig,
    color_mode: TerrainColor,
) -> Result<(Drawable, TerrainUniforms), ShaderGraphError> {
    let uniforms = TerrainUniforms::new(config.frequency, config.amplitude, config.speed);
    let graph = terrain_graph(&uniforms, color_mode);
    let material = Material::new(graph.position, graph.color, Space::World)?;

    let mut geometry = Geometry::plane(config.size, config.size, config.segments, config.segments);
    geometry.rotate_x(-std::f32::consts::FRAC_PI_2);

    Ok((Drawable::new("terrain", geometry, material), uniforms))
}

/// Full-screen quad in clip space running one of the canvas patterns.
pub fn create_shader_canvas(pattern: CanvasPattern) -> Result<Drawable, ShaderGraphError> {
    let graph = canvas_graph(pattern);
    let material = Material::new(graph.position, graph.color, Space::Screen)?;
    Ok(Drawable::new("shader canvas", Geometry::plane(2.0, 2.0, 1, 1), material))
}

pub fn create_demo_scene(config: &SceneConfig) -> Result<DemoScene, ShaderGraphError> {
    let mut scene = Scene::new(config.background);
    let terrain_color = TerrainColor::Gradient {
        low: config.terrain.low_color,
        high: config.terrain.high_color,
    };

    let (terrain, wireframe) = match config.demo {
        Demo::Terrain | Demo::TerrainScreenUv => {
            let mode = if config.demo == Demo::Terrain {
                terrain_color
            } else {
                TerrainColor::ScreenMapped
            };
            let (drawable, uniforms) = create_terrain(&config.terrain, mode)?;
            let wireframe = drawable.material.wireframe().clone();
            scene.add(drawable);
            (Some(uniforms), Some(wireframe))
        }
        Demo::NestedSquares => {
            scene.add(create_shader_canvas(CanvasPattern::NestedSquares)?);
            (None, None)
        }
        Demo::CurvePlot => {
            scene.add(create_shader_canvas(CanvasPattern::CurvePlot)?);
            (None, None)
        }
    };

    log::info!(
        "Built '{}' demo scene with {} drawable(s)",
        config.demo.name(),
        scene.drawables().len()
    );
    Ok(DemoScene { scene, terrain, wireframe })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_is_a_flat_subdivided_plane() {
        let config = TerrainConfig { segments: 8, ..Default::default() };
        let (drawable, uniforms) = create_terrain(&config, TerrainColor::ScreenMapped).unwrap();
        assert_eq!(drawable.geometry.vertices.len(), 81);
        assert!(drawable.geometry.vertices.iter().all(|v| v.position[1].abs() < 1e-4));
        assert_eq!(uniforms.amplitude.get(), 2.0);
        assert_eq!(drawable.material.space(), Space::World);
        assert_eq!(drawable.material.program().uniforms.len(), 3);
    }

    #[test]
    fn uniform_handle_drives_the_material() {
        let (drawable, uniforms) =
            create_terrain(&TerrainConfig::default(), TerrainColor::ScreenMapped).unwrap();
        uniforms.speed.set(4.5);
        let packed = drawable.material.program().pack_uniforms();
        assert!(packed[0].contains(&4.5));
    }

    #[test]
    fn each_demo_builds() {
        for demo in Demo::ALL {
            let config = SceneConfig { demo, ..Default::default() };
            let built = create_demo_scene(&config).unwrap();
            assert_eq!(built.scene.drawables().len(), 1);
            assert_eq!(built.terrain.is_some(), demo.is_terrain());
            assert_eq!(built.wireframe.is_some(), demo.is_terrain());
        }
    }

    #[test]
    fn canvas_is_a_clip_space_quad() {
        let drawable = create_shader_canvas(CanvasPattern::NestedSquares).unwrap();
        assert_eq!(drawable.material.space(), Space::Screen);
        assert_eq!(drawable.geometry.triangle_count(), 2);
        let xs: Vec<f32> = drawable.geometry.vertices.iter().map(|v| v.position[0]).collect();
        assert!(xs.contains(&-1.0) && xs.contains(&1.0));
    }
}

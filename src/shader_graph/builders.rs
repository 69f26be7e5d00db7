// src/shader_graph/builders.rs

use std::f32::consts::PI;

use super::node::*;
use super::uniform::Uniform;

/// Lower bound applied to the amplitude before it divides the wave height.
/// At amplitude 0 the wave is 0 everywhere, so the gradient factor settles at 0.5.
pub const AMPLITUDE_EPSILON: f32 = 1e-4;

/// The three values the terrain wave exposes for editing.
#[derive(Clone, Debug)]
pub struct TerrainUniforms {
    pub frequency: Uniform<f32>,
    pub amplitude: Uniform<f32>,
    pub speed: Uniform<f32>,
}

impl TerrainUniforms {
    pub fn new(frequency: f32, amplitude: f32, speed: f32) -> Self {
        Self {
            frequency: Uniform::new("frequency", frequency),
            amplitude: Uniform::new("amplitude", amplitude),
            speed: Uniform::new("speed", speed),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainColor {
    /// `mix(low, high, t01)` between two sRGB hex colors.
    Gradient { low: u32, high: u32 },
    /// `(screen_uv.x, t01, screen_uv.y)`.
    ScreenMapped,
}

pub struct TerrainGraph {
    /// Vertical offset of the surface.
    pub wave: Expr,
    /// Displaced position, `vec3(x, wave, z)`.
    pub position: Expr,
    /// Wave height normalized into [0, 1].
    pub t01: Expr,
    pub color: Expr,
}

pub fn terrain_graph(uniforms: &TerrainUniforms, color_mode: TerrainColor) -> TerrainGraph {
    let p = position_local();
    let x = p.x();
    let z = p.z();

    let dist = length(vec3(&x, 0.0, &z));
    let wave = sin(dist * &uniforms.frequency - time() * &uniforms.speed) * &uniforms.amplitude;
    let position = vec3(&x, &wave, &z);

    let t01 = &wave / max(&uniforms.amplitude, AMPLITUDE_EPSILON) * 0.5 + 0.5;

    let color = match color_mode {
        TerrainColor::Gradient { low, high } => mix(color(low), color(high), &t01),
        TerrainColor::ScreenMapped => {
            let s = screen_uv();
            vec4(s.x(), &t01, s.y(), 1.0)
        }
    };

    TerrainGraph { wave, position, t01, color }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasPattern {
    /// Concentric squares under a circle whose edge pulses with time.
    NestedSquares,
    /// Per-channel shaping curves with a plotted line for each.
    CurvePlot,
}

pub struct CanvasGraph {
    pub position: Expr,
    pub color: Expr,
}

pub const SQUARES_BACKGROUND: u32 = 0x16213e;
pub const SQUARES_OUTER: u32 = 0x0f3460;
pub const SQUARES_INNER: u32 = 0x533483;
pub const SQUARES_CIRCLE: u32 = 0xe94560;
pub const OUTER_MARGIN: f32 = 0.1;
pub const INNER_MARGIN: f32 = 0.25;
pub const CIRCLE_RADIUS: f32 = 0.15;
pub const HEARTBEAT_RATE: f32 = 3.0;

pub fn canvas_graph(pattern: CanvasPattern) -> CanvasGraph {
    // Screen UV has its origin top-left; flip so y points up.
    let s = screen_uv();
    let st = vec2(s.x(), 1.0 - s.y());
    let color = match pattern {
        CanvasPattern::NestedSquares => nested_squares(&st),
        CanvasPattern::CurvePlot => curve_plot(&st),
    };
    CanvasGraph { position: position_local(), color }
}

/// 1.0 where `st` lies in `[margin, 1 - margin)` on both axes, else 0.0.
pub fn square_mask(st: &Expr, margin: f32) -> Expr {
    let lower = step(margin, st);
    let upper = 1.0 - step(1.0 - margin, st);
    let inside = lower * upper;
    inside.x() * inside.y()
}

/// Circle edge half-width. Always positive, so the smoothstep edges never cross.
pub fn heartbeat_softness() -> Expr {
    let beat = 0.5 + 0.5 * sin(time() * HEARTBEAT_RATE);
    0.005 + 0.06 * beat
}

fn nested_squares(st: &Expr) -> Expr {
    let mut layered = color(SQUARES_BACKGROUND);
    layered = mix(layered, color(SQUARES_OUTER), square_mask(st, OUTER_MARGIN));
    layered = mix(layered, color(SQUARES_INNER), square_mask(st, INNER_MARGIN));

    let softness = heartbeat_softness();
    let d = distance(st, vec2(0.5, 0.5));
    let circle = 1.0 - smoothstep(CIRCLE_RADIUS - &softness, CIRCLE_RADIUS + &softness, d);
    mix(layered, color(SQUARES_CIRCLE), circle)
}

/// A thin band around the curve value `pct`, peaking at `st.y == pct`.
pub fn plot(st: &Expr, pct: &Expr) -> Expr {
    let y = st.y();
    smoothstep(pct - 0.01, pct, &y) - smoothstep(pct, pct + 0.01, &y)
}

fn curve_plot(st: &Expr) -> Expr {
    let x = st.x();
    let pct = vec3(
        smoothstep(0.0, 1.0, &x),
        sin(&x * PI),
        1.0 - pow(&x, 0.5),
    );

    let mut shaded = mix(constant_vec3([0.0, 0.0, 0.0]), constant_vec3([1.0, 1.0, 1.0]), &pct);
    shaded = mix(shaded, constant_vec3([1.0, 0.0, 0.0]), plot(st, &pct.x()));
    shaded = mix(shaded, constant_vec3([0.0, 1.0, 0.0]), plot(st, &pct.y()));
    mix(shaded, constant_vec3([0.0, 0.0, 1.0]), plot(st, &pct.z()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader_graph::{compile_material, evaluate, EvalContext, Space};
    use glam::{Vec2, Vec3};
    use rand::Rng;

    const GRADIENT: TerrainColor = TerrainColor::Gradient { low: 0x0033aa, high: 0x00ffcc };

    fn scalar(e: &Expr, ctx: &EvalContext) -> f32 {
        evaluate(e, ctx).unwrap().as_f32().unwrap()
    }

    fn canvas_color(pattern: CanvasPattern, screen: Vec2, time: f32) -> Vec3 {
        let graph = canvas_graph(pattern);
        evaluate(&graph.color, &EvalContext::at_screen_uv(screen, time))
            .unwrap()
            .as_vec3()
            .unwrap()
    }

    fn linear(hex: u32) -> Vec3 {
        Vec3::from(hex_to_linear(hex))
    }

    #[test]
    fn displacement_at_origin_is_position_independent() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let freq = rng.gen_range(0.01..=5.0);
            let amp = rng.gen_range(0.0..=8.0);
            let speed = rng.gen_range(0.0..=5.0);
            let t = rng.gen_range(0.0..100.0);
            let uniforms = TerrainUniforms::new(freq, amp, speed);
            let graph = terrain_graph(&uniforms, TerrainColor::ScreenMapped);
            let got = scalar(&graph.wave, &EvalContext::at_position(Vec3::ZERO, t));
            let expected = (-t * speed).sin() * amp;
            assert!((got - expected).abs() < 1e-4, "freq={freq} amp={amp} speed={speed} t={t}");
        }
    }

    #[test]
    fn gradient_factor_stays_in_unit_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let uniforms = TerrainUniforms::new(
                rng.gen_range(0.01..=5.0),
                rng.gen_range(0.1..=8.0),
                rng.gen_range(0.0..=5.0),
            );
            let graph = terrain_graph(&uniforms, GRADIENT);
            let p = Vec3::new(rng.gen_range(-15.0..15.0), 0.0, rng.gen_range(-15.0..15.0));
            let t01 = scalar(&graph.t01, &EvalContext::at_position(p, rng.gen_range(0.0..1000.0)));
            assert!((-1e-5..=1.0 + 1e-5).contains(&t01), "t01 = {t01}");
        }
    }

    #[test]
    fn zero_amplitude_flattens_and_centers_the_gradient() {
        let uniforms = TerrainUniforms::new(1.3, 0.0, 2.0);
        let graph = terrain_graph(&uniforms, GRADIENT);
        for (x, z, t) in [(0.0, 0.0, 0.0), (3.0, -4.0, 1.7), (14.0, 9.5, 250.0)] {
            let ctx = EvalContext::at_position(Vec3::new(x, 0.0, z), t);
            assert_eq!(scalar(&graph.wave, &ctx), 0.0);
            assert_eq!(scalar(&graph.t01, &ctx), 0.5);
        }
    }

    #[test]
    fn displaced_position_keeps_horizontal_coordinates() {
        let uniforms = TerrainUniforms::new(1.0, 2.0, 1.0);
        let graph = terrain_graph(&uniforms, TerrainColor::ScreenMapped);
        let ctx = EvalContext::at_position(Vec3::new(3.0, 0.0, 4.0), 0.0);
        let p = evaluate(&graph.position, &ctx).unwrap().as_vec3().unwrap();
        assert_eq!((p.x, p.z), (3.0, 4.0));
        assert!((p.y - 5.0_f32.sin() * 2.0).abs() < 1e-5);
    }

    #[test]
    fn uniform_edits_change_the_next_evaluation() {
        let uniforms = TerrainUniforms::new(1.0, 2.0, 1.0);
        let graph = terrain_graph(&uniforms, TerrainColor::ScreenMapped);
        let ctx = EvalContext::at_position(Vec3::new(1.0, 0.0, 0.0), 0.0);
        let before = scalar(&graph.wave, &ctx);
        uniforms.amplitude.set(4.0);
        assert!((scalar(&graph.wave, &ctx) - 2.0 * before).abs() < 1e-5);
    }

    #[test]
    fn screen_mapped_color_passes_screen_coordinates_through() {
        let uniforms = TerrainUniforms::new(1.0, 2.0, 1.0);
        let graph = terrain_graph(&uniforms, TerrainColor::ScreenMapped);
        let ctx = EvalContext {
            screen_uv: Vec2::new(0.25, 0.75),
            ..Default::default()
        };
        let rgba = evaluate(&graph.color, &ctx).unwrap().as_array4().unwrap();
        assert_eq!(rgba[0], 0.25);
        assert_eq!(rgba[2], 0.75);
        assert_eq!(rgba[3], 1.0);
    }

    #[test]
    fn square_mask_is_half_open() {
        let ctx = EvalContext::default();
        let at = |x: f32, y: f32| scalar(&square_mask(&vec2(x, y), OUTER_MARGIN), &ctx);
        assert_eq!(at(OUTER_MARGIN, 0.5), 1.0);
        assert_eq!(at(1.0 - OUTER_MARGIN, 0.5), 0.0);
        assert_eq!(at(0.5, 0.05), 0.0);
        assert_eq!(at(0.0, 0.0), 0.0);
        let full = |x: f32| scalar(&square_mask(&vec2(x, x), 0.0), &ctx);
        assert_eq!(full(0.0), 1.0);
        assert_eq!(full(0.999), 1.0);
    }

    #[test]
    fn nested_squares_layers_in_order() {
        let pattern = CanvasPattern::NestedSquares;
        assert_eq!(canvas_color(pattern, Vec2::new(0.02, 0.5), 0.0), linear(SQUARES_BACKGROUND));
        assert_eq!(canvas_color(pattern, Vec2::new(0.15, 0.5), 0.0), linear(SQUARES_OUTER));
        assert_eq!(canvas_color(pattern, Vec2::new(0.27, 0.5), 0.0), linear(SQUARES_INNER));
        assert_eq!(canvas_color(pattern, Vec2::new(0.5, 0.5), 0.0), linear(SQUARES_CIRCLE));
    }

    #[test]
    fn circle_edge_softness_pulses_with_time() {
        let ctx_at = |t: f32| EvalContext::at_screen_uv(Vec2::ZERO, t);
        let quiet = scalar(&heartbeat_softness(), &ctx_at(-PI / (2.0 * HEARTBEAT_RATE)));
        let peak = scalar(&heartbeat_softness(), &ctx_at(PI / (2.0 * HEARTBEAT_RATE)));
        assert!((quiet - 0.005).abs() < 1e-5);
        assert!((peak - 0.065).abs() < 1e-5);

        // A point just outside the hard radius is only tinted while the edge is soft.
        let edge = Vec2::new(0.5 + CIRCLE_RADIUS + 0.02, 0.5);
        let soft = canvas_color(CanvasPattern::NestedSquares, edge, PI / (2.0 * HEARTBEAT_RATE));
        let hard = canvas_color(CanvasPattern::NestedSquares, edge, -PI / (2.0 * HEARTBEAT_RATE));
        assert_eq!(hard, linear(SQUARES_INNER));
        assert_ne!(soft, hard);
    }

    #[test]
    fn curve_plot_draws_red_line_on_its_curve() {
        // x = 0.5: red curve smoothstep(0, 1, 0.5) = 0.5, so the red plot peaks at y = 0.5.
        let on_line = canvas_color(CanvasPattern::CurvePlot, Vec2::new(0.5, 0.5), 0.0);
        assert!((on_line.x - 1.0).abs() < 1e-5);
        assert!(on_line.y < 1e-5);
        assert!(on_line.z < 1e-5);
    }

    #[test]
    fn every_builder_output_compiles_to_valid_wgsl() {
        let uniforms = TerrainUniforms::new(1.0, 2.0, 1.0);
        for mode in [GRADIENT, TerrainColor::ScreenMapped] {
            let graph = terrain_graph(&uniforms, mode);
            let program = compile_material(&graph.position, &graph.color, Space::World).unwrap();
            assert_eq!(program.uniforms.len(), 3);
        }
        for pattern in [CanvasPattern::NestedSquares, CanvasPattern::CurvePlot] {
            let graph = canvas_graph(pattern);
            let program = compile_material(&graph.position, &graph.color, Space::Screen).unwrap();
            assert!(program.uniforms.is_empty());
        }
    }
}

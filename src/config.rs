// src/config.rs

use std::str::FromStr;

use glam::Vec3;

use crate::error::DemoError;

/// Slider bounds for one editable parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const FREQUENCY_RANGE: ParamRange = ParamRange { min: 0.01, max: 5.0, step: 0.01 };
pub const AMPLITUDE_RANGE: ParamRange = ParamRange { min: 0.0, max: 8.0, step: 0.1 };
pub const SPEED_RANGE: ParamRange = ParamRange { min: 0.0, max: 5.0, step: 0.1 };

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Demo {
    /// Rippling terrain with a blue-to-cyan height gradient.
    #[default]
    Terrain,
    /// Rippling terrain colored by screen position and height.
    TerrainScreenUv,
    NestedSquares,
    CurvePlot,
}

impl Demo {
    pub const ALL: [Demo; 4] = [
        Demo::Terrain,
        Demo::TerrainScreenUv,
        Demo::NestedSquares,
        Demo::CurvePlot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Demo::Terrain => "terrain",
            Demo::TerrainScreenUv => "terrain-uv",
            Demo::NestedSquares => "squares",
            Demo::CurvePlot => "curves",
        }
    }

    pub fn is_terrain(self) -> bool {
        matches!(self, Demo::Terrain | Demo::TerrainScreenUv)
    }
}

impl FromStr for Demo {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Demo::ALL
            .into_iter()
            .find(|demo| demo.name() == wanted)
            .ok_or_else(|| DemoError::UnknownDemo(s.to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub fov_y_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 60.0,
            znear: 0.1,
            zfar: 1000.0,
            position: Vec3::new(0.0, 12.0, 20.0),
            target: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct OrbitConfig {
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            min_distance: 5.0,
            max_distance: 60.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TerrainConfig {
    pub size: f32,
    pub segments: u32,
    pub frequency: f32,
    pub amplitude: f32,
    pub speed: f32,
    pub low_color: u32,
    pub high_color: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 30.0,
            segments: 200,
            frequency: 1.0,
            amplitude: 2.0,
            speed: 1.0,
            low_color: 0x0033aa,  // troughs
            high_color: 0x00ffcc, // peaks
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub demo: Demo,
    pub window_title: String,
    pub window_size: (u32, u32),
    /// Requested MSAA sample count; the renderer drops to 1 if unsupported.
    pub msaa_samples: u32,
    pub background: u32,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub terrain: TerrainConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            demo: Demo::default(),
            window_title: "Procedural Shader Demo".to_string(),
            window_size: (1280, 720),
            msaa_samples: 4,
            background: 0x111111,
            camera: CameraConfig::default(),
            orbit: OrbitConfig::default(),
            terrain: TerrainConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Reads the demo name from the first argument after the program name.
    /// Unknown names fall back to the default demo.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut config = Self::default();
        if let Some(arg) = args.into_iter().nth(1) {
            match arg.parse::<Demo>() {
                Ok(demo) => config.demo = demo,
                Err(e) => log::warn!("{e}; using '{}'", config.demo.name()),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn demo_names_round_trip() {
        for demo in Demo::ALL {
            assert_eq!(demo.name().parse::<Demo>().unwrap(), demo);
        }
        assert_eq!(" Squares ".parse::<Demo>().unwrap(), Demo::NestedSquares);
    }

    #[test]
    fn from_args_picks_demo_or_falls_back() {
        assert_eq!(SceneConfig::from_args(args(&["demo"])).demo, Demo::Terrain);
        assert_eq!(SceneConfig::from_args(args(&["demo", "curves"])).demo, Demo::CurvePlot);
        assert_eq!(SceneConfig::from_args(args(&["demo", "nope"])).demo, Demo::Terrain);
    }

    #[test]
    fn scene_is_antialiased_by_default() {
        assert_eq!(SceneConfig::default().msaa_samples, 4);
        assert_eq!(SceneConfig::from_args(args(&["demo", "squares"])).msaa_samples, 4);
    }

    #[test]
    fn defaults_sit_inside_their_ranges() {
        let terrain = TerrainConfig::default();
        assert!(FREQUENCY_RANGE.contains(terrain.frequency));
        assert!(AMPLITUDE_RANGE.contains(terrain.amplitude));
        assert!(SPEED_RANGE.contains(terrain.speed));
        let distance = CameraConfig::default().position.distance(Vec3::ZERO);
        let orbit = OrbitConfig::default();
        assert!(distance > orbit.min_distance && distance < orbit.max_distance);
    }
}

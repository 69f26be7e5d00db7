// src/ui.rs
use egui;

use crate::config::{ParamRange, AMPLITUDE_RANGE, FREQUENCY_RANGE, SPEED_RANGE};
use crate::shader_graph::{TerrainUniforms, Uniform};

enum Control {
    Slider { target: Uniform<f32>, range: ParamRange, value: f32 },
    Toggle { target: Uniform<bool>, value: bool },
}

struct Binding {
    key: &'static str,
    control: Control,
}

/// Floating panel of controls, each bound to one uniform. Every edit is written
/// straight through to its uniform.
pub struct ParameterPanel {
    title: String,
    bindings: Vec<Binding>,
    disposed: bool,
}

impl ParameterPanel {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            bindings: Vec::new(),
            disposed: false,
        }
    }

    pub fn for_terrain(uniforms: &TerrainUniforms, wireframe: &Uniform<bool>) -> Self {
        let mut panel = Self::new("Wave Controls");
        panel
            .add_slider("frequency", &uniforms.frequency, FREQUENCY_RANGE)
            .add_slider("amplitude", &uniforms.amplitude, AMPLITUDE_RANGE)
            .add_slider("speed", &uniforms.speed, SPEED_RANGE)
            .add_toggle("wireframe", wireframe);
        panel
    }

    pub fn add_slider(
        &mut self,
        key: &'static str,
        target: &Uniform<f32>,
        range: ParamRange,
    ) -> &mut Self {
        self.bindings.push(Binding {
            key,
            control: Control::Slider { target: target.clone(), range, value: target.get() },
        });
        self
    }

    pub fn add_toggle(&mut self, key: &'static str, target: &Uniform<bool>) -> &mut Self {
        self.bindings.push(Binding {
            key,
            control: Control::Toggle { target: target.clone(), value: target.get() },
        });
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.bindings.iter().map(|b| b.key).collect()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn range_of(&self, key: &str) -> Option<ParamRange> {
        self.bindings.iter().find_map(|b| match &b.control {
            Control::Slider { range, .. } if b.key == key => Some(*range),
            _ => None,
        })
    }

    /// The slider change path: clamps to the slider's range, mirrors the value and
    /// writes the uniform. Returns false if no such slider exists.
    pub fn set_number(&mut self, key: &str, new_value: f32) -> bool {
        for binding in &mut self.bindings {
            if let Control::Slider { target, range, value } = &mut binding.control {
                if binding.key == key {
                    *value = range.clamp(new_value);
                    target.set(*value);
                    return true;
                }
            }
        }
        false
    }

    pub fn set_flag(&mut self, key: &str, new_value: bool) -> bool {
        for binding in &mut self.bindings {
            if let Control::Toggle { target, value } = &mut binding.control {
                if binding.key == key {
                    *value = new_value;
                    target.set(new_value);
                    return true;
                }
            }
        }
        false
    }

    // Uniforms can be written outside the panel; controls always start from the
    // current value.
    fn sync_from_uniforms(&mut self) {
        for binding in &mut self.bindings {
            match &mut binding.control {
                Control::Slider { target, value, .. } => *value = target.get(),
                Control::Toggle { target, value } => *value = target.get(),
            }
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        if self.disposed || self.bindings.is_empty() {
            return;
        }
        self.sync_from_uniforms();
        egui::Window::new(self.title.as_str())
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
            .resizable(false)
            .show(ctx, |ui| {
                for binding in &mut self.bindings {
                    match &mut binding.control {
                        Control::Slider { target, range, value } => {
                            let slider = egui::Slider::new(value, range.min..=range.max)
                                .step_by(range.step as f64)
                                .text(binding.key);
                            if ui.add(slider).changed() {
                                target.set(*value);
                            }
                        }
                        Control::Toggle { target, value } => {
                            if ui.checkbox(value, binding.key).changed() {
                                target.set(*value);
                            }
                        }
                    }
                }
            });
    }

    /// Removes every control. Uniforms keep their last values.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.bindings.clear();
        log::debug!("Parameter panel '{}' disposed", self.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terrain_panel() -> (ParameterPanel, TerrainUniforms, Uniform<bool>) {
        let uniforms = TerrainUniforms::new(1.0, 2.0, 1.0);
        let wireframe = Uniform::new("wireframe", false);
        let panel = ParameterPanel::for_terrain(&uniforms, &wireframe);
        (panel, uniforms, wireframe)
    }

    #[test]
    fn terrain_panel_exposes_four_controls() {
        let (panel, _, _) = terrain_panel();
        assert_eq!(panel.title(), "Wave Controls");
        assert_eq!(panel.keys(), vec!["frequency", "amplitude", "speed", "wireframe"]);
        assert_eq!(panel.range_of("frequency"), Some(FREQUENCY_RANGE));
        assert_eq!(panel.range_of("amplitude").map(|r| (r.min, r.max)), Some((0.0, 8.0)));
        assert_eq!(panel.range_of("speed").map(|r| r.step), Some(0.1));
        assert_eq!(panel.range_of("wireframe"), None);
    }

    #[test]
    fn edits_write_through_to_uniforms() {
        let (mut panel, uniforms, wireframe) = terrain_panel();
        assert!(panel.set_number("frequency", 3.2));
        assert!(panel.set_flag("wireframe", true));
        assert_eq!(uniforms.frequency.get(), 3.2);
        assert!(wireframe.get());
        assert!(!panel.set_number("wireframe", 1.0));
        assert!(!panel.set_flag("speed", true));
    }

    #[test]
    fn edits_are_held_to_the_slider_range() {
        let (mut panel, uniforms, _) = terrain_panel();
        panel.set_number("amplitude", 20.0);
        assert_eq!(uniforms.amplitude.get(), 8.0);
        panel.set_number("frequency", 0.0);
        assert_eq!(uniforms.frequency.get(), 0.01);
    }

    #[test]
    fn dispose_removes_controls_and_keeps_values() {
        let (mut panel, uniforms, _) = terrain_panel();
        panel.set_number("speed", 2.0);
        panel.dispose();
        panel.dispose();
        assert!(panel.is_disposed());
        assert!(panel.keys().is_empty());
        assert!(!panel.set_number("speed", 4.0));
        assert_eq!(uniforms.speed.get(), 2.0);
    }

    #[test]
    fn controls_pick_up_writes_made_outside_the_panel() {
        let (mut panel, uniforms, wireframe) = terrain_panel();
        uniforms.frequency.set(4.2);
        wireframe.set(true);
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| panel.show(ctx));

        let shown: Vec<(f32, bool)> = panel
            .bindings
            .iter()
            .map(|b| match &b.control {
                Control::Slider { value, .. } => (*value, false),
                Control::Toggle { value, .. } => (0.0, *value),
            })
            .collect();
        assert_eq!(shown[0], (4.2, false));
        assert_eq!(shown[3], (0.0, true));
        assert_eq!(uniforms.frequency.get(), 4.2);
    }

    #[test]
    fn show_runs_headless() {
        let (mut panel, uniforms, _) = terrain_panel();
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| panel.show(ctx));
        assert_eq!(uniforms.frequency.get(), 1.0);
    }
}

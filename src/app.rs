// src/app.rs

use winit::event::WindowEvent;

use crate::config::SceneConfig;
use crate::demo_scene::create_demo_scene;
use crate::engine_lib::camera::PerspectiveCamera;
use crate::engine_lib::controller::OrbitControls;
use crate::engine_lib::frame_loop::FrameLoop;
use crate::engine_lib::scene_types::Scene;
use crate::engine_lib::subscription::Subscription;
use crate::error::DemoError;
use crate::rendering_lib::renderer::FrameRenderer;
use crate::shader_graph::TerrainUniforms;
use crate::ui::ParameterPanel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Running,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Rendered,
    /// The loop is not running; nothing was drawn.
    Stopped,
    /// The surface is unrecoverable and the host should shut down.
    Exit,
}

/// One mounted view: renderer, camera, controls, drawables, panel and the resize
/// listener. Built on `mount`, torn down once by `dispose`.
pub struct SceneSession<R: FrameRenderer> {
    config: SceneConfig,
    state: SessionState,
    renderer: Option<R>,
    scene: Option<Scene>,
    camera: Option<PerspectiveCamera>,
    controls: Option<OrbitControls>,
    panel: Option<ParameterPanel>,
    terrain: Option<TerrainUniforms>,
    resize_listener: Option<Subscription>,
    frame_loop: FrameLoop,
    elapsed: f32,
}

impl<R: FrameRenderer> SceneSession<R> {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
            renderer: None,
            scene: None,
            camera: None,
            controls: None,
            panel: None,
            terrain: None,
            resize_listener: None,
            frame_loop: FrameLoop::default(),
            elapsed: 0.0,
        }
    }

    /// Builds the scene around an initialized renderer and starts the frame loop.
    /// On error the partially built session is left for `dispose` to clean up.
    pub fn mount(&mut self, renderer: R) -> Result<(), DemoError> {
        if self.state != SessionState::Uninitialized || self.renderer.is_some() {
            return Err(DemoError::InvalidTransition { state: self.state, action: "mount" });
        }
        let (width, height) = renderer.surface_size();
        let renderer = self.renderer.insert(renderer);

        let built = create_demo_scene(&self.config)?;
        let scene = self.scene.insert(built.scene);
        for drawable in scene.drawables() {
            renderer.upload(drawable)?;
        }

        self.camera = Some(PerspectiveCamera::new(
            &self.config.camera,
            width.max(1) as f32 / height.max(1) as f32,
        ));
        self.controls = Some(OrbitControls::new(&self.config.orbit));
        self.panel = match (&built.terrain, &built.wireframe) {
            (Some(uniforms), Some(wireframe)) => {
                Some(ParameterPanel::for_terrain(uniforms, wireframe))
            }
            _ => None,
        };
        self.terrain = built.terrain;

        self.resize_listener = Some(Subscription::attach("resize"));
        self.frame_loop.start();
        self.state = SessionState::Running;
        log::info!("Session mounted at {width}x{height}");
        Ok(())
    }

    /// One iteration of the render loop: orbit update, then a single render.
    pub fn frame(&mut self, dt: f32) -> FrameStatus {
        if !self.frame_loop.begin_frame() {
            return FrameStatus::Stopped;
        }
        let (Some(renderer), Some(scene), Some(camera), Some(controls)) = (
            self.renderer.as_mut(),
            self.scene.as_ref(),
            self.camera.as_mut(),
            self.controls.as_mut(),
        ) else {
            return FrameStatus::Stopped;
        };

        self.elapsed += dt;
        controls.update(camera);

        match renderer.render(scene, camera, self.elapsed, self.panel.as_mut()) {
            Ok(()) => FrameStatus::Rendered,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = renderer.surface_size();
                log::warn!("Surface lost, reconfiguring at {width}x{height}");
                renderer.resize(width, height);
                FrameStatus::Rendered
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("WGPU out of memory, exiting");
                FrameStatus::Exit
            }
            Err(e) => {
                log::warn!("Surface error: {e:?}");
                FrameStatus::Rendered
            }
        }
    }

    /// Returns true if the resize was applied.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let listening = self.resize_listener.as_ref().is_some_and(Subscription::is_active);
        if self.state != SessionState::Running || !listening || width == 0 || height == 0 {
            return false;
        }
        if let Some(camera) = self.camera.as_mut() {
            camera.set_aspect(width, height);
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(width, height);
        }
        true
    }

    /// Routes input to the overlay first, then to the orbit controls.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        if self.renderer.as_mut().is_some_and(|r| r.on_window_event(event)) {
            return true;
        }
        let viewport_height = self.renderer.as_ref().map_or(1, |r| r.surface_size().1) as f32;
        self.controls
            .as_mut()
            .is_some_and(|c| c.handle_window_event(event, viewport_height))
    }

    /// Tears the session down. The frame loop is cancelled before anything else is
    /// released. Safe to call repeatedly and after a failed `mount`.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        self.frame_loop.cancel();
        if let Some(listener) = self.resize_listener.as_mut() {
            listener.release();
        }
        if let Some(controls) = self.controls.as_mut() {
            controls.dispose();
        }
        if let Some(panel) = self.panel.as_mut() {
            panel.dispose();
        }
        if let Some(renderer) = self.renderer.as_mut() {
            if let Some(scene) = self.scene.as_ref() {
                for id in scene.ids() {
                    renderer.release(id);
                }
            }
            renderer.dispose();
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.clear();
        }
        self.state = SessionState::Disposed;
        log::info!("Session disposed after {} frames", self.frame_loop.frames());
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.camera.as_ref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut ParameterPanel> {
        self.panel.as_mut()
    }

    pub fn terrain_uniforms(&self) -> Option<&TerrainUniforms> {
        self.terrain.as_ref()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl<R: FrameRenderer> Drop for SceneSession<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::Demo;
    use crate::engine_lib::scene_types::{Drawable, DrawableId};

    #[derive(Default)]
    struct Log {
        size: (u32, u32),
        resizes: Vec<(u32, u32)>,
        // (camera aspect, time, uniform values by name)
        renders: Vec<(f32, f32, Vec<(String, f32)>)>,
        uploads: Vec<DrawableId>,
        releases: Vec<DrawableId>,
        disposals: u32,
        fail_upload: bool,
        fail_next: Option<wgpu::SurfaceError>,
    }

    struct RecordingRenderer(Rc<RefCell<Log>>);

    impl FrameRenderer for RecordingRenderer {
        fn surface_size(&self) -> (u32, u32) {
            self.0.borrow().size
        }

        fn resize(&mut self, width: u32, height: u32) {
            let mut log = self.0.borrow_mut();
            log.size = (width, height);
            log.resizes.push((width, height));
        }

        fn upload(&mut self, drawable: &Drawable) -> Result<(), DemoError> {
            let mut log = self.0.borrow_mut();
            if log.fail_upload {
                return Err(DemoError::Upload(drawable.label().to_string()));
            }
            log.uploads.push(drawable.id());
            Ok(())
        }

        fn render(
            &mut self,
            scene: &Scene,
            camera: &PerspectiveCamera,
            time: f32,
            _panel: Option<&mut ParameterPanel>,
        ) -> Result<(), wgpu::SurfaceError> {
            let mut log = self.0.borrow_mut();
            if let Some(err) = log.fail_next.take() {
                return Err(err);
            }
            let uniforms = scene
                .drawables()
                .iter()
                .flat_map(|d| d.material.program().uniforms.iter())
                .map(|u| (u.name().to_string(), u.get()))
                .collect();
            log.renders.push((camera.aspect, time, uniforms));
            Ok(())
        }

        fn release(&mut self, id: DrawableId) -> bool {
            self.0.borrow_mut().releases.push(id);
            true
        }

        fn dispose(&mut self) {
            self.0.borrow_mut().disposals += 1;
        }
    }

    fn mounted(demo: Demo) -> (SceneSession<RecordingRenderer>, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log { size: (800, 600), ..Default::default() }));
        let mut session = SceneSession::new(SceneConfig { demo, ..Default::default() });
        session.mount(RecordingRenderer(log.clone())).unwrap();
        (session, log)
    }

    fn rendered_uniform(log: &Log, frame: usize, name: &str) -> Option<f32> {
        log.renders[frame].2.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    #[test]
    fn mount_starts_running_session() {
        let (session, log) = mounted(Demo::Terrain);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(log.borrow().uploads, session.scene().unwrap().ids());
        assert!((session.camera().unwrap().aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!(session.terrain_uniforms().is_some());
    }

    #[test]
    fn each_frame_renders_once_with_accumulated_time() {
        let (mut session, log) = mounted(Demo::NestedSquares);
        assert_eq!(session.frame(0.5), FrameStatus::Rendered);
        assert_eq!(session.frame(0.25), FrameStatus::Rendered);
        let log = log.borrow();
        assert_eq!(log.renders.len(), 2);
        assert_eq!(log.renders[1].1, 0.75);
    }

    #[test]
    fn panel_edit_is_seen_by_next_render() {
        let (mut session, log) = mounted(Demo::Terrain);
        session.frame(0.016);
        session.panel_mut().unwrap().set_number("amplitude", 6.5);
        session.frame(0.016);
        let log = log.borrow();
        assert_eq!(rendered_uniform(&log, 0, "amplitude"), Some(2.0));
        assert_eq!(rendered_uniform(&log, 1, "amplitude"), Some(6.5));
    }

    #[test]
    fn resize_updates_aspect_and_surface() {
        let (mut session, log) = mounted(Demo::Terrain);
        assert!(session.resize(1920, 1080));
        session.frame(0.016);
        let log = log.borrow();
        assert_eq!(log.size, (1920, 1080));
        assert!((log.renders[0].0 - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let (mut session, log) = mounted(Demo::Terrain);
        assert!(!session.resize(0, 600));
        assert!(log.borrow().resizes.is_empty());
    }

    #[test]
    fn dispose_is_idempotent_and_stops_callbacks() {
        let (mut session, log) = mounted(Demo::Terrain);
        let ids = session.scene().unwrap().ids();
        session.dispose();
        session.dispose();
        assert_eq!(session.state(), SessionState::Disposed);
        assert_eq!(session.frame(0.016), FrameStatus::Stopped);
        assert!(!session.resize(640, 480));
        assert!(session.panel_mut().unwrap().is_disposed());

        let log = log.borrow();
        assert_eq!(log.disposals, 1);
        assert_eq!(log.releases, ids);
        assert!(log.renders.is_empty());
        assert!(log.resizes.is_empty());
    }

    #[test]
    fn drop_disposes_once() {
        let (mut session, log) = mounted(Demo::CurvePlot);
        session.dispose();
        drop(session);
        assert_eq!(log.borrow().disposals, 1);
    }

    #[test]
    fn unmounted_session_disposes_safely_and_cannot_remount() {
        let log = Rc::new(RefCell::new(Log { size: (10, 10), ..Default::default() }));
        let mut session: SceneSession<RecordingRenderer> =
            SceneSession::new(SceneConfig::default());
        session.dispose();
        assert_eq!(session.state(), SessionState::Disposed);
        let err = session.mount(RecordingRenderer(log.clone())).unwrap_err();
        assert!(matches!(err, DemoError::InvalidTransition { state: SessionState::Disposed, .. }));
        assert_eq!(log.borrow().disposals, 0);
    }

    #[test]
    fn failed_mount_is_cleaned_up_by_dispose() {
        let log = Rc::new(RefCell::new(Log {
            size: (10, 10),
            fail_upload: true,
            ..Default::default()
        }));
        let mut session = SceneSession::new(SceneConfig::default());
        assert!(session.mount(RecordingRenderer(log.clone())).is_err());
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.frame(0.016), FrameStatus::Stopped);
        session.dispose();
        assert_eq!(log.borrow().disposals, 1);
        assert_eq!(session.state(), SessionState::Disposed);
    }

    #[test]
    fn lost_surface_is_reconfigured() {
        let (mut session, log) = mounted(Demo::Terrain);
        log.borrow_mut().fail_next = Some(wgpu::SurfaceError::Lost);
        assert_eq!(session.frame(0.016), FrameStatus::Rendered);
        assert_eq!(log.borrow().resizes, vec![(800, 600)]);

        log.borrow_mut().fail_next = Some(wgpu::SurfaceError::OutOfMemory);
        assert_eq!(session.frame(0.016), FrameStatus::Exit);
    }
}

// src/lib.rs

pub mod app;
pub mod config;
pub mod demo_scene;
pub mod engine_lib;
pub mod error;
pub mod rendering_lib;
pub mod shader_graph;
pub mod ui;

use std::sync::Arc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::WindowBuilder,
};

use app::{FrameStatus, SceneSession};
use config::SceneConfig;
use error::DemoError;
use rendering_lib::renderer::GpuRenderer;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        use web_time::Instant;
    } else {
        use std::time::Instant;
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub async fn run() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            if let Err(e) = console_log::init_with_level(log::Level::Warn) {
                web_sys::console::error_1(&format!("Couldn't initialize logger: {e}").into());
            }
        } else {
            env_logger::init();
        }
    }

    if let Err(e) = try_run().await {
        log::error!("{e}");
    }
}

async fn try_run() -> Result<(), DemoError> {
    let config = SceneConfig::from_args(std::env::args());

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window_size.0,
                config.window_size.1,
            ))
            .build(&event_loop)?,
    );

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::WindowExtWebSys;
        let attached = web_sys::window()
            .and_then(|win| win.document())
            .and_then(|doc| {
                let dst = doc.get_element_by_id("wasm-viewport")?;
                let canvas = web_sys::Element::from(window.canvas()?);
                dst.append_child(&canvas).ok()?;
                Some(())
            });
        if attached.is_none() {
            log::error!("Couldn't append canvas to #wasm-viewport");
        }
    }

    let renderer = GpuRenderer::new(window.clone(), config.msaa_samples).await?;
    let mut session = SceneSession::new(config);
    session.mount(renderer)?;
    let mut last_time = Instant::now();

    event_loop.run(move |event, target: &EventLoopWindowTarget<()>| {
        target.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { ref event, window_id } if window_id == window.id() => {
                if !session.handle_window_event(event) {
                    match event {
                        WindowEvent::CloseRequested => {
                            session.dispose();
                            target.exit();
                        }
                        WindowEvent::Resized(physical_size) => {
                            session.resize(physical_size.width, physical_size.height);
                        }
                        WindowEvent::RedrawRequested => { /* In AboutToWait */ }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                let dt = (now - last_time).as_secs_f32();
                last_time = now;

                if session.frame(dt) == FrameStatus::Exit {
                    session.dispose();
                    target.exit();
                }
                if !target.exiting() {
                    window.request_redraw();
                }
            }
            Event::LoopExiting => session.dispose(),
            _ => {}
        }
    })?;
    Ok(())
}

// src/rendering_lib/renderer.rs

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::{event::WindowEvent, window::Window};

use super::shader::{FrameUniforms, DEPTH_FORMAT};
use super::vertex::Vertex;
use crate::engine_lib::camera::PerspectiveCamera;
use crate::engine_lib::scene_types::{Drawable, DrawableId, Scene};
use crate::error::DemoError;
use crate::ui::ParameterPanel;

/// What a session needs from the GPU side. `GpuRenderer` is the wgpu
/// implementation; tests drive sessions with a recording stand-in.
pub trait FrameRenderer {
    fn surface_size(&self) -> (u32, u32);

    /// Reconfigures the surface. Zero sizes are filtered by the caller.
    fn resize(&mut self, width: u32, height: u32);

    /// Creates the GPU resources for a drawable.
    fn upload(&mut self, drawable: &Drawable) -> Result<(), DemoError>;

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        time: f32,
        panel: Option<&mut ParameterPanel>,
    ) -> Result<(), wgpu::SurfaceError>;

    /// Frees a drawable's resources. Returns false if nothing was uploaded under `id`.
    fn release(&mut self, id: DrawableId) -> bool;

    /// Gives the overlay UI first look at an event. True if it was consumed.
    fn on_window_event(&mut self, _event: &WindowEvent) -> bool {
        false
    }

    fn dispose(&mut self);
}

struct GpuDrawable {
    fill_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    edge_buffer: wgpu::Buffer,
    edge_count: u32,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
}

impl GpuDrawable {
    fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.edge_buffer.destroy();
        self.material_buffer.destroy();
    }
}

pub struct GpuRenderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    targets: RenderTargets,

    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    frame_bind_group_layout: wgpu::BindGroupLayout,
    material_bind_group_layout: wgpu::BindGroupLayout,

    drawables: HashMap<DrawableId, GpuDrawable>,

    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    disposed: bool,
}

fn uniform_layout_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// The requested sample count if the surface format can be multisampled at that
/// count, else 1.
pub fn supported_sample_count(requested: u32, flags: wgpu::TextureFormatFeatureFlags) -> u32 {
    if requested > 1 && flags.sample_count_supported(requested) {
        requested
    } else {
        1
    }
}

fn create_attachment(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    (width, height): (u32, u32),
    sample_count: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Size-dependent attachments: depth, plus a multisampled color target that
/// resolves into the surface when MSAA is on.
struct RenderTargets {
    depth: (wgpu::Texture, wgpu::TextureView),
    msaa: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl RenderTargets {
    fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, sample_count: u32) -> Self {
        let size = (config.width, config.height);
        let depth = create_attachment(device, "Depth Texture", DEPTH_FORMAT, size, sample_count);
        let msaa = (sample_count > 1).then(|| {
            create_attachment(device, "MSAA Color Texture", config.format, size, sample_count)
        });
        Self { depth, msaa }
    }

    fn destroy(&self) {
        self.depth.0.destroy();
        if let Some((texture, _)) = &self.msaa {
            texture.destroy();
        }
    }
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>, msaa_samples: u32) -> Result<Self, DemoError> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DemoError::NoAdapter)?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
                    } else {
                        wgpu::Limits::default()
                    },
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(DemoError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let format_flags = adapter.get_texture_format_features(config.format).flags;
        let sample_count = supported_sample_count(msaa_samples, format_flags);
        if sample_count != msaa_samples {
            log::warn!(
                "{msaa_samples}x MSAA unsupported for {:?}, using {sample_count}x",
                config.format
            );
        }
        let targets = RenderTargets::new(&device, &config, sample_count);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_layout_entry()],
                label: Some("frame_bind_group_layout"),
            });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
            label: Some("frame_bind_group"),
        });
        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_layout_entry()],
                label: Some("material_bind_group_layout"),
            });

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            sample_count,
            targets,
            frame_buffer,
            frame_bind_group,
            frame_bind_group_layout,
            material_bind_group_layout,
            drawables: HashMap::new(),
            egui_ctx,
            egui_state,
            egui_renderer,
            disposed: false,
        })
    }

    fn create_pipeline(
        &self,
        label: &str,
        module: &wgpu::ShaderModule,
        layout: &wgpu::PipelineLayout,
        topology: wgpu::PrimitiveTopology,
    ) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: self.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
    }

    fn draw_overlay(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        panel: &mut ParameterPanel,
    ) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| panel.show(ctx));
        self.egui_state.handle_platform_output(&self.window, full_output.platform_output);
        let tris = self.egui_ctx.tessellate(full_output.shapes, self.egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut gui_render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("GUI Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            self.egui_renderer.render(&mut gui_render_pass, &tris, &screen_descriptor);
        }
        for tex_id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(tex_id);
        }
    }
}

impl FrameRenderer for GpuRenderer {
    fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || self.disposed {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.targets.destroy();
        self.targets = RenderTargets::new(&self.device, &self.config, self.sample_count);
    }

    fn upload(&mut self, drawable: &Drawable) -> Result<(), DemoError> {
        if self.disposed {
            return Err(DemoError::Upload("renderer already disposed".into()));
        }
        let program = drawable.material.program();
        let geometry = &drawable.geometry;
        if geometry.indices.is_empty() {
            return Err(DemoError::Upload(format!("'{}' has no triangles", drawable.label())));
        }

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(drawable.label()),
            source: wgpu::ShaderSource::Wgsl(program.source.as_str().into()),
        });
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Material Pipeline Layout"),
            bind_group_layouts: &[&self.frame_bind_group_layout, &self.material_bind_group_layout],
            push_constant_ranges: &[],
        });
        let fill_pipeline = self.create_pipeline(
            "Fill Pipeline",
            &module,
            &pipeline_layout,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let line_pipeline = self.create_pipeline(
            "Wireframe Pipeline",
            &module,
            &pipeline_layout,
            wgpu::PrimitiveTopology::LineList,
        );

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let edges = geometry.edge_indices();
        let edge_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Edge Index Buffer"),
            contents: bytemuck::cast_slice(&edges),
            usage: wgpu::BufferUsages::INDEX,
        });
        let material_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniform Buffer"),
            contents: bytemuck::cast_slice(&program.pack_uniforms()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let material_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
            label: Some("material_bind_group"),
        });

        let gpu = GpuDrawable {
            fill_pipeline,
            line_pipeline,
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            edge_buffer,
            edge_count: edges.len() as u32,
            material_buffer,
            material_bind_group,
        };
        if let Some(previous) = self.drawables.insert(drawable.id(), gpu) {
            previous.destroy();
        }
        log::debug!(
            "Uploaded '{}': {} vertices, {} uniform slot(s)",
            drawable.label(),
            geometry.vertices.len(),
            program.slot_vec4_count()
        );
        Ok(())
    }

    fn render(
        &mut self,
        scene: &Scene,
        camera: &PerspectiveCamera,
        time: f32,
        panel: Option<&mut ParameterPanel>,
    ) -> Result<(), wgpu::SurfaceError> {
        if self.disposed {
            return Ok(());
        }
        let output_texture = self.surface.get_current_texture()?;
        let view = output_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Main Command Encoder"),
        });

        let frame = FrameUniforms {
            view_proj: camera.view_proj().to_cols_array_2d(),
            resolution: [self.config.width as f32, self.config.height as f32],
            time,
            _padding: 0.0,
        };
        self.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));
        for drawable in scene.drawables() {
            if let Some(gpu) = self.drawables.get(&drawable.id()) {
                let packed = drawable.material.program().pack_uniforms();
                self.queue.write_buffer(&gpu.material_buffer, 0, bytemuck::cast_slice(&packed));
            }
        }

        {
            let [r, g, b] = scene.background;
            let clear = wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: 1.0 };
            let (color_view, resolve_target) = match &self.targets.msaa {
                Some((_, msaa_view)) => (msaa_view, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth.1,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for drawable in scene.drawables() {
                let Some(gpu) = self.drawables.get(&drawable.id()) else { continue };
                render_pass.set_bind_group(1, &gpu.material_bind_group, &[]);
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                if drawable.material.is_wireframe() {
                    render_pass.set_pipeline(&gpu.line_pipeline);
                    render_pass
                        .set_index_buffer(gpu.edge_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..gpu.edge_count, 0, 0..1);
                } else {
                    render_pass.set_pipeline(&gpu.fill_pipeline);
                    render_pass
                        .set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..gpu.index_count, 0, 0..1);
                }
            }
        }

        if let Some(panel) = panel {
            self.draw_overlay(&mut encoder, &view, panel);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output_texture.present();
        Ok(())
    }

    fn release(&mut self, id: DrawableId) -> bool {
        match self.drawables.remove(&id) {
            Some(gpu) => {
                gpu.destroy();
                true
            }
            None => false,
        }
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        if self.disposed {
            return false;
        }
        self.egui_state.on_window_event(&self.window, event).consumed
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for (_, gpu) in self.drawables.drain() {
            gpu.destroy();
        }
        self.targets.destroy();
        self.frame_buffer.destroy();
        self.disposed = true;
        log::info!("Renderer disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormatFeatureFlags as Flags;

    #[test]
    fn msaa_falls_back_when_the_format_cannot_multisample() {
        assert_eq!(supported_sample_count(4, Flags::MULTISAMPLE_X4), 4);
        assert_eq!(supported_sample_count(4, Flags::MULTISAMPLE_X2), 1);
        assert_eq!(supported_sample_count(4, Flags::empty()), 1);
        assert_eq!(supported_sample_count(1, Flags::MULTISAMPLE_X4), 1);
    }
}

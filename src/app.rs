use std::{process, sync::Arc, time::Instant};

use anyhow::{anyhow, Context};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, Color, ColorTargetState, ColorWrites,
    Device, DeviceDescriptor, Extent3d, FilterMode, FragmentState, InstanceDescriptor, LoadOp,
    MemoryHints, MultisampleState, Operations, Origin3d, PipelineCompilationOptions,
    PipelineLayoutDescriptor, PrimitiveState, PrimitiveTopology, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, RequestAdapterOptions, Sampler,
    SamplerBindingType, SamplerDescriptor, ShaderModuleDescriptor, ShaderSource, ShaderStages,
    StoreOp, Surface, SurfaceConfiguration, SurfaceError, SurfaceTarget, TexelCopyBufferLayout,
    TexelCopyTextureInfo, Texture, TextureAspect, TextureDescriptor, TextureDimension,
    TextureFormat, TextureSampleType, TextureUsages, TextureViewDimension, VertexState,
};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, MouseButton, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow},
    window::{Window, WindowId},
};

use crate::{
    cmd::Cmd,
    config::{Config, Key},
    math::{vec2, Vec2i},
    session::Session,
    surface::Rgba,
    sync::{LogTransport, Outbox},
};

pub struct App {
    config: Config,
    instance: wgpu::Instance,
    win: Option<Win>,
    outbox: Outbox<LogTransport>,
}

struct Gpu {
    device: Device,
    queue: Queue,
    /// Format of the window surface.
    format: TextureFormat,

    render_pipeline: RenderPipeline,
    canvas_bgl: BindGroupLayout,
    sampler: Sampler,
}

impl Gpu {
    fn new(
        instance: &wgpu::Instance,
        surface: &Surface<'_>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<(Self, SurfaceConfiguration)> {
        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            compatible_surface: Some(surface),
            ..Default::default()
        }))
        .map_err(|e| anyhow!("failed to find a supported graphics adapter: {e}"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            memory_hints: MemoryHints::MemoryUsage,
            ..Default::default()
        }))?;

        let config = surface
            .get_default_config(&adapter, width, height)
            .context("adapter does not support surface")?;

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("shader"),
            source: ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let canvas_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("canvas"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    count: None,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::NonFiltering),
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    count: None,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                },
            ],
        });

        let render_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("present_pipeline"),
            layout: Some(&device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some("present_pipeline"),
                bind_group_layouts: &[&canvas_bgl],
                ..Default::default()
            })),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vertex"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[],
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fragment"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: ColorWrites::all(),
                })],
            }),
            multiview: None,
            cache: None,
        });
        // The canvas is shown 1:1, so no filtering.
        let sampler = device.create_sampler(&SamplerDescriptor {
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        });

        let gpu = Gpu {
            device,
            queue,
            format: config.format,
            render_pipeline,
            canvas_bgl,
            sampler,
        };
        Ok((gpu, config))
    }
}

/// GPU copy of the session's drawing surface.
struct Canvas {
    texture: Texture,
    bind_group: BindGroup,
}

impl Canvas {
    fn new(gpu: &Gpu, width: u32, height: u32) -> Self {
        let texture = gpu.device.create_texture(&TextureDescriptor {
            label: Some("canvas"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let bind_group = gpu.device.create_bind_group(&BindGroupDescriptor {
            label: Some("canvas"),
            layout: &gpu.canvas_bgl,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::Sampler(&gpu.sampler),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(
                        &texture.create_view(&Default::default()),
                    ),
                },
            ],
        });
        Self {
            texture,
            bind_group,
        }
    }

    fn upload(&self, gpu: &Gpu, pixels: &[Rgba]) {
        let size = Extent3d {
            width: self.texture.width(),
            height: self.texture.height(),
            depth_or_array_layers: 1,
        };
        gpu.queue.write_texture(
            TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: Origin3d::ZERO,
                aspect: TextureAspect::All,
            },
            bytemuck::cast_slice(pixels),
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: None,
            },
            size,
        );
    }
}

struct Win {
    window: Arc<Window>,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    gpu: Gpu,

    canvas: Canvas,
    session: Session,
    /// Scratch buffer the session's frame is composed into before upload.
    frame: Vec<Rgba>,
    cursor_pos: Option<Vec2i>,
}

impl Win {
    fn recreate_swapchain(&mut self) {
        let res = self.window.inner_size();
        self.surface_config.width = res.width;
        self.surface_config.height = res.height;

        log::debug!(
            "configuring window surface for {}x{} (format: {:?}, present mode: {:?})",
            res.width,
            res.height,
            self.gpu.format,
            self.surface_config.present_mode,
        );

        self.surface.configure(&self.gpu.device, &self.surface_config);
    }

    fn resize(&mut self, size: PhysicalSize<u32>) -> anyhow::Result<()> {
        // Minimized windows report a zero size; keep the old canvas until we get a real one.
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        self.session.resize(size.width, size.height)?;
        self.canvas = Canvas::new(&self.gpu, size.width, size.height);
        self.recreate_swapchain();
        Ok(())
    }

    fn redraw(&mut self) {
        let st = match self.surface.get_current_texture() {
            Ok(st) => st,
            Err(err @ (SurfaceError::Outdated | SurfaceError::Lost)) => {
                log::debug!("surface error: {}", err);
                self.recreate_swapchain();
                match self.surface.get_current_texture() {
                    Ok(st) => st,
                    Err(e) => {
                        log::warn!("failed to acquire frame after recreating swapchain: {e}");
                        return;
                    }
                }
            }
            Err(e) => {
                log::warn!("failed to acquire frame: {e}");
                return;
            }
        };

        self.session.frame().compose(&mut self.frame);
        self.canvas.upload(&self.gpu, &self.frame);

        let mut enc = self.gpu.device.create_command_encoder(&Default::default());
        let view = st.texture.create_view(&Default::default());
        let mut pass = enc.begin_render_pass(&RenderPassDescriptor {
            color_attachments: &[Some(RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color::BLACK),
                    store: StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        pass.set_pipeline(&self.gpu.render_pipeline);
        pass.set_bind_group(0, &self.canvas.bind_group, &[]);
        pass.draw(0..4, 0..1);
        drop(pass);

        self.gpu.queue.submit([enc.finish()]);
        self.window.pre_present_notify();
        st.present();
    }

    fn apply(&mut self, cmd: Cmd) {
        self.session.apply(cmd);
        self.window.request_redraw();
    }
}

impl App {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let outbox = Outbox::new(LogTransport::default(), config.sync.interval(), Instant::now());
        Ok(Self {
            config,
            instance: wgpu::Instance::new(&InstanceDescriptor::default()),
            win: None,
            outbox,
        })
    }

    fn create_win(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Win> {
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_inner_size(PhysicalSize::new(
                        self.config.window.width,
                        self.config.window.height,
                    ))
                    .with_title(self.config.window.title.clone()),
            )?,
        );

        let surface = self
            .instance
            .create_surface(SurfaceTarget::from(window.clone()))?;
        let size = window.inner_size();
        let (gpu, surface_config) = Gpu::new(&self.instance, &surface, size.width, size.height)?;
        surface.configure(&gpu.device, &surface_config);

        log::debug!(
            "creating canvas at {}x{}, format={:?}",
            size.width,
            size.height,
            gpu.format
        );
        let session = Session::new(size.width, size.height)?;
        let canvas = Canvas::new(&gpu, size.width, size.height);

        Ok(Win {
            window,
            surface,
            surface_config,
            gpu,
            canvas,
            session,
            frame: Vec::new(),
            cursor_pos: None,
        })
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.win.is_none() {
            let win = match self.create_win(event_loop) {
                Ok(win) => win,
                Err(e) => {
                    log::error!("could not create window: {e:#}");
                    process::exit(1);
                }
            };
            self.win = Some(win);
            event_loop.set_control_flow(ControlFlow::WaitUntil(self.outbox.deadline()));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(win) = &mut self.win else { return };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => win.redraw(),
            WindowEvent::Resized(size) => {
                if let Err(e) = win.resize(size) {
                    log::error!("could not resize canvas: {e:#}");
                    process::exit(1);
                }
                win.window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = vec2(position.x.floor() as i32, position.y.floor() as i32);
                win.cursor_pos = Some(position);
                win.apply(Cmd::PointerMove { position });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let Some(position) = win.cursor_pos else {
                    log::debug!("ignoring {state:?} before any cursor position");
                    return;
                };
                win.apply(match state {
                    ElementState::Pressed => Cmd::PointerDown { position },
                    ElementState::Released => Cmd::PointerUp { position },
                });
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let Some(key) = Key::from_winit(&logical_key) else { return };
                if let Some(&verb) = self.config.bind.get(&key) {
                    log::debug!("{key:?} -> {verb:?}");
                    win.apply(verb.into());
                }
            }
            _ => {}
        }
    }

    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        let Some(win) = &mut self.win else { return };
        match cause {
            StartCause::ResumeTimeReached { .. } => {
                let polled = self.outbox.poll(Instant::now(), &mut win.session);
                if polled.received > 0 {
                    win.window.request_redraw();
                }
                event_loop.set_control_flow(ControlFlow::WaitUntil(self.outbox.deadline()));
            }
            _ => {}
        }
    }
}

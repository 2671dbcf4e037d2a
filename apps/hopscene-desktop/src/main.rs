use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use hopscene_assets::{AssetLoader, AssetStore, ModelRole};
use hopscene_input::{ControlAction, ControlsListener, OrbitControls};
use hopscene_kernel::{MotionDriver, Scene, SceneConfig, SystemClock};
use hopscene_render::OrbitCamera;
use hopscene_render_wgpu::WgpuRenderer;
use hopscene_tools::SceneInspector;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Pixels of trackpad scroll that count as one wheel notch.
const PIXELS_PER_NOTCH: f32 = 50.0;

#[derive(Parser)]
#[command(name = "hopscene-desktop", about = "Hopping character viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Asks the window for a frame whenever the controls move the camera.
struct RedrawOnChange(Arc<Window>);

impl ControlsListener for RedrawOnChange {
    fn controls_changed(&mut self, _camera: &OrbitCamera) {
        self.0.request_redraw();
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Drag {
    Rotate,
    Pan,
}

/// Application state.
struct AppState {
    config: SceneConfig,
    scene: Scene,
    clock: SystemClock,
    driver: MotionDriver,
    camera: OrbitCamera,
    controls: OrbitControls,
    loader: AssetLoader,
    store: AssetStore,
    inspector: SceneInspector,
    show_inspector: bool,
    /// Set once per event-loop pass. Redraws requested only by the controls
    /// leave it clear and re-render without moving the character.
    frame_due: bool,
    // Input state
    drag: Option<Drag>,
    cursor: Option<PhysicalPosition<f64>>,
}

impl AppState {
    fn new(config: SceneConfig) -> Self {
        let mut loader = AssetLoader::new();
        loader.request(ModelRole::Structure, config.structure.asset.clone());
        loader.request(ModelRole::Character, config.character.asset.clone());

        Self {
            scene: Scene::new(config.environment),
            clock: SystemClock::new(),
            driver: MotionDriver::new(config.hop),
            camera: OrbitCamera::from_config(&config.camera, 1.0),
            controls: OrbitControls::new(config.controls),
            loader,
            store: AssetStore::new(),
            inspector: SceneInspector::new(),
            show_inspector: true,
            frame_due: false,
            drag: None,
            cursor: None,
            config,
        }
    }

    /// Prepare the next render. A due frame delivers finished loads, reads
    /// the clock and moves the character; every render lets the controls
    /// settle the camera.
    fn update(&mut self) {
        if std::mem::take(&mut self.frame_due) {
            self.step_scene();
        }
        self.controls.update(&mut self.camera);
    }

    fn step_scene(&mut self) {
        for event in self.loader.poll() {
            let (role, path) = (event.role, event.path.clone());
            if let Err(e) = event.deliver(&mut self.scene, &mut self.store, &self.config) {
                tracing::error!(?role, path = %path.display(), "failed to load model: {e}");
            }
        }

        let step = self.scene.advance(&self.clock, &self.driver);
        self.inspector.observe_events(&self.scene.drain_events());
        self.inspector.observe(&step);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
        self.controls.set_viewport_height(height);
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        if key == KeyCode::F1 {
            self.show_inspector = !self.show_inspector;
        }
    }

    fn handle_button(&mut self, button: MouseButton, pressed: bool) {
        let mode = match button {
            MouseButton::Left => Drag::Rotate,
            MouseButton::Right | MouseButton::Middle => Drag::Pan,
            _ => return,
        };
        if pressed {
            self.drag = Some(mode);
        } else if self.drag == Some(mode) {
            self.drag = None;
        }
    }

    fn handle_cursor(&mut self, position: PhysicalPosition<f64>) {
        let last = self.cursor.replace(position);
        let (Some(mode), Some(last)) = (self.drag, last) else {
            return;
        };
        let dx = (position.x - last.x) as f32;
        let dy = (position.y - last.y) as f32;
        let action = match mode {
            Drag::Rotate => ControlAction::Rotate { dx, dy },
            Drag::Pan => ControlAction::Pan { dx, dy },
        };
        self.controls.apply(action, &self.camera);
    }

    fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        let notches = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_NOTCH,
        };
        self.controls.apply(ControlAction::Zoom(notches), &self.camera);
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_inspector {
            return;
        }

        let summary = self.inspector.summary(&self.scene, &self.driver);

        egui::SidePanel::left("inspector")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Hop Scene");
                ui.separator();
                ui.label(format!("Frame: {}", summary.frame));
                ui.label(format!("Elapsed: {:.2}s", summary.elapsed));
                match (summary.character, summary.phase) {
                    (Some(p), Some(phase)) => {
                        ui.label(format!(
                            "Character: ({:.2}, {:.2}, {:.2})",
                            p.x, p.y, p.z
                        ));
                        ui.label(format!("Phase: {phase:?}"));
                    }
                    _ => {
                        ui.label("Character: loading");
                    }
                }
                ui.label(format!("Hops: {}  Wraps: {}", summary.hops, summary.wraps));
                ui.label(format!(
                    "Structure: {}",
                    if summary.structure_loaded {
                        "loaded"
                    } else {
                        "loading"
                    }
                ));
                ui.label(format!(
                    "Assets: {} registered, {} pending",
                    self.store.len(),
                    self.loader.in_flight()
                ));

                ui.separator();
                ui.heading("Camera");
                ui.label(format!(
                    "Eye: ({:.1}, {:.1}, {:.1})",
                    self.camera.eye.x, self.camera.eye.y, self.camera.eye.z
                ));
                ui.label(format!("Distance: {:.2}", self.camera.distance()));

                ui.separator();
                ui.heading("Environment");
                let mut env = *self.scene.environment();
                let old = env;
                ui.add(egui::Slider::new(&mut env.exposure, 0.1..=4.0).text("Exposure"));
                ui.add(egui::Slider::new(&mut env.ambient, 0.0..=1.0).text("Ambient"));
                if env != old {
                    self.scene.set_environment(env);
                }

                ui.separator();
                ui.small("F1: Toggle Inspector | LMB: Orbit | RMB: Pan | Wheel: Zoom");
            });
    }
}

/// Window, device and UI resources, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Hop Scene")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("hopscene_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw_overlay(
        &mut self,
        egui_ctx: &EguiContext,
        view: &wgpu::TextureView,
        state: &mut AppState,
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| state.draw_ui(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(config: SceneConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        // Clock and motion first, so the frame shows this frame's position.
        self.state.update();

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &self.state.scene,
        );
        gpu.draw_overlay(&self.egui_ctx, &view, &mut self.state);

        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let gpu = match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("failed to initialise graphics: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let size = gpu.window.inner_size();
        self.state.resize(size.width, size.height);
        self.state
            .controls
            .subscribe(Box::new(RedrawOnChange(gpu.window.clone())));
        self.gpu = Some(gpu);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
                self.state.resize(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.state
                    .handle_button(button, state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.handle_cursor(position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.state.handle_wheel(delta);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            self.state.frame_due = true;
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = SceneConfig::load_or_default(cli.config.as_deref())
        .context("failed to load scene config")?;
    tracing::info!(
        structure = %config.structure.asset.display(),
        character = %config.character.asset.display(),
        "hopscene-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let mut config = SceneConfig::default();
        config.structure.asset = PathBuf::from("/no/such/structure.glb");
        config.character.asset = PathBuf::from("/no/such/character.glb");
        AppState::new(config)
    }

    #[test]
    fn due_frame_advances_scene_once() {
        let mut state = state();
        state.frame_due = true;
        state.update();
        assert_eq!(state.scene.frame(), 1);
        assert!(!state.frame_due);
        state.update();
        assert_eq!(state.scene.frame(), 1);
    }

    #[test]
    fn controls_redraw_does_not_step_motion() {
        let mut state = state();
        let eye = state.camera.eye;
        state.handle_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        state.update();
        assert_eq!(state.scene.frame(), 0);
        assert_ne!(state.camera.eye, eye);
    }
}

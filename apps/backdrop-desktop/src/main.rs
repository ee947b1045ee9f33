use anyhow::{Context, Result};
use backdrop_content::BackdropConfig;
use backdrop_input::{EventHub, InputEvent, ViewportState};
use backdrop_render_wgpu::WgpuBackend;
use backdrop_session::{
    FrameQueue, FrameScheduler, FrameToken, MountPoint, SceneLifecycleManager, Section,
    SectionHost, SessionHandle,
};
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "backdrop-desktop", about = "Backdrop scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config file (.yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Section shown at startup (1-4)
    #[arg(long, default_value = "1")]
    section: char,
}

/// Frame requests become window redraw requests. Everything requested is due
/// on the next `RedrawRequested`.
struct RedrawScheduler {
    queue: FrameQueue,
    window: Arc<Window>,
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self, session: SessionHandle) -> FrameToken {
        self.window.request_redraw();
        self.queue.request_frame(session)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queue.cancel_frame(token);
    }

    fn take_due(&mut self) -> Vec<SessionHandle> {
        self.queue.take_due()
    }

    fn pending(&self) -> usize {
        self.queue.pending()
    }
}

type Manager = SceneLifecycleManager<WgpuBackend, RedrawScheduler>;

fn viewport_of(window: &Window) -> ViewportState {
    let scale = window.scale_factor();
    let size = window.inner_size().to_logical::<f32>(scale);
    ViewportState::new(size.width, size.height, scale as f32)
}

struct BackdropApp {
    config: BackdropConfig,
    initial: Section,
    window: Option<Arc<Window>>,
    manager: Option<Manager>,
    host: SectionHost,
    events: Rc<RefCell<EventHub>>,
}

impl BackdropApp {
    fn new(config: BackdropConfig, initial: Section) -> Self {
        Self {
            host: SectionHost::new(MountPoint::shared(), config.clone()),
            config,
            initial,
            window: None,
            manager: None,
            events: Rc::new(RefCell::new(EventHub::new())),
        }
    }

    fn show(&mut self, section: Section) {
        let Some(window) = &self.window else {
            return;
        };
        let viewport = viewport_of(window);
        match &mut self.manager {
            Some(manager) => {
                self.host.show(manager, section, viewport, Instant::now());
            }
            None => tracing::info!(section = section.name(), "no renderer, showing blank"),
        }
        window.set_title(&format!("{} - {}", self.config.window.title, section.name()));
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: &Key) {
        match key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Character(text) => {
                if let Some(section) = text.chars().next().and_then(Section::from_key) {
                    self.show(section);
                }
            }
            _ => {}
        }
    }

    fn dispatch(&self, event: InputEvent) {
        self.events.borrow_mut().dispatch(&event);
    }
}

impl ApplicationHandler for BackdropApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match WgpuBackend::new(window.clone()) {
            Ok(backend) => {
                tracing::info!(adapter = backend.adapter_name(), "renderer ready");
                let scheduler = RedrawScheduler {
                    queue: FrameQueue::new(),
                    window: window.clone(),
                };
                self.manager = Some(SceneLifecycleManager::new(
                    backend,
                    scheduler,
                    self.events.clone(),
                ));
            }
            Err(e) => tracing::warn!("rendering unavailable, backgrounds stay blank: {e}"),
        }

        self.window = Some(window);
        self.show(self.initial);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(manager) = &mut self.manager {
                    self.host.hide(manager);
                }
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                let Some(window) = &self.window else {
                    return;
                };
                tracing::debug!(width, height, "window resized");
                self.dispatch(InputEvent::Resized(viewport_of(window)));
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.dispatch(InputEvent::Resized(viewport_of(window)));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let Some(window) = &self.window else {
                    return;
                };
                let logical = position.to_logical::<f32>(window.scale_factor());
                self.dispatch(InputEvent::PointerMoved {
                    client_x: logical.x,
                    client_y: logical.y,
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
                self.handle_key(event_loop, &logical_key);
            }
            WindowEvent::RedrawRequested => {
                if let Some(manager) = &mut self.manager {
                    manager.run_due_frames(Instant::now());
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut manager) = self.manager.take() {
            manager.shutdown();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => BackdropConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BackdropConfig::default(),
    };
    let initial = Section::from_key(cli.section)
        .with_context(|| format!("unknown section {:?}, expected 1-4", cli.section))?;

    tracing::info!("backdrop-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = BackdropApp::new(config, initial);
    event_loop.run_app(&mut app)?;

    Ok(())
}

use anyhow::Context;
use backdrop_content::{BackdropConfig, ContentSpec};
use backdrop_input::{EventHub, InputEvent, PointerState, ViewportState};
use backdrop_render::{HeadlessBackend, RenderBackend, SurfaceSize};
use backdrop_scene::DrawableCounts;
use backdrop_session::{FrameQueue, MountPoint, SceneLifecycleManager};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Simulated display refresh interval.
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

#[derive(Parser)]
#[command(name = "backdrop-cli", about = "CLI tool for backdrop scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default scene parameters
    Info,
    /// Run a headless session and report camera and resource stats
    Simulate(SimulateArgs),
    /// Check a YAML or JSON config file
    Validate {
        /// Config file (.yaml, .yml or .json)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SceneKind {
    Particles,
    Cubes,
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// Scene to mount
    #[arg(long, value_enum, default_value = "particles")]
    scene: SceneKind,
    /// Number of frames to run
    #[arg(short, long, default_value = "120")]
    frames: u64,
    /// Viewport width in logical pixels
    #[arg(long, default_value = "1920")]
    width: f32,
    /// Viewport height in logical pixels
    #[arg(long, default_value = "1080")]
    height: f32,
    /// Device pixel ratio
    #[arg(long, default_value = "1")]
    dpr: f32,
    /// Pointer position in client pixels, as X,Y
    #[arg(long, value_parser = parse_pointer)]
    pointer: Option<(f32, f32)>,
    /// RNG seed for content generation
    #[arg(long)]
    seed: Option<u64>,
    /// Scene parameters from a config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
    /// Dump the scene graph after the last frame
    #[arg(long)]
    dump: bool,
}

fn parse_pointer(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("bad coordinate {v:?}: {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    content: &'static str,
    frames: u64,
    surface: SurfaceSize,
    aspect: f32,
    pointer: PointerState,
    camera_position: [f32; 3],
    counts: DrawableCounts,
    resources: usize,
    draw_calls: usize,
    live_resources_after_stop: usize,
    listeners_after_stop: usize,
    surfaces_after_stop: usize,
}

fn simulate(args: &SimulateArgs) -> anyhow::Result<(SimulationReport, Option<String>)> {
    let config = match &args.config {
        Some(path) => BackdropConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BackdropConfig::default(),
    };
    let spec = match args.scene {
        SceneKind::Particles => ContentSpec::Particles(backdrop_content::ParticleFieldConfig {
            seed: args.seed.or(config.hero.seed),
            ..config.hero
        }),
        SceneKind::Cubes => ContentSpec::Cubes(backdrop_content::CubeFieldConfig {
            seed: args.seed.or(config.projects.seed),
            ..config.projects
        }),
    };

    let events = Rc::new(RefCell::new(EventHub::new()));
    let mut manager =
        SceneLifecycleManager::new(HeadlessBackend::new(), FrameQueue::new(), events.clone());
    let mount = MountPoint::shared();
    let viewport = ViewportState::new(args.width, args.height, args.dpr);

    let start = Instant::now();
    let handle = manager
        .start(mount.clone(), &spec, viewport, start)
        .context("starting session")?;

    if let Some((client_x, client_y)) = args.pointer {
        events
            .borrow_mut()
            .dispatch(&InputEvent::PointerMoved { client_x, client_y });
    }

    let mut now = start;
    for _ in 0..args.frames {
        now += FRAME_INTERVAL;
        manager.run_due_frames(now);
    }

    let session = manager
        .session(handle)
        .context("session vanished during simulation")?;
    let camera = session.camera();
    let dump = args
        .dump
        .then(|| HeadlessBackend::describe(session.scene(), camera));
    let mut report = SimulationReport {
        content: session.content_name(),
        frames: session.frames(),
        surface: session.surface_size(),
        aspect: camera.aspect,
        pointer: session.pointer(),
        camera_position: camera.position.to_array(),
        counts: session.scene().counts(),
        resources: session.resources().len(),
        draw_calls: manager
            .backend()
            .last_frame()
            .map_or(0, |frame| frame.draw_calls),
        live_resources_after_stop: 0,
        listeners_after_stop: 0,
        surfaces_after_stop: 0,
    };

    manager.stop(handle);
    report.live_resources_after_stop = manager.backend().live_resources();
    report.listeners_after_stop = events.borrow().listener_count();
    report.surfaces_after_stop = mount.borrow().attached().len();
    Ok((report, dump))
}

fn print_report(report: &SimulationReport) {
    println!("Simulated {} for {} frames", report.content, report.frames);
    println!(
        "Surface: {}x{} px, aspect {:.3}",
        report.surface.width, report.surface.height, report.aspect
    );
    println!("Pointer: ({:.2}, {:.2})", report.pointer.x, report.pointer.y);
    let [x, y, z] = report.camera_position;
    println!("Camera: ({x:.3}, {y:.3}, {z:.3})");
    println!(
        "Scene: {} points in {} clouds, {} meshes, {} line sets ({} draw calls)",
        report.counts.points,
        report.counts.point_clouds,
        report.counts.meshes,
        report.counts.line_sets,
        report.draw_calls
    );
    println!("Resources: {}", report.resources);
    println!(
        "After stop: {} live resources, {} listeners, {} surfaces",
        report.live_resources_after_stop, report.listeners_after_stop, report.surfaces_after_stop
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            let config = BackdropConfig::default();
            println!("backdrop-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "hero: {} particles, extent {}, smoothing {}",
                config.hero.count, config.hero.extent, config.hero.smoothing
            );
            println!(
                "projects: {} cubes, grid {}x{}, smoothing {}",
                config.projects.count,
                config.projects.grid.divisions,
                config.projects.grid.divisions,
                config.projects.smoothing
            );
            println!(
                "window: {:?} {}x{}",
                config.window.title, config.window.width, config.window.height
            );
        }
        Commands::Simulate(args) => {
            let (report, dump) = simulate(&args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if let Some(dump) = dump {
                print!("{dump}");
            }
        }
        Commands::Validate { file } => {
            let config = BackdropConfig::load(&file)
                .with_context(|| format!("validating {}", file.display()))?;
            tracing::info!(path = %file.display(), "config is valid");
            println!(
                "OK: hero {} particles, projects {} cubes",
                config.hero.count, config.projects.count
            );
        }
    }

    Ok(())
}

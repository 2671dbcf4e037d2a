use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use hopscene_assets::{AssetLoader, AssetStore, ModelRole, import_model};
use hopscene_kernel::{ManualClock, MotionDriver, Scene, SceneConfig};
use hopscene_render::{DebugTextRenderer, OrbitCamera, Renderer};
use hopscene_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

/// How long a headless run waits for its models before starting without them.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "hopscene-cli", about = "Headless tools for the hop scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hop motion on a fixed-step clock and print frames
    Simulate {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Frames per simulated second
        #[arg(long, default_value = "60")]
        fps: f64,
        /// Print every Nth frame
        #[arg(long, default_value = "30")]
        every: u64,
        /// Scene configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the character model path
        #[arg(long)]
        character: Option<PathBuf>,
        /// Override the structure model path
        #[arg(long)]
        structure: Option<PathBuf>,
    },
    /// Import a model file and print its mesh and material
    Inspect {
        /// Path to a .gltf or .glb file
        asset: PathBuf,
        /// Which scene slot to import for
        #[arg(long, value_enum, default_value = "character")]
        role: Role,
    },
    /// Validate a scene configuration and print it with defaults filled in
    CheckConfig {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Structure,
    Character,
}

impl From<Role> for ModelRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Structure => ModelRole::Structure,
            Role::Character => ModelRole::Character,
        }
    }
}

fn simulate(
    frames: u64,
    fps: f64,
    every: u64,
    config: SceneConfig,
) -> anyhow::Result<()> {
    anyhow::ensure!(fps.is_finite() && fps > 0.0, "fps must be positive, got {fps}");
    let every = every.max(1);

    let mut loader = AssetLoader::new();
    loader.request(ModelRole::Structure, config.structure.asset.clone());
    loader.request(ModelRole::Character, config.character.asset.clone());

    let mut scene = Scene::new(config.environment);
    let mut store = AssetStore::new();
    for event in loader.wait_all(LOAD_TIMEOUT) {
        let (role, path) = (event.role, event.path.clone());
        if let Err(e) = event.deliver(&mut scene, &mut store, &config) {
            tracing::error!(?role, path = %path.display(), "failed to load model: {e}");
        }
    }
    if scene.character().is_absent() {
        tracing::warn!("no character loaded; frames will show an inert scene");
    }

    let clock = ManualClock::new();
    let driver = MotionDriver::new(config.hop);
    let camera = OrbitCamera::from_config(&config.camera, 16.0 / 9.0);
    let renderer = DebugTextRenderer::new();
    let mut inspector = SceneInspector::new();

    println!(
        "Simulating {frames} frames at {fps} fps (hop period {:.3}s)",
        config.hop.period()
    );
    for _ in 0..frames {
        clock.advance(1.0 / fps);
        let step = scene.advance(&clock, &driver);
        inspector.observe_events(&scene.drain_events());
        inspector.observe(&step);

        if step.frame % every == 0 {
            print!("{}", renderer.render(&scene, &camera));
        }
    }
    println!("{}", inspector.summary(&scene, &driver));
    Ok(())
}

fn inspect(asset: PathBuf, role: Role) -> anyhow::Result<()> {
    let model = import_model(&asset, role.into())
        .with_context(|| format!("failed to import {}", asset.display()))?;
    let mut store = AssetStore::new();
    let (mesh_id, material_id) = store.register_model(&model);

    let mesh = &model.mesh;
    let size = mesh.bounds.size();
    println!("{}", asset.display());
    println!("  mesh '{}' [{:016x}]", mesh.name, mesh_id.0);
    println!(
        "    vertices={} indices={}",
        mesh.vertex_count, mesh.index_count
    );
    println!(
        "    bounds min=({:.3}, {:.3}, {:.3}) size=({:.3}, {:.3}, {:.3})",
        mesh.bounds.min.x, mesh.bounds.min.y, mesh.bounds.min.z, size.x, size.y, size.z
    );
    match (&model.material, material_id) {
        (Some(material), Some(id)) => {
            let s = &material.surface;
            println!("  material '{}' [{:016x}]", material.name, id.0);
            println!(
                "    base_color=({:.3}, {:.3}, {:.3}, {:.3}) metalness={:.2} roughness={:.2}",
                s.base_color[0],
                s.base_color[1],
                s.base_color[2],
                s.base_color[3],
                s.metalness,
                s.roughness
            );
        }
        _ => println!("  material: (none)"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Simulate {
            frames,
            fps,
            every,
            config,
            character,
            structure,
        } => {
            let mut scene_config = SceneConfig::load_or_default(config.as_deref())
                .context("failed to load scene config")?;
            if let Some(path) = character {
                scene_config.character.asset = path;
            }
            if let Some(path) = structure {
                scene_config.structure.asset = path;
            }
            simulate(frames, fps, every, scene_config)?;
        }
        Commands::Inspect { asset, role } => inspect(asset, role)?,
        Commands::CheckConfig { path } => {
            let config = SceneConfig::load(&path)
                .with_context(|| format!("invalid config {}", path.display()))?;
            println!("{}: OK", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

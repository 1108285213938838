//! hand_tree — interactive entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hand_tree::app::run;
use hand_tree::config::{AppConfig, InputMode};

#[derive(Parser)]
#[command(name = "hand_tree")]
#[command(version)]
#[command(about = "A fractal tree steered by your hand (or the mouse)", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/hand_tree/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pointer input: mouse, camera or replay
    #[arg(short, long, value_enum)]
    input: Option<InputMode>,

    /// Camera index for camera input
    #[arg(long)]
    camera_index: Option<u32>,

    /// Directory of frames for replay input
    #[arg(short, long)]
    replay_dir: Option<PathBuf>,

    /// Don't open the camera preview window
    #[arg(long)]
    no_preview: bool,

    /// Tree window width
    #[arg(long)]
    width: Option<usize>,

    /// Tree window height
    #[arg(long)]
    height: Option<usize>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Trunk length in pixels
    #[arg(short, long)]
    size: Option<f64>,

    /// Length ratio between levels, strictly between 0 and 1
    #[arg(short, long)]
    decay: Option<f64>,

    /// Branching levels
    #[arg(short = 'D', long)]
    depth: Option<u32>,
}

impl Cli {
    /// Command-line values win over the file.
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(mode) = self.input        { cfg.input.mode = mode; }
        if let Some(i) = self.camera_index    { cfg.input.camera_index = i; }
        if let Some(dir) = self.replay_dir    {
            cfg.input.replay_dir = Some(dir);
            // A replay directory on the command line implies replay input.
            if self.input.is_none() { cfg.input.mode = InputMode::Replay; }
        }
        if self.no_preview                    { cfg.input.preview = false; }
        if let Some(w) = self.width           { cfg.window.width = w; }
        if let Some(h) = self.height          { cfg.window.height = h; }
        if let Some(fps) = self.fps           { cfg.window.fps = fps; }
        if let Some(s) = self.size            { cfg.tree.size = s; }
        if let Some(d) = self.decay           { cfg.tree.decay = d; }
        if let Some(d) = self.depth           { cfg.tree.max_depth = d; }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    if let Err(e) = start(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn start(cli: Cli) -> Result<()> {
    let mut cfg = AppConfig::load(cli.config.as_deref()).context("cannot load configuration")?;
    cli.apply(&mut cfg);

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Hand Tree — Fractal Tree Under Your Hand            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match cfg.input.mode {
        InputMode::Mouse  => println!("  Mode: Mouse simulation  (use --input camera for a webcam)"),
        InputMode::Camera => println!("  Mode: Camera {}", cfg.input.camera_index),
        InputMode::Replay => println!("  Mode: Replay"),
    }
    if cfg!(not(feature = "camera")) && cfg.input.mode == InputMode::Camera {
        println!("  (this build has no camera support; rebuild with --features camera)");
    }
    println!("  Keys: H = toggle HUD   Q / Esc = quit");
    println!();

    run(cfg)
}

//! Roomwalk - headless scene runner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use roomwalk::config::SceneConfig;
use roomwalk::game::assets::{self, CharacterAsset};
use roomwalk::game::camera::Camera;
use roomwalk::game::input::{KeyboardState, ScriptedInput};
use roomwalk::game::scene::SceneGraph;
use roomwalk::game::{FrameClock, Game, Presenter};

#[derive(Parser)]
#[command(name = "roomwalk")]
#[command(about = "Physics-driven character scene runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scene with the scripted key timeline from the config
    Run {
        /// Path to scene.toml (default: ./scene.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Character model (overrides [player].model)
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Use a model-less character with the configured clip names
        #[arg(long)]
        placeholder: bool,
        /// Number of ticks to run (default: length of the script, or 600)
        #[arg(short, long)]
        ticks: Option<u64>,
        /// Ticks per second
        #[arg(long, default_value = "60")]
        tick_rate: u32,
        /// Pace ticks against the wall clock and measure real frame time
        #[arg(long)]
        realtime: bool,
        /// Log a frame summary every N ticks
        #[arg(long, default_value = "30")]
        log_every: u64,
        /// Write the final frame snapshot as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List the skeleton joints and animation clips of a character model
    Clips {
        model: PathBuf,
    },
}

/// Presenter that logs the camera and player every few frames.
struct LogPresenter {
    every: u64,
    frames: u64,
}

impl Presenter for LogPresenter {
    fn present(&mut self, camera: &Camera, scene: &SceneGraph) {
        self.frames += 1;
        if self.every == 0 || self.frames % self.every != 0 {
            return;
        }
        let player = scene
            .find("player")
            .and_then(|id| scene.get(id))
            .map(|n| n.position);
        log::info!(
            "[Frame {}] camera={:?} target={:?} player={:?}",
            self.frames,
            camera.position,
            camera.target,
            player
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            model,
            placeholder,
            ticks,
            tick_rate,
            realtime,
            log_every,
            report,
        } => run_scene(RunOptions {
            config,
            model,
            placeholder,
            ticks,
            tick_rate,
            realtime,
            log_every,
            report,
        }),
        Commands::Clips { model } => list_clips(&model),
    }
}

struct RunOptions {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    placeholder: bool,
    ticks: Option<u64>,
    tick_rate: u32,
    realtime: bool,
    log_every: u64,
    report: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<(SceneConfig, PathBuf)> {
    match path {
        Some(p) => {
            let config = SceneConfig::from_file(p).context("loading scene config")?;
            let dir = p.parent().map(Path::to_path_buf).unwrap_or_default();
            Ok((config, dir))
        }
        None if Path::new("scene.toml").exists() => {
            let config = SceneConfig::from_dir(Path::new(".")).context("loading scene config")?;
            Ok((config, PathBuf::from(".")))
        }
        None => {
            log::info!("[Config] no scene.toml found, using defaults");
            Ok((SceneConfig::default(), PathBuf::from(".")))
        }
    }
}

fn run_scene(opts: RunOptions) -> Result<()> {
    let (config, config_dir) = load_config(opts.config.as_deref())?;
    let script_ticks: u64 = config.script.iter().map(|s| s.ticks as u64).sum();
    let total_ticks = opts
        .ticks
        .unwrap_or(if script_ticks > 0 { script_ticks } else { 600 });
    let tick_rate = opts.tick_rate.max(1);

    let mut script = ScriptedInput::new(config.script.clone());
    let mut game = Game::new(config);

    if opts.placeholder {
        let asset = CharacterAsset::placeholder(&game.config.animation.clips);
        game.spawn_player(&asset);
    } else {
        let model = opts
            .model
            .unwrap_or_else(|| config_dir.join(&game.config.player.model));
        game.begin_character_load(model);
        if !opts.realtime {
            // Fixed-step runs are deterministic only if the player exists from tick 0.
            game.wait_for_character();
        }
    }

    let mut keyboard = KeyboardState::new();
    let mut presenter = LogPresenter {
        every: opts.log_every,
        frames: 0,
    };

    log::info!(
        "[Run] {} ticks at {} Hz ({})",
        total_ticks,
        tick_rate,
        if opts.realtime { "realtime" } else { "fixed step" }
    );

    let tick_duration = Duration::from_secs_f64(1.0 / tick_rate as f64);
    let fixed_dt = 1.0 / tick_rate as f32;
    let mut clock = FrameClock::new();

    for _ in 0..total_ticks {
        let start = Instant::now();
        script.drive(&mut keyboard);

        if opts.realtime {
            game.frame(&keyboard, &mut clock, &mut presenter);
            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                thread::sleep(tick_duration - elapsed);
            }
        } else {
            game.tick(fixed_dt, keyboard.sample());
            presenter.present(&game.camera, &game.scene);
        }
    }

    let snapshot = game.snapshot();
    log::info!(
        "[Run] done: tick={} status={:?} player={:?} clip={:?}",
        snapshot.tick,
        snapshot.player_status,
        snapshot.player_position,
        snapshot.active_clip
    );

    if let Some(path) = opts.report {
        let json = serde_json::to_string_pretty(&snapshot).context("serializing snapshot")?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("[Run] wrote report to {}", path.display());
    }
    Ok(())
}

fn list_clips(model: &Path) -> Result<()> {
    let asset = assets::load_character(model)?;
    println!("{}", asset.path.display());
    println!("joints: {}", asset.joint_names.len());
    for name in asset.clip_names() {
        println!("  {:<40} {:>6.2}s", name, asset.clips[name].duration);
    }
    Ok(())
}

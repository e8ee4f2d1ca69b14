#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Meat Harvest round.

mod autopilot;

use std::{fs, io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use meat_harvest_core::{Command, Event};
use meat_harvest_rendering::{
    FrameInput, HeadlessBackend, Presentation, RenderingBackend, Scene, TileGridPresentation,
};
use meat_harvest_system_bootstrap::Bootstrap;
use meat_harvest_system_scoreboard::Scoreboard;
use meat_harvest_system_steering::{Steering, SteeringInput};
use meat_harvest_world::{self as world, query, RoundConfig, TilePalette, World, DEFAULT_LAYOUT};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::autopilot::Autopilot;

#[derive(Parser, Debug)]
#[command(
    name = "meat-harvest",
    version,
    about = "Run a headless Meat Harvest round"
)]
struct Cli {
    /// Layout file with one character per tile (`g` plant, `b` barn, `x` wall).
    #[arg(long)]
    layout: Option<PathBuf>,
    /// TOML file overriding round tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for growth jitter and spontaneous infestation.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 3_600)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Move script of U, D, L and R; the next move starts when the last one ends.
    #[arg(long, default_value = "")]
    moves: String,
    /// Print the final grid after the HUD.
    #[arg(long)]
    show_final: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let layout = match &cli.layout {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read layout {}", path.display()))?,
        None => DEFAULT_LAYOUT.to_owned(),
    };
    let autopilot = Autopilot::parse(&cli.moves).context("invalid --moves script")?;

    let world = World::from_layout(&layout, &TilePalette::meat_farm(), config)
        .context("failed to set up round")?;
    let bootstrap = Bootstrap;
    let banner = bootstrap.welcome_banner(&world);
    info!(banner, "round starting");

    let scoreboard = Scoreboard::new(bootstrap.round(&world), bootstrap.grid(&world).barn());
    let scene = capture_scene(&world, &scoreboard)?;
    let mut session = Session {
        world,
        steering: Steering::new(),
        scoreboard,
        autopilot,
        last_events: Vec::new(),
    };

    let frame_time = Duration::from_millis(cli.tick_ms);
    HeadlessBackend::new(cli.ticks, frame_time, io::stdout().lock())
        .with_final_scene(cli.show_final)
        .run(Presentation::new(banner, scene), move |dt, input, scene| {
            session.frame(dt, input, scene)
        })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<RoundConfig> {
    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => RoundConfig::default(),
    };
    Ok(match cli.seed {
        Some(seed) => config.with_seed(seed),
        None => config,
    })
}

/// Everything the frame closure owns between frames.
struct Session {
    world: World,
    steering: Steering,
    scoreboard: Scoreboard,
    autopilot: Autopilot,
    last_events: Vec<Event>,
}

impl Session {
    fn frame(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) {
        let scripted = self.autopilot.input();
        let input = SteeringInput {
            up: input.up || scripted.up,
            down: input.down || scripted.down,
            left: input.left || scripted.left,
            right: input.right || scripted.right,
            test_spore: input.test_spore || scripted.test_spore,
        };

        let mut commands = Vec::new();
        self.steering.handle(&self.last_events, input, &mut commands);
        commands.push(Command::Tick { dt });

        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        let mut cues = Vec::new();
        self.scoreboard.handle(&events, &mut cues);
        for cue in cues {
            debug!(?cue, "audio cue");
        }
        self.autopilot.observe(&events);

        refresh_scene(scene, &self.world, &self.scoreboard);
        self.last_events = events;
    }
}

fn capture_scene(world: &World, scoreboard: &Scoreboard) -> Result<Scene> {
    let grid = query::grid(world);
    let tile_grid = TileGridPresentation::new(
        grid.columns(),
        grid.rows(),
        query::config(world).tile_length,
    )
    .context("invalid grid presentation")?;
    let harvester = query::harvester(world).into();
    let mut scene = Scene::new(tile_grid, Vec::new(), harvester, Vec::new());
    refresh_scene(&mut scene, world, scoreboard);
    Ok(scene)
}

fn refresh_scene(scene: &mut Scene, world: &World, scoreboard: &Scoreboard) {
    scene.tiles = query::tiles(world).into_iter().map(Into::into).collect();
    scene.harvester = query::harvester(world).into();
    scene.spores = query::spore_view(world)
        .into_vec()
        .into_iter()
        .map(Into::into)
        .collect();
    scene.hud_lines = scoreboard.hud_lines().to_vec();
    scene.game_over = scoreboard.game_over();
}

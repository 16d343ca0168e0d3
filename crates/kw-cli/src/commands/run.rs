use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;

use kw_core::{Entity, EventKind, ListenerError, World, WorldConfig};

use crate::scene::{self, Health, Scene, SceneComponent};

/// Event lines kept for `--verbose`.
const MAX_LOGGED_EVENTS: usize = 200;

/// Options of `kw run`.
pub struct RunOptions {
    pub ticks: u64,
    pub seed: u64,
    pub dt: f64,
    pub entities: usize,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Default)]
struct Tally {
    added: u64,
    updated: u64,
    removed: u64,
    lines: Vec<String>,
    dropped: usize,
}

impl Tally {
    fn count(&mut self, kind: EventKind) {
        match kind {
            EventKind::Add => self.added += 1,
            EventKind::Update => self.updated += 1,
            EventKind::Remove => self.removed += 1,
        }
    }
}

pub fn run(opts: &RunOptions) -> Result<(), String> {
    if !opts.dt.is_finite() {
        return Err(format!("--dt must be a finite number, got {}", opts.dt));
    }

    let config = match &opts.config {
        Some(path) => load_config(path)?,
        None => WorldConfig::default(),
    };
    let mut world = World::<Scene>::with_config(config);

    let tally = Arc::new(Mutex::new(Tally::default()));
    let sink = Arc::clone(&tally);
    let verbose = opts.verbose;
    world.on_component_event(move |event| {
        let mut tally = sink
            .lock()
            .map_err(|_| ListenerError::new("event tally lock poisoned"))?;
        tally.count(event.kind);
        if verbose {
            if tally.lines.len() < MAX_LOGGED_EVENTS {
                let line = format!("{:<6} {:<9} {}", event.kind, event.name, event.entity);
                tally.lines.push(line);
            } else {
                tally.dropped += 1;
            }
        }
        Ok(())
    });

    // Listeners cannot touch the world, so fallen entities are queued and
    // despawned after the decay pass.
    let fallen: Arc<Mutex<Vec<Entity>>> = Arc::new(Mutex::new(Vec::new()));
    let queue = Arc::clone(&fallen);
    world.on_component_event_for(SceneComponent::Health, move |event| {
        if event.component::<Health>().is_some_and(|h| h.current <= 0) {
            queue
                .lock()
                .map_err(|_| ListenerError::new("despawn queue lock poisoned"))?
                .push(event.entity);
        }
        Ok(())
    });

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let spawned = scene::spawn(&mut world, &mut rng, opts.entities);
    log::info!("spawned {} entities with seed {}", spawned.len(), opts.seed);

    let mut despawned = 0;
    for tick in 1..=opts.ticks {
        let moved = scene::movement(&mut world, opts.dt);
        scene::decay(&mut world);
        let doomed = std::mem::take(
            &mut *fallen
                .lock()
                .map_err(|_| "despawn queue lock poisoned".to_string())?,
        );
        let removed = scene::despawn(&mut world, doomed);
        despawned += removed;
        world.update_time(opts.dt);
        log::debug!("tick {tick}: moved {moved}, despawned {removed}");
    }

    // Header
    println!(
        "  {} {}",
        "Run".bold(),
        format!("({} ticks, seed={}, dt={})", opts.ticks, opts.seed, opts.dt).dimmed()
    );
    println!(
        "  {} entities spawned, {} despawned, {} remaining",
        spawned.len(),
        despawned,
        world.entities().len()
    );
    println!("  Elapsed time: {:.2}", world.time());
    println!();

    let tally = tally
        .lock()
        .map_err(|_| "event tally lock poisoned".to_string())?;

    if opts.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for line in &tally.lines {
            println!("  {line}");
        }
        if tally.lines.is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        if tally.dropped > 0 {
            println!("  {}", format!("... and {} more", tally.dropped).dimmed());
        }
        println!();
    }

    // Event counts
    println!("  {}", "Events".bold().underline());
    println!("  {:<8} {}", "ADD".green().bold(), tally.added);
    println!("  {:<8} {}", "UPDATE".cyan().bold(), tally.updated);
    println!("  {:<8} {}", "REMOVE".red().bold(), tally.removed);
    if world.listener_faults() > 0 {
        println!(
            "  {} {} listener calls failed",
            "WARN".yellow().bold(),
            world.listener_faults()
        );
    }
    println!();

    // Remaining entities
    println!("  {}", "Entities".bold().underline());
    println!();
    println!("{}", super::entity_table(&world));
    println!();

    if let Some(path) = &opts.output {
        let json = world
            .snapshot()
            .to_json()
            .map_err(|e| format!("cannot encode snapshot: {e}"))?;
        fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        println!("  Snapshot written to {}", path.display());
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<WorldConfig, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid config {}: {e}", path.display()))
}

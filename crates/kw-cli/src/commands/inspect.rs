use std::fs;
use std::path::Path;

use colored::Colorize;

use kw_core::{World, WorldSnapshot};

use crate::scene::{Scene, SceneComponent};

pub fn run(file: &Path) -> Result<(), String> {
    let json =
        fs::read_to_string(file).map_err(|e| format!("cannot read {}: {e}", file.display()))?;
    let snapshot = WorldSnapshot::<Scene>::from_json(&json)
        .map_err(|e| format!("invalid snapshot {}: {e}", file.display()))?;

    let mut world = World::<Scene>::new();
    world
        .restore(snapshot)
        .map_err(|e| format!("cannot restore {}: {e}", file.display()))?;

    println!("  {} {}", "Snapshot".bold(), file.display().to_string().dimmed());
    println!("  Elapsed time: {:.2}", world.time());
    println!("  {} entities", world.entities().len());
    for name in [
        SceneComponent::Transform,
        SceneComponent::Velocity,
        SceneComponent::Health,
    ] {
        println!("  {:<10} {}", name.to_string(), world.component_count(name));
    }
    println!();

    if world.entities().is_empty() {
        println!("  {}", "(no entities)".dimmed());
    } else {
        println!("{}", super::entity_table(&world));
    }
    println!();

    Ok(())
}

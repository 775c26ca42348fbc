use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use acre_core::{LocationEvent, World};
use acre_simulation::{SimConfig, SimEventKind, Simulation};

pub fn run(file: &Path, days: u32, frames: u64, seed: u64, verbose: bool) -> Result<(), String> {
    let location = super::load_location(file)?;
    let name = location.name().to_string();
    let before = (location.objects().len(), location.terrain_features().len());

    let mut world = World::new();
    world.add(location).map_err(|e| e.to_string())?;

    let config = SimConfig::default().with_seed(seed).with_max_events(500);
    let mut sim = Simulation::new(world, config);
    sim.set_active_location(&name)
        .map_err(|e| format!("simulation error: {e}"))?;
    sim.run_frames(frames);
    sim.run_days(days)
        .map_err(|e| format!("simulation error: {e}"))?;

    println!(
        "  {} '{name}' {}",
        "Simulation".bold(),
        format!("({frames} frames, {days} days, seed={seed})").dimmed()
    );
    println!(
        "  Date: {}, {} events logged",
        sim.clock().date(),
        sim.events().len()
    );
    println!();

    if verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in sim.events().events() {
            let frame_label = format!("[frame {:>4}]", event.frame).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {frame_label} {desc}");
        }
        if sim.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    }

    let location = sim
        .world()
        .get(&name)
        .ok_or_else(|| format!("location '{name}' vanished"))?;
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Collection", "Before", "After"]);
    table.add_row(vec![
        "objects".to_string(),
        before.0.to_string(),
        location.objects().len().to_string(),
    ]);
    table.add_row(vec![
        "terrain features".to_string(),
        before.1.to_string(),
        location.terrain_features().len().to_string(),
    ]);
    println!("{table}");
    Ok(())
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::DayStarted { .. } => description.bold(),
        SimEventKind::ActiveLocationChanged { .. } => description.blue(),
        SimEventKind::Location { event, .. } => match event {
            LocationEvent::Explosion { .. } | LocationEvent::Removed { .. } => description.red(),
            LocationEvent::Added { .. } => description.green(),
            LocationEvent::BuildingConstructed { .. } | LocationEvent::BuildingUpgraded { .. } => {
                description.cyan()
            }
            _ => description.normal(),
        },
    }
}

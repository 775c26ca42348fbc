use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use acre_core::render::render_ascii;
use acre_core::{CollisionMask, Location, TilePos};

pub fn run(
    file: &Path,
    tile: Option<TilePos>,
    map: bool,
    mask: CollisionMask,
    ignore: CollisionMask,
) -> Result<(), String> {
    let location = super::load_location(file)?;
    let grid = location.grid();

    println!(
        "  {} '{}' {}",
        "Location".bold(),
        location.name(),
        format!("({:?})", location.rules.kind).dimmed()
    );
    println!(
        "  {}x{} tiles, {} layers, {} tilesheets",
        grid.width(),
        grid.height(),
        grid.layers().len(),
        grid.sheets.len()
    );
    let patches: Vec<&str> = location.applied_patches().collect();
    if !patches.is_empty() {
        println!("  Patches applied: {}", patches.join(", "));
    }
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Collection", "Count"]);
    let counts = [
        ("objects", location.objects().len()),
        ("terrain features", location.terrain_features().len()),
        ("large terrain features", location.large_terrain_features().len()),
        ("resource clumps", location.resource_clumps().len()),
        ("furniture", location.furniture().len()),
        ("buildings", location.buildings().len()),
        ("characters", location.characters().len()),
        ("farmers", location.farmers().len()),
        ("animals", location.animals().len()),
        ("fixtures", location.fixtures().len()),
    ];
    for (name, count) in counts {
        table.add_row(vec![name.to_string(), count.to_string()]);
    }
    println!("{table}");

    if map {
        println!();
        println!("  {}", "Occupancy".bold().underline());
        for row in render_ascii(&location).lines() {
            println!("  {row}");
        }
    }

    if let Some(tile) = tile {
        println!();
        print_tile(&location, tile, mask, ignore);
    }
    Ok(())
}

fn print_tile(location: &Location, tile: TilePos, mask: CollisionMask, ignore: CollisionMask) {
    println!("  {} {tile}", "Tile".bold().underline());
    if !location.is_tile_on_map(tile) {
        println!("  {}", "off map".red());
        return;
    }
    let occupancy = location.occupancy();
    let occupied = occupancy.is_tile_occupied_by(tile, mask, ignore);
    let blocked = occupancy.is_tile_blocked_by(tile, mask, ignore);
    let placeable = location.can_item_be_placed_here(tile, false, mask, ignore);
    println!(
        "  occupied: {}  passable: {}  placeable: {}",
        yes_no(occupied),
        yes_no(!blocked),
        yes_no(placeable)
    );

    let occupants = occupancy.occupants_at(tile, mask);
    if occupants.is_empty() {
        println!("  {}", "(no occupants)".dimmed());
        return;
    }
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Occupant", "Kind", "Passable"]);
    for occupant in &occupants {
        table.add_row(vec![
            occupant.label(),
            occupant.kind().to_string(),
            occupant.is_passable_at(tile).to_string(),
        ]);
    }
    println!("{table}");
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value { "yes".green() } else { "no".red() }
}

use std::fs;
use std::path::Path;

use colored::Colorize;

use acre_core::TileRect;

pub fn run(
    file: &Path,
    source: &Path,
    key: &str,
    dest: Option<TileRect>,
    output: Option<&Path>,
) -> Result<(), String> {
    let mut location = super::load_location(file)?;
    let source_grid = super::load_map(source)?;

    let applied = location.apply_map_override(&source_grid, key, None, dest, None);
    if applied {
        eprintln!("  {} patch '{key}' to '{}'", "Applied".green().bold(), location.name());
    } else {
        eprintln!("  {} patch '{key}' already applied", "Skipped".yellow().bold());
    }

    let json = super::location_json(&location)?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

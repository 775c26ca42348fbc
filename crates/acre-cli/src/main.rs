//! CLI frontend for the acre location engine.

mod commands;

use std::path::PathBuf;
use std::process;

use acre_core::{CollisionMask, TilePos, TileRect};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "acre",
    about = "acre: inspect, patch and simulate tile-based locations",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a location file
    Inspect {
        /// Location file (JSON map plus saved state)
        file: PathBuf,

        /// Also report the occupants and passability of one tile, as `x,y`
        #[arg(short, long, value_parser = parse_tile)]
        tile: Option<TilePos>,

        /// Print an ASCII occupancy map
        #[arg(short, long)]
        map: bool,

        /// Occupant categories the tile report considers, e.g. `objects|furniture`
        #[arg(long, default_value = "all", value_parser = parse_mask)]
        mask: CollisionMask,

        /// Categories whose passable occupants the tile report ignores
        #[arg(long, default_value = "none", value_parser = parse_mask)]
        ignore: CollisionMask,
    },

    /// Apply a map patch to a location file
    Patch {
        /// Location file to patch
        file: PathBuf,

        /// Map document to overlay
        #[arg(short, long)]
        source: PathBuf,

        /// Patch key; a key is applied at most once
        #[arg(short, long)]
        key: String,

        /// Destination rectangle as `x,y,w,h` (default: origin, source size)
        #[arg(short, long, value_parser = parse_rect)]
        dest: Option<TileRect>,

        /// Write the patched location here (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run frames and days against a location file
    Simulate {
        /// Location file to simulate
        file: PathBuf,

        /// Days to run after the frames
        #[arg(long, default_value = "1")]
        days: u32,

        /// Frames to run on the first day
        #[arg(long, default_value = "60")]
        frames: u64,

        /// RNG seed for deterministic spawning and growth
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Show all events (not just summary)
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[i32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got '{s}'"));
    }
    let mut out = [0; N];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
    }
    Ok(out)
}

fn parse_tile(s: &str) -> Result<TilePos, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    Ok(TilePos::new(x, y))
}

fn parse_rect(s: &str) -> Result<TileRect, String> {
    let [x, y, w, h] = parse_numbers::<4>(s)?;
    Ok(TileRect::new(x, y, w, h))
}

fn parse_mask(s: &str) -> Result<CollisionMask, String> {
    Ok(CollisionMask::parse_list(s))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect {
            file,
            tile,
            map,
            mask,
            ignore,
        } => commands::inspect::run(&file, tile, map, mask, ignore),
        Commands::Patch {
            file,
            source,
            key,
            dest,
            output,
        } => commands::patch::run(&file, &source, &key, dest, output.as_deref()),
        Commands::Simulate {
            file,
            days,
            frames,
            seed,
            verbose,
        } => commands::simulate::run(&file, days, frames, seed, verbose),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

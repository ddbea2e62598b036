use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use consist_formats::units::to_kilometers_per_hour;
use consist_formats::Consist;

#[derive(Parser)]
#[command(name = "consist-info")]
#[command(about = "Load rail consist files (.con or .toml) and print their contents")]
struct Args {
    /// Consist files to load
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// List every vehicle of each consist
    #[arg(long)]
    vehicles: bool,

    /// Enable verbose logging of the parse
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();

    let mut failures = 0;
    for path in &args.paths {
        match Consist::load(path).with_context(|| format!("Failed to load {}", path.display())) {
            Ok(consist) => print_consist(&consist, args.vehicles),
            Err(e) => {
                error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} consists failed to load", failures, args.paths.len());
    }

    info!("Loaded {} consists", args.paths.len());
    Ok(())
}

fn print_consist(consist: &Consist, list_vehicles: bool) {
    let train = &consist.train;

    println!("{}", consist.name);
    println!("  serial:      {}", train.serial);
    match train.max_velocity {
        Some(max) => println!(
            "  max speed:   {:.2} m/s ({:.1} km/h), tolerance {}",
            max.limit,
            to_kilometers_per_hour(max.limit),
            max.tolerance
        ),
        None => println!("  max speed:   unset"),
    }
    println!("  durability:  {}", train.durability);
    if !train.tcs_parameters_file.is_empty() {
        println!("  tcs file:    {}", train.tcs_parameters_file);
    }
    println!(
        "  vehicles:    {} ({} engines, {} eot)",
        train.vehicles.len(),
        train.engine_count(),
        train.eot_count()
    );

    if list_vehicles {
        for vehicle in &train.vehicles {
            let loads = vehicle.loads.as_ref().map_or(0, |l| l.len());
            println!(
                "    [{:>4}] {:<6} {}/{}{}{}",
                vehicle.uid,
                vehicle.kind(),
                vehicle.folder,
                vehicle.name,
                if vehicle.flip { " (flipped)" } else { "" },
                if loads > 0 { format!(" {} loads", loads) } else { String::new() }
            );
        }
    }
}

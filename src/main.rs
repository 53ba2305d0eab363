//! Terrain Evolve CLI - Evolve a heightmap from JSON configuration.

use std::fs;
use std::path::PathBuf;

use terrain_evolve::{
    compute::{GridStats, evolution::EvolutionEngine},
    schema::EvolutionConfig,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations]", args[0]);
        eprintln!();
        eprintln!("Evolve a terrain heightmap from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to evolution configuration file");
        eprintln!("  generations  Override the configured generation count");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let mut config: EvolutionConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Some(generations) = args.get(2).and_then(|s| s.parse().ok()) {
        config.population.generations = generations;
    }

    println!("Terrain Evolution");
    println!("=================");
    println!("Grid: {}x{}", config.grid.height, config.grid.width);
    println!(
        "Noise: {} octaves, persistence {}, lacunarity {}",
        config.noise.octaves, config.noise.persistence, config.noise.lacunarity
    );
    println!(
        "Population: {} ({} children per pair, {:?} seeding)",
        config.population.size, config.population.children_per_pair, config.population.seeding
    );
    println!("Generations: {}", config.population.generations);
    println!(
        "Mutation: {}% ({:?}), crossover: {:?}",
        config.mutation.chance, config.mutation.scale, config.crossover
    );
    println!();

    let locality_radius = config.locality_radius;
    let mut engine = EvolutionEngine::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    println!("Running evolution...");
    let result = engine
        .run_with_callback(|progress| {
            if let Some(best) = progress.best_fitness {
                println!(
                    "  Generation {}/{} [{:?}]: balance={:.2}, sea={:.2}, bedrock={:.2}, mountain={:.2}, mutated={}",
                    progress.generation,
                    progress.total_generations,
                    progress.phase,
                    best.balance,
                    best.sea_level,
                    best.bedrock,
                    best.mountain,
                    progress.mutated_last_generation
                );
            }
        })
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let stats = GridStats::from_grid(&result.best);
    let (center_row, center_col) = (stats.height / 2, stats.width / 2);
    let local = result
        .best
        .neighborhood(center_row, center_col, locality_radius);

    println!();
    println!("Best heightmap:");
    println!("  Size: {}x{}", stats.height, stats.width);
    println!(
        "  Value range: [{:.3}, {:.3}]",
        stats.min_value, stats.max_value
    );
    println!("  Mean: {:.3}, std: {:.3}", stats.mean_value, stats.std_dev);
    if let Some(local) = local {
        println!(
            "  Center ({}, {}), radius {}: mean={:.3}, total difference={:.3}",
            center_row, center_col, locality_radius, local.mean_height, local.total_difference
        );
    }
    println!();
    println!(
        "Time: {:.2}s ({} evaluations, {:.1} evals/s)",
        result.stats.elapsed_seconds,
        result.stats.total_evaluations,
        result.stats.evaluations_per_second
    );
}

fn print_example_config() {
    let config = EvolutionConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}

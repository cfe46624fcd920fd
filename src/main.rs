//! somlattice CLI - Self-Organizing Map demonstrations
//!
//! Trains lattices on colour teachers and writes the maps as PNG images.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use somlattice::{render, Config, Lattice, LatticeConfig, Result, SomError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Passes used by the palette demo when neither flag nor config file sets one.
const PALETTE_PASSES: usize = 105;

#[derive(Parser)]
#[command(name = "somlattice")]
#[command(version)]
#[command(about = "Self-Organizing Map trainer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by every training command.
#[derive(Args)]
struct TrainArgs {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid dimension (default: 20)
    #[arg(short, long)]
    dimension: Option<usize>,

    /// Random seed for the initial lattice
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of training passes over the teachers
    #[arg(short = 'n', long)]
    passes: Option<usize>,

    /// Pixel scale factor for output images (default: 16)
    #[arg(long)]
    scale: Option<u32>,
}

impl TrainArgs {
    /// Merges the optional config file with command-line overrides.
    fn resolve(&self, default_passes: usize) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config {
                passes: default_passes,
                ..Config::default()
            },
        };
        if let Some(dimension) = self.dimension {
            config.lattice.dimension = dimension;
        }
        if self.seed.is_some() {
            config.lattice.seed = self.seed;
        }
        if let Some(passes) = self.passes {
            config.passes = passes;
        }
        if let Some(scale) = self.scale {
            config.render.scale = scale;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train on uniformly random RGB teachers
    Random {
        #[command(flatten)]
        train: TrainArgs,

        /// Number of random teachers
        #[arg(short, long, default_value = "10000")]
        count: usize,

        /// Seed for generating the teachers
        #[arg(long)]
        data_seed: Option<u64>,

        /// Colour to look up after training, e.g. "0.5,0.9,0.1"
        #[arg(short, long)]
        query: Option<String>,

        /// Output directory for images
        #[arg(short, long, default_value = "som_output")]
        output: PathBuf,
    },

    /// Train on a fixed palette of five colours
    Palette {
        #[command(flatten)]
        train: TrainArgs,

        /// Output directory for images
        #[arg(short, long, default_value = "som_output")]
        output: PathBuf,
    },

    /// Train one lattice per seed in parallel and compare quantization errors
    Sweep {
        #[command(flatten)]
        train: TrainArgs,

        /// Comma-separated lattice seeds
        #[arg(long, value_delimiter = ',', default_value = "1,2,3,4")]
        seeds: Vec<u64>,

        /// Number of random teachers
        #[arg(short, long, default_value = "2000")]
        count: usize,

        /// Seed for generating the teachers
        #[arg(long)]
        data_seed: Option<u64>,
    },

    /// Print the default configuration as JSON
    Config,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Random {
            train,
            count,
            data_seed,
            query,
            output,
        } => train_random(train, count, data_seed, query, output),

        Commands::Palette { train, output } => train_palette(train, output),

        Commands::Sweep {
            train,
            seeds,
            count,
            data_seed,
        } => sweep(train, seeds, count, data_seed),

        Commands::Config => print_config(),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Generates `count` uniformly random RGB teachers.
fn random_colors(count: usize, seed: Option<u64>) -> Vec<Vec<f64>> {
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    (0..count)
        .map(|_| (0..3).map(|_| rng.gen::<f64>()).collect())
        .collect()
}

/// Blue, green, red, black and white in b,g,r order.
fn palette_colors() -> Vec<Vec<f64>> {
    vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
        vec![1.0, 1.0, 1.0],
        vec![0.00001, 0.00001, 0.00001],
    ]
}

fn parse_query(text: &str) -> Result<Vec<f64>> {
    text.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| SomError::InvalidInput(format!("bad query component '{}': {}", part, e)))
        })
        .collect()
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
        .map_err(|e| SomError::Config(e.to_string()))?
        .progress_chars("█▓▒░  ");
    let pb = ProgressBar::new(len as u64);
    pb.set_style(style);
    Ok(pb)
}

/// Runs `passes` training passes with a progress bar.
fn run_passes(lattice: &mut Lattice, passes: usize) -> Result<()> {
    let pb = progress_bar(passes)?;
    pb.set_message("Training...");
    for _ in 0..passes {
        lattice.train();
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(())
}

fn write_map(lattice: &Lattice, scale: u32, path: &Path) -> Result<()> {
    render::save_png(lattice.nodes(), lattice.dimension(), scale, path)?;
    println!("  Wrote {}", path.display());
    Ok(())
}

/// Builds a lattice, writes its initial and trained maps, and returns it.
fn train_and_render(teachers: &[Vec<f64>], config: &Config, output: &Path) -> Result<Lattice> {
    let start_time = Instant::now();
    fs::create_dir_all(output)?;

    let mut lattice = Lattice::new(teachers, &config.lattice)?;
    println!(
        "✓ Initialized {}x{} lattice ({} teachers, {} dims)",
        lattice.dimension(),
        lattice.dimension(),
        lattice.n_teacher(),
        lattice.weight_dim()
    );
    write_map(&lattice, config.render.scale, &output.join("initial.png"))?;

    let initial_error = lattice.quantization_error();
    run_passes(&mut lattice, config.passes)?;
    println!(
        "✓ Trained {} pass(es) in {:.2?}",
        lattice.passes(),
        start_time.elapsed()
    );
    println!(
        "  Quantization error: {:.4} -> {:.4}",
        initial_error,
        lattice.quantization_error()
    );
    write_map(&lattice, config.render.scale, &output.join("trained.png"))?;

    Ok(lattice)
}

fn train_random(
    train: TrainArgs,
    count: usize,
    data_seed: Option<u64>,
    query: Option<String>,
    output: PathBuf,
) -> Result<()> {
    let config = train.resolve(1)?;
    // Parse before training so a bad query fails fast.
    let query = query.as_deref().map(parse_query).transpose()?;

    println!("Random colour map");
    let teachers = random_colors(count, data_seed);
    let lattice = train_and_render(&teachers, &config, &output)?;

    if let Some(query) = query {
        let (row, col) = lattice.best_matching_unit(&query)?;
        println!("  Best matching unit for {:?}: ({}, {})", query, row, col);
        let swatch = render::swatch(&query, config.render.scale)?;
        let path = output.join("query.png");
        swatch.save(&path)?;
        println!("  Wrote {}", path.display());
    }

    Ok(())
}

fn train_palette(train: TrainArgs, output: PathBuf) -> Result<()> {
    let config = train.resolve(PALETTE_PASSES)?;

    println!("Palette colour map");
    let teachers = palette_colors();
    let lattice = train_and_render(&teachers, &config, &output)?;

    for color in &teachers {
        let (row, col) = lattice.best_matching_unit(color)?;
        println!("  {:?} -> ({}, {})", color, row, col);
    }

    Ok(())
}

fn sweep(train: TrainArgs, seeds: Vec<u64>, count: usize, data_seed: Option<u64>) -> Result<()> {
    let config = train.resolve(1)?;
    if seeds.is_empty() {
        return Err(SomError::InvalidInput("no seeds given".to_string()));
    }

    let teachers = random_colors(count, data_seed);
    info!(
        "Sweeping {} seeds on {} teachers, {} pass(es)",
        seeds.len(),
        teachers.len(),
        config.passes
    );

    // Lattices are independent, one per seed.
    let results: Vec<(u64, f64, f64)> = seeds
        .par_iter()
        .map(|&seed| -> Result<(u64, f64, f64)> {
            let lattice_config = LatticeConfig::new(config.lattice.dimension, Some(seed));
            let mut lattice = Lattice::new(&teachers, &lattice_config)?;
            let before = lattice.quantization_error();
            for _ in 0..config.passes {
                lattice.train();
            }
            Ok((seed, before, lattice.quantization_error()))
        })
        .collect::<Result<Vec<_>>>()?;

    println!("{:>12}  {:>10}  {:>10}", "seed", "initial", "trained");
    for (seed, before, after) in &results {
        println!("{:>12}  {:>10.4}  {:>10.4}", seed, before, after);
    }

    if let Some((seed, _, after)) = results
        .iter()
        .min_by(|a, b| a.2.total_cmp(&b.2))
    {
        println!("✓ Best seed {} (error {:.4})", seed, after);
    }

    Ok(())
}

fn print_config() -> Result<()> {
    println!("{}", Config::default().to_json()?);
    Ok(())
}

//! qif - command-line front end for channel analysis
//!
//! # Commands
//!
//! - `qif random -i 2 -o 3`: print a random channel (seeded with `--seed`)
//! - `qif metrics FILE`: entropy and leakage metrics of a channel file
//! - `qif compose parallel A B`: compose two channel files
//!
//! # Logging
//!
//! `--debug` > `--verbose` > `RUST_LOG` > default `warn`. Logs go to stderr so
//! stdout stays a valid channel document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use qif_channel::{Channel, RandomConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Quantitative information flow over probabilistic channels
#[derive(Parser, Debug)]
#[command(name = "qif")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print channels as JSON instead of the text layout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a randomly generated channel
    Random {
        /// Number of secret inputs
        #[arg(short, long, default_value_t = 2)]
        inputs: usize,

        /// Number of observable outputs
        #[arg(short, long, default_value_t = 2)]
        outputs: usize,

        /// Seed for a reproducible channel (OS entropy if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Largest integer weight drawn per matrix entry
        #[arg(long, default_value_t = RandomConfig::default().max_weight)]
        max_weight: u32,

        /// Channel name
        #[arg(long, default_value = "random")]
        name: String,
    },

    /// Print entropy and leakage metrics of a channel file
    Metrics {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Compose two channel files and print the result
    Compose {
        #[arg(value_enum)]
        op: ComposeOp,

        #[arg(value_name = "LEFT")]
        left: PathBuf,

        #[arg(value_name = "RIGHT")]
        right: PathBuf,

        /// Probability of running LEFT (hidden and visible choice)
        #[arg(short, long, default_value_t = 0.5)]
        p: f64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ComposeOp {
    Parallel,
    Cascade,
    Hidden,
    Visible,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();

    match args.command {
        Command::Random {
            inputs,
            outputs,
            seed,
            max_weight,
            name,
        } => {
            let config = RandomConfig { max_weight };
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            let channel = Channel::random_with_config(inputs, outputs, config, &mut rng)
                .context("cannot generate channel")?
                .with_name(name)?;
            info!(inputs, outputs, ?seed, "generated random channel");
            print_channel(&channel, args.json)
        }
        Command::Metrics { file } => {
            let channel = load(&file)?;
            print_metrics(&channel);
            Ok(())
        }
        Command::Compose { op, left, right, p } => {
            let c1 = load(&left)?;
            let c2 = load(&right)?;
            let result = match op {
                ComposeOp::Parallel => c1.parallel(&c2),
                ComposeOp::Cascade => c1.cascade(&c2),
                ComposeOp::Hidden => Channel::hidden_choice(&c1, &c2, p),
                ComposeOp::Visible => Channel::visible_choice(&c1, &c2, p),
            }
            .with_context(|| format!("cannot compose {} and {}", left.display(), right.display()))?;
            info!(?op, n_out = result.n_out(), "composed channels");
            print_channel(&result, args.json)
        }
    }
}

fn load(path: &Path) -> Result<Channel> {
    Channel::from_file(path).with_context(|| format!("cannot load {}", path.display()))
}

fn print_channel(channel: &Channel, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(channel)?);
    } else {
        print!("{channel}");
    }
    Ok(())
}

fn print_metrics(c: &Channel) {
    println!("channel:                       {}", c.name());
    println!("dimensions:                    {} x {}", c.n_in(), c.n_out());
    println!("H(X)  prior entropy:           {:.6}", c.shannon_entropy_prior());
    println!("H(Y)  output entropy:          {:.6}", c.shannon_entropy_out());
    println!("H(Y|X) conditional entropy:    {:.6}", c.conditional_entropy());
    println!("H(X|Y) posterior entropy:      {:.6}", c.conditional_entropy_hyper());
    println!("H(X,Y) joint entropy:          {:.6}", c.joint_entropy());
    println!("G(X)  guessing entropy:        {:.6}", c.guessing_entropy());
    println!("I(X;Y) mutual information:     {:.6}", c.mutual_information());
    println!("normalized mutual information: {:.6}", c.normalized_mutual_information());
    println!("symmetric uncertainty:         {:.6}", c.symmetric_uncertainty());
    println!("prior Bayes vulnerability:     {:.6}", c.prior_bayes_vulnerability());
    println!("posterior Bayes vulnerability: {:.6}", c.posterior_bayes_vulnerability());
    println!("min-entropy leakage:           {:.6}", c.min_entropy_leakage());
}

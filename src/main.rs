//! BB84 key distribution simulator CLI.
//!
//! Runs one session and prints the protocol transcript, or a batch of
//! sessions and prints detection statistics.

use anyhow::{Context, Result};
use bb84_sim::protocols::qkd::basis::format_bits;
use bb84_sim::{
    DEFAULT_NUM_QUBITS, DEFAULT_SAMPLE_SIZE, NoiseModel, Session, SessionConfig, TrialSampler,
};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NoiseKind {
    BitFlip,
    PhaseFlip,
    Depolarizing,
}

#[derive(Debug, Parser)]
#[command(name = "bb84-sim", version, about = "Simulate BB84 key distribution")]
struct Cli {
    /// Qubits sent per session
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_QUBITS)]
    qubits: usize,

    /// Reconciled bits disclosed to check for interception
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// Let an eavesdropper measure every qubit in transit
    #[arg(short, long)]
    intercept: bool,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Noise model of the quantum line
    #[arg(long, value_enum, requires = "noise_prob")]
    noise: Option<NoiseKind>,

    /// Error probability of the noise model
    #[arg(long, requires = "noise")]
    noise_prob: Option<f64>,

    /// Run this many sessions and print aggregate statistics
    #[arg(short, long)]
    trials: Option<usize>,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::new()
            .with_num_qubits(self.qubits)
            .with_sample_size(self.sample_size)
            .with_intercept(self.intercept);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let (Some(kind), Some(p)) = (self.noise, self.noise_prob) {
            config = config.with_noise(match kind {
                NoiseKind::BitFlip => NoiseModel::BitFlip(p),
                NoiseKind::PhaseFlip => NoiseModel::PhaseFlip(p),
                NoiseKind::Depolarizing => NoiseModel::Depolarizing(p),
            });
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.session_config();

    match cli.trials {
        Some(trials) => run_batch(config, trials),
        None => run_single(config),
    }
}

fn run_single(config: SessionConfig) -> Result<()> {
    let report = Session::from_config(config)
        .and_then(Session::run)
        .context("key distribution session aborted")?;

    println!("[X] Alice key: {}", format_bits(&report.sender_key));
    if report.intercepted() {
        println!("[X] Message intercepted by Eve");
    }
    println!("[X] Bob key: {}", format_bits(&report.receiver_key));
    println!("[X] Common secret computed");

    if report.established() {
        println!("[X] No interception detected. Common secret established");
        println!("{} {}", report.sender_secret, report.receiver_secret);
    } else {
        println!("[X] Interception detected");
    }
    Ok(())
}

fn run_batch(config: SessionConfig, trials: usize) -> Result<()> {
    let stats = TrialSampler::new(config)
        .run(trials)
        .context("trial batch aborted")?;

    println!(
        "[X] {} trials: {} established, {} detected, {} aborted, detection rate {:.1}%, mean QBER {:.2}%",
        stats.trials,
        stats.established,
        stats.detected,
        stats.aborted,
        stats.detection_rate() * 100.0,
        stats.mean_qber
    );
    Ok(())
}

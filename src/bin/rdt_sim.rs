use std::{process::ExitCode, time::Duration};

use clap::Parser;
use rdt::{
    layer::Builder,
    sim::{LinkConfig, SimConfig, Simulation},
};

/// Runs a Go-Back-N sender and receiver over a simulated faulty link.
#[derive(Parser)]
#[command(name = "rdt-sim")]
struct Args {
    /// Number of messages the application produces
    #[arg(short, long, default_value_t = 200)]
    messages: usize,
    /// Mean message size in bytes
    #[arg(long, default_value_t = 300)]
    mean_size: usize,
    /// Mean gap between messages in milliseconds
    #[arg(long, default_value_t = 20)]
    mean_interval_ms: u64,
    /// Probability that a packet is lost
    #[arg(long, default_value_t = 0.1)]
    drop_rate: f64,
    /// Probability that one bit of a packet is flipped
    #[arg(long, default_value_t = 0.1)]
    corrupt_rate: f64,
    /// Probability that a packet is delayed past later ones
    #[arg(long, default_value_t = 0.05)]
    reorder_rate: f64,
    /// One-way link delay in milliseconds
    #[arg(long, default_value_t = 10)]
    delay_ms: u64,
    /// Outstanding window size
    #[arg(short, long, default_value_t = 5)]
    window: usize,
    /// Retransmission timeout in milliseconds
    #[arg(short, long, default_value_t = 300)]
    timeout_ms: u64,
    /// Overflow buffer capacity in fragments
    #[arg(long, default_value_t = 1_000_000)]
    overflow_buf_cap: usize,
    /// RNG seed
    #[arg(short, long, default_value_t = 0xBAD5EED)]
    seed: u64,
    /// Simulated time limit in seconds
    #[arg(long, default_value_t = 3600)]
    max_time_s: u64,
}

impl Args {
    fn into_config(self) -> SimConfig {
        SimConfig {
            messages: self.messages,
            mean_msg_size: self.mean_size,
            mean_msg_interval: Duration::from_millis(self.mean_interval_ms),
            link: LinkConfig {
                drop_rate: self.drop_rate,
                corrupt_rate: self.corrupt_rate,
                reorder_rate: self.reorder_rate,
                delay: Duration::from_millis(self.delay_ms),
            },
            seed: self.seed,
            protocol: Builder {
                window_size: self.window,
                timeout: Duration::from_millis(self.timeout_ms),
                overflow_buf_cap: self.overflow_buf_cap,
            },
            max_time: Duration::from_secs(self.max_time_s),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rdt=info".into()),
        )
        .init();

    let config = Args::parse().into_config();
    let sim = match Simulation::new(config) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    let report = sim.run();
    println!("{report}");
    if report.intact {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

use std::path::PathBuf;

use clap::Parser;
use fastrestore::{
    OperationConfigOverride, RequestKind, RequestState, RestoreJobBuilder, RestoreRole,
};
use restsim::{Distributions, Jiffies};

#[derive(Parser, Debug)]
#[command(name = "fast_restore")]
#[command(about = "Brings up a simulated restore job and prints what the master saw")]
struct Cli {
    /// TOML file overriding the operation config
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Loader processes to start
    #[arg(long, default_value_t = 4)]
    loaders: usize,

    /// Applier processes to start
    #[arg(long, default_value_t = 2)]
    appliers: usize,

    /// Jiffies the master waits for each reply
    #[arg(long, default_value_t = 100)]
    timeout: usize,

    #[arg(long, default_value_t = 3)]
    max_attempts: usize,

    #[arg(long, default_value_t = 69)]
    seed: u64,

    /// Number of loaders, counted from the last one, that never come up
    #[arg(long, default_value_t = 0)]
    offline_loaders: usize,

    /// Upper bound of the uniform extra delay on master links
    #[arg(long, default_value_t = 0)]
    max_latency: usize,
}

fn main() -> fastrestore::Result<()> {
    let cli = Cli::parse();

    let mut builder = RestoreJobBuilder::default()
        .loaders(cli.loaders)
        .appliers(cli.appliers)
        .request_timeout(Jiffies(cli.timeout))
        .max_attempts(cli.max_attempts)
        .seed(cli.seed);

    if cli.max_latency > 0 {
        let latency = Distributions::Uniform(Jiffies(0), Jiffies(cli.max_latency));
        builder = builder.link_latency(latency);
    }
    for index in cli.loaders.saturating_sub(cli.offline_loaders)..cli.loaders {
        builder = builder.offline(RestoreRole::Loader, index);
    }
    if let Some(path) = &cli.config {
        builder.override_config(&OperationConfigOverride::from_file(path)?)?;
    }

    let job = builder.build()?;
    print!("{}", job.config().to_toml_string()?);
    for p in job.participants() {
        println!("P{:<4} {:<8} {}", p.process, p.role.name(), p.id);
    }
    println!();

    let report = job.run();
    print!("{report}");
    println!("{}", "-".repeat(75));
    println!(
        "Confirmed workers: {}, heartbeats timed out: {}, hard failures: {}",
        report.confirmed().len(),
        report.count(RequestKind::Heartbeat, RequestState::TimedOut),
        report.hard_failures().count()
    );
    Ok(())
}

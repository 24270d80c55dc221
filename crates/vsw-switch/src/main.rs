//! vswd: virtual Ethernet switch driver.
//!
//! Builds a switch from configuration, attaches one virtual node per port,
//! replays a scenario of frames through it on the simulated clock and prints
//! the learned table and traffic counters.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use vsw_switch::{
    EthSoftSwitch, ReplayStep, Scenario, SwitchConfig, SwitchError, TracingTap, VirtualNode,
};

/// Frames replayed when no scenario file is given: a flood, then the reply
/// that comes back unicast.
const DEMO_SCENARIO: &str = r#"
[[frame]]
port = 0
src = "02:00:00:00:00:01"
dst = "02:00:00:00:00:02"

[[frame]]
port = 1
src = "02:00:00:00:00:02"
dst = "02:00:00:00:00:01"
mode = "non-blocking"
gap_ns = 500
"#;

/// Virtual Ethernet learning switch
#[derive(Parser, Debug)]
#[command(name = "vswd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Switch configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Scenario file (TOML list of frames)
    #[arg(short = 's', long)]
    scenario: Option<PathBuf>,

    /// Number of ports, overrides the configuration
    #[arg(short = 'p', long)]
    ports: Option<usize>,

    /// Enable monitoring taps, overrides the configuration
    #[arg(short = 'm', long)]
    monitor: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SwitchError>() {
            Some(inconsistency @ SwitchError::RoutingInconsistency { .. }) => {
                error!("vswd: simulation stopped: {}", inconsistency);
                eprintln!("vswd: {}", inconsistency);
                ExitCode::from(2)
            }
            _ => {
                error!("vswd: {:#}", e);
                eprintln!("vswd: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn init_logging(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .init();
}

fn load_config(args: &Args) -> Result<SwitchConfig> {
    let mut config = match &args.config {
        Some(path) => SwitchConfig::load_or_default(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SwitchConfig::default(),
    };
    if let Some(ports) = args.ports {
        config.switch.num_ports = ports;
    }
    if args.monitor {
        config.switch.monitoring_enabled = true;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    info!(
        "vswd: {} with {} ports, precision 1e{} s",
        config.switch.name, config.switch.num_ports, config.clock.precision
    );

    let (mut builder, clock) = EthSoftSwitch::from_config(&config)?;
    let nodes: Vec<Arc<VirtualNode>> = (0..config.switch.num_ports)
        .map(|i| Arc::new(VirtualNode::new(format!("node{}", i))))
        .collect();
    for (i, node) in nodes.iter().enumerate() {
        builder = builder.bind(i, node.clone())?;
    }
    let switch = builder.tap_all(Arc::new(TracingTap)).build()?;

    let scenario = match &args.scenario {
        Some(path) => {
            Scenario::load(path).with_context(|| format!("loading scenario {}", path.display()))?
        }
        None => Scenario::from_toml(DEMO_SCENARIO)?,
    };
    info!("vswd: replaying {} frames", scenario.len());

    let steps = scenario.replay_clocked(&switch, &clock).await?;
    print_report(&switch, &nodes, &steps);
    Ok(())
}

fn print_report(switch: &EthSoftSwitch, nodes: &[Arc<VirtualNode>], steps: &[ReplayStep]) {
    println!("Replay:");
    for step in steps {
        println!(
            "  #{:<3} {:<12} port {:<3} status {:<14} {:?}{}",
            step.index,
            step.mode.to_string(),
            step.port,
            step.status.to_string(),
            step.outcome(),
            step.error
                .as_deref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default()
        );
    }

    println!("Learning table ({} entries):", switch.table().len());
    for (fingerprint, entry) in switch.table().entries() {
        let address = entry
            .address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {}  {}  port {}", fingerprint, address, entry.port);
    }

    println!("Nodes:");
    for node in nodes {
        println!("  {:<8} {} frames", node.name(), node.received_count());
    }

    let stats = switch.stats();
    println!("Statistics:");
    println!("  received      {}", stats.total_received());
    println!("  unicast       {}", stats.unicast);
    println!("  flooded       {}", stats.flooded);
    println!("  learned       {}", stats.learned);
    println!("  bypassed      {}", stats.bypassed);
    println!("  downstream    {}", stats.downstream_failures);
    println!("  monitor fail  {}", stats.monitor_failures);
}

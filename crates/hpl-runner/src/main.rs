#![warn(missing_docs)]

//! Entry point for the `hpl-runner` binary: loads a set of properties (and
//! an optional trace), builds their monitors, starts the live monitoring
//! bus, and replays the trace (or idles until interrupted) while verdicts
//! stream to any connected client.

mod cli;
mod error;

use std::{env, fs, path::Path, process, sync::Arc};

use hpl_config::RuntimeConfig;
use live_bus::LiveBus;
use monitor_manager::{Manager, MonitorStatus, VerdictSink};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::error::{Error, Result};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    install_logging();

    let args = cli::parse(env::args().skip(1))?;
    let config = load_config()?;

    let text = fs::read_to_string(&args.properties_path).map_err(|source| Error::Read {
        path: args.properties_path.clone(),
        source,
    })?;
    let properties = hpl_ast::load_properties_from_str(&text)?;
    info!(count = properties.len(), "loaded properties");

    let initial_status: Vec<MonitorStatus> = properties
        .iter()
        .enumerate()
        .map(|(index, p)| MonitorStatus {
            id: if p.id().is_empty() { format!("property-{index}") } else { p.id().to_string() },
            title: p.title().to_string(),
            property: p.description().to_string(),
            verdict: None,
            witness: None,
        })
        .collect();

    let bus = Arc::new(LiveBus::new(&config.bus).spawn(initial_status)?);
    info!(addr = %bus.local_addr(), "live monitoring bus listening");

    let sink_bus = Arc::clone(&bus);
    let sink: VerdictSink = Arc::new(move |event| sink_bus.post(event));
    let mut manager = Manager::build(&properties, Some(sink))?;

    match &args.trace_path {
        Some(trace_path) => {
            let trace = hpl_player::Trace::load_from_path(trace_path)?;
            hpl_player::replay(&trace, config.tick_hz, &mut manager)?;
        }
        None => {
            manager.launch(0.0)?;
            info!("no trace given; idling until interrupted (press Enter to stop)");
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
            manager.shutdown(0.0)?;
        }
    }

    bus.shutdown()?;
    Ok(())
}

fn load_config() -> Result<RuntimeConfig> {
    match env::var("HPL_RUNNER_CONFIG") {
        Ok(path) => Ok(RuntimeConfig::load_from_path(Path::new(&path))?),
        Err(_) => Ok(RuntimeConfig::default()),
    }
}

fn install_logging() {
    let spec = logging::compute_spec(false, false, None, None);
    let env_filter = logging::env_filter_from_spec(&spec);
    registry().with(env_filter).with(fmt::layer().without_time()).try_init().ok();
}

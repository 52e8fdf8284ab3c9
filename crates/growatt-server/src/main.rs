//! Growatt telemetry proxy binary.
//!
//! # Usage
//!
//! ```bash
//! growatt-proxy --config growatt-proxy.toml
//! growatt-proxy --config /etc/growatt-proxy.toml --work-dir /var/lib/growatt-proxy
//! ```

use std::sync::Arc;

use clap::Parser;
use growatt_core::ProxyConfig;
use growatt_server::{
    Server,
    control,
    dispatch::Dispatch,
    mqtt::MqttPublisher,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Growatt datalogger telemetry proxy
#[derive(Parser, Debug)]
#[command(name = "growatt-proxy")]
#[command(about = "Transparent proxy for the Growatt datalogger telemetry protocol")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "growatt-proxy.toml")]
    config: String,

    /// Working directory to chdir into before reading the config file
    #[arg(long)]
    work_dir: Option<String>,
}

fn init_logging(config: &ProxyConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_output {
        growatt_core::config::LogOutput::Stdout => {
            tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
            None
        },
        growatt_core::config::LogOutput::File => {
            let file_appender = tracing_appender::rolling::daily(".", &config.log_file);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        },
    }
}

#[tokio::main]
#[allow(clippy::print_stderr)] // tracing isn't initialized yet for these bootstrap failures
async fn main() -> std::process::ExitCode {
    let args = Args::parse();

    if let Some(work_dir) = &args.work_dir {
        if !std::path::Path::new(work_dir).is_dir() {
            eprintln!("work directory {work_dir} does not exist");
            return std::process::ExitCode::from(3);
        }
        if let Err(err) = std::env::set_current_dir(work_dir) {
            eprintln!("cannot chdir into {work_dir}: {err}");
            return std::process::ExitCode::from(3);
        }
    }

    let config_text = match std::fs::read_to_string(&args.config) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("cannot read config file {}: {err}", args.config);
            return std::process::ExitCode::FAILURE;
        },
    };
    let config: ProxyConfig = match toml::from_str(&config_text) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid config file {}: {err}", args.config);
            return std::process::ExitCode::FAILURE;
        },
    };

    let _log_guard = init_logging(&config);
    tracing::info!("growatt-proxy starting");

    let config = Arc::new(config);

    // Dynamic plugin discovery is out of scope; the set starts empty and
    // is only ever populated by code compiled directly into this binary.
    let mqtt: Option<Arc<dyn growatt_server::dispatch::MqttSink>> =
        if config.mqtt.enabled { Some(Arc::new(MqttPublisher::connect(&config.mqtt))) } else { None };
    let dispatch = Arc::new(Dispatch::new(Vec::new(), Vec::new(), mqtt));

    let server = Arc::new(Server::new(Arc::clone(&config), dispatch));

    tokio::spawn(control::serve(Arc::clone(&server)));

    if let Err(err) = server.serve().await {
        tracing::error!(%err, "server exited with error");
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}

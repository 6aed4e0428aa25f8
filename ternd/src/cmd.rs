use clap::{Parser, ValueEnum};

use ternd::agent::server;
use ternd::config::Config;
use ternd::trace::TraceConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Tern CNI delegation daemon", long_about = None)]
pub struct Cmd {
    #[arg(short, long, default_value = "info", help = "Log level (trace, debug, info, warn, error)")]
    pub level: String,

    #[arg(value_enum, short = 'd', long, default_value = "plain", help = "Log display format")]
    pub format: Format,

    #[arg(short = 'o', long = "log-file", help = "Log output file path")]
    pub log_file: Option<String>,

    #[arg(short, long, help = "Config file path for ternd")]
    pub file: Option<String>,

    #[arg(short, long, help = "Endpoint where the CNI delegation server listens")]
    pub endpoint: Option<String>,

    #[arg(long = "vrouter", help = "Endpoint of the vRouter backend")]
    pub vrouter_endpoint: Option<String>,

    #[arg(long, help = "Per request handling timeout in seconds")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Format {
    Plain,
    Json,
}

pub fn run(cmd: Cmd) {
    let mut config = match &cmd.file {
        Some(file) => Config::load(file).expect("failed to load configuration file"),
        None => Config::default(),
    };
    if let Some(endpoint) = cmd.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(vrouter_endpoint) = cmd.vrouter_endpoint {
        config.vrouter_endpoint = vrouter_endpoint;
    }
    if let Some(timeout) = cmd.timeout {
        config.request_timeout = timeout;
    }

    let format = match cmd.format {
        Format::Plain => "plain".to_string(),
        Format::Json => "json".to_string(),
    };
    let trace_config = TraceConfig {
        level: cmd.level,
        format,
        file: cmd.log_file,
    };

    server::start(config, trace_config);
}

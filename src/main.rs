//! Command-line interface for dpi-relay
//!
//! Reads JSON-encoded DPI records (one per line) from a file or stdin,
//! runs them through the rule-processing engine, writes the rendered
//! syslog/SIEM output to stdout, and forwards statistics records to stderr
//! or a file.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use dpi_relay::{DpiRecord, EngineConfig, RuleEngine};

/// DPI rule-processing engine: syslog and SIEM message relay
#[derive(Parser, Debug)]
#[command(name = "dpi-relay")]
#[command(version = dpi_relay::VERSION)]
#[command(about = "Process classified DPI records into syslog and SIEM messages", long_about = None)]
struct Cli {
    /// YAML configuration file; flags below override its values
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input file with one JSON record per line (defaults to stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Number of worker tasks (defaults to the number of CPU cores)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Enable the SIEM composition path
    #[arg(long)]
    siem: bool,

    /// Verbose diagnostic SIEM rendering
    #[arg(long)]
    siem_debug: bool,

    /// Disable syslog line output
    #[arg(long)]
    no_syslog: bool,

    /// Per-line cap for syslog output
    #[arg(long)]
    max_line_length: Option<usize>,

    /// Directory holding auxiliary protocol scripts
    #[arg(long, value_name = "DIR")]
    scripts_dir: Option<PathBuf>,

    /// Write statistics records (JSON) to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    stats_file: Option<PathBuf>,

    /// Enable JSON structured logging
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_yaml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.siem {
            config.siem_mode = true;
        }
        if self.siem_debug {
            config.siem_debug_mode = true;
        }
        if self.no_syslog {
            config.syslog_enabled = false;
        }
        if let Some(max) = self.max_line_length {
            config.max_line_length = max;
        }
        if let Some(dir) = &self.scripts_dir {
            config.scripts_dir = Some(dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dpi_relay::init_tracing(cli.json_logs);

    let config = cli.engine_config()?;
    info!(workers = config.workers, siem = config.siem_mode, "dpi-relay starting");

    let mut handle = RuleEngine::new(config)?.start()?;
    let producer = handle.producer.clone();

    // Feed records from the input source into the bounded receive queue;
    // a full queue backpressures this task, never the engine.
    let input = cli.input.clone();
    let feeder = tokio::spawn(async move {
        let reader: Box<dyn BufRead + Send> = match input {
            Some(path) => match std::fs::File::open(&path) {
                Ok(file) => Box::new(BufReader::new(file)),
                Err(err) => {
                    warn!(%err, path = %path.display(), "cannot open input");
                    return;
                }
            },
            None => Box::new(BufReader::new(std::io::stdin())),
        };
        for line in reader.lines() {
            let line = match line {
                Ok(line) if !line.trim().is_empty() => line,
                Ok(_) => continue,
                Err(err) => {
                    warn!(%err, "input read failed");
                    break;
                }
            };
            match serde_json::from_str::<DpiRecord>(&line) {
                Ok(record) => {
                    if producer.send(record).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(%err, "skipping undecodable record"),
            }
        }
    });

    // Forward stats records.
    let stats_file = cli.stats_file.clone();
    let mut stats_rx = std::mem::replace(&mut handle.stats_rx, tokio::sync::mpsc::channel(1).1);
    let stats_task = tokio::spawn(async move {
        let mut out: Box<dyn Write + Send> = match stats_file {
            Some(path) => match std::fs::File::create(&path) {
                Ok(file) => Box::new(file),
                Err(err) => {
                    warn!(%err, "cannot create stats file, using stderr");
                    Box::new(std::io::stderr())
                }
            },
            None => Box::new(std::io::stderr()),
        };
        while let Some(record) = stats_rx.recv().await {
            if let Ok(json) = serde_json::to_string(&record) {
                let _ = writeln!(out, "{json}");
            }
        }
    });

    // Print rendered output until the engine stops.
    let mut syslog_rx = std::mem::replace(&mut handle.syslog_rx, tokio::sync::mpsc::channel(1).1);
    let printer = tokio::spawn(async move {
        let stdout = std::io::stdout();
        while let Some(line) = syslog_rx.recv().await {
            let mut lock = stdout.lock();
            let _ = writeln!(lock, "{line}");
        }
    });

    // Run until the input is exhausted or Ctrl-C arrives.
    let mut feeder = feeder;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
        }
        _ = &mut feeder => {
            // give in-flight records a moment to drain
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    feeder.abort();
    handle.shutdown(Duration::from_secs(10)).await?;
    printer.await.ok();
    stats_task.abort();
    Ok(())
}

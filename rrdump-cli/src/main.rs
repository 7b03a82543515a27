//! CLI for inspecting and exporting rrdtool dumps.
//!
//! Provides commands for summarizing a round-robin database and exporting its
//! contents as JSON or CSV.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use rrdump::{Archive, RrdTool, Value};
use tracing_subscriber::EnvFilter;

/// rrdump — inspect rrdtool databases through their XML dump.
#[derive(Parser)]
#[command(name = "rrdump", version, about)]
struct Cli {
    /// rrdtool executable used to dump `.rrd` files.
    #[arg(long, global = true, env = "RRDTOOL", default_value = rrdump::source::DEFAULT_PROGRAM)]
    rrdtool: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Display version, step, data sources and archives.
    Info {
        /// An `.rrd` file, a saved `.xml` dump, or `-` for a dump on stdin.
        source: PathBuf,
    },

    /// Export decoded data.
    Export {
        /// An `.rrd` file, a saved `.xml` dump, or `-` for a dump on stdin.
        source: PathBuf,

        /// Output format.
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Archive to export as CSV (0 = first `rra` in the dump).
        #[arg(long, default_value = "0")]
        rra: usize,
    },
}

/// Output format for exports.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// The whole archive as pretty-printed JSON.
    Json,
    /// One archive's rows as comma-separated values.
    Csv,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tool = RrdTool::with_program(cli.rrdtool);

    let result = match cli.command {
        Commands::Info { source } => cmd_info(&tool, &source),
        Commands::Export {
            source,
            format,
            rra,
        } => cmd_export(&tool, &source, &format, rra),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Obtains and decodes the archive named by `source`.
fn load(tool: &RrdTool, source: &Path) -> Result<Archive, Box<dyn std::error::Error>> {
    let bytes = if source == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        buf
    } else if source.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xml")) {
        rrdump::source::read_dump(source)?
    } else {
        tool.dump(source)?
    };

    tracing::debug!(source = %source.display(), bytes = bytes.len(), "decoding");
    Ok(rrdump::decode(&bytes)?)
}

/// Implements `rrdump info <source>`.
fn cmd_info(tool: &RrdTool, source: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let archive = load(tool, source)?;

    println!("Source: {}", source.display());
    println!("Version: {}", archive.version);
    println!("Step: {}", format_duration_secs(archive.step.as_secs()));
    println!(
        "Last update: {} ({})",
        archive.last_update.to_rfc3339(),
        archive.last_update.timestamp()
    );
    println!();

    println!("Data sources: {}", archive.data_sources.len());
    for (i, ds) in archive.data_sources.iter().enumerate() {
        println!(
            "  {i}: \"{}\" type={} heartbeat={} min={} max={}",
            ds.name,
            ds.kind,
            format_heartbeat(ds.minimal_heartbeat),
            ds.min,
            ds.max
        );
    }
    println!();

    println!("Archives: {}", archive.archives.len());
    for (i, rra) in archive.archives.iter().enumerate() {
        let xff = rra
            .xff()
            .map_or_else(|| "-".to_string(), |x| format!("{x}"));
        let interval = rra
            .row_interval(archive.step)
            .map_or_else(|| "?".to_string(), |d| format_duration_secs(d.as_secs()));
        let span = rra
            .span(archive.step)
            .and_then(|s| u64::try_from(s.num_seconds()).ok())
            .map_or_else(|| "?".to_string(), format_duration_secs);
        let unknown = rra
            .rows
            .iter()
            .flat_map(|row| row.values())
            .filter(|v| v.is_unknown())
            .count();

        println!(
            "  {i}: cf={} pdp_per_row={} xff={xff} rows={} interval={interval} span={span} unknown={unknown}",
            rra.cf.trim(),
            rra.pdp_per_row,
            rra.rows.len()
        );
    }

    Ok(())
}

/// Implements `rrdump export <source>`.
fn cmd_export(
    tool: &RrdTool,
    source: &Path,
    format: &OutputFormat,
    rra_index: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let archive = load(tool, source)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&archive)?);
        }
        OutputFormat::Csv => {
            let rra = archive.archives.get(rra_index).ok_or_else(|| {
                format!(
                    "Archive {rra_index} not found ({} available)",
                    archive.archives.len()
                )
            })?;
            let timestamps = archive.row_timestamps(rra_index);

            let header: Vec<&str> = archive
                .data_sources
                .iter()
                .map(|ds| ds.name.as_str())
                .collect();
            println!(
                "# cf={}, pdp_per_row={}, rows={}",
                rra.cf.trim(),
                rra.pdp_per_row,
                rra.rows.len()
            );
            println!("timestamp,{}", header.join(","));

            for (i, row) in rra.rows.iter().enumerate() {
                let ts = timestamps
                    .as_ref()
                    .and_then(|t| t.get(i))
                    .map_or_else(String::new, |t| t.timestamp().to_string());
                let cells: Vec<String> = row.values().iter().copied().map(format_cell).collect();
                println!("{ts},{}", cells.join(","));
            }
        }
    }

    Ok(())
}

/// Formats a sample for CSV; unknown samples are left empty.
fn format_cell(value: Value) -> String {
    value.known().map(|v| v.to_string()).unwrap_or_default()
}

/// Formats seconds as a human-readable duration.
fn format_duration_secs(secs: u64) -> String {
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

/// Formats a heartbeat; negative values are shown as plain seconds.
fn format_heartbeat(secs: i64) -> String {
    u64::try_from(secs).map_or_else(|_| format!("{secs}s"), format_duration_secs)
}

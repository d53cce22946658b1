//! icetap - strips ICY metadata from a captured Shoutcast/Icecast stream.
//!
//! Reads the raw response body from a file or stdin, writes the clean audio
//! to a file or stdout, and reports track changes as JSON lines.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use icetap_core::{
    IcyAsyncReader, IcyHeaders, MetaInterval, MetadataSink, NowPlaying, StreamMetadata,
    TextEncoding,
};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::CliConfig;

/// Path argument meaning stdin or stdout.
const STDIO_PATH: &str = "-";

/// icetap - Strip ICY metadata from Shoutcast/Icecast captures.
#[derive(Parser, Debug)]
#[command(name = "icetap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Captured response body, or "-" for stdin.
    #[arg(value_name = "INPUT", default_value = STDIO_PATH)]
    input: PathBuf,

    /// Where to write the audio ("-" for stdout). Audio is discarded when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "ICETAP_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bytes between metadata frames (overrides config and headers).
    #[arg(short, long, allow_negative_numbers = true)]
    metaint: Option<i64>,

    /// Captured response headers used to find icy-metaint.
    #[arg(long, value_name = "FILE")]
    headers: Option<PathBuf>,

    /// Metadata text encoding (utf-8 or iso-8859-1).
    #[arg(short, long)]
    encoding: Option<TextEncoding>,

    /// Print every key/value pair instead of only track changes.
    #[arg(long)]
    raw: bool,

    /// Copy the input unchanged without looking for metadata.
    #[arg(long)]
    no_metadata: bool,
}

/// One `key='value'` pair as printed in raw mode.
#[derive(Serialize)]
struct PairEvent<'a> {
    key: &'a str,
    value: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays free for audio or events
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("icetap v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(metaint) = args.metaint {
        config.metaint = Some(metaint);
    }
    if let Some(headers) = args.headers {
        config.headers_file = Some(headers);
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if args.raw {
        config.raw_pairs = true;
    }
    if args.no_metadata {
        config.metadata_enabled = false;
    }

    let interval = resolve_interval(&config)?;
    log::info!(
        "Configuration: metaint={}, encoding={}",
        interval,
        config.encoding.label()
    );

    let audio_to_stdout = args.output.as_deref().is_some_and(is_stdio);
    let input = open_input(&args.input).await?;
    let mut output = open_output(args.output.as_deref()).await?;

    let raw_pairs = config.raw_pairs;
    let mut now_playing = NowPlaying::new()
        .on_change(move |meta: &StreamMetadata| emit_event(meta, audio_to_stdout));
    let sink = move |key: &str, value: &str| {
        if raw_pairs {
            emit_event(&PairEvent { key, value }, audio_to_stdout);
        } else {
            now_playing.on_metadata(key, value);
        }
    };

    let mut reader = IcyAsyncReader::with_options(input, interval, &config.to_demux_options())
        .with_sink(sink);

    let copied = tokio::io::copy(&mut reader, &mut output)
        .await
        .context("Stream copy failed")?;
    output.flush().await.context("Failed to flush output")?;

    log::info!("Done: {} audio bytes", copied);
    Ok(())
}

/// Picks the metadata interval: explicit value first, then the captured headers.
fn resolve_interval(config: &CliConfig) -> Result<MetaInterval> {
    let options = config.to_demux_options();
    if !options.metadata_enabled {
        return Ok(MetaInterval::PASSTHROUGH);
    }

    if let Some(metaint) = config.metaint {
        return Ok(MetaInterval::new(metaint));
    }

    if let Some(ref path) = config.headers_file {
        let block = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read headers file: {}", path.display()))?;
        let headers = IcyHeaders::parse_block(&block);
        if let Some(ref name) = headers.name {
            log::info!("Station: {}", name);
        }
        if headers.metaint.is_none() {
            log::warn!("{} has no icy-metaint, copying unchanged", path.display());
        }
        return Ok(headers.interval(&options));
    }

    bail!("No metadata interval: pass --metaint, --headers or --no-metadata")
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO_PATH
}

async fn open_input(path: &Path) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
    if is_stdio(path) {
        return Ok(Box::new(tokio::io::stdin()));
    }
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open input: {}", path.display()))?;
    Ok(Box::new(file))
}

async fn open_output(path: Option<&Path>) -> Result<Box<dyn AsyncWrite + Unpin + Send>> {
    match path {
        None => Ok(Box::new(tokio::io::sink())),
        Some(path) if is_stdio(path) => Ok(Box::new(tokio::io::stdout())),
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create output: {}", path.display()))?;
            Ok(Box::new(file))
        }
    }
}

/// Prints one JSON line to stdout, or stderr when stdout carries audio.
fn emit_event<T: Serialize>(event: &T, to_stderr: bool) {
    match serde_json::to_string(event) {
        Ok(line) if to_stderr => eprintln!("{}", line),
        Ok(line) => println!("{}", line),
        Err(e) => log::warn!("Failed to serialize metadata event: {}", e),
    }
}

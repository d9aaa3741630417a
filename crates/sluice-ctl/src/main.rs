//! sluice-ctl — write, read back and checksum bulk-encoded files.

use std::path::Path;

use anyhow::{bail, Context, Result};

use sluice_core::bulk::MULTI_BULK_TAG;
use sluice_core::config::SluiceConfig;
use sluice_core::{FileBackend, Transport};

/// Bytes pulled per read when checksumming a whole file.
const CHECKSUM_STEP: u64 = 64 * 1024;

fn hex_crc(crc: u64) -> String {
    hex::encode(crc.to_be_bytes())
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

fn cmd_encode(config: &SluiceConfig, path: &Path, values: &[&str]) -> Result<()> {
    let file = FileBackend::create(path, config.transport.write_buffer)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = Transport::from_config(file, config);

    let mut written = out
        .write_bulk_count(MULTI_BULK_TAG, values.len() as u64)
        .context("failed to write record count")?;
    for value in values {
        written += out
            .write_bulk_string(value.as_bytes())
            .context("failed to write value")?;
    }
    out.flush().context("failed to sync output")?;

    let syncs = out.as_file().map(|f| f.sync_count()).unwrap_or(0);
    tracing::info!(path = %path.display(), written, syncs, "encoded");
    println!("wrote {} values, {} bytes", values.len(), written);
    println!("crc64  : {}", hex_crc(out.checksum()));
    Ok(())
}

fn cmd_decode(config: &SluiceConfig, path: &Path) -> Result<()> {
    let file = FileBackend::open(path, config.transport.read_buffer)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut input = Transport::from_config(file, config);

    let count = input
        .read_bulk_count(MULTI_BULK_TAG)
        .context("missing record count")?;
    for i in 0..count {
        let value = input
            .read_bulk_string()
            .with_context(|| format!("failed to read value {i} of {count}"))?;
        println!("{i:>4}  {}", String::from_utf8_lossy(&value));
    }
    println!("crc64  : {}", hex_crc(input.checksum()));
    Ok(())
}

fn cmd_checksum(config: &SluiceConfig, path: &Path) -> Result<()> {
    let total = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    let file = FileBackend::open(path, config.transport.read_buffer)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut input = Transport::from_config(file, config);
    if !config.transport.checksum {
        input.set_checksum(Some(sluice_core::checksum::crc64_update));
    }

    let mut buf = vec![0u8; CHECKSUM_STEP as usize];
    let mut left = total;
    while left > 0 {
        let step = left.min(CHECKSUM_STEP) as usize;
        input
            .read(&mut buf[..step])
            .context("file shrank while reading")?;
        left -= step as u64;
    }

    println!("bytes  : {}", input.processed_bytes());
    println!("crc64  : {}", hex_crc(input.checksum()));
    Ok(())
}

fn cmd_config(config: &SluiceConfig) -> Result<()> {
    println!("# {}", SluiceConfig::file_path().display());
    print!("{}", config.to_toml()?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = SluiceConfig::write_default_if_missing().context("failed to write config")?;
    println!("config : {}", path.display());
    Ok(())
}

fn print_usage() {
    println!("Usage: sluice-ctl [--max-chunk <bytes>] <command>");
    println!();
    println!("Commands:");
    println!("  encode <file> <value>...   Write values as a multi-bulk record");
    println!("  decode <file>              Print the values of a multi-bulk record");
    println!("  checksum <file>            CRC-64 of a file, streamed through a transport");
    println!("  config                     Print the effective configuration");
    println!("  config init                Write a default config file if none exists");
    println!();
    println!("Options:");
    println!("  --max-chunk <bytes>   Override transport.max_chunk");
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = SluiceConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        SluiceConfig::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--max-chunk" {
            i += 1;
            config.transport.max_chunk = args
                .get(i)
                .context("--max-chunk requires a value")?
                .parse()
                .context("--max-chunk must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["encode", path, values @ ..] => cmd_encode(&config, Path::new(path), values),
        ["decode", path] => cmd_decode(&config, Path::new(path)),
        ["checksum", path] => cmd_checksum(&config, Path::new(path)),
        ["config"] => cmd_config(&config),
        ["config", "init"] => cmd_config_init(),
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            bail!("unknown command: {}", other.join(" "))
        }
    }
}

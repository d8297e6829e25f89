// vsfsck/src/main.rs

mod utils;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use vsfs::prelude::*;

use crate::utils::{LogLevel, init_logger};

/// Check a vsfs image for consistency.
///
/// Silent on success. Set `RUST_LOG=debug` for the per-phase report,
/// `RUST_LOG=trace` for per-inode records.
#[derive(Parser)]
#[command(name = "vsfsck", disable_version_flag = true)]
struct Cli {
    /// Image to check (opened read-only)
    image: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {e:#}", "error".red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let level = init_logger(std::env::var("RUST_LOG").ok().as_deref());

    let mut file = File::open(&cli.image)
        .with_context(|| format!("cannot open image {}", cli.image.display()))?;
    let mut io = StdBlockIO::new(&mut file);

    let meta = VsfsMeta::from_io(&mut io)?;
    log::debug!(
        "{}: {} blocks, {} inodes, data region {}..{}",
        cli.image.display(),
        meta.size,
        meta.ninodes,
        meta.data_start,
        meta.size
    );

    let mut checker = VsfsChecker::new(&mut io, &meta);
    let report = checker.check_all()?;

    if level == LogLevel::Verbose {
        for line in report.to_string().lines() {
            log::debug!("{line}");
        }
        let stats = checker.stats();
        log::debug!(
            "{}: clean ({} inodes, {} blocks in use)",
            cli.image.display(),
            stats.inodes_checked,
            stats.blocks_referenced
        );
    }
    Ok(())
}

//! Main entry point for the zipfetch CLI application.
//!
//! Lists or extracts regex-selected entries of a ZIP archive, fetched with
//! HTTP Range requests for URLs or read in place for local paths.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;

use zipfetch::logging::init_logging;
use zipfetch::{
    ArchiveHandle, Cli, EntryFilter, FetchConfig, HttpRangeFetcher, LocalFileFetcher, Outcome,
    RangeFetch, extract_matching,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let config = match &cli.config {
        Some(path) => FetchConfig::load(path)?,
        None => FetchConfig::default(),
    };

    if cli.is_http_url() {
        let fetcher = Arc::new(HttpRangeFetcher::new(cli.archive.clone(), &config)?);
        let handle = Arc::new(ArchiveHandle::new(Arc::clone(&fetcher), &config));

        let result = process_archive(handle, &cli, &config).await;

        // Display network transfer statistics for HTTP sources
        if !cli.quiet {
            eprintln!(
                "Total bytes transferred: {}",
                format_size(fetcher.transferred_bytes())
            );
        }
        result
    } else {
        let fetcher = Arc::new(LocalFileFetcher::open(Path::new(&cli.archive))?);
        process_archive(Arc::new(ArchiveHandle::new(fetcher, &config)), &cli, &config).await
    }
}

/// List or extract, depending on the CLI flags.
async fn process_archive<F: RangeFetch + 'static>(
    handle: Arc<ArchiveHandle<F>>,
    cli: &Cli,
    config: &FetchConfig,
) -> Result<()> {
    if cli.is_listing() {
        return list_files(&handle, cli).await;
    }

    let report = extract_matching(handle, &cli.extract_dir, &cli.pattern, config).await?;

    if !cli.quiet {
        for path in &report.written {
            println!("  extracted: {}", path.display());
        }
        for name in &report.skipped {
            println!("  skipped directory: {name}");
        }
    }
    for failure in &report.failed {
        eprintln!("  failed: {} ({})", failure.file_name, failure.error);
    }

    match report.outcome() {
        Outcome::Complete => {
            if !cli.quiet {
                println!(
                    "{} of {} matching entries extracted",
                    report.written.len(),
                    report.matched
                );
            }
            Ok(())
        }
        Outcome::Partial { failed } => {
            bail!("{failed} of {} matching entries failed", report.matched)
        }
    }
}

/// List matching entries.
///
/// `-l` prints names only; `-v` prints a table with sizes, compression
/// ratio and DOS timestamps, followed by a totals line.
async fn list_files<F: RangeFetch>(handle: &ArchiveHandle<F>, cli: &Cli) -> Result<()> {
    let directory = handle.directory().await?;
    let filter = EntryFilter::new(&cli.pattern)?;
    let entries = filter.apply(&directory.entries);

    if !cli.verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory() {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );

    Ok(())
}

/// Space saved by compression, as a right-aligned percentage.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    let saved = if uncompressed > 0 && compressed <= uncompressed {
        100 - (compressed * 100 / uncompressed)
    } else {
        0
    };
    format!("{saved:>4}%")
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

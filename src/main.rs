//! superbook-border - Scanner-bed border removal for scanned book pages
//!
//! CLI entry point

use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use superbook_border::cli::collect_images;
use superbook_border::{
    exit_codes, BorderOptions, BorderRemover, CleanArgs, Cli, Commands, Config, PageOutcome, Side,
};
use tracing::{warn, Level};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Clean(args) => run_clean(args, cli.quiet),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============ Clean Command ============

fn run_clean(args: &CleanArgs, quiet: bool) -> anyhow::Result<()> {
    let start_time = Instant::now();

    if !args.input.exists() {
        eprintln!("Error: Input path does not exist: {}", args.input.display());
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    let images = collect_images(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    if images.is_empty() {
        eprintln!("Error: No images found in input path");
        std::process::exit(exit_codes::INPUT_NOT_FOUND);
    }

    // Config file first, CLI flags on top. A found but broken file is an
    // error whether it was named with --config or picked up from the search paths.
    let loaded = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    let file_config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_codes::INVALID_CONFIG);
        }
    };
    let config = file_config.merge_with_cli(&args.overrides());

    if let Err(e) = config.border.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(exit_codes::INVALID_CONFIG);
    }

    let pairs: Vec<(PathBuf, PathBuf)> = images
        .iter()
        .map(|input| {
            let name = input.file_name().map(PathBuf::from).unwrap_or_default();
            (input.clone(), args.output.join(name))
        })
        .collect();

    if args.dry_run {
        print_execution_plan(args, &pairs, &config);
        return Ok(());
    }

    if let Some(threads) = config.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            warn!("Could not configure {} worker threads: {}", threads, e);
        }
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(pairs.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb
    };

    let outcomes = BorderRemover::process_batch_with_progress(&pairs, &config.border, |outcome| {
        if let Some(err) = &outcome.error {
            progress.println(format!("Failed: {}: {}", outcome.input.display(), err));
        }
        progress.inc(1);
    });
    progress.finish_and_clear();

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&outcomes).context("failed to serialize report")?;
        std::fs::write(report_path, json)
            .with_context(|| format!("failed to write {}", report_path.display()))?;
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if !quiet {
        print_summary(&outcomes);
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    if failed > 0 {
        bail!("{} page(s) failed to process", failed);
    }

    Ok(())
}

/// Print execution plan for dry-run mode
fn print_execution_plan(args: &CleanArgs, pairs: &[(PathBuf, PathBuf)], config: &Config) {
    let border = &config.border;

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", args.input.display());
    println!("Output: {}", args.output.display());
    println!("Pages to process: {}", pairs.len());
    println!();
    println!("Border Options:");
    println!("  Strategy: {}", border.strategy);
    println!("  Dark threshold: {}", border.dark_threshold);
    println!("  Edge band: {:.0}%", border.edge_process_pct * 100.0);
    println!(
        "  Verification: valid ratio >= {:.2}, dark fraction >= {:.2}",
        border.min_valid_ratio, border.min_dark_fraction
    );
    println!("  Mask cleanup radius: {}px", border.mask_erode_px);
    println!(
        "  Corners: {}",
        if border.first_wins { "first wins" } else { "last wins" }
    );
    for side in Side::all() {
        let [r, g, b] = border.colors.for_side(side);
        println!("  {} color: ({}, {}, {})", side, r, g, b);
    }
    println!();
    println!(
        "Threads: {}",
        config
            .threads
            .map_or_else(|| "all cores".to_string(), |t| t.to_string())
    );
    if let Some(report) = &args.report {
        println!("Report: {}", report.display());
    }
    println!();
    println!("Pages:");
    for (i, (input, output)) in pairs.iter().enumerate() {
        println!("  {}. {} -> {}", i + 1, input.display(), output.display());
    }
}

fn print_summary(outcomes: &[PageOutcome]) {
    let ok = outcomes.iter().filter(|o| o.is_ok()).count();
    let cleaned = outcomes
        .iter()
        .filter_map(|o| o.report.as_ref())
        .filter(|r| r.has_border())
        .count();

    println!("Processed: {}/{} pages", ok, outcomes.len());
    println!("  Borders whitened: {}", cleaned);
    println!("  Unchanged: {}", ok - cleaned);
    if ok < outcomes.len() {
        println!("  Failed: {}", outcomes.len() - ok);
    }
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("superbook-border v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  Worker threads: {}", rayon::current_num_threads());

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let marker = if path.is_file() { " (found)" } else { "" };
        println!("  {}{}", path.display(), marker);
    }

    println!();
    println!("Default Options:");
    let defaults = Config {
        border: BorderOptions::default(),
        threads: None,
    };
    for line in defaults.to_toml()?.lines() {
        println!("  {}", line);
    }

    Ok(())
}

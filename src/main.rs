mod annotate;
mod bcf_io;
mod cli;
mod complexity;
mod genome_ref;
mod globals;
mod int_range;
mod log_utils;
mod logger;
mod progress_reporter;
mod refine;
mod run_stats;
mod seq_util;
mod sv_type;
mod variant;
mod vcf_utils;

use std::{error, process};

use hhmmss::Hhmmss;
use itertools::Itertools;
use log::info;

use crate::annotate::run_annotate;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_stderr_logger;
use crate::progress_reporter::LogProgressReporter;
use crate::run_stats::write_annotate_run_stats;

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!("cmdline: {}", std::env::args().join(" "));
    info!("Running on {} threads", settings.shared.thread_count);

    let start = std::time::Instant::now();

    let progress = LogProgressReporter::new("Annotated", "chromosomes");
    let stats = run_annotate(
        &settings.annotate,
        settings.shared.thread_count,
        &progress,
    )?;
    stats.log_summary();

    if let Some(stats_filename) = &settings.annotate.stats_filename {
        write_annotate_run_stats(stats_filename, &stats);
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    setup_stderr_logger(settings.shared.debug);

    if let Err(err) = run(&settings) {
        eprintln!("{err}");
        process::exit(2);
    }
}

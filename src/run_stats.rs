//! Track stats for the whole annotation run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RefineFailureStats {
    /// Candidates without an acceptable consensus alignment
    pub alignment: usize,

    /// Candidates without an acceptable junction in the consensus alignment
    pub split: usize,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AnnotateStats {
    pub chrom_count: usize,

    /// Count of all records read from the variant file
    pub candidate_count: usize,

    /// Records dropped because their SV type does not match the requested type
    pub type_filtered_count: usize,

    /// Records too large, imprecise or lacking a consensus sequence
    pub ineligible_count: usize,

    pub refined_count: usize,
    pub refine_failures: RefineFailureStats,

    /// Count of records written with symbolic alleles
    pub fallback_count: usize,

    /// Count of all records written
    pub output_record_count: usize,

    pub total_runtime_secs: f64,
}

impl AnnotateStats {
    pub fn log_summary(&self) {
        info!(
            "Read {} candidate records on {} chromosomes",
            self.candidate_count, self.chrom_count
        );
        info!(
            "Records written: {} refined: {} symbolic: {} filtered by SV type: {}",
            self.output_record_count,
            self.refined_count,
            self.fallback_count,
            self.type_filtered_count
        );
        info!(
            "Symbolic records: {} ineligible, {} without consensus alignment, {} without junction",
            self.ineligible_count, self.refine_failures.alignment, self.refine_failures.split
        );
    }
}

/// Write run stats out in json format
pub fn write_annotate_run_stats(filename: &Utf8Path, run_stats: &AnnotateStats) {
    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(filename),
        "Unable to create run statistics json file: '{}'",
        filename
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &run_stats),
        "Unable to write run statistics json file: '{}'",
        filename
    );
}

//! Annotate SV candidate records with refined breakpoints
//!
//! Chromosomes are processed in reference order. Each candidate of the requested SV type is either
//! refined from its consensus sequence, or written with symbolic alleles at its original position
//! when it is not eligible for refinement or refinement fails.
//!

pub mod compose;

use std::str::FromStr;

use hhmmss::Hhmmss;
use log::{info, warn};
use rayon::prelude::*;
use simple_error::{SimpleResult, try_with};

use self::compose::{compose_fallback, compose_refined};
use crate::bcf_io::{BcfVariantSink, BcfVariantSource};
use crate::cli::AnnotateSettings;
use crate::genome_ref::FastaReferenceSource;
use crate::log_utils::debug_msg;
use crate::progress_reporter::ProgressReporter;
use crate::refine::align::ConsensusAligner;
use crate::refine::{RefineFailure, RefineSettings, refine_breakpoint};
use crate::run_stats::AnnotateStats;
use crate::sv_type::SvType;
use crate::variant::{AnnotatedVariant, CandidateVariant};
use crate::vcf_utils::{OutputFormat, build_bcf_index, get_annotated_vcf_header};

/// A reference chromosome sequence, uppercased
pub struct ChromSeq {
    pub name: String,
    pub seq: Vec<u8>,
}

/// Streams reference chromosomes in reference order
///
/// Chromosome sequences are converted to uppercase by the source, so that refinement can compare
/// them directly to the uppercase consensus.
///
pub trait ReferenceSource {
    fn next_chrom(&mut self) -> Option<SimpleResult<ChromSeq>>;
}

/// Indexed access to SV candidates by chromosome
///
/// Each candidate is returned with an opaque handle to its source record, which is passed back to
/// the [VariantSink] together with the annotation result.
///
pub trait VariantSource {
    type Handle;

    /// Number of chromosomes in the source header
    fn chrom_count(&self) -> usize;

    fn has_chrom(&self, chrom: &str) -> bool;

    /// Get all candidates on `chrom` in source order
    fn fetch_chrom(
        &mut self,
        chrom: &str,
        chrom_len: u64,
    ) -> SimpleResult<Vec<(CandidateVariant, Self::Handle)>>;
}

pub trait VariantSink<H> {
    fn write_variant(&mut self, handle: H, variant: &AnnotatedVariant) -> SimpleResult<()>;
}

#[derive(Clone, Debug)]
pub struct AnnotateOptions {
    /// Only candidates of this type, or without any type, are annotated
    pub sv_type: SvType,

    /// Maximum SV length eligible for refinement
    pub max_len: i64,

    pub emit_microhomology: bool,
    pub refine: RefineSettings,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            sv_type: SvType::default(),
            max_len: 500,
            emit_microhomology: false,
            refine: RefineSettings::default(),
        }
    }
}

/// How a candidate's annotation was produced
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CandidateOutcome {
    Refined,
    Ineligible,
    Failed(RefineFailure),
}

/// Return true if the candidate's SV type is missing or matches `sv_type`
fn is_selected_sv_type(candidate: &CandidateVariant, sv_type: SvType) -> bool {
    match &candidate.sv_type {
        Some(x) => SvType::from_str(x).ok() == Some(sv_type),
        None => true,
    }
}

/// A candidate is eligible for refinement if it is precise, no longer than `max_len`, and has
/// a consensus sequence
fn is_eligible(candidate: &CandidateVariant, max_len: i64) -> bool {
    candidate.precise && candidate.sv_len() <= max_len && candidate.get_consensus().is_some()
}

/// Get the reference window range expected to contain the consensus sequence
///
/// The candidate span is padded by the consensus length on each side and clamped to the
/// chromosome.
///
fn get_window_range(
    candidate: &CandidateVariant,
    consensus_len: usize,
    chrom_len: usize,
) -> (usize, usize) {
    let pad = consensus_len as i64;
    let start = (candidate.pos - pad).max(0);
    let end = (candidate.pos + candidate.sv_len() + pad).min(chrom_len as i64);
    let start = start.min(chrom_len as i64);
    (start as usize, end.max(start) as usize)
}

/// Annotate one candidate against its chromosome sequence
///
/// `chrom_seq` must be uppercase, as provided by [ReferenceSource].
///
pub fn annotate_candidate(
    aligner: &mut ConsensusAligner,
    chrom_seq: &[u8],
    candidate: &CandidateVariant,
    options: &AnnotateOptions,
) -> (AnnotatedVariant, CandidateOutcome) {
    let fallback = || {
        AnnotatedVariant::Fallback(compose_fallback(chrom_seq, candidate.pos, options.sv_type))
    };

    let consensus = match candidate.get_consensus() {
        Some(x) if is_eligible(candidate, options.max_len) => x,
        _ => return (fallback(), CandidateOutcome::Ineligible),
    };

    let (window_start, window_end) =
        get_window_range(candidate, consensus.len(), chrom_seq.len());
    let window = &chrom_seq[window_start..window_end];

    match refine_breakpoint(aligner, consensus, window, options.sv_type, &options.refine) {
        Ok(refined) => {
            let alleles = compose_refined(
                window_start as i64,
                window,
                consensus,
                &refined,
                options.emit_microhomology,
            );
            debug_msg!(
                options.refine.print_alignments,
                "Refined {}:{} to pos {} end {} quality {:.3} homology {:?}",
                candidate.chrom,
                candidate.pos + 1,
                alleles.pos + 1,
                alleles.end,
                alleles.split_quality,
                refined.homology
            );
            (AnnotatedVariant::Refined(alleles), CandidateOutcome::Refined)
        }
        Err(failure) => {
            debug_msg!(
                options.refine.print_alignments,
                "Refinement failed for {}:{} at stage {:?}",
                candidate.chrom,
                candidate.pos + 1,
                failure
            );
            (fallback(), CandidateOutcome::Failed(failure))
        }
    }
}

/// Annotate all candidates of one chromosome
///
/// Refinement runs on `pool`, and the results are returned in candidate order.
///
fn annotate_chrom_candidates(
    options: &AnnotateOptions,
    chrom_seq: &[u8],
    candidates: &[CandidateVariant],
    pool: &rayon::ThreadPool,
) -> Vec<(AnnotatedVariant, CandidateOutcome)> {
    pool.install(|| {
        candidates
            .par_iter()
            .map_init(ConsensusAligner::new, |aligner, candidate| {
                annotate_candidate(aligner, chrom_seq, candidate, options)
            })
            .collect()
    })
}

fn update_stats(stats: &mut AnnotateStats, outcome: CandidateOutcome) {
    match outcome {
        CandidateOutcome::Refined => stats.refined_count += 1,
        CandidateOutcome::Ineligible => {
            stats.ineligible_count += 1;
            stats.fallback_count += 1;
        }
        CandidateOutcome::Failed(failure) => {
            match failure {
                RefineFailure::Alignment => stats.refine_failures.alignment += 1,
                RefineFailure::Split => stats.refine_failures.split += 1,
            }
            stats.fallback_count += 1;
        }
    }
}

/// Annotate all candidates from `source` and write them to `sink`
///
/// Records on each chromosome are written sorted by their annotated position. Candidates with an
/// SV type other than the requested one are dropped.
///
pub fn annotate_variants<R, S, W>(
    options: &AnnotateOptions,
    reference: &mut R,
    source: &mut S,
    sink: &mut W,
    progress: &dyn ProgressReporter,
    pool: &rayon::ThreadPool,
) -> SimpleResult<AnnotateStats>
where
    R: ReferenceSource,
    S: VariantSource,
    W: VariantSink<S::Handle>,
{
    let mut stats = AnnotateStats::default();
    progress.start(source.chrom_count() as u64);

    while let Some(chrom) = reference.next_chrom() {
        let chrom = chrom?;
        if !source.has_chrom(&chrom.name) {
            continue;
        }

        let fetched = source.fetch_chrom(&chrom.name, chrom.seq.len() as u64)?;
        let fetched_count = fetched.len();
        stats.chrom_count += 1;
        stats.candidate_count += fetched_count;

        let (candidates, handles): (Vec<_>, Vec<_>) = fetched
            .into_iter()
            .filter(|(candidate, _)| is_selected_sv_type(candidate, options.sv_type))
            .unzip();
        stats.type_filtered_count += fetched_count - candidates.len();

        let results = annotate_chrom_candidates(options, &chrom.seq, &candidates, pool);

        let mut annotated = Vec::with_capacity(results.len());
        for ((variant, outcome), handle) in results.into_iter().zip(handles) {
            update_stats(&mut stats, outcome);
            annotated.push((variant, handle));
        }
        annotated.sort_by_key(|(variant, _)| variant.pos());

        for (variant, handle) in annotated {
            sink.write_variant(handle, &variant)?;
            stats.output_record_count += 1;
        }

        progress.inc(&chrom.name);
    }
    progress.finish();

    if stats.chrom_count < source.chrom_count() {
        warn!(
            "Variants were annotated on {} of {} chromosomes in the input variant header",
            stats.chrom_count,
            source.chrom_count()
        );
    }

    Ok(stats)
}

/// Run the full annotation process from the command-line settings
///
pub fn run_annotate(
    settings: &AnnotateSettings,
    thread_count: usize,
    progress: &dyn ProgressReporter,
) -> SimpleResult<AnnotateStats> {
    let start = std::time::Instant::now();

    let options = AnnotateOptions {
        sv_type: settings.sv_type,
        max_len: settings.max_len,
        emit_microhomology: settings.emit_microhomology,
        refine: RefineSettings {
            min_flank_size: settings.min_flank_size,
            min_split_quality: settings.min_split_quality,
            max_homology_len: settings.max_homology_len,
            print_alignments: settings.print_alignments,
        },
    };

    info!("Reading SV candidates from '{}'", settings.infile);
    let mut source = BcfVariantSource::new(&settings.infile)?;
    let mut reference = FastaReferenceSource::new(&settings.genome)?;

    let output_format = OutputFormat::from_path(&settings.outfile);
    let header = get_annotated_vcf_header(source.header(), options.emit_microhomology);

    let pool = try_with!(
        rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build(),
        "Unable to create worker thread pool"
    );

    info!(
        "Annotating {} SV candidates with maximum size {}",
        options.sv_type, options.max_len
    );
    let mut stats = {
        let mut sink = BcfVariantSink::new(&settings.outfile, &header, output_format)?;
        annotate_variants(
            &options,
            &mut reference,
            &mut source,
            &mut sink,
            progress,
            &pool,
        )?
    };

    if output_format.is_indexable() {
        if let Err(e) = build_bcf_index(&settings.outfile, 1, false) {
            warn!("{e}");
        }
    }

    stats.total_runtime_secs = start.elapsed().as_secs_f64();
    info!("Annotation runtime: {}", start.elapsed().hhmmssxxx());
    Ok(stats)
}

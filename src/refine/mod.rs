//! Breakpoint refinement of a single SV candidate
//!
//! A candidate consensus sequence is aligned to the reference window around the SV, the junction
//! matching the SV type is located in the alignment path, and the microhomology around the
//! junction is measured.
//!

pub mod align;
pub mod homology;
pub mod locate;

use self::align::ConsensusAligner;
use self::homology::{HomologyExtent, find_homology};
use self::locate::{Breakpoint, find_split};
use crate::complexity::sequence_entropy;
use crate::log_utils::debug_msg;
use crate::sv_type::SvType;

#[derive(Clone, Debug)]
pub struct RefineSettings {
    /// Minimum number of consensus bases which must align on each side of the junction
    pub min_flank_size: usize,

    /// Minimum fraction of matching alignment columns flanking the junction
    pub min_split_quality: f64,

    /// Maximum microhomology extension tested on each side of the junction
    pub max_homology_len: usize,

    /// Print each consensus alignment to stderr
    pub print_alignments: bool,
}

impl Default for RefineSettings {
    fn default() -> Self {
        Self {
            min_flank_size: 13,
            min_split_quality: 0.8,
            max_homology_len: 100,
            print_alignments: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RefinedBreakpoint {
    pub breakpoint: Breakpoint,
    pub homology: HomologyExtent,

    /// Shannon entropy of the consensus sequence
    pub entropy: f64,
}

/// Refinement stage at which a candidate was rejected
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::IntoStaticStr)]
pub enum RefineFailure {
    /// No acceptable consensus to reference alignment
    Alignment,

    /// No acceptable junction in the alignment
    Split,
}

/// Refine one SV candidate breakpoint from its consensus sequence
///
/// # Arguments
///
/// * `aligner` - alignment workspace, reused across calls
/// * `consensus` - uppercase consensus sequence
/// * `window` - uppercase reference window expected to contain the consensus
///
pub fn refine_breakpoint(
    aligner: &mut ConsensusAligner,
    consensus: &[u8],
    window: &[u8],
    sv_type: SvType,
    settings: &RefineSettings,
) -> Result<RefinedBreakpoint, RefineFailure> {
    let matrix = aligner
        .align(consensus, window, sv_type, settings.min_flank_size)
        .ok_or(RefineFailure::Alignment)?;

    if settings.print_alignments {
        let alignment = matrix.traceback();
        debug_msg!(
            true,
            "{} consensus alignment score {}:\n{}",
            sv_type,
            matrix.score(),
            alignment.pretty(consensus, window, 100)
        );
    }

    let breakpoint = find_split(&matrix, sv_type, settings).ok_or(RefineFailure::Split)?;
    let homology = find_homology(&matrix, &breakpoint, sv_type, settings.max_homology_len);

    Ok(RefinedBreakpoint {
        breakpoint,
        homology,
        entropy: sequence_entropy(consensus),
    })
}

//! Allele composition for refined and fallback output records
//!

use crate::refine::RefinedBreakpoint;
use crate::sv_type::SvType;
use crate::variant::{RefinedAlleles, SymbolicAlleles};

/// Build the base-exact alleles of a refined breakpoint
///
/// Both alleles start with the window base preceding the junction. REF continues with the replaced
/// window bases and ALT with the inserted consensus bases.
///
/// # Arguments
///
/// * `window_start` - 0-indexed chromosome position of the first window base
/// * `window` - reference window the consensus was aligned to
/// * `consensus` - consensus sequence
/// * `emit_microhomology` - if true, report the combined homology extent
///
pub fn compose_refined(
    window_start: i64,
    window: &[u8],
    consensus: &[u8],
    refined: &RefinedBreakpoint,
    emit_microhomology: bool,
) -> RefinedAlleles {
    let bp = &refined.breakpoint;
    let anchor_index = bp.ref_range.start as usize - 1;
    let anchor = window[anchor_index];

    let ref_allele = window[anchor_index..bp.ref_range.end as usize].to_vec();

    let mut alt_allele = Vec::with_capacity(bp.cons_range.size() as usize + 1);
    alt_allele.push(anchor);
    alt_allele.extend_from_slice(&consensus[bp.cons_range.as_usize_range()]);

    let microhomology_len = if emit_microhomology {
        Some(refined.homology.size() as i32)
    } else {
        None
    };

    RefinedAlleles {
        pos: window_start + anchor_index as i64,
        ref_allele,
        alt_allele,
        end: window_start + bp.ref_range.end,
        insertion_len: bp.cons_range.size() as i32,
        split_quality: bp.quality as f32,
        consensus_entropy: refined.entropy as f32,
        microhomology_len,
    }
}

/// Build the symbolic representation of a candidate at its original position
///
/// REF is the uppercase chromosome base at `pos`, or 'N' if `pos` is outside of the chromosome.
///
pub fn compose_fallback(chrom_seq: &[u8], pos: i64, sv_type: SvType) -> SymbolicAlleles {
    let ref_base = if pos >= 0 && (pos as usize) < chrom_seq.len() {
        chrom_seq[pos as usize].to_ascii_uppercase()
    } else {
        b'N'
    };
    SymbolicAlleles {
        pos,
        ref_allele: vec![ref_base],
        alt_allele: sv_type.symbolic_allele().into_bytes(),
    }
}

use super::align::AlignmentMatrix;
use super::locate::Breakpoint;
use crate::int_range::IntRange;
use crate::seq_util::comp_base;
use crate::sv_type::{JunctionSignature, SvType};

/// Microhomology extent around a refined junction
///
/// `left` is the number of positions the junction can be shifted to the left, and `right` the number
/// of positions it can be shifted to the right, without changing either allele sequence.
///
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HomologyExtent {
    pub left: usize,
    pub right: usize,
}

impl HomologyExtent {
    pub fn size(&self) -> usize {
        self.left + self.right
    }
}

/// Find how far a junction can be shifted without changing the alignment's edit distance
///
/// # Arguments
///
/// * `ref_seq` - reference window sequence
/// * `ref_range` - ref span of the junction in its current represented location
/// * `cons_seq` - consensus sequence
/// * `cons_range` - consensus span of the junction in its current represented location
/// * `max_extent` - maximum shift tested in each direction
///
/// Range coordinates are zero-indexed and start at the first position affected by the junction. For
/// instance:
/// - The deletion 2M1D2M would have refRange(2,3), consRange(2,2)
/// - The insertion 2M1I2M would have refRange(2,2), consRange(2,3)
///
/// Extension stops at the first mismatch, at either sequence boundary, or at `max_extent`. The
/// target junction is assessed assuming perfect matching along the left and right flanks.
///
pub fn get_junction_homology_extent(
    ref_seq: &[u8],
    ref_range: &IntRange,
    cons_seq: &[u8],
    cons_range: &IntRange,
    max_extent: usize,
) -> HomologyExtent {
    // Test how far the junction can be translated to the left of its current position:
    let max_left_offset = std::cmp::min(ref_range.start, cons_range.start).max(0) as usize;
    let max_left_offset = max_left_offset.min(max_extent);
    let mut left = 0;
    while left < max_left_offset {
        let ref_base = ref_seq[ref_range.end as usize - left - 1];
        let cons_base = cons_seq[cons_range.end as usize - left - 1];
        if ref_base != cons_base {
            break;
        }
        left += 1;
    }

    // Test how far the junction can be translated to the right of its current position:
    let max_right_offset = std::cmp::min(
        ref_seq.len() as i64 - ref_range.end,
        cons_seq.len() as i64 - cons_range.end,
    )
    .max(0) as usize;
    let max_right_offset = max_right_offset.min(max_extent);
    let mut right = 0;
    while right < max_right_offset {
        let ref_base = ref_seq[ref_range.start as usize + right];
        let cons_base = cons_seq[cons_range.start as usize + right];
        if ref_base != cons_base {
            break;
        }
        right += 1;
    }

    HomologyExtent { left, right }
}

/// Find how far both edges of an inverted block can move inward without changing the variant
/// allele
///
/// Shrinking the block [a,b) to [a+1,b-1) leaves the allele unchanged when `ref_seq[a]` is the
/// complement of `ref_seq[b-1]`, so this is the length of the inverted repeat at the block edges.
/// The left edge moves right by the returned `right` extent, and the right edge moves left by the
/// same amount.
///
pub fn get_inverted_block_homology_extent(
    ref_seq: &[u8],
    ref_range: &IntRange,
    max_extent: usize,
) -> HomologyExtent {
    let max_shift = ((ref_range.size().max(0) as usize) / 2).min(max_extent);
    let start = ref_range.start as usize;
    let end = ref_range.end as usize;
    let mut right = 0;
    while right < max_shift {
        let left_base = ref_seq[start + right];
        let right_base = ref_seq[end - right - 1];
        if left_base == b'N' || left_base != comp_base(right_base) {
            break;
        }
        right += 1;
    }
    HomologyExtent { left: 0, right }
}

/// Get the microhomology extent around a located breakpoint
///
pub fn find_homology(
    matrix: &AlignmentMatrix,
    breakpoint: &Breakpoint,
    sv_type: SvType,
    max_extent: usize,
) -> HomologyExtent {
    match sv_type.junction_signature() {
        JunctionSignature::InvertedBlock => get_inverted_block_homology_extent(
            matrix.window(),
            &breakpoint.ref_range,
            max_extent,
        ),
        JunctionSignature::DeletionGap | JunctionSignature::InsertionGap => {
            get_junction_homology_extent(
                matrix.window(),
                &breakpoint.ref_range,
                matrix.consensus(),
                &breakpoint.cons_range,
                max_extent,
            )
        }
    }
}

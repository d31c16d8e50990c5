//! Locate the SV junction in a consensus to reference-window alignment
//!

use bio::alignment::{Alignment, AlignmentOperation};

use super::RefineSettings;
use super::align::AlignmentMatrix;
use crate::int_range::IntRange;
use crate::seq_util::{comp_base, rev_comp, seq_identity};
use crate::sv_type::{JunctionSignature, SvType};

/// Minimum identity between the reverse-complemented consensus block and the reference block
const MIN_INVERTED_BLOCK_IDENTITY: f64 = 0.8;

/// A single inverted base cannot be told apart from a substitution
const MIN_INVERTED_BLOCK_LEN: usize = 2;

/// Refined SV junction
///
/// All ranges are 0-indexed and half-closed. For a pure deletion `cons_range` is empty, and for a
/// pure insertion `ref_range` is empty, in each case marking the junction position. For an
/// inversion both ranges have the same size, and `cons_range` holds the reverse complement of
/// `ref_range`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Breakpoint {
    /// Consensus bases replacing `ref_range` in the variant allele
    pub cons_range: IntRange,

    /// Reference window bases removed in the variant allele
    pub ref_range: IntRange,

    /// First and last alignment path column of the junction
    pub junction_columns: (usize, usize),

    /// Fraction of matching columns in the alignment flanking the junction
    ///
    /// For an inversion this is the fraction of consensus bases matching the inverted reference
    /// haplotype.
    ///
    pub quality: f64,
}

/// A maximal run of gap columns
#[derive(Debug)]
struct JunctionRun {
    first_column: usize,
    last_column: usize,
    cons_range: IntRange,
    ref_range: IntRange,
    del_len: usize,
    ins_len: usize,
}

impl JunctionRun {
    fn column_count(&self) -> usize {
        self.last_column + 1 - self.first_column
    }

    /// Twice the distance from the run midpoint to the path center
    fn center_distance(&self, column_count: usize) -> usize {
        (self.first_column + self.last_column).abs_diff(column_count.saturating_sub(1))
    }
}

fn is_gap(op: &AlignmentOperation) -> bool {
    matches!(op, AlignmentOperation::Del | AlignmentOperation::Ins)
}

fn is_match(op: &AlignmentOperation) -> bool {
    matches!(op, AlignmentOperation::Match)
}

fn is_base_match(a: u8, b: u8) -> bool {
    a == b && a != b'N'
}

/// Move the consensus and reference positions past one alignment column
fn advance_positions(op: &AlignmentOperation, cons_pos: &mut i64, ref_pos: &mut i64) {
    use AlignmentOperation::*;
    match op {
        Match | Subst => {
            *cons_pos += 1;
            *ref_pos += 1;
        }
        Del => *ref_pos += 1,
        Ins => *cons_pos += 1,
        Xclip(len) => *cons_pos += *len as i64,
        Yclip(len) => *ref_pos += *len as i64,
    }
}

/// Split the alignment path into maximal runs of gap columns
///
fn get_gap_runs(alignment: &Alignment) -> Vec<JunctionRun> {
    use AlignmentOperation::*;

    let mut runs = Vec::new();
    let mut cons_pos = alignment.xstart as i64;
    let mut ref_pos = alignment.ystart as i64;
    let mut current: Option<JunctionRun> = None;

    for (column, op) in alignment.operations.iter().enumerate() {
        if is_gap(op) {
            let run = current.get_or_insert_with(|| JunctionRun {
                first_column: column,
                last_column: column,
                cons_range: IntRange::from_pair(cons_pos, cons_pos),
                ref_range: IntRange::from_pair(ref_pos, ref_pos),
                del_len: 0,
                ins_len: 0,
            });
            run.last_column = column;
            match op {
                Del => run.del_len += 1,
                Ins => run.ins_len += 1,
                _ => {}
            }
        } else if let Some(run) = current.take() {
            runs.push(run);
        }

        advance_positions(op, &mut cons_pos, &mut ref_pos);

        if let Some(run) = current.as_mut() {
            run.cons_range.end = cons_pos;
            run.ref_range.end = ref_pos;
        }
    }
    if let Some(run) = current.take() {
        runs.push(run);
    }
    runs
}

/// Fraction of matching columns outside of the junction run
fn get_flank_quality(alignment: &Alignment, run: &JunctionRun) -> f64 {
    let ops = &alignment.operations;
    let flank_columns = ops.len() - run.column_count();
    if flank_columns == 0 {
        return 0.0;
    }
    let flank_matches = ops[..run.first_column]
        .iter()
        .chain(ops[run.last_column + 1..].iter())
        .filter(|x| is_match(x))
        .count();
    (flank_matches as f64 / flank_columns as f64).clamp(0.0, 1.0)
}

/// Find a deletion or insertion junction in an alignment path
///
/// The candidate junctions are maximal gap runs which leave at least `min_flank_size` consensus
/// bases on each side. The candidate with the largest `signature_size` is selected, with ties
/// resolved first by distance to the path center and then by leftmost position. Runs with a
/// signature size of zero do not express the SV type.
///
fn find_gap_split(
    alignment: &Alignment,
    consensus_len: usize,
    settings: &RefineSettings,
    signature_size: impl Fn(&JunctionRun) -> usize,
) -> Option<Breakpoint> {
    let min_flank_size = settings.min_flank_size as i64;
    let column_count = alignment.operations.len();
    let mut best: Option<(usize, usize, JunctionRun)> = None;
    for run in get_gap_runs(alignment) {
        let left_flank = run.cons_range.start;
        let right_flank = consensus_len as i64 - run.cons_range.end;
        if left_flank < min_flank_size || right_flank < min_flank_size {
            continue;
        }

        // The base preceding the junction anchors the refined alleles
        if run.ref_range.start < 1 {
            continue;
        }

        let size = signature_size(&run);
        if size == 0 {
            continue;
        }

        let distance = run.center_distance(column_count);
        let is_better = match &best {
            None => true,
            Some((best_size, best_distance, _)) => {
                size > *best_size || (size == *best_size && distance < *best_distance)
            }
        };
        if is_better {
            best = Some((size, distance, run));
        }
    }

    let (_, _, run) = best?;
    let quality = get_flank_quality(alignment, &run);
    if quality < settings.min_split_quality {
        return None;
    }

    Some(Breakpoint {
        cons_range: run.cons_range,
        ref_range: run.ref_range,
        junction_columns: (run.first_column, run.last_column),
        quality,
    })
}

/// Window offset of the consensus when both ends of the alignment path agree on one ungapped
/// placement
///
/// The offset is read at the first and last matching columns of the path. An inversion does not
/// change the consensus length, so None is returned when the two offsets differ.
///
fn get_ungapped_offset(alignment: &Alignment) -> Option<i64> {
    let mut cons_pos = alignment.xstart as i64;
    let mut ref_pos = alignment.ystart as i64;
    let mut first_offset = None;
    let mut last_offset = None;
    for op in alignment.operations.iter() {
        if is_match(op) {
            let offset = ref_pos - cons_pos;
            first_offset.get_or_insert(offset);
            last_offset = Some(offset);
        }
        advance_positions(op, &mut cons_pos, &mut ref_pos);
    }
    match (first_offset, last_offset) {
        (Some(first), Some(last)) if first == last => Some(first),
        _ => None,
    }
}

/// First and last alignment path columns consuming the consensus bases of `cons_range`
fn get_cons_range_columns(alignment: &Alignment, cons_range: &IntRange) -> (usize, usize) {
    use AlignmentOperation::*;

    let mut cons_pos = alignment.xstart as i64;
    let mut ref_pos = alignment.ystart as i64;
    let mut columns: Option<(usize, usize)> = None;
    for (column, op) in alignment.operations.iter().enumerate() {
        let is_cons_column = matches!(op, Match | Subst | Ins);
        if is_cons_column && cons_pos >= cons_range.start && cons_pos < cons_range.end {
            columns.get_or_insert((column, column)).1 = column;
        }
        advance_positions(op, &mut cons_pos, &mut ref_pos);
    }
    columns.unwrap_or_default()
}

#[derive(Debug)]
struct InvertedBlock {
    start: usize,
    end: usize,
    score: usize,
}

impl InvertedBlock {
    fn size(&self) -> usize {
        self.end - self.start
    }

    /// Higher score wins, then the larger block, then the leftmost block
    fn is_better_than(&self, other: &Self) -> bool {
        (self.score, self.size(), std::cmp::Reverse(self.start))
            > (other.score, other.size(), std::cmp::Reverse(other.start))
    }
}

/// Find the consensus block which best explains the consensus as `ref_seq` with one inverted
/// segment
///
/// `ref_seq` is the reference segment under the ungapped consensus, so both have the same length.
/// A block [a,b) scores one point for each consensus base outside of the block matching `ref_seq`,
/// and one point for each base inside the block matching the reverse complement of
/// `ref_seq[a..b]`.
///
/// Blocks sharing the same a+b compare the same base pairs, so each of these block families is
/// scanned outward from its center with a running count of inverted matches.
///
/// # Arguments
///
/// * `min_start` - smallest allowed block start
/// * `min_flank_size` - minimum number of consensus bases after the block end
///
fn find_inverted_block(
    consensus: &[u8],
    ref_seq: &[u8],
    min_start: usize,
    min_flank_size: usize,
) -> Option<InvertedBlock> {
    let len = consensus.len();
    if ref_seq.len() != len || len < min_start + min_flank_size + MIN_INVERTED_BLOCK_LEN {
        return None;
    }
    let max_end = len - min_flank_size;

    // Number of forward matches in each consensus prefix
    let mut forward = Vec::with_capacity(len + 1);
    let mut count = 0;
    forward.push(count);
    for (&c, &r) in consensus.iter().zip(ref_seq) {
        count += is_base_match(c, r) as usize;
        forward.push(count);
    }

    let is_inverted_match = |pair_sum: usize, i: usize| {
        is_base_match(consensus[i], comp_base(ref_seq[pair_sum - 1 - i]))
    };

    let mut best: Option<InvertedBlock> = None;
    let min_pair_sum = 2 * min_start + MIN_INVERTED_BLOCK_LEN;
    let max_pair_sum = 2 * max_end - MIN_INVERTED_BLOCK_LEN;
    for pair_sum in min_pair_sum..=max_pair_sum {
        let min_block_start = min_start.max(pair_sum.saturating_sub(max_end));

        let mut start = pair_sum / 2;
        let mut end = pair_sum - start;
        let mut inverted_matches = if end > start {
            is_inverted_match(pair_sum, start) as usize
        } else {
            0
        };

        while start > min_block_start {
            start -= 1;
            end += 1;
            inverted_matches += is_inverted_match(pair_sum, start) as usize;
            inverted_matches += is_inverted_match(pair_sum, end - 1) as usize;

            let block = InvertedBlock {
                start,
                end,
                score: forward[start] + (forward[len] - forward[end]) + inverted_matches,
            };
            if best.as_ref().is_none_or(|x| block.is_better_than(x)) {
                best = Some(block);
            }
        }
    }
    best
}

/// Find an inversion junction
///
/// The consensus is placed on the window at the offset shared by both alignment flanks, and the
/// inverted block is found by direct comparison of the consensus to the inverted reference rather
/// than from the alignment path, since the aligner usually breaks an inverted segment up into
/// short gaps and mismatches.
///
fn find_inversion_split(
    alignment: &Alignment,
    consensus: &[u8],
    window: &[u8],
    settings: &RefineSettings,
) -> Option<Breakpoint> {
    let offset = get_ungapped_offset(alignment)?;
    if offset < 0 || offset as usize + consensus.len() > window.len() {
        return None;
    }
    let ref_seq = &window[offset as usize..offset as usize + consensus.len()];

    // The base preceding the block anchors the refined alleles
    let min_start = settings.min_flank_size.max((offset == 0) as usize);
    let block = find_inverted_block(consensus, ref_seq, min_start, settings.min_flank_size)?;

    // The inversion must explain the consensus better than the reference does
    let forward_matches = consensus
        .iter()
        .zip(ref_seq)
        .filter(|&(&c, &r)| is_base_match(c, r))
        .count();
    if block.score <= forward_matches {
        return None;
    }

    let cons_range = IntRange::from_pair(block.start as i64, block.end as i64);
    let ref_range = IntRange::from_pair(offset + block.start as i64, offset + block.end as i64);
    let cons_block = rev_comp(&consensus[cons_range.as_usize_range()]);
    if seq_identity(&cons_block, &window[ref_range.as_usize_range()]) < MIN_INVERTED_BLOCK_IDENTITY
    {
        return None;
    }

    let quality = block.score as f64 / consensus.len() as f64;
    if quality < settings.min_split_quality {
        return None;
    }

    Some(Breakpoint {
        junction_columns: get_cons_range_columns(alignment, &cons_range),
        cons_range,
        ref_range,
        quality,
    })
}

fn find_split_in_alignment(
    alignment: &Alignment,
    consensus: &[u8],
    window: &[u8],
    sv_type: SvType,
    settings: &RefineSettings,
) -> Option<Breakpoint> {
    match sv_type.junction_signature() {
        JunctionSignature::DeletionGap => {
            find_gap_split(alignment, consensus.len(), settings, |run| run.del_len)
        }
        JunctionSignature::InsertionGap => {
            find_gap_split(alignment, consensus.len(), settings, |run| run.ins_len)
        }
        JunctionSignature::InvertedBlock => {
            find_inversion_split(alignment, consensus, window, settings)
        }
    }
}

/// Find the SV junction in a consensus to reference-window alignment matrix
///
pub fn find_split(
    matrix: &AlignmentMatrix,
    sv_type: SvType,
    settings: &RefineSettings,
) -> Option<Breakpoint> {
    let alignment = matrix.traceback();
    find_split_in_alignment(
        &alignment,
        matrix.consensus(),
        matrix.window(),
        sv_type,
        settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::align::ConsensusAligner;
    use bio::alignment::AlignmentMode;
    use bio::alignment::AlignmentOperation::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn test_settings() -> RefineSettings {
        RefineSettings {
            min_flank_size: 3,
            ..Default::default()
        }
    }

    fn get_test_alignment(ystart: usize, operations: Vec<AlignmentOperation>) -> Alignment {
        let xlen = operations
            .iter()
            .filter(|x| matches!(x, Match | Subst | Ins))
            .count();
        let ylen = ystart
            + operations
                .iter()
                .filter(|x| matches!(x, Match | Subst | Del))
                .count();
        Alignment {
            score: 0,
            xstart: 0,
            ystart,
            xend: xlen,
            yend: ylen,
            xlen,
            ylen,
            operations,
            mode: AlignmentMode::Semiglobal,
        }
    }

    #[test]
    fn test_find_deletion_split() {
        let consensus = b"GATTACAGTCCGTC";
        let window = b"CCGATTACAGATCCGTCTT";
        let mut aligner = ConsensusAligner::new();
        let matrix = aligner.align(consensus, window, SvType::Deletion, 3).unwrap();
        let bp = find_split(&matrix, SvType::Deletion, &test_settings()).unwrap();

        assert_eq!(bp.cons_range, IntRange::from_pair(8, 8));
        assert_eq!(bp.ref_range, IntRange::from_pair(10, 11));
        assert_eq!(bp.junction_columns, (8, 8));
        approx::assert_ulps_eq!(bp.quality, 1.0);
    }

    #[test]
    fn test_find_deletion_split_left_shifted() {
        // The deleted CAG repeats the preceding reference sequence, so the deletion could be
        // placed at several positions. The leftmost placement is expected.
        let consensus = b"GATTACAGTCCGTC";
        let window = b"CCGATTACAGCAGTCCGTCTT";
        let mut aligner = ConsensusAligner::new();
        let matrix = aligner.align(consensus, window, SvType::Deletion, 3).unwrap();
        let bp = find_split(&matrix, SvType::Deletion, &test_settings()).unwrap();

        assert_eq!(bp.cons_range, IntRange::from_pair(5, 5));
        assert_eq!(bp.ref_range, IntRange::from_pair(7, 10));
    }

    #[test]
    fn test_find_insertion_split() {
        let consensus = b"GATTACAGCCATGTGTC";
        let window = b"CCGATTACAGTGTGTCTT";
        let mut aligner = ConsensusAligner::new();
        let matrix = aligner
            .align(consensus, window, SvType::Insertion, 3)
            .unwrap();
        let bp = find_split(&matrix, SvType::Insertion, &test_settings()).unwrap();

        assert_eq!(bp.cons_range, IntRange::from_pair(8, 11));
        assert_eq!(bp.ref_range, IntRange::from_pair(10, 10));
        approx::assert_ulps_eq!(bp.quality, 1.0);

        // The same alignment has no deletion signature
        assert!(find_split(&matrix, SvType::Deletion, &test_settings()).is_none());
    }

    #[test]
    fn test_find_inversion_split() {
        let consensus = b"GATTACAGGGTTTTTCCGTC";
        let window = b"CCGATTACAGAAAACCTCCGTCTT";
        let mut aligner = ConsensusAligner::new();
        let matrix = aligner
            .align(consensus, window, SvType::Inversion, 3)
            .unwrap();
        let bp = find_split(&matrix, SvType::Inversion, &test_settings()).unwrap();

        assert_eq!(bp.cons_range, IntRange::from_pair(8, 14));
        assert_eq!(bp.ref_range, IntRange::from_pair(10, 16));
        approx::assert_ulps_eq!(bp.quality, 1.0);
    }

    fn get_random_seq(rng: &mut StdRng, len: usize) -> Vec<u8> {
        (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
    }

    /// Replace the breakpoint's window bases with its consensus bases
    fn apply_breakpoint(window: &[u8], consensus: &[u8], bp: &Breakpoint) -> Vec<u8> {
        let mut haplotype = window[..bp.ref_range.start as usize].to_vec();
        haplotype.extend_from_slice(&consensus[bp.cons_range.as_usize_range()]);
        haplotype.extend_from_slice(&window[bp.ref_range.end as usize..]);
        haplotype
    }

    #[test]
    fn test_find_random_inversion_splits() {
        let mut rng = StdRng::seed_from_u64(0x1A7E_5EED);
        let settings = RefineSettings::default();
        let mut aligner = ConsensusAligner::new();
        let (pad, flank) = (20, 60);

        for inv_len in [10, 20, 40, 80] {
            for _ in 0..20 {
                let window = get_random_seq(&mut rng, 2 * (pad + flank) + inv_len);
                let inv_start = pad + flank;
                let inv_end = inv_start + inv_len;
                let mut consensus = window[pad..inv_start].to_vec();
                consensus.extend(rev_comp(&window[inv_start..inv_end]));
                consensus.extend_from_slice(&window[inv_end..inv_end + flank]);

                let matrix = aligner
                    .align(&consensus, &window, SvType::Inversion, settings.min_flank_size)
                    .unwrap();
                let bp = find_split(&matrix, SvType::Inversion, &settings).unwrap();

                let haplotype = apply_breakpoint(&window, &consensus, &bp);
                assert_eq!(&haplotype[pad..pad + consensus.len()], consensus.as_slice());
                approx::assert_ulps_eq!(bp.quality, 1.0);

                // Only inverted repeats at the block edges may widen the planted block
                let left_extension = inv_start as i64 - bp.ref_range.start;
                let right_extension = bp.ref_range.end - inv_end as i64;
                assert!(left_extension >= 0);
                assert_eq!(left_extension, right_extension);
                assert_eq!(bp.cons_range.size(), bp.ref_range.size());
            }
        }
    }

    #[test]
    fn test_inversion_split_requires_ungapped_placement() {
        let mut rng = StdRng::seed_from_u64(7);
        let window = get_random_seq(&mut rng, 200);
        let settings = RefineSettings::default();
        let mut aligner = ConsensusAligner::new();

        // A deletion places the two consensus flanks at different window offsets
        let mut consensus = window[20..90].to_vec();
        consensus.extend_from_slice(&window[100..170]);
        let matrix = aligner
            .align(&consensus, &window, SvType::Inversion, settings.min_flank_size)
            .unwrap();
        assert!(find_split(&matrix, SvType::Inversion, &settings).is_none());

        // No inversion explains the consensus better than the reference itself
        let consensus = window[20..170].to_vec();
        let matrix = aligner
            .align(&consensus, &window, SvType::Inversion, settings.min_flank_size)
            .unwrap();
        assert!(find_split(&matrix, SvType::Inversion, &settings).is_none());
    }

    #[test]
    fn test_inverted_block_tie_break() {
        // Blocks [5,12), [6,11) and [7,10) all produce the consensus, the largest is selected
        let ref_seq = b"CCCCCAGGTTCTCCCCC";
        let consensus = b"CCCCCAGAACCTCCCCC";
        let block = find_inverted_block(consensus, ref_seq, 1, 1).unwrap();
        assert_eq!((block.start, block.end, block.score), (5, 12, 17));

        assert!(find_inverted_block(consensus, ref_seq, 8, 8).is_none());
    }

    #[test]
    fn test_flank_size_requirement() {
        let consensus = b"GATTACAGTCCGTC";
        let window = b"CCGATTACAGATCCGTCTT";
        let mut aligner = ConsensusAligner::new();
        let matrix = aligner.align(consensus, window, SvType::Deletion, 3).unwrap();

        let settings = RefineSettings {
            min_flank_size: 6,
            ..test_settings()
        };
        assert!(find_split(&matrix, SvType::Deletion, &settings).is_some());

        let settings = RefineSettings {
            min_flank_size: 7,
            ..test_settings()
        };
        assert!(find_split(&matrix, SvType::Deletion, &settings).is_none());
    }

    #[test]
    fn test_junction_tie_break() {
        let consensus = b"ACGTACGTACGTACGTACGT";
        let window = b"TACGTACGTACGTACGTACGTACGTACGTA";
        let settings = test_settings();

        // Two equal deletions, the second is closer to the path center
        let mut ops = vec![Match; 4];
        ops.extend([Del, Del]);
        ops.extend(vec![Match; 6]);
        ops.extend([Del, Del]);
        ops.extend(vec![Match; 10]);
        let alignment = get_test_alignment(1, ops);
        let bp =
            find_split_in_alignment(&alignment, consensus, window, SvType::Deletion, &settings)
                .unwrap();
        assert_eq!(bp.junction_columns, (12, 13));
        assert_eq!(bp.cons_range, IntRange::from_pair(10, 10));
        assert_eq!(bp.ref_range, IntRange::from_pair(13, 15));

        // Two equal deletions at the same distance from the path center, take the leftmost
        let mut ops = vec![Match; 5];
        ops.extend([Del, Del]);
        ops.extend(vec![Match; 10]);
        ops.extend([Del, Del]);
        ops.extend(vec![Match; 5]);
        let alignment = get_test_alignment(1, ops);
        let bp =
            find_split_in_alignment(&alignment, consensus, window, SvType::Deletion, &settings)
                .unwrap();
        assert_eq!(bp.junction_columns, (5, 6));

        // A longer deletion wins regardless of position
        let mut ops = vec![Match; 4];
        ops.extend([Del, Del, Del]);
        ops.extend(vec![Match; 6]);
        ops.extend([Del, Del]);
        ops.extend(vec![Match; 10]);
        let alignment = get_test_alignment(1, ops);
        let bp =
            find_split_in_alignment(&alignment, consensus, window, SvType::Deletion, &settings)
                .unwrap();
        assert_eq!(bp.junction_columns, (4, 6));
    }

    #[test]
    fn test_flank_quality() {
        let consensus = b"ACGTACGTACGTACGTACGT";
        let window = b"TACGTACGTACGTACGTACGTACGTACGTA";

        let mut ops = vec![Match; 8];
        ops.extend([Subst, Subst]);
        ops.extend([Del, Del]);
        ops.extend(vec![Match; 10]);
        let alignment = get_test_alignment(1, ops);

        let settings = RefineSettings {
            min_split_quality: 0.0,
            ..test_settings()
        };
        let bp =
            find_split_in_alignment(&alignment, consensus, window, SvType::Deletion, &settings)
                .unwrap();
        approx::assert_ulps_eq!(bp.quality, 0.9, max_ulps = 4);

        let settings = RefineSettings {
            min_split_quality: 0.95,
            ..test_settings()
        };
        assert!(
            find_split_in_alignment(&alignment, consensus, window, SvType::Deletion, &settings)
                .is_none()
        );
    }
}

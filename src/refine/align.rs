//! Consensus to reference-window alignment
//!
//! The consensus is aligned globally and the reference window locally, so unaligned reference
//! sequence on either end of the window is free. Gap scoring is affine with separate costs for
//! reference-only (deletion) and consensus-only (insertion) gaps, selected by SV type.
//!
//! The full traceback grid is kept so that the alignment path can be recovered, and it is stored in
//! a flat buffer owned by [ConsensusAligner] which is reused across candidates.
//!

use bio::alignment::{Alignment, AlignmentMode, AlignmentOperation};

use crate::sv_type::{AlignmentWeights, SvType};

const NEG_INF: i32 = i32::MIN / 4;

// Traceback cell layout
//
// bits 0-1: predecessor of the best (H) state
// bit 2: the deletion (E) state extends a deletion from the left neighbor
// bit 3: the insertion (F) state extends an insertion from the upper neighbor
//
const H_FROM_DIAG: u8 = 0;
const H_FROM_DEL: u8 = 1;
const H_FROM_INS: u8 = 2;
const H_START: u8 = 3;
const H_SOURCE_MASK: u8 = 0x3;
const DEL_EXTEND: u8 = 0x4;
const INS_EXTEND: u8 = 0x8;

#[derive(Clone, Copy, PartialEq)]
enum TraceState {
    Best,
    Del,
    Ins,
}

/// Traceback grid for one consensus to reference-window alignment
///
/// Rows correspond to consensus positions and columns to window positions, with one extra leading
/// row and column for the empty prefix, so the dimensions are `(|consensus|+1) x (|window|+1)`.
///
pub struct AlignmentMatrix<'a> {
    consensus: &'a [u8],
    window: &'a [u8],
    trace: &'a [u8],
    cols: usize,
    score: i32,

    /// Window column where the optimal alignment of the full consensus ends
    end_col: usize,
}

impl<'a> AlignmentMatrix<'a> {
    pub fn consensus(&self) -> &'a [u8] {
        self.consensus
    }

    pub fn window(&self) -> &'a [u8] {
        self.window
    }

    pub fn rows(&self) -> usize {
        self.consensus.len() + 1
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    fn cell(&self, row: usize, col: usize) -> u8 {
        self.trace[row * self.cols + col]
    }

    /// Trace the optimal alignment path back from the final consensus row
    ///
    /// In the returned alignment x is the consensus and y is the reference window, following the
    /// rust-bio convention, so that `Del` operations consume window bases only and `Ins`
    /// operations consume consensus bases only.
    ///
    pub fn traceback(&self) -> Alignment {
        let mut ops = Vec::with_capacity(self.rows() + self.cols);
        let mut row = self.consensus.len();
        let mut col = self.end_col;
        let mut state = TraceState::Best;
        while row > 0 {
            let cell = self.cell(row, col);
            match state {
                TraceState::Best => match cell & H_SOURCE_MASK {
                    H_FROM_DIAG => {
                        let op = if self.consensus[row - 1] == self.window[col - 1] {
                            AlignmentOperation::Match
                        } else {
                            AlignmentOperation::Subst
                        };
                        ops.push(op);
                        row -= 1;
                        col -= 1;
                    }
                    H_FROM_DEL => state = TraceState::Del,
                    H_FROM_INS => state = TraceState::Ins,
                    _ => break,
                },
                TraceState::Del => {
                    ops.push(AlignmentOperation::Del);
                    col -= 1;
                    if cell & DEL_EXTEND == 0 {
                        state = TraceState::Best;
                    }
                }
                TraceState::Ins => {
                    ops.push(AlignmentOperation::Ins);
                    row -= 1;
                    if cell & INS_EXTEND == 0 {
                        state = TraceState::Best;
                    }
                }
            }
        }
        ops.reverse();

        Alignment {
            score: self.score,
            xstart: 0,
            ystart: col,
            xend: self.consensus.len(),
            yend: self.end_col,
            xlen: self.consensus.len(),
            ylen: self.window.len(),
            operations: ops,
            mode: AlignmentMode::Semiglobal,
        }
    }
}

/// Reusable consensus to reference aligner
///
/// Holds the traceback grid and score rows so that repeated alignments only reallocate when a
/// larger problem size is seen. Create one per worker thread.
///
#[derive(Default)]
pub struct ConsensusAligner {
    trace: Vec<u8>,
    best_prev: Vec<i32>,
    best_cur: Vec<i32>,
    ins_prev: Vec<i32>,
    ins_cur: Vec<i32>,
}

impl ConsensusAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align `consensus` to `window` with the scoring policy of `sv_type`
    ///
    /// Returns None when no usable alignment exists: the consensus is empty, the window is not
    /// longer than `min_flank_size`, or the optimal score is below the score of `min_flank_size`
    /// matching bases.
    ///
    pub fn align<'a>(
        &'a mut self,
        consensus: &'a [u8],
        window: &'a [u8],
        sv_type: SvType,
        min_flank_size: usize,
    ) -> Option<AlignmentMatrix<'a>> {
        if consensus.is_empty() || window.len() <= min_flank_size {
            return None;
        }

        let weights = sv_type.alignment_weights();
        let (score, end_col) = self.fill(consensus, window, &weights);

        let min_score = (min_flank_size as i32) * weights.match_;
        if score < min_score.max(1) {
            return None;
        }

        Some(AlignmentMatrix {
            consensus,
            window,
            trace: &self.trace,
            cols: window.len() + 1,
            score,
            end_col,
        })
    }

    /// Fill the traceback grid and return the best score and end column on the final row
    ///
    /// Ties are broken in a fixed order so that identical input always produces an identical grid:
    /// the diagonal is preferred over a deletion and a deletion over an insertion, gap opening is
    /// preferred over gap extension, and the leftmost column wins on the final row.
    ///
    fn fill(&mut self, consensus: &[u8], window: &[u8], weights: &AlignmentWeights) -> (i32, usize) {
        let rows = consensus.len() + 1;
        let cols = window.len() + 1;

        self.trace.clear();
        self.trace.resize(rows * cols, 0);
        for v in [
            &mut self.best_prev,
            &mut self.best_cur,
            &mut self.ins_prev,
            &mut self.ins_cur,
        ] {
            v.clear();
            v.resize(cols, NEG_INF);
        }

        // Leading reference bases are free
        self.best_prev.fill(0);
        self.trace[..cols].fill(H_START);

        let del_open = weights.del_open + weights.del_extend;
        let ins_open = weights.ins_open + weights.ins_extend;

        for row in 1..rows {
            let row_offset = row * cols;
            let cbase = consensus[row - 1];

            // Leading consensus bases can only be inserted
            let ins_open_score = self.best_prev[0] + ins_open;
            let ins_ext_score = self.ins_prev[0] + weights.ins_extend;
            let mut cell = H_FROM_INS;
            if ins_ext_score > ins_open_score {
                self.ins_cur[0] = ins_ext_score;
                cell |= INS_EXTEND;
            } else {
                self.ins_cur[0] = ins_open_score;
            }
            self.best_cur[0] = self.ins_cur[0];
            self.trace[row_offset] = cell;

            let mut del = NEG_INF;
            for col in 1..cols {
                let mut cell = 0;

                let del_open_score = self.best_cur[col - 1] + del_open;
                let del_ext_score = del + weights.del_extend;
                if del_ext_score > del_open_score {
                    del = del_ext_score;
                    cell |= DEL_EXTEND;
                } else {
                    del = del_open_score;
                }

                let ins_open_score = self.best_prev[col] + ins_open;
                let ins_ext_score = self.ins_prev[col] + weights.ins_extend;
                let ins = if ins_ext_score > ins_open_score {
                    cell |= INS_EXTEND;
                    ins_ext_score
                } else {
                    ins_open_score
                };
                self.ins_cur[col] = ins;

                let sub = if cbase == window[col - 1] {
                    weights.match_
                } else {
                    weights.mismatch
                };
                let mut best = self.best_prev[col - 1] + sub;
                let mut source = H_FROM_DIAG;
                if del > best {
                    best = del;
                    source = H_FROM_DEL;
                }
                if ins > best {
                    best = ins;
                    source = H_FROM_INS;
                }
                self.best_cur[col] = best;
                self.trace[row_offset + col] = cell | source;
            }

            std::mem::swap(&mut self.best_prev, &mut self.best_cur);
            std::mem::swap(&mut self.ins_prev, &mut self.ins_cur);
        }

        // Trailing reference bases are free
        let mut best_score = NEG_INF;
        let mut end_col = 0;
        for (col, &score) in self.best_prev.iter().enumerate() {
            if score > best_score {
                best_score = score;
                end_col = col;
            }
        }
        (best_score, end_col)
    }
}

//! Sequence complexity scoring
//!

/// Get the Shannon entropy of the symbol distribution in `seq`, in bits
///
/// Entropy is computed from the empirical frequency of each distinct byte, so it does not depend
/// on symbol order. An empty or single-symbol sequence has zero entropy.
///
pub fn sequence_entropy(seq: &[u8]) -> f64 {
    let mut counts = [0usize; (u8::MAX as usize) + 1];
    for &c in seq.iter() {
        counts[c as usize] += 1;
    }

    let observed = counts.iter().filter(|&&x| x > 0).count();
    if observed <= 1 {
        return 0.0;
    }

    let total = seq.len() as f64;
    counts
        .iter()
        .filter(|&&x| x > 0)
        .map(|&x| {
            let p = x as f64 / total;
            -p * p.log2()
        })
        .sum()
}

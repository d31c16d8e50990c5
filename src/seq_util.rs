/// Complement a DNA base in either case, with symbols other than ACGT complemented to 'N'
pub fn comp_base(x: u8) -> u8 {
    match x {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'n' => b'n',
        _ => b'N',
    }
}

/// Reverse complement a DNA sequence
///
/// Any symbol outside of ACGT (either case) is complemented to 'N', so that IUPAC ambiguity codes in
/// caller consensus sequences never match a reference base after inversion.
///
pub fn rev_comp(dna: &[u8]) -> Vec<u8> {
    dna.iter().rev().map(|&x| comp_base(x)).collect::<Vec<_>>()
}

/// Fraction of positions where two equal-length sequences agree, ignoring 'N'
///
/// Returns 0 for empty or unequal-length input.
///
pub fn seq_identity(seq1: &[u8], seq2: &[u8]) -> f64 {
    if seq1.is_empty() || seq1.len() != seq2.len() {
        return 0.0;
    }
    let matches = seq1
        .iter()
        .zip(seq2.iter())
        .filter(|&(&a, &b)| a == b && a != b'N')
        .count();
    matches as f64 / seq1.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rev_comp() {
        let input = b"NNATGCG".to_vec();
        let expected_output = b"CGCATNN".to_vec();
        let output = rev_comp(&input);
        assert_eq!(output, expected_output);
    }

    #[test]
    fn test_rev_comp_ambiguous() {
        assert_eq!(rev_comp(b"ARY"), b"NNT".to_vec());
    }

    #[test]
    fn test_seq_identity() {
        approx::assert_ulps_eq!(seq_identity(b"ACGT", b"ACGT"), 1.0);
        approx::assert_ulps_eq!(seq_identity(b"ACGT", b"ACGA"), 0.75);
        approx::assert_ulps_eq!(seq_identity(b"NNNN", b"NNNN"), 0.0);
        approx::assert_ulps_eq!(seq_identity(b"ACG", b"ACGT"), 0.0);
    }
}

//! SV type specific refinement behavior
//!
//! Each SV type supplies the consensus-to-reference scoring policy, the junction signature the
//! breakpoint locator searches for, and the symbolic allele used when refinement is not possible.
//!

/// Alignment scores for the consensus-to-reference alignment
///
/// Gap costs follow the affine convention: a gap of length L costs `open + L * extend`. Deletion
/// gaps consume reference bases only, insertion gaps consume consensus bases only.
///
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentWeights {
    pub match_: i32,
    pub mismatch: i32,
    pub del_open: i32,
    pub del_extend: i32,
    pub ins_open: i32,
    pub ins_extend: i32,
}

/// The alignment pattern identifying an SV junction in a consensus-to-reference alignment
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JunctionSignature {
    /// A block of reference-only alignment steps
    DeletionGap,

    /// A block of consensus-only alignment steps
    InsertionGap,

    /// A consensus block matching the reverse complement of the reference it replaces, with the
    /// consensus otherwise placed on the reference without gaps
    InvertedBlock,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum SvType {
    #[default]
    #[strum(serialize = "DEL")]
    Deletion,
    #[strum(serialize = "INS")]
    Insertion,
    #[strum(serialize = "DUP")]
    Duplication,
    #[strum(serialize = "INV")]
    Inversion,
}

impl SvType {
    /// SVTYPE label used in VCF records
    pub fn tag(&self) -> &'static str {
        self.into()
    }

    /// Symbolic ALT allele for this SV type, eg. "<DEL>"
    pub fn symbolic_allele(&self) -> String {
        format!("<{}>", self.tag())
    }

    /// Deletions favor one long reference-only gap and insertions one long consensus-only gap, by
    /// making gap extension free for the expected gap type. Other types use symmetric scores.
    ///
    pub fn alignment_weights(&self) -> AlignmentWeights {
        use SvType::*;
        match self {
            Deletion => AlignmentWeights {
                match_: 5,
                mismatch: -4,
                del_open: -20,
                del_extend: 0,
                ins_open: -20,
                ins_extend: -4,
            },
            Insertion => AlignmentWeights {
                match_: 5,
                mismatch: -4,
                del_open: -20,
                del_extend: -4,
                ins_open: -20,
                ins_extend: 0,
            },
            Duplication | Inversion => AlignmentWeights {
                match_: 5,
                mismatch: -4,
                del_open: -20,
                del_extend: -1,
                ins_open: -20,
                ins_extend: -1,
            },
        }
    }

    /// A tandem duplication shows up as inserted sequence relative to the reference window
    pub fn junction_signature(&self) -> JunctionSignature {
        use SvType::*;
        match self {
            Deletion => JunctionSignature::DeletionGap,
            Insertion | Duplication => JunctionSignature::InsertionGap,
            Inversion => JunctionSignature::InvertedBlock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_sv_type_labels() {
        assert_eq!(SvType::from_str("DEL").unwrap(), SvType::Deletion);
        assert_eq!(SvType::from_str("INV").unwrap(), SvType::Inversion);
        assert!(SvType::from_str("BND").is_err());

        assert_eq!(SvType::Insertion.tag(), "INS");
        assert_eq!(SvType::Duplication.symbolic_allele(), "<DUP>");
        assert_eq!(SvType::Deletion.to_string(), "DEL");

        for sv_type in SvType::iter() {
            assert_eq!(SvType::from_str(sv_type.tag()).unwrap(), sv_type);
        }
    }

    #[test]
    fn test_gap_policy() {
        let del = SvType::Deletion.alignment_weights();
        assert_eq!(del.del_extend, 0);
        assert!(del.ins_extend < 0);

        let ins = SvType::Insertion.alignment_weights();
        assert_eq!(ins.ins_extend, 0);
        assert!(ins.del_extend < 0);

        let inv = SvType::Inversion.alignment_weights();
        assert_eq!(inv.del_extend, inv.ins_extend);
        assert_eq!(inv.del_open, inv.ins_open);
    }
}

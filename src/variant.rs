/// An SV candidate read from the input variant file
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateVariant {
    pub chrom: String,

    /// 0-indexed position of the record
    pub pos: i64,

    /// Value of the INFO/END tag if present
    pub end: Option<i64>,

    /// Value of the INFO/SVTYPE tag if present
    pub sv_type: Option<String>,

    /// True if the INFO/PRECISE flag is set
    pub precise: bool,

    /// Value of the INFO/CONSENSUS tag if present, uppercased
    pub consensus: Option<Vec<u8>>,
}

impl CandidateVariant {
    /// SV length used for refinement eligibility
    ///
    /// This is the distance from POS to END, or 1 if END is missing.
    ///
    pub fn sv_len(&self) -> i64 {
        match self.end {
            Some(end) => end - self.pos,
            None => 1,
        }
    }

    /// Return the consensus sequence if it is present and non-empty
    pub fn get_consensus(&self) -> Option<&[u8]> {
        match &self.consensus {
            Some(x) if !x.is_empty() => Some(x.as_slice()),
            _ => None,
        }
    }
}

/// Base-exact alleles and annotations from a refined breakpoint
///
#[derive(Clone, Debug, PartialEq)]
pub struct RefinedAlleles {
    /// 0-indexed position of the anchor base preceding the junction
    pub pos: i64,

    pub ref_allele: Vec<u8>,
    pub alt_allele: Vec<u8>,

    /// 1-indexed position of the last replaced reference base
    pub end: i64,

    pub insertion_len: i32,
    pub split_quality: f32,
    pub consensus_entropy: f32,
    pub microhomology_len: Option<i32>,
}

/// Single-base REF allele with a symbolic ALT allele, used whenever refinement is not possible
///
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolicAlleles {
    pub pos: i64,
    pub ref_allele: Vec<u8>,
    pub alt_allele: Vec<u8>,
}

/// Annotation result for one candidate, applied to the candidate's record on output
///
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotatedVariant {
    Refined(RefinedAlleles),
    Fallback(SymbolicAlleles),
}

impl AnnotatedVariant {
    pub fn pos(&self) -> i64 {
        match self {
            AnnotatedVariant::Refined(x) => x.pos,
            AnnotatedVariant::Fallback(x) => x.pos,
        }
    }
}

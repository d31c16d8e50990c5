use camino::Utf8Path;
use itertools::Itertools;
use rust_htslib::bcf::header::{Header, HeaderView};
use rust_htslib::{htslib, utils};

use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};

/// Variant output file format, selected from the output filename
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Vcf,
    CompressedVcf,
    Bcf,
}

impl OutputFormat {
    /// Names ending in ".vcf" are written as plain VCF, ".vcf.gz" as bgzipped VCF, and all others
    /// as BCF
    ///
    pub fn from_path(path: &Utf8Path) -> Self {
        let name = path.as_str();
        if name.ends_with(".vcf") {
            OutputFormat::Vcf
        } else if name.ends_with(".vcf.gz") {
            OutputFormat::CompressedVcf
        } else {
            OutputFormat::Bcf
        }
    }

    pub fn is_uncompressed(&self) -> bool {
        *self == OutputFormat::Vcf
    }

    /// Only compressed output can be indexed
    pub fn is_indexable(&self) -> bool {
        !self.is_uncompressed()
    }

    pub fn htslib_format(&self) -> rust_htslib::bcf::Format {
        match self {
            OutputFormat::Bcf => rust_htslib::bcf::Format::Bcf,
            _ => rust_htslib::bcf::Format::Vcf,
        }
    }
}

/// INFO fields written by refinement, as (ID, VCF header line)
const REFINED_INFO_FIELDS: &[(&str, &str)] = &[
    (
        "END",
        r#"##INFO=<ID=END,Number=1,Type=Integer,Description="End position of the structural variant">"#,
    ),
    (
        "INSLEN",
        r#"##INFO=<ID=INSLEN,Number=1,Type=Integer,Description="Predicted length of the insertion">"#,
    ),
    (
        "SRQ",
        r#"##INFO=<ID=SRQ,Number=1,Type=Float,Description="Split-read consensus alignment quality">"#,
    ),
    (
        "CE",
        r#"##INFO=<ID=CE,Number=1,Type=Float,Description="Consensus sequence entropy">"#,
    ),
];

const MICROHOMOLOGY_INFO_FIELD: (&str, &str) = (
    "MICROHOMLEN",
    r#"##INFO=<ID=MICROHOMLEN,Number=1,Type=Integer,Description="Length of breakpoint microhomology">"#,
);

/// Build the output header from the input variant header
///
/// INFO fields written by refinement are removed from the input header and declared again, so that
/// their type always matches the refined values.
///
pub fn get_annotated_vcf_header(template: &HeaderView, emit_microhomology: bool) -> Header {
    let mut header = Header::from_template(template);

    let mut info_fields = REFINED_INFO_FIELDS.to_vec();
    if emit_microhomology {
        info_fields.push(MICROHOMOLOGY_INFO_FIELD);
    }

    for (id, line) in info_fields {
        header.remove_info(id.as_bytes());
        header.push_record(line.as_bytes());
    }

    header.push_record(format!("##source=\"{PROGRAM_NAME} {PROGRAM_VERSION}\"").as_bytes());
    let cmdline = std::env::args().join(" ");
    header.push_record(format!("##{PROGRAM_NAME}_cmdline=\"{cmdline}\"").as_bytes());

    header
}

#[derive(Debug)]
pub struct BcfBuildError {
    pub msg: String,
}

impl BcfBuildError {
    pub fn error_message(error: i32) -> &'static str {
        match error {
            -1 => "indexing failed",
            -2 => "opening @fn failed",
            -3 => "format not indexable",
            -4 => "failed to create and/or save the index",
            _ => "unknown error",
        }
    }
}

impl std::error::Error for BcfBuildError {}

impl std::fmt::Display for BcfBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BcfBuildError{{msg: {}}}", self.msg)
    }
}

/// Build index for bcf or vcf.gz file
///
/// # Arguments
/// * `bcf_path` - Path to bcf/vcf file for indexing
/// * `build_tbi` - If true build older tbi style index, otherwise build csi index
///
pub fn build_bcf_index<P: AsRef<std::path::Path>>(
    bcf_path: P,
    n_threads: usize,
    build_tbi: bool,
) -> Result<(), BcfBuildError> {
    let min_shift = if build_tbi { 0 } else { 14 };
    let idx_path_ptr = std::ptr::null();
    let bcf_path_cstr = match utils::path_to_cstring(&bcf_path) {
        Some(x) => x,
        None => {
            return Err(BcfBuildError {
                msg: format!("Invalid bcf path: '{}'", bcf_path.as_ref().display()),
            });
        }
    };
    let ret = unsafe {
        // Returns 0 if successful, or a negative error code listed in BcfBuildError
        htslib::bcf_index_build3(
            bcf_path_cstr.as_ptr(),
            idx_path_ptr,
            min_shift,
            n_threads as i32,
        )
    };
    match ret {
        0 => Ok(()),
        e => Err(BcfBuildError {
            msg: format!(
                "Failed to build bcf index. Error: {e:?}/{}",
                BcfBuildError::error_message(e)
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bcf::{self, Read};
    use std::io::Write;

    #[test]
    fn test_output_format() {
        assert_eq!(
            OutputFormat::from_path(Utf8Path::new("out.vcf")),
            OutputFormat::Vcf
        );
        assert_eq!(
            OutputFormat::from_path(Utf8Path::new("out.vcf.gz")),
            OutputFormat::CompressedVcf
        );
        assert_eq!(
            OutputFormat::from_path(Utf8Path::new("out.bcf")),
            OutputFormat::Bcf
        );
        assert!(!OutputFormat::Vcf.is_indexable());
        assert!(OutputFormat::CompressedVcf.is_indexable());
    }

    #[test]
    fn test_annotated_header() {
        let mut file = tempfile::Builder::new().suffix(".vcf").tempfile().unwrap();
        writeln!(file, "##fileformat=VCFv4.2").unwrap();
        writeln!(file, "##contig=<ID=chr1,length=1000>").unwrap();
        writeln!(
            file,
            r#"##INFO=<ID=SRQ,Number=1,Type=String,Description="Old definition">"#
        )
        .unwrap();
        writeln!(file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
        file.flush().unwrap();

        let reader = bcf::Reader::from_path(file.path()).unwrap();
        let out_dir = tempfile::tempdir().unwrap();

        let header = get_annotated_vcf_header(reader.header(), false);
        let writer = bcf::Writer::from_path(
            out_dir.path().join("out1.vcf"),
            &header,
            true,
            bcf::Format::Vcf,
        )
        .unwrap();
        let view = writer.header();
        let (tag_type, _) = view.info_type(b"SRQ").unwrap();
        assert!(matches!(tag_type, bcf::header::TagType::Float));
        assert!(view.info_type(b"INSLEN").is_ok());
        assert!(view.info_type(b"MICROHOMLEN").is_err());

        let header = get_annotated_vcf_header(reader.header(), true);
        let writer = bcf::Writer::from_path(
            out_dir.path().join("out2.vcf"),
            &header,
            true,
            bcf::Format::Vcf,
        )
        .unwrap();
        assert!(writer.header().info_type(b"MICROHOMLEN").is_ok());
    }
}

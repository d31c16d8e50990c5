use camino::Utf8PathBuf;
use clap::Args;
use simple_error::{SimpleResult, bail};

use super::utils::{check_required_filename, check_required_nonempty_filename};
use crate::sv_type::SvType;

#[derive(Args, Default)]
pub struct AnnotateSettings {
    /// SV type to annotate [DEL, INS, DUP, INV]
    ///
    /// Records with any other SVTYPE value are left out of the output. Records without SVTYPE are
    /// annotated as this type.
    ///
    #[arg(short = 't', long = "type", value_name = "SVTYPE", default_value = "DEL")]
    pub sv_type: SvType,

    /// Genome reference in FASTA format, optionally gzip-compressed
    #[arg(short = 'g', long, value_name = "FILE")]
    pub genome: Utf8PathBuf,

    /// Maximum SV size for breakpoint refinement
    ///
    /// Larger SVs are written with symbolic alleles at their original position.
    ///
    #[arg(short = 'm', long = "maxlen", default_value_t = 500)]
    pub max_len: i64,

    /// Output variant file
    ///
    /// Output is written as VCF for names ending in ".vcf", bgzipped VCF for ".vcf.gz", and BCF
    /// otherwise. Compressed output is indexed.
    ///
    #[arg(short = 'f', long, value_name = "FILE", default_value = "out.bcf")]
    pub outfile: Utf8PathBuf,

    /// Indexed SV candidate file in BCF or VCF format
    #[arg(value_name = "INFILE")]
    pub infile: Utf8PathBuf,

    /// Minimum number of consensus bases aligned on each side of the breakpoint
    #[arg(long, default_value_t = 13)]
    pub min_flank_size: usize,

    /// Minimum fraction of matching consensus alignment columns flanking the breakpoint
    #[arg(long, default_value_t = 0.8)]
    pub min_split_quality: f64,

    /// Maximum microhomology extension tested on each side of the breakpoint
    #[arg(hide = true, long, default_value_t = 100)]
    pub max_homology_len: usize,

    /// Write breakpoint microhomology length to INFO/MICROHOMLEN for refined records
    #[arg(long)]
    pub emit_microhomology: bool,

    /// Write run statistics in JSON format to this file
    #[arg(long = "stats", value_name = "FILE")]
    pub stats_filename: Option<Utf8PathBuf>,

    /// Print each consensus alignment and refinement result to stderr
    ///
    /// This is intended for debugging only, and should be used with --threads 1
    ///
    #[arg(hide = true, long)]
    pub print_alignments: bool,
}

pub fn validate_and_fix_annotate_settings(
    settings: AnnotateSettings,
) -> SimpleResult<AnnotateSettings> {
    check_required_nonempty_filename(settings.genome.as_str(), "genome reference")?;
    check_required_filename(settings.infile.as_str(), "input variant")?;

    if settings.max_len <= 0 {
        bail!("--maxlen argument must be greater than 0");
    }

    if !(0.0..=1.0).contains(&settings.min_split_quality) {
        bail!(
            "--min-split-quality argument must be in the range [0,1], value given: {}",
            settings.min_split_quality
        );
    }

    if settings.outfile == settings.infile {
        bail!("Output variant file must be different than the input variant file");
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_settings(dir: &tempfile::TempDir) -> AnnotateSettings {
        let dir_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let genome = dir_path.join("ref.fa");
        std::fs::write(&genome, ">chr1\nACGT\n").unwrap();
        let infile = dir_path.join("in.bcf");
        std::fs::write(&infile, "").unwrap();
        AnnotateSettings {
            genome,
            infile,
            outfile: dir_path.join("out.bcf"),
            max_len: 500,
            min_split_quality: 0.8,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_annotate_settings() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_and_fix_annotate_settings(get_test_settings(&dir)).is_ok());

        let settings = AnnotateSettings {
            max_len: 0,
            ..get_test_settings(&dir)
        };
        assert!(validate_and_fix_annotate_settings(settings).is_err());

        let settings = AnnotateSettings {
            min_split_quality: 1.5,
            ..get_test_settings(&dir)
        };
        assert!(validate_and_fix_annotate_settings(settings).is_err());
    }

    #[test]
    fn test_empty_genome_reference() {
        let dir = tempfile::tempdir().unwrap();
        let settings = get_test_settings(&dir);
        std::fs::write(&settings.genome, "").unwrap();
        assert!(validate_and_fix_annotate_settings(settings).is_err());
    }
}

use std::fs::File;
use std::io::{BufReader, Read};

use bio::io::fasta;
use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use log::info;
use simple_error::{SimpleResult, try_with};

use crate::annotate::{ChromSeq, ReferenceSource};

/// Streams chromosome sequences from a fasta file in file order
///
/// Sequences are converted to upper-case. Files with a ".gz" extension are decompressed, which
/// includes bgzip-compressed references.
///
pub struct FastaReferenceSource {
    records: fasta::Records<BufReader<Box<dyn Read>>>,
}

impl FastaReferenceSource {
    pub fn new(filename: &Utf8Path) -> SimpleResult<Self> {
        info!("Reading reference genome from file '{filename}'");

        let file = try_with!(
            File::open(filename),
            "Unable to open reference fasta file: '{}'",
            filename
        );
        let reader: Box<dyn Read> = if filename.extension() == Some("gz") {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(Self::from_reader(reader))
    }

    pub fn from_reader(reader: Box<dyn Read>) -> Self {
        Self {
            records: fasta::Reader::new(reader).records(),
        }
    }
}

impl ReferenceSource for FastaReferenceSource {
    fn next_chrom(&mut self) -> Option<SimpleResult<ChromSeq>> {
        let record = self.records.next()?;
        let record = match record {
            Ok(x) => x,
            Err(e) => {
                return Some(Err(simple_error::SimpleError::new(format!(
                    "Error during fasta record parsing: {e}"
                ))));
            }
        };
        Some(Ok(ChromSeq {
            name: record.id().to_string(),
            seq: record.seq().to_ascii_uppercase(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const TEST_FASTA: &str = ">chr1 first\nACGTacgt\nNNAC\n>chr2\nggcc\n";

    fn check_test_chroms(mut source: FastaReferenceSource) {
        let chrom = source.next_chrom().unwrap().unwrap();
        assert_eq!(chrom.name, "chr1");
        assert_eq!(chrom.seq, b"ACGTACGTNNAC".to_vec());

        let chrom = source.next_chrom().unwrap().unwrap();
        assert_eq!(chrom.name, "chr2");
        assert_eq!(chrom.seq, b"GGCC".to_vec());

        assert!(source.next_chrom().is_none());
    }

    #[test]
    fn test_fasta_reference_source() {
        let dir = tempfile::tempdir().unwrap();
        let filename = camino::Utf8PathBuf::from_path_buf(dir.path().join("ref.fa")).unwrap();
        std::fs::write(&filename, TEST_FASTA).unwrap();

        check_test_chroms(FastaReferenceSource::new(&filename).unwrap());
    }

    #[test]
    fn test_compressed_fasta_reference_source() {
        let dir = tempfile::tempdir().unwrap();
        let filename = camino::Utf8PathBuf::from_path_buf(dir.path().join("ref.fa.gz")).unwrap();
        {
            let file = File::create(&filename).unwrap();
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(TEST_FASTA.as_bytes()).unwrap();
            encoder.finish().unwrap();
        }

        check_test_chroms(FastaReferenceSource::new(&filename).unwrap());
    }

    #[test]
    fn test_missing_fasta() {
        let result = FastaReferenceSource::new(Utf8Path::new("/nonexistent/ref.fa"));
        assert!(result.is_err());
    }
}

//! Indexed variant file input and annotated variant output
//!

use camino::Utf8Path;
use rust_htslib::bcf::{self, Read};
use simple_error::{SimpleResult, bail, try_with};

use crate::annotate::{VariantSink, VariantSource};
use crate::variant::{AnnotatedVariant, CandidateVariant};
use crate::vcf_utils::OutputFormat;

/// Convert an INFO lookup result, treating a tag missing from the header like a tag missing from
/// the record
///
fn undefined_tag_as_none<T>(
    result: Result<Option<T>, rust_htslib::errors::Error>,
    info_key: &[u8],
) -> SimpleResult<Option<T>> {
    match result {
        Ok(x) => Ok(x),
        Err(rust_htslib::errors::Error::BcfUndefinedTag { .. }) => Ok(None),
        Err(err) => bail!(
            "Unexpected error reading INFO key '{}': {:?}",
            String::from_utf8_lossy(info_key),
            err
        ),
    }
}

fn get_info_string(rec: &bcf::Record, info_key: &[u8]) -> SimpleResult<Option<Vec<u8>>> {
    let x = undefined_tag_as_none(rec.info(info_key).string(), info_key)?;
    Ok(x.and_then(|x| x.first().map(|v| v.to_vec())))
}

fn get_info_integer(rec: &bcf::Record, info_key: &[u8]) -> SimpleResult<Option<i64>> {
    let x = undefined_tag_as_none(rec.info(info_key).integer(), info_key)?;
    Ok(x.and_then(|x| x.first().map(|&v| v as i64)))
}

fn get_info_flag(rec: &bcf::Record, info_key: &[u8]) -> SimpleResult<bool> {
    let x = undefined_tag_as_none(rec.info(info_key).flag().map(Some), info_key)?;
    Ok(x.unwrap_or(false))
}

/// Parse the SV candidate fields from a variant record
///
fn get_candidate_variant(chrom: &str, rec: &bcf::Record) -> SimpleResult<CandidateVariant> {
    let sv_type = get_info_string(rec, b"SVTYPE")?
        .map(|x| String::from_utf8_lossy(&x).to_string());
    let consensus = get_info_string(rec, b"CONSENSUS")?.map(|x| x.to_ascii_uppercase());

    Ok(CandidateVariant {
        chrom: chrom.to_string(),
        pos: rec.pos(),
        end: get_info_integer(rec, b"END")?,
        sv_type,
        precise: get_info_flag(rec, b"PRECISE")?,
        consensus,
    })
}

/// SV candidate input from an indexed BCF or VCF file
///
pub struct BcfVariantSource {
    reader: bcf::IndexedReader,
}

impl BcfVariantSource {
    pub fn new(filename: &Utf8Path) -> SimpleResult<Self> {
        let reader = try_with!(
            bcf::IndexedReader::from_path(filename),
            "Unable to open indexed variant file: '{}'",
            filename
        );
        Ok(Self { reader })
    }

    pub fn header(&self) -> &bcf::header::HeaderView {
        self.reader.header()
    }
}

impl VariantSource for BcfVariantSource {
    type Handle = bcf::Record;

    fn chrom_count(&self) -> usize {
        self.reader.header().contig_count() as usize
    }

    fn has_chrom(&self, chrom: &str) -> bool {
        self.reader.header().name2rid(chrom.as_bytes()).is_ok()
    }

    fn fetch_chrom(
        &mut self,
        chrom: &str,
        chrom_len: u64,
    ) -> SimpleResult<Vec<(CandidateVariant, bcf::Record)>> {
        let rid = try_with!(
            self.reader.header().name2rid(chrom.as_bytes()),
            "Unable to find chromosome '{}' in variant file header",
            chrom
        );
        try_with!(
            self.reader.fetch(rid, 0, Some(chrom_len)),
            "Unable to fetch variant records on chromosome '{}'",
            chrom
        );

        let mut candidates = Vec::new();
        loop {
            let mut rec = self.reader.empty_record();
            match self.reader.read(&mut rec) {
                None => break,
                Some(result) => {
                    try_with!(
                        result,
                        "Unable to read variant record on chromosome '{}'",
                        chrom
                    );
                }
            }
            let candidate = get_candidate_variant(chrom, &rec)?;
            candidates.push((candidate, rec));
        }
        Ok(candidates)
    }
}

/// Annotated variant output to a BCF or VCF file
///
pub struct BcfVariantSink {
    writer: bcf::Writer,
}

impl BcfVariantSink {
    pub fn new(
        filename: &Utf8Path,
        header: &bcf::Header,
        output_format: OutputFormat,
    ) -> SimpleResult<Self> {
        let writer = try_with!(
            bcf::Writer::from_path(
                filename,
                header,
                output_format.is_uncompressed(),
                output_format.htslib_format()
            ),
            "Unable to create variant output file: '{}'",
            filename
        );
        Ok(Self { writer })
    }
}

/// Apply the annotated alleles and INFO fields to the record
fn update_record(
    rec: &mut bcf::Record,
    variant: &AnnotatedVariant,
) -> Result<(), rust_htslib::errors::Error> {
    match variant {
        AnnotatedVariant::Refined(x) => {
            rec.set_pos(x.pos);
            rec.set_alleles(&[x.ref_allele.as_slice(), x.alt_allele.as_slice()])?;
            rec.push_info_integer(b"END", &[x.end as i32])?;
            rec.push_info_integer(b"INSLEN", &[x.insertion_len])?;
            rec.push_info_float(b"SRQ", &[x.split_quality])?;
            rec.push_info_float(b"CE", &[x.consensus_entropy])?;
            if let Some(microhomology_len) = x.microhomology_len {
                rec.push_info_integer(b"MICROHOMLEN", &[microhomology_len])?;
            }
        }
        AnnotatedVariant::Fallback(x) => {
            rec.set_alleles(&[x.ref_allele.as_slice(), x.alt_allele.as_slice()])?;
        }
    }
    Ok(())
}

impl VariantSink<bcf::Record> for BcfVariantSink {
    fn write_variant(
        &mut self,
        mut rec: bcf::Record,
        variant: &AnnotatedVariant,
    ) -> SimpleResult<()> {
        self.writer.translate(&mut rec);
        try_with!(
            update_record(&mut rec, variant),
            "Unable to update variant record at position {}",
            rec.pos() + 1
        );
        try_with!(
            self.writer.write(&rec),
            "Unable to write variant record at position {}",
            rec.pos() + 1
        );
        Ok(())
    }
}

use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

use itertools::{Itertools, MinMaxResult};
use log::debug;

use crate::compressor;
use crate::compressor::ExternalCompressor;
use crate::data_series::DataSeries;
use crate::encoding::{BlockContentId, Encoding, EncodingDetails};
use crate::header::CompressionHeader;
use crate::record::{CramRecord, ReadFeature};
use crate::substitution_matrix::SubstitutionMatrix;
use crate::tag::TagId;
use crate::tag_dictionary::TagIdsDictionary;

/// Error occurring while planning a compression header.
#[derive(Debug)]
pub enum HeaderBuildError {
    /// A tag whose type character is outside the closed SAM type set.
    UnknownTagType(char),
    /// I/O error while gathering tag values into the scratch buffer.
    TagValueIo(io::Error),
    /// A candidate compressor failed during the probe.
    ProbeFailed(io::Error),
}

impl Display for HeaderBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderBuildError::UnknownTagType(tag_type) => {
                write!(f, "Unknown tag type: `{}`", tag_type)
            }
            HeaderBuildError::TagValueIo(e) => write!(f, "IO error gathering tag values: {}", e),
            HeaderBuildError::ProbeFailed(e) => write!(f, "Compressor probe failed: {}", e),
        }
    }
}

impl Error for HeaderBuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HeaderBuildError::UnknownTagType(_) => None,
            HeaderBuildError::TagValueIo(e) | HeaderBuildError::ProbeFailed(e) => Some(e),
        }
    }
}

/// The result of a header planning operation.
pub type HeaderBuildResult<T> = Result<T, HeaderBuildError>;

/// Variable-size `B` tags whose smallest value is larger than this are worth
/// a stop-byte encoding when a free delimiter exists.
const BYTE_ARRAY_STOP_MIN_SIZE: usize = 100;

const TAG_VALUE_SCRATCH_CAPACITY: usize = 1024 * 1024;

/// Decides the encodings and external compressors for batches of records.
///
/// The factory owns the only state that survives a batch: the per-tag
/// encoding cache and the scratch buffer used to concatenate tag values.
/// Sharing one factory across threads is not possible; give each planner
/// thread its own instance instead.
#[derive(Debug)]
pub struct CompressionHeaderFactory {
    best_encodings: HashMap<TagId, EncodingDetails>,
    tag_value_scratch: Vec<u8>,
}

impl CompressionHeaderFactory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            best_encodings: HashMap::new(),
            tag_value_scratch: Vec::with_capacity(TAG_VALUE_SCRATCH_CAPACITY),
        }
    }

    /// Plans the compression header for a batch.
    ///
    /// The records are mutated in place: tags are sorted by packed key, the
    /// tag-ids dictionary row is attached to each record, and unassigned
    /// substitution codes are filled in from the new substitution matrix.
    pub fn build(
        &mut self,
        records: &mut [CramRecord],
        coordinate_sorted: bool,
    ) -> HeaderBuildResult<CompressionHeader> {
        let mut header = CompressionHeader::new(coordinate_sorted);

        Self::add_fixed_series_encodings(&mut header);

        header.tag_ids_dictionary = TagIdsDictionary::from_records(records);
        debug!(
            "Tag dictionary has {} rows for {} records",
            header.tag_ids_dictionary.len(),
            records.len()
        );

        self.add_tag_encodings(records, &mut header)?;

        let substitution_matrix = SubstitutionMatrix::from_records(records);
        update_substitution_codes(records, &substitution_matrix);
        debug!("Substitution matrix: {}", substitution_matrix);
        header.substitution_matrix = substitution_matrix;

        Ok(header)
    }

    fn add_fixed_series_encodings(header: &mut CompressionHeader) {
        Self::add_external_rans_order_0(header, DataSeries::AlignmentPositionOffset);
        Self::add_external_rans_order_1(header, DataSeries::Base);
        Self::add_external_rans_order_1(header, DataSeries::BitFlags);
        Self::add_external_gzip(header, DataSeries::BaseSubstitutionCode);
        Self::add_external_rans_order_1(header, DataSeries::CompressionBitFlags);
        Self::add_external_gzip(header, DataSeries::DeletionLength);
        Self::add_external_gzip(header, DataSeries::FeatureCode);
        Self::add_external_gzip(header, DataSeries::NumberOfReadFeatures);
        Self::add_external_gzip(header, DataSeries::FeaturePosition);
        Self::add_external_gzip(header, DataSeries::HardClip);
        Self::add_byte_array_stop_tab_gzip(header, DataSeries::Insertion);
        Self::add_external_gzip(header, DataSeries::MateBitFlags);
        Self::add_external_gzip(header, DataSeries::MappingQuality);
        Self::add_external_gzip(header, DataSeries::RecordsToNextFragment);
        Self::add_external_gzip(header, DataSeries::NextFragmentAlignmentStart);
        Self::add_external_rans_order_1(header, DataSeries::NextFragmentReferenceSequenceId);
        Self::add_external_gzip(header, DataSeries::Padding);
        Self::add_external_rans_order_1(header, DataSeries::QualityScore);
        Self::add_external_rans_order_1(header, DataSeries::ReadGroup);
        Self::add_external_rans_order_0(header, DataSeries::RefId);
        Self::add_external_rans_order_1(header, DataSeries::ReadLength);
        Self::add_byte_array_stop_tab_gzip(header, DataSeries::ReadName);
        Self::add_external_gzip(header, DataSeries::ReferenceSkip);
        Self::add_byte_array_stop_tab_gzip(header, DataSeries::SoftClip);
        Self::add_external_gzip(header, DataSeries::TagCount);
        Self::add_external_gzip(header, DataSeries::TagIdList);
        Self::add_external_gzip(header, DataSeries::TagNameAndType);
        Self::add_external_rans_order_1(header, DataSeries::InsertSize);
    }

    fn add_external_encoding(
        header: &mut CompressionHeader,
        series: DataSeries,
        encoding: Encoding,
        compressor: ExternalCompressor,
    ) {
        let block_id = series.external_block_content_id();
        header.external_compressors.insert(block_id, compressor);
        header.data_series_encodings.insert(series, encoding);
    }

    fn add_external_scalar(
        header: &mut CompressionHeader,
        series: DataSeries,
        compressor: ExternalCompressor,
    ) {
        let encoding = Encoding::ExternalByte {
            block_id: series.external_block_content_id(),
        };
        Self::add_external_encoding(header, series, encoding, compressor);
    }

    fn add_external_gzip(header: &mut CompressionHeader, series: DataSeries) {
        Self::add_external_scalar(header, series, ExternalCompressor::Gzip);
    }

    fn add_external_rans_order_0(header: &mut CompressionHeader, series: DataSeries) {
        Self::add_external_scalar(header, series, ExternalCompressor::RansOrder0);
    }

    fn add_external_rans_order_1(header: &mut CompressionHeader, series: DataSeries) {
        Self::add_external_scalar(header, series, ExternalCompressor::RansOrder1);
    }

    fn add_byte_array_stop_tab_gzip(header: &mut CompressionHeader, series: DataSeries) {
        let encoding = Encoding::ByteArrayStop {
            stop_byte: b'\t',
            block_id: series.external_block_content_id(),
        };
        Self::add_external_encoding(header, series, encoding, ExternalCompressor::Gzip);
    }

    fn add_tag_encodings(
        &mut self,
        records: &[CramRecord],
        header: &mut CompressionHeader,
    ) -> HeaderBuildResult<()> {
        let tag_ids: BTreeSet<TagId> = records
            .iter()
            .flat_map(|record| record.tags().iter().map(|tag| tag.id()))
            .collect();

        for tag_id in tag_ids {
            let details = match self.best_encodings.get(&tag_id) {
                Some(details) => {
                    debug!("Reusing cached encoding for tag `{}`", tag_id);
                    details.clone()
                }
                None => {
                    let details = self.build_encoding_for_tag(records, tag_id)?;
                    self.best_encodings.insert(tag_id, details.clone());
                    details
                }
            };

            header
                .external_compressors
                .insert(BlockContentId::from(tag_id), details.compressor);
            header.tag_encodings.insert(tag_id, details.encoding);
        }

        Ok(())
    }

    fn build_encoding_for_tag(
        &mut self,
        records: &[CramRecord],
        tag_id: TagId,
    ) -> HeaderBuildResult<EncodingDetails> {
        self.gather_tag_values(records, tag_id)?;
        let compressor = compressor::best_external(&self.tag_value_scratch)
            .map_err(HeaderBuildError::ProbeFailed)?;
        debug!(
            "Chose {} for tag `{}` ({} value bytes)",
            compressor,
            tag_id,
            self.tag_value_scratch.len()
        );

        let block_id = BlockContentId::from(tag_id);
        let encoding = match tag_id.tag_type() {
            b'A' | b'c' | b'C' => Encoding::fixed_len_byte_array(1, block_id),
            b's' | b'S' => Encoding::fixed_len_byte_array(2, block_id),
            b'i' | b'I' | b'f' => Encoding::fixed_len_byte_array(4, block_id),
            b'Z' | b'B' => {
                let (min, max) = byte_size_range(records, tag_id);
                if min == max {
                    Encoding::fixed_len_byte_array(min as i32, block_id)
                } else if tag_id.tag_type() == b'Z' {
                    Encoding::ByteArrayStop {
                        stop_byte: b'\t',
                        block_id,
                    }
                } else {
                    Self::variable_array_encoding(&self.tag_value_scratch, min, block_id)
                }
            }
            other => return Err(HeaderBuildError::UnknownTagType(other as char)),
        };

        Ok(EncodingDetails {
            encoding,
            compressor,
        })
    }

    /// Encoding for a `B` tag with varying value sizes: a stop byte when the
    /// values are large and leave one free, length-prefixed otherwise.
    fn variable_array_encoding(data: &[u8], min_size: usize, block_id: BlockContentId) -> Encoding {
        if min_size > BYTE_ARRAY_STOP_MIN_SIZE {
            if let Some(stop_byte) = compressor::find_unused_byte(data) {
                return Encoding::ByteArrayStop { stop_byte, block_id };
            }
        }

        Encoding::ByteArrayLen {
            lengths: Box::new(Encoding::ExternalInteger { block_id }),
            values: Box::new(Encoding::ExternalByte { block_id }),
        }
    }

    fn gather_tag_values(
        &mut self,
        records: &[CramRecord],
        tag_id: TagId,
    ) -> HeaderBuildResult<()> {
        self.tag_value_scratch.clear();

        for record in records {
            for tag in record.tags() {
                if tag.id() != tag_id {
                    continue;
                }
                tag.value()
                    .write_bytes(&mut self.tag_value_scratch)
                    .map_err(HeaderBuildError::TagValueIo)?;
            }
        }

        Ok(())
    }
}

impl Default for CompressionHeaderFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn byte_size_range(records: &[CramRecord], tag_id: TagId) -> (usize, usize) {
    let sizes = records
        .iter()
        .flat_map(|record| record.tags().iter())
        .filter(|tag| tag.id() == tag_id)
        .map(|tag| tag.value().byte_size());

    match sizes.minmax() {
        MinMaxResult::NoElements => (0, 0),
        MinMaxResult::OneElement(size) => (size, size),
        MinMaxResult::MinMax(min, max) => (min, max),
    }
}

fn update_substitution_codes(records: &mut [CramRecord], matrix: &SubstitutionMatrix) {
    for record in records.iter_mut() {
        for feature in record.read_features_mut() {
            if let ReadFeature::Substitution(substitution) = feature {
                if substitution.code().is_none() {
                    let code = matrix.code(substitution.reference_base(), substitution.base());
                    substitution.set_code(code);
                }
            }
        }
    }
}

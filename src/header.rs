use std::collections::BTreeMap;

use crate::compressor::ExternalCompressor;
use crate::data_series::DataSeries;
use crate::encoding::{BlockContentId, Encoding};
use crate::substitution_matrix::SubstitutionMatrix;
use crate::tag::TagId;
use crate::tag_dictionary::TagIdsDictionary;

/// The planned compression header for one batch of records: the encoding of
/// every fixed data series and every observed tag, the compressor of every
/// external block, the tag-ids dictionary, and the substitution matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionHeader {
    pub(crate) ap_delta: bool,
    pub(crate) data_series_encodings: BTreeMap<DataSeries, Encoding>,
    pub(crate) tag_encodings: BTreeMap<TagId, Encoding>,
    pub(crate) external_compressors: BTreeMap<BlockContentId, ExternalCompressor>,
    pub(crate) tag_ids_dictionary: TagIdsDictionary,
    pub(crate) substitution_matrix: SubstitutionMatrix,
}

impl CompressionHeader {
    pub(crate) fn new(ap_delta: bool) -> Self {
        Self {
            ap_delta,
            data_series_encodings: BTreeMap::new(),
            tag_encodings: BTreeMap::new(),
            external_compressors: BTreeMap::new(),
            tag_ids_dictionary: TagIdsDictionary::default(),
            substitution_matrix: SubstitutionMatrix::default(),
        }
    }

    /// Whether alignment positions are stored as deltas. Set when the batch
    /// is coordinate sorted.
    #[inline]
    #[must_use]
    pub fn ap_delta(&self) -> bool {
        self.ap_delta
    }

    /// The encoding of a fixed data series.
    #[must_use]
    pub fn data_series_encoding(&self, series: DataSeries) -> Option<&Encoding> {
        self.data_series_encodings.get(&series)
    }

    /// All fixed data series encodings, in block content id order.
    #[must_use]
    pub fn data_series_encodings(&self) -> &BTreeMap<DataSeries, Encoding> {
        &self.data_series_encodings
    }

    /// The encoding of a tag observed in the batch.
    #[must_use]
    pub fn tag_encoding(&self, id: TagId) -> Option<&Encoding> {
        self.tag_encodings.get(&id)
    }

    /// All tag encodings, in packed tag id order.
    #[must_use]
    pub fn tag_encodings(&self) -> &BTreeMap<TagId, Encoding> {
        &self.tag_encodings
    }

    /// The compressor assigned to an external block.
    #[must_use]
    pub fn external_compressor(&self, block_id: BlockContentId) -> Option<ExternalCompressor> {
        self.external_compressors.get(&block_id).copied()
    }

    /// All external block compressors.
    #[must_use]
    pub fn external_compressors(&self) -> &BTreeMap<BlockContentId, ExternalCompressor> {
        &self.external_compressors
    }

    /// The tag-ids dictionary of the batch.
    #[must_use]
    pub fn tag_ids_dictionary(&self) -> &TagIdsDictionary {
        &self.tag_ids_dictionary
    }

    /// The substitution matrix of the batch.
    #[must_use]
    pub fn substitution_matrix(&self) -> &SubstitutionMatrix {
        &self.substitution_matrix
    }
}

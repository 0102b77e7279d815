use std::fmt::{Display, Formatter};

use crate::encoding::BlockContentId;

/// A fixed logical data series: one column across all records of a slice,
/// encoded independently. The discriminants are the external block content
/// ids; 18 and 19 belong to the unused `BB` and `QQ` series and stay
/// reserved.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(i32)]
pub enum DataSeries {
    BitFlags = 1,
    CompressionBitFlags = 2,
    RefId = 3,
    ReadLength = 4,
    AlignmentPositionOffset = 5,
    ReadGroup = 6,
    ReadName = 7,
    MateBitFlags = 8,
    NextFragmentReferenceSequenceId = 9,
    NextFragmentAlignmentStart = 10,
    InsertSize = 11,
    RecordsToNextFragment = 12,
    TagIdList = 13,
    NumberOfReadFeatures = 14,
    FeatureCode = 15,
    FeaturePosition = 16,
    DeletionLength = 17,
    BaseSubstitutionCode = 20,
    Insertion = 21,
    ReferenceSkip = 22,
    Padding = 23,
    HardClip = 24,
    MappingQuality = 25,
    Base = 26,
    QualityScore = 27,
    TagCount = 28,
    TagNameAndType = 29,
    SoftClip = 30,
}

impl DataSeries {
    /// All data series, in block content id order.
    pub const ALL: [DataSeries; 28] = [
        DataSeries::BitFlags,
        DataSeries::CompressionBitFlags,
        DataSeries::RefId,
        DataSeries::ReadLength,
        DataSeries::AlignmentPositionOffset,
        DataSeries::ReadGroup,
        DataSeries::ReadName,
        DataSeries::MateBitFlags,
        DataSeries::NextFragmentReferenceSequenceId,
        DataSeries::NextFragmentAlignmentStart,
        DataSeries::InsertSize,
        DataSeries::RecordsToNextFragment,
        DataSeries::TagIdList,
        DataSeries::NumberOfReadFeatures,
        DataSeries::FeatureCode,
        DataSeries::FeaturePosition,
        DataSeries::DeletionLength,
        DataSeries::BaseSubstitutionCode,
        DataSeries::Insertion,
        DataSeries::ReferenceSkip,
        DataSeries::Padding,
        DataSeries::HardClip,
        DataSeries::MappingQuality,
        DataSeries::Base,
        DataSeries::QualityScore,
        DataSeries::TagCount,
        DataSeries::TagNameAndType,
        DataSeries::SoftClip,
    ];

    /// The two-letter series code used by the container format.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            DataSeries::BitFlags => "BF",
            DataSeries::CompressionBitFlags => "CF",
            DataSeries::RefId => "RI",
            DataSeries::ReadLength => "RL",
            DataSeries::AlignmentPositionOffset => "AP",
            DataSeries::ReadGroup => "RG",
            DataSeries::ReadName => "RN",
            DataSeries::MateBitFlags => "MF",
            DataSeries::NextFragmentReferenceSequenceId => "NS",
            DataSeries::NextFragmentAlignmentStart => "NP",
            DataSeries::InsertSize => "TS",
            DataSeries::RecordsToNextFragment => "NF",
            DataSeries::TagIdList => "TL",
            DataSeries::NumberOfReadFeatures => "FN",
            DataSeries::FeatureCode => "FC",
            DataSeries::FeaturePosition => "FP",
            DataSeries::DeletionLength => "DL",
            DataSeries::BaseSubstitutionCode => "BS",
            DataSeries::Insertion => "IN",
            DataSeries::ReferenceSkip => "RS",
            DataSeries::Padding => "PD",
            DataSeries::HardClip => "HC",
            DataSeries::MappingQuality => "MQ",
            DataSeries::Base => "BA",
            DataSeries::QualityScore => "QS",
            DataSeries::TagCount => "TC",
            DataSeries::TagNameAndType => "TN",
            DataSeries::SoftClip => "SC",
        }
    }

    /// The id of the external block this series' bytes are stored in.
    #[inline]
    #[must_use]
    pub const fn external_block_content_id(self) -> BlockContentId {
        BlockContentId(self as i32)
    }
}

impl Display for DataSeries {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

use lazy_static::lazy_static;

use crate::record::{Base, CramRecord, ReadFeature, Substitution};
use crate::tag::{ReadTag, TagValue};

#[must_use]
pub fn nm_tag(value: i32) -> ReadTag {
    ReadTag::new([b'N', b'M'], TagValue::Int32(value))
}

#[must_use]
pub fn md_tag(value: &str) -> ReadTag {
    ReadTag::new([b'M', b'D'], TagValue::String(value.as_bytes().to_vec()))
}

#[must_use]
pub fn substitution_feature(position: i32, read: Base, reference: Base) -> ReadFeature {
    ReadFeature::Substitution(Substitution::new(position, read, reference))
}

lazy_static! {
    /// A small mixed batch: tagged records (one pair with permuted tag
    /// order), an untagged record, and a record with read features.
    pub static ref MIXED_TEST_BATCH: Vec<CramRecord> = vec![
        CramRecord::new(vec![nm_tag(1), md_tag("50")], vec![]),
        CramRecord::new(vec![md_tag("10A5"), nm_tag(2)], vec![]),
        CramRecord::default(),
        CramRecord::new(
            vec![nm_tag(0)],
            vec![
                substitution_feature(7, Base::C, Base::A),
                ReadFeature::SoftClip {
                    position: 0,
                    bases: b"TT".to_vec(),
                },
            ],
        ),
    ];

    /// A batch dominated by A→C substitutions, forcing that pair to rank 0,
    /// with one extra substitution at position 7.
    pub static ref SUBSTITUTION_TEST_BATCH: Vec<CramRecord> = {
        let mut records: Vec<CramRecord> = (0..1000)
            .map(|index| {
                CramRecord::new(
                    vec![],
                    vec![substitution_feature(index, Base::C, Base::A)],
                )
            })
            .collect();
        records.push(CramRecord::new(
            vec![],
            vec![substitution_feature(7, Base::C, Base::A)],
        ));
        records
    };
}

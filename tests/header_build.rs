use cramplan::_internal_test_data::{MIXED_TEST_BATCH, SUBSTITUTION_TEST_BATCH};
use cramplan::data_series::DataSeries;
use cramplan::header_factory::CompressionHeaderFactory;
use cramplan::record::{Base, CramRecord, ReadFeature};
use cramplan::tag::TagId;

#[test_log::test]
fn builds_a_header_for_a_mixed_batch() {
    let mut records: Vec<CramRecord> = MIXED_TEST_BATCH.clone();

    let header = CompressionHeaderFactory::new()
        .build(&mut records, true)
        .unwrap();

    assert!(header.ap_delta());
    assert_eq!(header.data_series_encodings().len(), DataSeries::ALL.len());

    // NM:i and MD:Z are the two distinct tags in the batch
    let tag_ids: Vec<TagId> = header.tag_encodings().keys().copied().collect();
    assert_eq!(
        tag_ids,
        [TagId::new([b'M', b'D'], b'Z'), TagId::new([b'N', b'M'], b'i')]
    );
    for id in tag_ids {
        assert!(header.external_compressor(id.into()).is_some(), "{}", id);
    }

    // the empty row, [NM], and [MD, NM]; the two-tag records share one row
    assert_eq!(header.tag_ids_dictionary().len(), 3);
    assert_eq!(records[0].tag_ids_index(), records[1].tag_ids_index());
    assert_eq!(records[2].tag_ids_index(), Some(0));
}

#[test]
fn dictionary_rows_match_record_tags() {
    let mut records: Vec<CramRecord> = MIXED_TEST_BATCH.clone();

    let header = CompressionHeaderFactory::new()
        .build(&mut records, false)
        .unwrap();

    for record in &records {
        let row = header
            .tag_ids_dictionary()
            .row(record.tag_ids_index().unwrap());
        let keys: Vec<[u8; 3]> = record.tags().iter().map(|tag| tag.id().bytes()).collect();
        assert_eq!(row, keys);
    }
}

#[test]
fn substitution_codes_are_assigned_everywhere() {
    let mut records: Vec<CramRecord> = SUBSTITUTION_TEST_BATCH.clone();

    let header = CompressionHeaderFactory::new()
        .build(&mut records, true)
        .unwrap();

    for record in &records {
        for feature in record.read_features() {
            if let ReadFeature::Substitution(substitution) = feature {
                let code = substitution.code().unwrap();
                assert!(code < 4);
                assert_eq!(
                    header
                        .substitution_matrix()
                        .base(substitution.reference_base(), code),
                    substitution.base()
                );
            }
        }
    }

    // every substitution in the batch is A→C, so it must take code 0
    assert_eq!(header.substitution_matrix().code(Base::A, Base::C), 0);
}

#[test]
fn build_is_idempotent() {
    let mut first_records: Vec<CramRecord> = MIXED_TEST_BATCH.clone();
    let first = CompressionHeaderFactory::new()
        .build(&mut first_records, true)
        .unwrap();

    let mut second_records = first_records.clone();
    let second = CompressionHeaderFactory::new()
        .build(&mut second_records, true)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first_records, second_records);
}

#[test]
fn record_order_does_not_change_dictionary_or_matrix() {
    let mut forward: Vec<CramRecord> = MIXED_TEST_BATCH.clone();
    let mut backward: Vec<CramRecord> = MIXED_TEST_BATCH.iter().rev().cloned().collect();

    let forward_header = CompressionHeaderFactory::new()
        .build(&mut forward, true)
        .unwrap();
    let backward_header = CompressionHeaderFactory::new()
        .build(&mut backward, true)
        .unwrap();

    assert_eq!(
        forward_header.tag_ids_dictionary(),
        backward_header.tag_ids_dictionary()
    );
    assert_eq!(
        forward_header.substitution_matrix(),
        backward_header.substitution_matrix()
    );
}

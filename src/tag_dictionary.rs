use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::record::CramRecord;

/// A serialized tag-key sequence: the 3-byte keys of a record's sorted tags,
/// concatenated. Sequences order by length first, then bytewise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TagIdsKey(Vec<u8>);

impl TagIdsKey {
    fn from_record(record: &CramRecord) -> Self {
        let bytes = record
            .tags()
            .iter()
            .flat_map(|tag| tag.id().bytes())
            .collect();

        Self(bytes)
    }
}

impl Ord for TagIdsKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for TagIdsKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The dictionary of distinct tag-key sequences observed in a batch: one row
/// per sequence, each row a list of 3-byte keys. Row 0 is always the empty
/// sequence, and rows are numbered in (length, bytewise) order of their
/// serialized form, so the dictionary is a pure function of the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIdsDictionary {
    rows: Vec<Vec<[u8; 3]>>,
}

impl TagIdsDictionary {
    /// Builds the dictionary for a batch and stamps every record with the
    /// row index its tag-key sequence resolves to. Each record's tags are
    /// sorted in place by ascending packed key first.
    pub fn from_records(records: &mut [CramRecord]) -> Self {
        let mut distinct = BTreeSet::new();
        distinct.insert(TagIdsKey(Vec::new()));

        for record in records.iter_mut() {
            record.tags_mut().sort_by_key(|tag| tag.id());
            distinct.insert(TagIdsKey::from_record(record));
        }

        let indices: HashMap<&TagIdsKey, usize> = distinct
            .iter()
            .enumerate()
            .map(|(index, key)| (key, index))
            .collect();

        for record in records.iter_mut() {
            let key = TagIdsKey::from_record(record);
            record.set_tag_ids_index(indices[&key]);
        }

        let rows = distinct
            .iter()
            .map(|key| {
                key.0
                    .chunks_exact(3)
                    .map(|chunk| [chunk[0], chunk[1], chunk[2]])
                    .collect()
            })
            .collect();

        Self { rows }
    }

    /// The dictionary rows, in row-index order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<[u8; 3]>] {
        &self.rows
    }

    /// The keys of a single row.
    #[must_use]
    pub fn row(&self, index: usize) -> &[[u8; 3]] {
        &self.rows[index]
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

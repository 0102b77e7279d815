use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;

/// Error occurring while reading, writing or querying a FASTA index.
#[derive(Debug)]
pub enum FastaIndexError {
    /// I/O error while reading or writing the index file.
    IoError(io::Error),
    /// A line not matching `contig\tsize\toffset\tbases\tbytes`.
    InvalidLine(String),
    /// The same contig name occurring twice.
    DuplicateContig(String),
    /// A lookup for a contig the index does not contain.
    UnknownContig(String),
}

impl From<io::Error> for FastaIndexError {
    fn from(e: io::Error) -> Self {
        Self::IoError(e)
    }
}

impl Display for FastaIndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FastaIndexError::IoError(e) => write!(f, "IO error: {}", e),
            FastaIndexError::InvalidLine(line) => {
                write!(f, "Invalid fasta index line: `{}`", line)
            }
            FastaIndexError::DuplicateContig(contig) => {
                write!(f, "Contig `{}` already exists in the fasta index", contig)
            }
            FastaIndexError::UnknownContig(contig) => {
                write!(f, "No fasta index entry for contig `{}`", contig)
            }
        }
    }
}

impl Error for FastaIndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FastaIndexError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

/// The result of a FASTA index operation.
pub type FastaIndexResult<T> = Result<T, FastaIndexError>;

/// One `.fai` row: a reference sequence, its length in bases, the byte
/// offset of its first base, and its line geometry.
#[derive(Debug, Clone, Eq)]
pub struct FastaSequenceIndexEntry {
    contig: String,
    location: u64,
    size: u64,
    bases_per_line: u32,
    bytes_per_line: u32,
    sequence_index: usize,
}

impl FastaSequenceIndexEntry {
    /// The contig name.
    #[must_use]
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// Byte offset of the first base of the contig in the FASTA file.
    #[inline]
    #[must_use]
    pub fn location(&self) -> u64 {
        self.location
    }

    /// Number of bases in the contig.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of bases on each full FASTA line.
    #[inline]
    #[must_use]
    pub fn bases_per_line(&self) -> u32 {
        self.bases_per_line
    }

    /// Number of bytes of each full FASTA line, including line terminators.
    #[inline]
    #[must_use]
    pub fn bytes_per_line(&self) -> u32 {
        self.bytes_per_line
    }

    /// Zero-based position of this entry in the index, in insertion order.
    #[inline]
    #[must_use]
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }
}

// The sequence index is positional bookkeeping and not part of entry
// identity.
impl PartialEq for FastaSequenceIndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.contig == other.contig
            && self.location == other.location
            && self.size == other.size
            && self.bases_per_line == other.bases_per_line
            && self.bytes_per_line == other.bytes_per_line
    }
}

impl Display for FastaSequenceIndexEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "contig {}; location {}; size {}; basesPerLine {}; bytesPerLine {}",
            self.contig, self.location, self.size, self.bases_per_line, self.bytes_per_line
        )
    }
}

/// A FASTA index (`.fai`), as produced by `samtools faidx`: one entry per
/// reference sequence, iterated in insertion order and looked up by contig
/// name.
#[derive(Debug, Clone, Default, Eq)]
pub struct FastaSequenceIndex {
    entries: IndexMap<String, FastaSequenceIndexEntry>,
}

impl FastaSequenceIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Reads an index from `.fai` text.
    ///
    /// # Examples
    /// ```
    /// use cramplan::fasta_index::FastaSequenceIndex;
    ///
    /// let index = FastaSequenceIndex::from_reader("chr1\t248956422\t6\t60\t61\n".as_bytes())
    ///     .unwrap();
    /// assert_eq!(index.len(), 1);
    /// ```
    pub fn from_reader<R: BufRead>(reader: R) -> FastaIndexResult<Self> {
        let mut index = Self::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            index.parse_line(&line)?;
        }

        Ok(index)
    }

    /// Reads an index from a `.fai` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> FastaIndexResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn parse_line(&mut self, line: &str) -> FastaIndexResult<()> {
        let invalid = || FastaIndexError::InvalidLine(line.to_owned());

        let mut fields = line.split('\t');
        let contig = fields.next().ok_or_else(invalid)?;
        let size = Self::parse_field::<u64>(&mut fields, line)?;
        let location = Self::parse_field::<u64>(&mut fields, line)?;
        let bases_per_line = Self::parse_field::<u32>(&mut fields, line)?;
        let bytes_per_line = Self::parse_field::<u32>(&mut fields, line)?;
        if fields.next().is_some() {
            return Err(invalid());
        }

        // the SAM sequence-name rule: the name ends at the first whitespace
        let contig = contig.split_whitespace().next().ok_or_else(invalid)?;

        self.add(contig, location, size, bases_per_line, bytes_per_line)
    }

    fn parse_field<'a, T: std::str::FromStr>(
        fields: &mut impl Iterator<Item = &'a str>,
        line: &str,
    ) -> FastaIndexResult<T> {
        fields
            .next()
            .and_then(|field| field.parse().ok())
            .ok_or_else(|| FastaIndexError::InvalidLine(line.to_owned()))
    }

    /// Appends an entry, assigning it the next sequence index.
    pub fn add(
        &mut self,
        contig: &str,
        location: u64,
        size: u64,
        bases_per_line: u32,
        bytes_per_line: u32,
    ) -> FastaIndexResult<()> {
        if self.entries.contains_key(contig) {
            return Err(FastaIndexError::DuplicateContig(contig.to_owned()));
        }

        let entry = FastaSequenceIndexEntry {
            contig: contig.to_owned(),
            location,
            size,
            bases_per_line,
            bytes_per_line,
            sequence_index: self.entries.len(),
        };
        self.entries.insert(entry.contig.clone(), entry);

        Ok(())
    }

    /// Writes the index as `.fai` text, one tab-delimited line per entry in
    /// insertion order.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for entry in self.entries.values() {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                entry.contig, entry.size, entry.location, entry.bases_per_line, entry.bytes_per_line
            )?;
        }

        Ok(())
    }

    /// Writes the index to a `.fai` file.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> FastaIndexResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;

        Ok(())
    }

    /// Whether the index has an entry for the given contig.
    #[must_use]
    pub fn has_index_entry(&self, contig: &str) -> bool {
        self.entries.contains_key(contig)
    }

    /// The entry for the given contig.
    pub fn index_entry(&self, contig: &str) -> FastaIndexResult<&FastaSequenceIndexEntry> {
        self.entries
            .get(contig)
            .ok_or_else(|| FastaIndexError::UnknownContig(contig.to_owned()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FastaSequenceIndexEntry> {
        self.entries.values()
    }
}

impl PartialEq for FastaSequenceIndex {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<'a> IntoIterator for &'a FastaSequenceIndex {
    type Item = &'a FastaSequenceIndexEntry;
    type IntoIter = indexmap::map::Values<'a, String, FastaSequenceIndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use crate::fasta_index::{FastaIndexError, FastaSequenceIndex};

    const CHR1_LINE: &str = "chr1\t248956422\t6\t60\t61\n";

    #[test]
    fn parses_a_single_line() {
        let index = FastaSequenceIndex::from_reader(CHR1_LINE.as_bytes()).unwrap();

        let entry = index.index_entry("chr1").unwrap();
        assert_eq!(entry.contig(), "chr1");
        assert_eq!(entry.size(), 248956422);
        assert_eq!(entry.location(), 6);
        assert_eq!(entry.bases_per_line(), 60);
        assert_eq!(entry.bytes_per_line(), 61);
        assert_eq!(entry.sequence_index(), 0);
    }

    #[test]
    fn emitting_reproduces_the_input_bytes() {
        let index = FastaSequenceIndex::from_reader(CHR1_LINE.as_bytes()).unwrap();

        let mut output = Vec::new();
        index.write(&mut output).unwrap();

        assert_eq!(output, CHR1_LINE.as_bytes());
    }

    #[test]
    fn round_trips_through_text() {
        let mut index = FastaSequenceIndex::new();
        index.add("chr1", 6, 248956422, 60, 61).unwrap();
        index.add("chrM", 252513010, 16569, 70, 71).unwrap();

        let mut text = Vec::new();
        index.write(&mut text).unwrap();
        let parsed = FastaSequenceIndex::from_reader(text.as_slice()).unwrap();

        assert_eq!(parsed, index);
    }

    #[test]
    fn sequence_indices_follow_insertion_order() {
        let mut index = FastaSequenceIndex::new();
        index.add("chr2", 0, 10, 60, 61).unwrap();
        index.add("chr1", 20, 10, 60, 61).unwrap();

        let contigs: Vec<&str> = index.iter().map(|entry| entry.contig()).collect();
        assert_eq!(contigs, ["chr2", "chr1"]);
        assert_eq!(index.index_entry("chr1").unwrap().sequence_index(), 1);
    }

    #[test]
    fn contig_names_truncate_at_whitespace() {
        let text = "chr1 Homo sapiens chromosome 1\t1000\t6\t60\t61\n";
        let index = FastaSequenceIndex::from_reader(text.as_bytes()).unwrap();

        assert!(index.has_index_entry("chr1"));
        assert_eq!(index.index_entry("chr1").unwrap().size(), 1000);
    }

    #[test]
    fn should_reject_duplicate_contig() {
        let text = "chr1\t1000\t6\t60\t61\nchr1\t2000\t30\t60\t61\n";
        let error = FastaSequenceIndex::from_reader(text.as_bytes()).unwrap_err();

        assert!(matches!(error, FastaIndexError::DuplicateContig(contig) if contig == "chr1"));
    }

    #[test]
    fn should_reject_short_line() {
        let error = FastaSequenceIndex::from_reader("chr1\t1000\t6\t60\n".as_bytes()).unwrap_err();

        assert!(matches!(error, FastaIndexError::InvalidLine(_)));
    }

    #[test]
    fn should_reject_non_numeric_field() {
        let error =
            FastaSequenceIndex::from_reader("chr1\tlots\t6\t60\t61\n".as_bytes()).unwrap_err();

        assert!(matches!(error, FastaIndexError::InvalidLine(line) if line.starts_with("chr1")));
    }

    #[test]
    fn should_reject_extra_fields() {
        let error = FastaSequenceIndex::from_reader("chr1\t1000\t6\t60\t61\t9\n".as_bytes())
            .unwrap_err();

        assert!(matches!(error, FastaIndexError::InvalidLine(_)));
    }

    #[test]
    fn missing_contig_lookup_fails() {
        let index = FastaSequenceIndex::new();
        let error = index.index_entry("chrM").unwrap_err();

        assert!(matches!(error, FastaIndexError::UnknownContig(contig) if contig == "chrM"));
    }

    #[test]
    fn entry_equality_ignores_sequence_index() {
        let mut first = FastaSequenceIndex::new();
        first.add("chrM", 0, 16569, 70, 71).unwrap();

        let mut second = FastaSequenceIndex::new();
        second.add("chr1", 0, 1000, 60, 61).unwrap();
        second.add("chrM", 0, 16569, 70, 71).unwrap();

        assert_eq!(
            first.index_entry("chrM").unwrap(),
            second.index_entry("chrM").unwrap()
        );
    }

    #[test]
    fn index_equality_requires_the_same_order() {
        let mut forward = FastaSequenceIndex::new();
        forward.add("chr1", 0, 1000, 60, 61).unwrap();
        forward.add("chr2", 1020, 500, 60, 61).unwrap();

        let mut backward = FastaSequenceIndex::new();
        backward.add("chr2", 1020, 500, 60, 61).unwrap();
        backward.add("chr1", 0, 1000, 60, 61).unwrap();

        assert_ne!(forward, backward);
    }

    #[test]
    fn file_round_trip() {
        let mut index = FastaSequenceIndex::new();
        index.add("chr1", 6, 248956422, 60, 61).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.fa.fai");
        index.write_to_path(&path).unwrap();
        let parsed = FastaSequenceIndex::from_path(&path).unwrap();

        assert_eq!(parsed, index);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", FastaIndexError::InvalidLine("bad line".to_owned())),
            "Invalid fasta index line: `bad line`"
        );
        assert_eq!(
            format!("{}", FastaIndexError::DuplicateContig("chr1".to_owned())),
            "Contig `chr1` already exists in the fasta index"
        );
        assert_eq!(
            format!("{}", FastaIndexError::UnknownContig("chrM".to_owned())),
            "No fasta index entry for contig `chrM`"
        );
    }

    #[test]
    fn test_error_source() {
        use std::io::ErrorKind::NotFound;

        assert!(FastaIndexError::from(std::io::Error::from(NotFound))
            .source()
            .is_some());
        assert!(FastaIndexError::UnknownContig("chr1".to_owned())
            .source()
            .is_none());
    }
}

use std::fmt::{Display, Formatter};

use derive_more::Deref;

use crate::compressor::ExternalCompressor;
use crate::tag::TagId;

/// Identifier of an external byte block in the container. Fixed data series
/// and packed tag ids share this number space.
#[derive(Deref, Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct BlockContentId(pub i32);

impl BlockContentId {
    #[inline]
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Display for BlockContentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TagId> for BlockContentId {
    fn from(id: TagId) -> Self {
        Self(id.as_int())
    }
}

/// A value encoding, as recorded in the compression header. Composite
/// encodings nest their sub-encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// Value bytes stored verbatim in the external block with the given id.
    ExternalByte { block_id: BlockContentId },
    /// Integers stored ITF8-encoded in the external block with the given id.
    ExternalInteger { block_id: BlockContentId },
    /// Byte runs terminated by a stop byte, stored in the external block
    /// with the given id.
    ByteArrayStop {
        stop_byte: u8,
        block_id: BlockContentId,
    },
    /// A length encoding followed by a value encoding.
    ByteArrayLen {
        lengths: Box<Encoding>,
        values: Box<Encoding>,
    },
    /// Canonical Huffman over an explicit integer alphabet.
    HuffmanInteger {
        symbols: Vec<i32>,
        code_lengths: Vec<u32>,
    },
}

impl Encoding {
    /// A `ByteArrayLen` whose length alphabet is the single value `size`:
    /// the shape used for tags whose values all have the same width.
    #[must_use]
    pub fn fixed_len_byte_array(size: i32, block_id: BlockContentId) -> Self {
        Encoding::ByteArrayLen {
            lengths: Box::new(Encoding::HuffmanInteger {
                symbols: vec![size],
                code_lengths: vec![0],
            }),
            values: Box::new(Encoding::ExternalByte { block_id }),
        }
    }
}

/// Everything needed to encode one data series or tag: the value encoding
/// and the compressor applied to its external block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingDetails {
    pub encoding: Encoding,
    pub compressor: ExternalCompressor,
}

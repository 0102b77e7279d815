use std::fmt::{Display, Formatter};
use std::io;
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;
use rans::byte_encoder::{ByteRansEncSymbol, ByteRansEncoderMulti};
use rans::{RansEncSymbol, RansEncoder, RansEncoderMulti};

const SCALE_BITS: u32 = 12;
const SCALE: u32 = 1 << SCALE_BITS;

/// One of the general-purpose compressors applied to external blocks.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ExternalCompressor {
    Gzip,
    RansOrder0,
    RansOrder1,
}

impl ExternalCompressor {
    /// Compresses `data`, returning the full output stream for this
    /// compressor (for the rANS variants: the serialized frequency tables
    /// followed by the entropy-coded payload).
    pub fn compress(self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            ExternalCompressor::Gzip => gzip_compress(data),
            ExternalCompressor::RansOrder0 => rans_compress_order_0(data),
            ExternalCompressor::RansOrder1 => rans_compress_order_1(data),
        }
    }
}

impl Display for ExternalCompressor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalCompressor::Gzip => write!(f, "gzip"),
            ExternalCompressor::RansOrder0 => write!(f, "rANS order-0"),
            ExternalCompressor::RansOrder1 => write!(f, "rANS order-1"),
        }
    }
}

/// Compresses `data` with every candidate and returns the one producing the
/// smallest output. Ties go to the lowest-complexity decoder: rANS order-0,
/// then rANS order-1, then gzip.
pub fn best_external(data: &[u8]) -> io::Result<ExternalCompressor> {
    let gzip_len = ExternalCompressor::Gzip.compress(data)?.len();
    let rans_0_len = ExternalCompressor::RansOrder0.compress(data)?.len();
    let rans_1_len = ExternalCompressor::RansOrder1.compress(data)?.len();

    let min_len = gzip_len.min(rans_0_len).min(rans_1_len);
    if min_len == rans_0_len {
        Ok(ExternalCompressor::RansOrder0)
    } else if min_len == rans_1_len {
        Ok(ExternalCompressor::RansOrder1)
    } else {
        Ok(ExternalCompressor::Gzip)
    }
}

/// Returns the smallest byte value not occurring in `data`, or `None` if
/// all 256 values are present.
#[must_use]
pub fn find_unused_byte(data: &[u8]) -> Option<u8> {
    let mut used = [false; 256];
    for &byte in data {
        used[byte as usize] = true;
    }

    used.iter().position(|&in_use| !in_use).map(|i| i as u8)
}

fn gzip_compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Symbol table for one rANS context, covering the full byte alphabet.
struct RansByteModel {
    symbols: Vec<ByteRansEncSymbol>,
}

impl RansByteModel {
    /// Builds the table from frequencies already normalized to [`SCALE`].
    #[must_use]
    fn new(freqs: &[u32; 256]) -> Self {
        let mut cum_freq = 0;
        let symbols = freqs
            .iter()
            .map(|&freq| {
                let symbol = ByteRansEncSymbol::new(cum_freq, freq, SCALE_BITS);
                cum_freq += freq;
                symbol
            })
            .collect();

        Self { symbols }
    }

    #[inline]
    fn symbol(&self, byte: u8) -> &ByteRansEncSymbol {
        &self.symbols[byte as usize]
    }
}

/// Scales raw counts to frequencies summing to [`SCALE`]. Every present
/// symbol keeps a frequency of at least 1; rounding drift lands on the most
/// frequent symbol.
fn normalize_frequencies(counts: &[u64; 256]) -> [u32; 256] {
    let mut freqs = [0u32; 256];
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return freqs;
    }

    let mut assigned: i64 = 0;
    let mut max_index = 0;
    for (index, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let freq = ((count * u64::from(SCALE)) / total).max(1) as u32;
        freqs[index] = freq;
        assigned += i64::from(freq);
        if freq > freqs[max_index] {
            max_index = index;
        }
    }

    let drift = i64::from(SCALE) - assigned;
    freqs[max_index] = (i64::from(freqs[max_index]) + drift).max(1) as u32;

    freqs
}

fn write_frequency_table<W: Write>(writer: &mut W, freqs: &[u32; 256]) -> io::Result<()> {
    let present = freqs.iter().filter(|&&freq| freq > 0).count() as u16;
    writer.write_u16::<BigEndian>(present)?;
    for (symbol, &freq) in freqs.iter().enumerate() {
        if freq > 0 {
            writer.write_u8(symbol as u8)?;
            writer.write_u16::<BigEndian>(freq as u16)?;
        }
    }

    Ok(())
}

fn max_encoded_size(len: usize) -> usize {
    len * 2 + 64
}

fn rans_compress_order_0(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut counts = [0u64; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }
    let freqs = normalize_frequencies(&counts);
    let model = RansByteModel::new(&freqs);

    let mut output = Vec::with_capacity(data.len() / 2 + 64);
    write_frequency_table(&mut output, &freqs)?;

    let mut encoder: ByteRansEncoderMulti<1> = ByteRansEncoderMulti::new(max_encoded_size(data.len()));
    // symbols go in back to front so a decoder reads them forward
    for &byte in data.iter().rev() {
        encoder.put(model.symbol(byte));
    }
    encoder.flush_all();
    output.extend_from_slice(encoder.data());

    Ok(output)
}

fn rans_compress_order_1(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut counts = vec![[0u64; 256]; 256];
    let mut context = 0usize;
    for &byte in data {
        counts[context][byte as usize] += 1;
        context = byte as usize;
    }

    let mut models: Vec<Option<RansByteModel>> = Vec::with_capacity(256);
    let mut output = Vec::with_capacity(data.len() / 2 + 64);

    let present_contexts = counts
        .iter()
        .filter(|row| row.iter().any(|&count| count > 0))
        .count() as u16;
    output.write_u16::<BigEndian>(present_contexts)?;

    for (context, row) in counts.iter().enumerate() {
        if row.iter().all(|&count| count == 0) {
            models.push(None);
            continue;
        }

        let freqs = normalize_frequencies(row);
        output.write_u8(context as u8)?;
        write_frequency_table(&mut output, &freqs)?;
        models.push(Some(RansByteModel::new(&freqs)));
    }

    let mut encoder: ByteRansEncoderMulti<1> = ByteRansEncoderMulti::new(max_encoded_size(data.len()));
    for index in (0..data.len()).rev() {
        let context = if index == 0 { 0 } else { data[index - 1] as usize };
        let model = models[context]
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing rANS context"))?;
        encoder.put(model.symbol(data[index]));
    }
    encoder.flush_all();
    output.extend_from_slice(encoder.data());

    Ok(output)
}

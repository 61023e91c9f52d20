//! Binary position file codec.
//!
//! Layout, little-endian with no padding:
//!
//! ```text
//! u64 count
//! count × { u64 title_len, title_len bytes, f32 x, f32 y, f32 z }
//! ```

use modeller_core::error::{PersistError, Result};
use modeller_core::types::Vec3;
use tracing::warn;

/// Name of the position file inside a save root.
pub const POSITIONS_FILE: &str = "physics.bin";

// Upper bound on pre-allocation so a bogus count cannot exhaust memory.
const MAX_PREALLOC: usize = 1024;

/// Encode `(title, position)` records in the given order.
pub fn encode_positions<'a, I>(records: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'a str, Vec3)>,
{
    let records: Vec<(&str, Vec3)> = records.into_iter().collect();
    let mut out = Vec::with_capacity(8 + records.len() * 24);

    out.extend_from_slice(&(records.len() as u64).to_le_bytes());
    for (title, position) in records {
        out.extend_from_slice(&(title.len() as u64).to_le_bytes());
        out.extend_from_slice(title.as_bytes());
        for component in [position.x, position.y, position.z] {
            out.extend_from_slice(&component.to_le_bytes());
        }
    }
    out
}

/// Decode every record in `bytes`, in file order.
///
/// Records whose title is not valid UTF-8 are skipped. Truncated input is an
/// error. Bytes after the last record are ignored.
pub fn decode_positions(bytes: &[u8]) -> Result<Vec<(String, Vec3)>> {
    let mut reader = Reader { bytes, offset: 0 };
    let count = reader.read_u64("record count")?;
    let mut records = Vec::with_capacity((count as usize).min(MAX_PREALLOC));

    for record in 0..count {
        let len = reader.read_u64("title length")?;
        let len = usize::try_from(len).map_err(|_| {
            PersistError::CorruptPositions(format!("record {record}: title length {len} is too large"))
        })?;
        let raw = reader.take(len, "title")?;
        let x = reader.read_f32("x")?;
        let y = reader.read_f32("y")?;
        let z = reader.read_f32("z")?;

        match std::str::from_utf8(raw) {
            Ok(title) => records.push((title.to_string(), Vec3::new(x, y, z))),
            Err(_) => warn!(record, "skipping position record with a non-UTF-8 title"),
        }
    }

    Ok(records)
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                PersistError::CorruptPositions(format!(
                    "unexpected end of data reading {what} at byte {}",
                    self.offset
                ))
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u64(&mut self, what: &str) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8, what)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_f32(&mut self, what: &str) -> Result<f32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4, what)?);
        Ok(f32::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeller_core::error::ModelError;

    #[test]
    fn layout_matches_the_file_format() {
        let bytes = encode_positions([("Ab", Vec3::new(1.0, 2.0, 3.0))]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&1u64.to_le_bytes());
        expected.extend_from_slice(&2u64.to_le_bytes());
        expected.extend_from_slice(b"Ab");
        expected.extend_from_slice(&1.0f32.to_le_bytes());
        expected.extend_from_slice(&2.0f32.to_le_bytes());
        expected.extend_from_slice(&3.0f32.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn empty_graph_encodes_only_the_count() {
        let bytes = encode_positions(std::iter::empty());
        assert_eq!(bytes, 0u64.to_le_bytes().to_vec());
        assert!(decode_positions(&bytes).unwrap().is_empty());
    }

    #[test]
    fn decode_keeps_file_order_and_unicode_titles() {
        let bytes = encode_positions([
            ("Zeta", Vec3::new(-1.5, 0.0, 9.25)),
            ("Ålesund", Vec3::new(4.0, 5.0, 6.0)),
        ]);
        let records = decode_positions(&bytes).unwrap();
        assert_eq!(records[0], ("Zeta".to_string(), Vec3::new(-1.5, 0.0, 9.25)));
        assert_eq!(records[1].0, "Ålesund");
    }

    #[test]
    fn truncated_data_is_corrupt() {
        let bytes = encode_positions([("Node", Vec3::new(1.0, 1.0, 1.0))]);
        for cut in [0, 7, 12, bytes.len() - 1] {
            let err = decode_positions(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, ModelError::Persist(PersistError::CorruptPositions(_))),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn huge_count_does_not_preallocate() {
        let bytes = u64::MAX.to_le_bytes();
        assert!(decode_positions(&bytes).is_err());
    }

    #[test]
    fn non_utf8_titles_are_skipped() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2u64.to_le_bytes());
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.push(0xFF);
        bytes.extend_from_slice(&[0u8; 12]);
        bytes.extend_from_slice(&1u64.to_le_bytes());
        bytes.push(b'A');
        bytes.extend_from_slice(&7.0f32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);

        let records = decode_positions(&bytes).unwrap();
        assert_eq!(records, vec![("A".to_string(), Vec3::new(7.0, 0.0, 0.0))]);
    }
}

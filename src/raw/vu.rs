use super::{RawVuFile, RawVuRecord, SignedSpan, UnmarshalOptions, VU_TRANSFER_SID};
use crate::dt::{Gen2Version, Generation};
use crate::error::{Error, Location, Result};

const GEN1_SIGNATURE_SIZE: usize = 128;

/// One element of a Generation 1 block descriptor: either a fixed-width
/// field group or a record list prefixed by its element count.
#[derive(Debug, Clone, Copy)]
enum Segment {
    Fixed(usize),
    Counted8(usize),
    Counted16(usize),
}

/// Static block layout per TREP, straight from the Generation 1 download
/// protocol. The framer only needs extents, not meaning.
fn gen1_block_descriptor(trep: u8) -> Option<&'static [Segment]> {
    use Segment::*;
    match trep {
        // Overview: certificates, vehicle identity, period, slots, download
        // activity, company locks, control activities.
        0x01 => Some(&[
            Fixed(194),
            Fixed(194),
            Fixed(17),
            Fixed(15),
            Fixed(4),
            Fixed(8),
            Fixed(1),
            Fixed(58),
            Counted8(98),
            Counted8(31),
        ]),
        // Activities: date, odometer, card IW, activity changes, places,
        // specific conditions.
        0x02 => Some(&[
            Fixed(4),
            Fixed(3),
            Counted16(129),
            Counted16(2),
            Counted8(28),
            Counted16(5),
        ]),
        // Events and faults: faults, events, overspeed control, overspeed
        // events, time adjustments.
        0x03 => Some(&[
            Counted8(82),
            Counted8(83),
            Fixed(9),
            Counted8(31),
            Counted8(98),
        ]),
        // Detailed speed.
        0x04 => Some(&[Counted16(64)]),
        // Technical data: identification, sensor, calibrations.
        0x05 => Some(&[Fixed(116), Fixed(20), Counted8(167)]),
        _ => None,
    }
}

fn truncated(index: usize, offset: usize, detail: String) -> Error {
    Error::Truncated {
        location: Location {
            record_index: Some(index),
            byte_offset: Some(offset as u64),
            ..Default::default()
        },
        detail,
    }
}

/// Walks one Generation 1 block body, returning the total value length and
/// the signed span (the data bytes and the trailing RSA signature).
fn walk_gen1(bytes: &[u8], index: usize) -> Result<(usize, Vec<SignedSpan>)> {
    let trep = bytes[1];
    let descriptor = gen1_block_descriptor(trep).ok_or(Error::UnknownTag {
        file_id: trep as u16,
        record_index: index,
    })?;

    let body = &bytes[2..];
    let mut offset = 0usize;
    for segment in descriptor {
        let needed = match *segment {
            Segment::Fixed(size) => size,
            Segment::Counted8(record_size) => {
                let count = *body.get(offset).ok_or_else(|| {
                    truncated(index, offset, "count byte missing".into())
                })? as usize;
                1 + count * record_size
            }
            Segment::Counted16(record_size) => {
                if body.len() - offset < 2 {
                    return Err(truncated(index, offset, "count word missing".into()));
                }
                let count =
                    u16::from_be_bytes([body[offset], body[offset + 1]]) as usize;
                2 + count * record_size
            }
        };
        if body.len() - offset < needed {
            return Err(truncated(
                index,
                offset,
                format!("segment needs {} bytes, {} remain", needed, body.len() - offset),
            ));
        }
        offset += needed;
    }

    let remaining = body.len() - offset;
    let signed_sections = if remaining >= GEN1_SIGNATURE_SIZE {
        let span = SignedSpan {
            data_start: 0,
            data_end: offset,
            signature_start: offset,
            signature_end: offset + GEN1_SIGNATURE_SIZE,
        };
        offset += GEN1_SIGNATURE_SIZE;
        vec![span]
    } else if remaining == 0 {
        log::warn!("Gen1 VU block {:#04x} carries no signature", trep);
        Vec::new()
    } else {
        return Err(truncated(
            index,
            offset,
            format!("{} bytes is neither a signature nor a block boundary", remaining),
        ));
    };

    Ok((offset, signed_sections))
}

/// Walks one Generation 2 block body: record arrays
/// `type (1) | record size (2) | count (2)` up to and including the
/// signature record array that closes the block.
fn walk_gen2(bytes: &[u8], index: usize) -> Result<(usize, Vec<SignedSpan>)> {
    const SIGNATURE_RECORD_TYPE: u8 = 0x08;
    const ARRAY_HEADER_SIZE: usize = 5;

    let body = &bytes[2..];
    let mut offset = 0usize;
    let mut signed_sections = Vec::new();

    while offset < body.len() {
        if body.len() - offset < ARRAY_HEADER_SIZE {
            return Err(truncated(index, offset, "record array header missing".into()));
        }
        let record_type = body[offset];
        let record_size =
            u16::from_be_bytes([body[offset + 1], body[offset + 2]]) as usize;
        let count = u16::from_be_bytes([body[offset + 3], body[offset + 4]]) as usize;
        let payload = record_size
            .checked_mul(count)
            .ok_or_else(|| truncated(index, offset, "record array overflows".into()))?;
        if body.len() - offset - ARRAY_HEADER_SIZE < payload {
            return Err(truncated(
                index,
                offset,
                format!(
                    "record array needs {} bytes, {} remain",
                    payload,
                    body.len() - offset - ARRAY_HEADER_SIZE
                ),
            ));
        }
        let payload_start = offset + ARRAY_HEADER_SIZE;
        let payload_end = payload_start + payload;
        if record_type == SIGNATURE_RECORD_TYPE {
            signed_sections.push(SignedSpan {
                data_start: 0,
                data_end: offset,
                signature_start: payload_start,
                signature_end: payload_end,
            });
            // The signature array closes the transfer block.
            return Ok((payload_end, signed_sections));
        }
        offset = payload_end;
    }

    log::warn!("Gen2 VU block ended without a signature record array");
    Ok((offset, signed_sections))
}

fn classify_trep(trep: u8) -> Option<(Generation, Gen2Version)> {
    match trep {
        0x01..=0x05 => Some((Generation::Gen1, Gen2Version::V1)),
        0x21..=0x25 => Some((Generation::Gen2, Gen2Version::V1)),
        0x31..=0x35 => Some((Generation::Gen2, Gen2Version::V2)),
        _ => None,
    }
}

/// Frames a VU download: a sequence of `0x76 <trep>` transfer blocks whose
/// extents come from the per-generation block descriptors.
pub fn unmarshal_vu(bytes: &[u8], options: &UnmarshalOptions) -> Result<RawVuFile> {
    let mut records = Vec::new();
    let mut offset = 0usize;
    let mut index = 0usize;

    while offset < bytes.len() {
        if bytes.len() - offset < 2 {
            return Err(truncated(index, offset, "transfer header missing".into()));
        }
        let sid = bytes[offset];
        let trep = bytes[offset + 1];
        if sid != VU_TRANSFER_SID {
            return Err(Error::Other(anyhow::anyhow!(
                "expected transfer SID {:#04x} at offset {}, found {:#04x}",
                VU_TRANSFER_SID,
                offset,
                sid
            )));
        }
        let (generation, version) = classify_trep(trep).ok_or(Error::UnknownTag {
            file_id: trep as u16,
            record_index: index,
        })?;
        log::debug!(
            "Framing VU block {} with TREP {:#04x} ({:?} {:?})",
            index,
            trep,
            generation,
            version
        );

        let window = &bytes[offset..];
        let (value_len, signed_sections) = match generation {
            Generation::Gen1 => walk_gen1(window, index)?,
            Generation::Gen2 => walk_gen2(window, index)?,
        };
        let value = window[2..2 + value_len].to_vec();
        records.push(RawVuRecord {
            trep,
            generation,
            version,
            value,
            signed_sections,
            authentication: None,
        });
        offset += 2 + value_len;
        index += 1;
    }

    Ok(RawVuFile {
        records,
        preserve_raw_data: options.preserve_raw_data,
    })
}

/// Re-emits the framed transfer blocks byte-for-byte.
pub fn marshal_raw_vu(file: &RawVuFile) -> Vec<u8> {
    let mut out = Vec::new();
    for record in &file.records {
        out.push(VU_TRANSFER_SID);
        out.push(record.trep);
        out.extend_from_slice(&record.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_gen1_overview() -> Vec<u8> {
        let mut bytes = vec![0x76, 0x01];
        bytes.extend_from_slice(&[0xAA; 194]); // member state certificate
        bytes.extend_from_slice(&[0xBB; 194]); // vu certificate
        bytes.extend_from_slice(&[b'V'; 17]); // vin
        bytes.extend_from_slice(&[0x12; 15]); // registration
        bytes.extend_from_slice(&1_600_000_000u32.to_be_bytes());
        bytes.extend_from_slice(&[0; 8]); // downloadable period
        bytes.push(0x11); // card slots status
        bytes.extend_from_slice(&[0x20; 58]); // download activity
        bytes.push(0); // no company locks
        bytes.push(0); // no control activities
        bytes.extend_from_slice(&[0xC3; 128]); // signature
        bytes
    }

    #[test]
    fn walks_gen1_overview_with_counts() {
        let bytes = minimal_gen1_overview();
        let file = unmarshal_vu(&bytes, &UnmarshalOptions::default()).unwrap();
        assert_eq!(file.records.len(), 1);
        let record = &file.records[0];
        assert_eq!(record.generation, Generation::Gen1);
        assert_eq!(record.signed_sections.len(), 1);
        let span = &record.signed_sections[0];
        assert_eq!(span.data_start, 0);
        assert_eq!(span.signature_end - span.signature_start, 128);
        assert_eq!(&record.value[span.signature_start..span.signature_end], &[0xC3; 128]);
        assert_eq!(marshal_raw_vu(&file), bytes);
    }

    #[test]
    fn walks_gen2_record_arrays_to_signature() {
        let mut bytes = vec![0x76, 0x21];
        // One 4-byte CurrentDateTime record.
        bytes.push(0x03);
        bytes.extend_from_slice(&4u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&1_600_000_000u32.to_be_bytes());
        // Signature array with one 64-byte record.
        bytes.push(0x08);
        bytes.extend_from_slice(&64u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&[0x5A; 64]);

        let file = unmarshal_vu(&bytes, &UnmarshalOptions::default()).unwrap();
        let record = &file.records[0];
        assert_eq!(record.generation, Generation::Gen2);
        assert_eq!(record.version, Gen2Version::V1);
        assert_eq!(record.signed_sections.len(), 1);
        let span = &record.signed_sections[0];
        assert_eq!(span.data_start, 0);
        assert_eq!(span.data_end, 9);
        assert_eq!(span.signature_end - span.signature_start, 64);
        assert_eq!(marshal_raw_vu(&file), bytes);
    }

    #[test]
    fn unknown_trep_is_rejected() {
        let bytes = vec![0x76, 0x42, 0, 0];
        assert!(matches!(
            unmarshal_vu(&bytes, &UnmarshalOptions::default()),
            Err(Error::UnknownTag { file_id: 0x42, .. })
        ));
    }

    #[test]
    fn truncated_gen1_block_is_rejected() {
        let mut bytes = minimal_gen1_overview();
        bytes.truncate(300);
        assert!(matches!(
            unmarshal_vu(&bytes, &UnmarshalOptions::default()),
            Err(Error::Truncated { .. })
        ));
    }
}

use super::{
    CardFileKind, ContentType, RawCardFile, RawCardRecord, UnmarshalOptions,
};
use crate::dt::Generation;
use crate::error::{Error, Location, Result};

const RECORD_HEADER_SIZE: usize = 5;

fn split_appendix(appendix: u8) -> (ContentType, Generation) {
    let content_type = if appendix & 0x01 == 0 {
        ContentType::Data
    } else {
        ContentType::Signature
    };
    let generation = if appendix & 0x02 == 0 {
        Generation::Gen1
    } else {
        Generation::Gen2
    };
    (content_type, generation)
}

/// Frames a card download: a flat sequence of
/// `file_id (2 BE) | appendix (1) | length (2 BE) | value` records.
pub fn unmarshal_card(bytes: &[u8], options: &UnmarshalOptions) -> Result<RawCardFile> {
    let mut records = Vec::new();
    let mut offset = 0usize;
    let mut index = 0usize;

    while offset < bytes.len() {
        if bytes.len() - offset < RECORD_HEADER_SIZE {
            return Err(Error::Truncated {
                location: Location {
                    record_index: Some(index),
                    byte_offset: Some(offset as u64),
                    ..Default::default()
                },
                detail: format!(
                    "{} trailing bytes cannot hold a record header",
                    bytes.len() - offset
                ),
            });
        }
        let file_id = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);
        let appendix = bytes[offset + 2];
        let length = u16::from_be_bytes([bytes[offset + 3], bytes[offset + 4]]) as usize;
        let value_start = offset + RECORD_HEADER_SIZE;
        if bytes.len() - value_start < length {
            return Err(Error::Truncated {
                location: Location {
                    file_id: Some(file_id),
                    record_index: Some(index),
                    byte_offset: Some(value_start as u64),
                },
                detail: format!(
                    "record declares {} bytes but only {} remain",
                    length,
                    bytes.len() - value_start
                ),
            });
        }
        let value = bytes[value_start..value_start + length].to_vec();
        let (content_type, generation) = split_appendix(appendix);
        let kind = CardFileKind::from_file_id(file_id);
        if kind == CardFileKind::Unknown {
            if options.strict {
                return Err(Error::UnknownTag {
                    file_id,
                    record_index: index,
                });
            }
            log::warn!(
                "Unknown file id {:#06x} at record {}, carrying verbatim",
                file_id,
                index
            );
        }
        log::debug!(
            "Framed card record {}: file id {:#06x} appendix {:#04x} ({} bytes)",
            index,
            file_id,
            appendix,
            length
        );

        if content_type == ContentType::Signature {
            // A signature record is only well-formed directly after its data
            // record; the appendix bit is authoritative, adjacency alone is
            // not enough.
            let paired = records.last().map(|previous: &RawCardRecord| {
                previous.content_type == ContentType::Data
                    && previous.file_id == file_id
                    && previous.generation == generation
            });
            if paired != Some(true) {
                return Err(Error::DanglingSignature {
                    location: Location::file_record(file_id, index),
                });
            }
        }

        records.push(RawCardRecord {
            file_id,
            appendix,
            content_type,
            generation,
            kind,
            value,
            authentication: None,
        });
        offset = value_start + length;
        index += 1;
    }

    Ok(RawCardFile {
        records,
        preserve_raw_data: options.preserve_raw_data,
    })
}

/// Re-emits the framed records byte-for-byte.
pub fn marshal_raw_card(file: &RawCardFile) -> Vec<u8> {
    let mut out = Vec::new();
    for record in &file.records {
        out.extend_from_slice(&record.file_id.to_be_bytes());
        out.push(record.appendix);
        out.extend_from_slice(&(record.value.len() as u16).to_be_bytes());
        out.extend_from_slice(&record.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file_id: u16, appendix: u8, value: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&file_id.to_be_bytes());
        bytes.push(appendix);
        bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        bytes.extend_from_slice(value);
        bytes
    }

    #[test]
    fn frames_data_and_signature_pairs() {
        let mut bytes = record(0x0002, 0x00, &[1; 25]);
        bytes.extend_from_slice(&record(0x0502, 0x00, &[2; 50]));
        bytes.extend_from_slice(&record(0x0502, 0x01, &[3; 128]));

        let file = unmarshal_card(&bytes, &UnmarshalOptions::default()).unwrap();
        assert_eq!(file.records.len(), 3);
        assert_eq!(file.records[0].kind, CardFileKind::Icc);
        assert!(!file.records[0].is_signature());
        assert!(file.records[2].is_signature());
        assert_eq!(file.records[2].generation, Generation::Gen1);
        assert_eq!(marshal_raw_card(&file), bytes);
    }

    #[test]
    fn gen2_appendix_bit_selects_generation() {
        let bytes = record(0x0521, 0x02, &[0; 53]);
        let file = unmarshal_card(&bytes, &UnmarshalOptions::default()).unwrap();
        assert_eq!(file.records[0].generation, Generation::Gen2);
        assert_eq!(file.records[0].content_type, ContentType::Data);
    }

    #[test]
    fn dangling_signature_is_a_framing_error() {
        // Signature with no preceding data record.
        let bytes = record(0x0502, 0x01, &[0; 128]);
        let result = unmarshal_card(&bytes, &UnmarshalOptions::default());
        assert!(matches!(result, Err(Error::DanglingSignature { .. })));

        // Signature following a mismatched file id.
        let mut bytes = record(0x0502, 0x00, &[0; 24]);
        bytes.extend_from_slice(&record(0x0503, 0x01, &[0; 128]));
        let result = unmarshal_card(&bytes, &UnmarshalOptions::default());
        assert!(matches!(result, Err(Error::DanglingSignature { .. })));
    }

    #[test]
    fn unknown_tag_respects_strictness() {
        let bytes = record(0xFFFE, 0x00, &[9; 4]);
        let strict = UnmarshalOptions {
            strict: true,
            ..Default::default()
        };
        assert!(matches!(
            unmarshal_card(&bytes, &strict),
            Err(Error::UnknownTag { file_id: 0xFFFE, .. })
        ));

        let lenient = unmarshal_card(&bytes, &UnmarshalOptions::default()).unwrap();
        assert_eq!(lenient.records[0].kind, CardFileKind::Unknown);
        assert_eq!(marshal_raw_card(&lenient), bytes);
    }

    #[test]
    fn truncated_value_is_rejected() {
        let mut bytes = record(0x0002, 0x00, &[1; 25]);
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            unmarshal_card(&bytes, &UnmarshalOptions::default()),
            Err(Error::Truncated { .. })
        ));
    }
}

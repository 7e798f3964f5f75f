use anyhow::{Context, Result};
use std::fmt::Display;

/// Sniffed shape of a .DDD file, from its leading bytes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DddFileType {
    DriverCardGen1,
    DriverCardGen2,
    VehicleUnitGen1,
    VehicleUnitGen2,
    VehicleUnitGen2V2,
}

impl Display for DddFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DddFileType::DriverCardGen1 => write!(f, "Driver Card Gen1"),
            DddFileType::DriverCardGen2 => write!(f, "Driver Card Gen2"),
            DddFileType::VehicleUnitGen1 => write!(f, "Vehicle Unit Gen1"),
            DddFileType::VehicleUnitGen2 => write!(f, "Vehicle Unit Gen2"),
            DddFileType::VehicleUnitGen2V2 => write!(f, "Vehicle Unit Gen2V2"),
        }
    }
}

/// Walks card record headers without copying values, looking for any record
/// framed with the Gen2 appendix bit.
fn card_has_gen2_records(bytes: &[u8]) -> bool {
    let mut offset = 0usize;
    while bytes.len() - offset >= 5 {
        let appendix = bytes[offset + 2];
        if appendix & 0x02 != 0 {
            return true;
        }
        let length = u16::from_be_bytes([bytes[offset + 3], bytes[offset + 4]]) as usize;
        offset += 5 + length;
        if offset > bytes.len() {
            return false;
        }
    }
    false
}

pub fn detect_from_bytes(bytes: &[u8]) -> Result<DddFileType> {
    if bytes.len() < 2 {
        anyhow::bail!("file of {} bytes is not a tachograph download", bytes.len());
    }
    match [bytes[0], bytes[1]] {
        // Vehicle unit files start with the transfer SID; the TREP range
        // identifies the dialect.
        [0x76, trep] => match trep {
            0x01..=0x05 => Ok(DddFileType::VehicleUnitGen1),
            0x21..=0x25 => Ok(DddFileType::VehicleUnitGen2),
            0x31..=0x35 => Ok(DddFileType::VehicleUnitGen2V2),
            other => anyhow::bail!("unsupported vehicle unit TREP {:#04x}", other),
        },
        // Card files start with the EF_ICC file id.
        [0x00, 0x02] => {
            if card_has_gen2_records(bytes) {
                Ok(DddFileType::DriverCardGen2)
            } else {
                Ok(DddFileType::DriverCardGen1)
            }
        }
        [first, second] => anyhow::bail!(
            "unsupported tachograph file, leading bytes {:#04x} {:#04x}",
            first,
            second
        ),
    }
}

pub fn detect_from_file(file_path: &str) -> Result<DddFileType> {
    let bytes = std::fs::read(file_path).context("Failed to read file")?;
    detect_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_vu_dialects() {
        assert_eq!(
            detect_from_bytes(&[0x76, 0x01]).unwrap(),
            DddFileType::VehicleUnitGen1
        );
        assert_eq!(
            detect_from_bytes(&[0x76, 0x22]).unwrap(),
            DddFileType::VehicleUnitGen2
        );
        assert_eq!(
            detect_from_bytes(&[0x76, 0x31]).unwrap(),
            DddFileType::VehicleUnitGen2V2
        );
        assert!(detect_from_bytes(&[0x76, 0x42]).is_err());
    }

    #[test]
    fn detects_card_generation_from_appendix_bits() {
        // EF_ICC record only: Gen1.
        let mut gen1 = vec![0x00, 0x02, 0x00, 0x00, 0x02, 0xAA, 0xBB];
        assert_eq!(
            detect_from_bytes(&gen1).unwrap(),
            DddFileType::DriverCardGen1
        );

        // Append a record with the Gen2 appendix bit.
        gen1.extend_from_slice(&[0x05, 0x01, 0x02, 0x00, 0x01, 0xCC]);
        assert_eq!(
            detect_from_bytes(&gen1).unwrap(),
            DddFileType::DriverCardGen2
        );
    }

    #[test]
    fn rejects_foreign_files() {
        assert!(detect_from_bytes(&[0x50, 0x4B]).is_err());
        assert!(detect_from_bytes(&[0x00]).is_err());
    }
}

use crate::dt::{gen1, gen2, Gen2Version, Generation};
use crate::error::{Error, Location, Result};
use crate::raw::{RawVuFile, UnmarshalOptions};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// One Generation 1 transfer block, selected by TREP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VuBlockGen1 {
    Overview(gen1::VuOverviewBlock),
    Activities(gen1::VuActivitiesBlock),
    EventsAndFaults(gen1::VuEventsAndFaultsBlock),
    DetailedSpeed(gen1::VuDetailedSpeedData),
    TechnicalData(gen1::VuTechnicalDataBlock),
}

impl VuBlockGen1 {
    pub fn trep(&self) -> u8 {
        match self {
            Self::Overview(_) => 0x01,
            Self::Activities(_) => 0x02,
            Self::EventsAndFaults(_) => 0x03,
            Self::DetailedSpeed(_) => 0x04,
            Self::TechnicalData(_) => 0x05,
        }
    }

    pub fn signature(&self) -> Option<&[u8]> {
        match self {
            Self::Overview(block) => block.signature.as_deref(),
            Self::Activities(block) => block.signature.as_deref(),
            Self::EventsAndFaults(block) => block.signature.as_deref(),
            Self::DetailedSpeed(block) => block.signature.as_deref(),
            Self::TechnicalData(block) => block.signature.as_deref(),
        }
    }

    pub fn clear_signature(&mut self) {
        match self {
            Self::Overview(block) => block.signature = None,
            Self::Activities(block) => block.signature = None,
            Self::EventsAndFaults(block) => block.signature = None,
            Self::DetailedSpeed(block) => block.signature = None,
            Self::TechnicalData(block) => block.signature = None,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) -> anyhow::Result<()> {
        match self {
            Self::Overview(block) => block.encode(out),
            Self::Activities(block) => block.encode(out),
            Self::EventsAndFaults(block) => block.encode(out),
            Self::DetailedSpeed(block) => block.encode(out),
            Self::TechnicalData(block) => block.encode(out),
        }
    }
}

/// One Generation 2 transfer block: its TREP and the record arrays in file
/// order, signature arrays included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuBlockGen2 {
    pub trep: u8,
    pub version: Gen2Version,
    pub record_arrays: Vec<gen2::VuRecordArray>,
}

impl VuBlockGen2 {
    pub fn clear_signatures(&mut self) {
        self.record_arrays.retain(|array| !array.is_signature());
    }
}

/// One transfer block of either dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VuTransfer {
    Gen1(VuBlockGen1),
    Gen2(VuBlockGen2),
}

/// Semantic view of a vehicle unit download: the transfer blocks in download
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUnitFile {
    pub transfers: Vec<VuTransfer>,
}

/// Builds the semantic VU model from framed transfer blocks.
pub fn parse_vu(raw: &RawVuFile) -> Result<VehicleUnitFile> {
    let mut transfers = Vec::with_capacity(raw.records.len());
    for (index, record) in raw.records.iter().enumerate() {
        let mut cursor = Cursor::new(record.value.as_slice());
        let transfer = match record.generation {
            Generation::Gen1 => {
                let block = match record.trep {
                    0x01 => gen1::VuOverviewBlock::parse(&mut cursor).map(VuBlockGen1::Overview),
                    0x02 => {
                        gen1::VuActivitiesBlock::parse(&mut cursor).map(VuBlockGen1::Activities)
                    }
                    0x03 => gen1::VuEventsAndFaultsBlock::parse(&mut cursor)
                        .map(VuBlockGen1::EventsAndFaults),
                    0x04 => gen1::VuDetailedSpeedData::parse(&mut cursor)
                        .map(VuBlockGen1::DetailedSpeed),
                    0x05 => gen1::VuTechnicalDataBlock::parse(&mut cursor)
                        .map(VuBlockGen1::TechnicalData),
                    other => Err(anyhow::anyhow!("unsupported Gen1 TREP {:#04x}", other)),
                };
                VuTransfer::Gen1(block.map_err(|source| Error::EfDecode {
                    ef: "VU transfer block",
                    location: Location {
                        file_id: Some(record.trep as u16),
                        record_index: Some(index),
                        byte_offset: Some(cursor.position()),
                    },
                    source,
                })?)
            }
            Generation::Gen2 => {
                let mut record_arrays = Vec::new();
                while (cursor.position() as usize) < record.value.len() {
                    let array =
                        gen2::VuRecordArray::parse(&mut cursor).map_err(|source| {
                            Error::EfDecode {
                                ef: "VU record array",
                                location: Location {
                                    file_id: Some(record.trep as u16),
                                    record_index: Some(index),
                                    byte_offset: Some(cursor.position()),
                                },
                                source,
                            }
                        })?;
                    record_arrays.push(array);
                }
                VuTransfer::Gen2(VuBlockGen2 {
                    trep: record.trep,
                    version: record.version,
                    record_arrays,
                })
            }
        };
        transfers.push(transfer);
    }
    Ok(VehicleUnitFile { transfers })
}

/// Rebuilds the framed view from the semantic model. Block bytes are encoded
/// and then re-framed through the block walkers, so signed spans always match
/// what a fresh unmarshal would produce.
pub fn unparse_vu(file: &VehicleUnitFile) -> Result<RawVuFile> {
    let options = UnmarshalOptions {
        preserve_raw_data: true,
        ..Default::default()
    };
    crate::raw::unmarshal_vu(&marshal_vu(file)?, &options)
}

/// Serializes the semantic model back to a .DDD byte stream.
pub fn marshal_vu(file: &VehicleUnitFile) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for transfer in &file.transfers {
        out.push(crate::raw::VU_TRANSFER_SID);
        match transfer {
            VuTransfer::Gen1(block) => {
                out.push(block.trep());
                block.encode(&mut out).map_err(|source| Error::EfEncode {
                    ef: "VU transfer block",
                    source,
                })?;
            }
            VuTransfer::Gen2(block) => {
                out.push(block.trep);
                for array in &block.record_arrays {
                    array.encode(&mut out).map_err(|source| Error::EfEncode {
                        ef: "VU record array",
                        source,
                    })?;
                }
            }
        }
    }
    Ok(out)
}

/// Clears all signatures; used after anonymization.
pub fn clear_signatures(file: &mut VehicleUnitFile) {
    for transfer in &mut file.transfers {
        match transfer {
            VuTransfer::Gen1(block) => block.clear_signature(),
            VuTransfer::Gen2(block) => block.clear_signatures(),
        }
    }
}

pub mod external;
pub mod gen1;
pub mod gen2;

use crate::bytes::{read_bcd, write_bcd, write_u16_be, write_u32_be, TakeExact};
use anyhow::{Context, Result};
use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};

/// Wire dialect of a framed record, recovered from the tag appendix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Generation {
    Gen1,
    Gen2,
}

/// Version split of the Generation 2 VU dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gen2Version {
    V1,
    V2,
}

/// [TimeReal: appendix 2.162.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e24993)
///
/// Big-endian seconds since 1970-01-01 UTC. The wire value 0 means "not set"
/// and must never resurface as 1970-01-01; it decodes to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeReal(pub Option<DateTime<Utc>>);

impl TimeReal {
    pub const SIZE: usize = 4;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let unix_timestamp = cursor
            .read_u32::<BigEndian>()
            .context("Failed to read TimeReal")?;
        if unix_timestamp == 0 {
            return Ok(TimeReal(None));
        }
        let dt = DateTime::from_timestamp(unix_timestamp as i64, 0)
            .context("Failed to create DateTime from unix timestamp")?;
        Ok(TimeReal(Some(dt)))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let seconds = match self.0 {
            None => 0,
            Some(dt) => {
                let seconds = dt.timestamp();
                if seconds < 1 || seconds > u32::MAX as i64 {
                    anyhow::bail!("TimeReal {} outside the unsigned 32-bit range", dt);
                }
                seconds as u32
            }
        };
        write_u32_be(out, seconds);
        Ok(())
    }

    pub fn from_timestamp(seconds: i64) -> Self {
        TimeReal(DateTime::from_timestamp(seconds, 0))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

/// [Datef: appendix 2.63.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e20100)
///
/// BCD yyyymmdd. Month 0 or day 0 marks an unset date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datef {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Datef {
    pub const SIZE: usize = 4;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let year = read_bcd(cursor, 2).context("Failed to parse year")? as u16;
        let month = read_bcd(cursor, 1).context("Failed to parse month")? as u8;
        let day = read_bcd(cursor, 1).context("Failed to parse day")? as u8;
        Ok(Datef { year, month, day })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_bcd(out, self.year as u32, 2)?;
        write_bcd(out, self.month as u32, 1)?;
        write_bcd(out, self.day as u32, 1)?;
        Ok(())
    }

    pub fn is_unset(&self) -> bool {
        self.month == 0 || self.day == 0
    }
}

/// BCD mmyy as used inside extended serial numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthYear {
    pub month: u8,
    pub year: u8,
}

impl MonthYear {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let month = read_bcd(cursor, 1).context("Failed to parse month")? as u8;
        let year = read_bcd(cursor, 1).context("Failed to parse year")? as u8;
        Ok(MonthYear { month, year })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_bcd(out, self.month as u32, 1)?;
        write_bcd(out, self.year as u32, 1)?;
        Ok(())
    }
}

/// [IA5String: appendix 2.7.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e16562)
///
/// 7-bit ASCII in a fixed window, right-padded with 0x20. The original window
/// is retained so an untouched value re-emits byte-identically even when the
/// card padded with something other than spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IA5String {
    pub value: String,
    pub length: usize,
    #[serde(skip)]
    raw: Option<Vec<u8>>,
}

impl IA5String {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Self> {
        let mut buffer = vec![0u8; size];
        cursor
            .read_exact(&mut buffer)
            .context("Failed to read IA5String")?;
        let value = String::from_utf8_lossy(&buffer)
            .trim_end_matches(&[' ', '\0'][..])
            .to_string();
        Ok(IA5String {
            value,
            length: size,
            raw: Some(buffer),
        })
    }

    pub fn new(value: impl Into<String>, length: usize) -> Self {
        IA5String {
            value: value.into(),
            length,
            raw: None,
        }
    }

    /// Replaces the value and drops the original window, so the next encode
    /// re-renders from the new text.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.raw = None;
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        if let Some(raw) = &self.raw {
            let unchanged = String::from_utf8_lossy(raw).trim_end_matches(&[' ', '\0'][..]) == self.value;
            if unchanged {
                out.extend_from_slice(raw);
                return Ok(());
            }
        }
        if !self.value.is_ascii() || self.value.len() > self.length {
            anyhow::bail!(
                "string {:?} cannot be encoded as IA5 in {} bytes",
                self.value,
                self.length
            );
        }
        out.extend_from_slice(self.value.as_bytes());
        out.resize(out.len() + self.length - self.value.len(), 0x20);
        Ok(())
    }
}

fn decode_code_page(buffer: &[u8], code_page: u8) -> String {
    let value = match code_page {
        1 => textcode::iso8859_1::decode_to_string(buffer),
        2 => textcode::iso8859_2::decode_to_string(buffer),
        3 => textcode::iso8859_3::decode_to_string(buffer),
        4 => textcode::iso8859_4::decode_to_string(buffer),
        5 => textcode::iso8859_5::decode_to_string(buffer),
        6 => textcode::iso8859_6::decode_to_string(buffer),
        7 => textcode::iso8859_7::decode_to_string(buffer),
        8 => textcode::iso8859_8::decode_to_string(buffer),
        9 => textcode::iso8859_9::decode_to_string(buffer),
        13 => textcode::iso8859_13::decode_to_string(buffer),
        14 => textcode::iso8859_14::decode_to_string(buffer),
        15 => textcode::iso8859_15::decode_to_string(buffer),
        16 => textcode::iso8859_16::decode_to_string(buffer),
        80 => encoding_rs::KOI8_U.decode(buffer).0.to_string(),
        85 => encoding_rs::KOI8_R.decode(buffer).0.to_string(),
        _ => String::from_utf8_lossy(buffer).to_string(),
    };
    value.trim_end_matches(&[' ', '\0'][..]).to_string()
}

fn encode_code_page(value: &str, code_page: u8) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(value.len());
    match code_page {
        1 => textcode::iso8859_1::encode(value, &mut out),
        2 => textcode::iso8859_2::encode(value, &mut out),
        3 => textcode::iso8859_3::encode(value, &mut out),
        4 => textcode::iso8859_4::encode(value, &mut out),
        5 => textcode::iso8859_5::encode(value, &mut out),
        6 => textcode::iso8859_6::encode(value, &mut out),
        7 => textcode::iso8859_7::encode(value, &mut out),
        8 => textcode::iso8859_8::encode(value, &mut out),
        9 => textcode::iso8859_9::encode(value, &mut out),
        13 => textcode::iso8859_13::encode(value, &mut out),
        14 => textcode::iso8859_14::encode(value, &mut out),
        15 => textcode::iso8859_15::encode(value, &mut out),
        16 => textcode::iso8859_16::encode(value, &mut out),
        80 => out = encoding_rs::KOI8_U.encode(value).0.into_owned(),
        85 => out = encoding_rs::KOI8_R.encode(value).0.into_owned(),
        _ => {
            if !value.is_ascii() {
                return None;
            }
            out.extend_from_slice(value.as_bytes());
        }
    }
    // A lossless encoding must survive the trip back.
    if decode_code_page(&out, code_page) != value.trim_end_matches(&[' ', '\0'][..]) {
        return None;
    }
    Some(out)
}

/// A string field prefixed by a one-byte code page selecting an ISO-8859
/// variant. The payload window length is fixed by the enclosing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodePageString {
    pub code_page: u8,
    pub value: String,
    pub length: usize,
    #[serde(skip)]
    raw: Option<Vec<u8>>,
}

impl CodePageString {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, payload_size: usize) -> Result<Self> {
        let code_page = cursor.read_u8().context("Failed to read code page")?;
        let mut buffer = vec![0u8; payload_size];
        cursor
            .read_exact(&mut buffer)
            .context("Failed to read string payload")?;
        let value = decode_code_page(&buffer, code_page);
        Ok(CodePageString {
            code_page,
            value,
            length: payload_size,
            raw: Some(buffer),
        })
    }

    pub fn new(value: impl Into<String>, length: usize) -> Self {
        CodePageString {
            code_page: 0x01,
            value: value.into(),
            length,
            raw: None,
        }
    }

    /// Replaces the value, keeping the code page byte, and drops the
    /// original window so the next encode re-renders from the new text.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.raw = None;
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code_page);
        if let Some(raw) = &self.raw {
            if decode_code_page(raw, self.code_page) == self.value {
                out.extend_from_slice(raw);
                return Ok(());
            }
        }
        let encoded = encode_code_page(&self.value, self.code_page).ok_or_else(|| {
            crate::error::Error::EncodingLoss {
                code_page: self.code_page,
                value: self.value.clone(),
            }
        })?;
        if encoded.len() > self.length {
            anyhow::bail!(
                "string {:?} exceeds its {}-byte window",
                self.value,
                self.length
            );
        }
        out.extend_from_slice(&encoded);
        out.resize(out.len() + self.length - encoded.len(), 0x20);
        Ok(())
    }
}

/// [Name: appendix 2.99.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e22398)
pub type Name = CodePageString;
/// [Address: appendix 2.2.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e16375)
pub type Address = CodePageString;

pub const NAME_PAYLOAD: usize = 35;
pub const NAME_SIZE: usize = 1 + NAME_PAYLOAD;

pub fn parse_name(cursor: &mut Cursor<&[u8]>) -> Result<Name> {
    CodePageString::parse_dyn_size(cursor, NAME_PAYLOAD)
}

/// [HolderName: appendix 2.83.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e21860)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderName {
    pub holder_surname: Name,
    pub holder_first_names: Name,
}

impl HolderName {
    pub const SIZE: usize = 2 * NAME_SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(HolderName {
            holder_surname: parse_name(cursor)?,
            holder_first_names: parse_name(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.holder_surname.encode(out)?;
        self.holder_first_names.encode(out)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language(pub IA5String);

impl Language {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(Language(IA5String::parse_dyn_size(cursor, 2)?))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(out)
    }
}

/// [OdometerShort: appendix 2.113.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e22854)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdometerShort(pub u32);

impl OdometerShort {
    pub const SIZE: usize = 3;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut km_buffer = [0u8; 3];
        cursor
            .read_exact(&mut km_buffer)
            .context("Failed to read odometer value")?;
        let km = u32::from_be_bytes([0, km_buffer[0], km_buffer[1], km_buffer[2]]);
        Ok(OdometerShort(km))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        if self.0 >= 1 << 24 {
            anyhow::bail!("odometer value {} does not fit in 3 bytes", self.0);
        }
        out.extend_from_slice(&self.0.to_be_bytes()[1..]);
        Ok(())
    }
}

/// [OdometerValueMidnight: appendix 2.114.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e22880)
pub type OdometerValueMidnight = OdometerShort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distance(pub u16);

impl Distance {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read distance")?;
        Ok(Distance(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u16_be(out, self.0);
        Ok(())
    }
}

/// [Speed: appendix 2.155.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e24822)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speed(pub u8);

impl Speed {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor.read_u8().context("Failed to read value for Speed")?;
        Ok(Speed(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.0);
        Ok(())
    }
}

pub type SpeedAuthorised = Speed;
pub type SpeedAverage = Speed;
pub type SpeedMax = Speed;

/// Two-byte packed BCD counter kept as raw nibbles so that slots holding
/// garbage survive a round trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BcdCounter(pub [u8; 2]);

impl BcdCounter {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut raw = [0u8; 2];
        cursor
            .read_exact(&mut raw)
            .context("Failed to read BCD counter")?;
        Ok(BcdCounter(raw))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.0);
        Ok(())
    }

    pub fn value(&self) -> Option<u16> {
        let mut cursor = Cursor::new(&self.0[..]);
        read_bcd(&mut cursor, 2).ok().map(|v| v as u16)
    }
}

/// [DailyPresenceCounter: appendix 2.56.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e19510)
pub type DailyPresenceCounter = BcdCounter;
/// [VuDataBlockCounter: appendix 2.189.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e26512)
pub type VuDataBlockCounter = BcdCounter;

/// [VehicleRegistrationNumber: appendix 2.168.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e25188)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRegistrationNumber(pub CodePageString);

impl VehicleRegistrationNumber {
    pub const PAYLOAD: usize = 13;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VehicleRegistrationNumber(CodePageString::parse_dyn_size(
            cursor,
            Self::PAYLOAD,
        )?))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(out)
    }
}

/// [VehicleRegistrationIdentification: appendix 2.166.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e25120)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRegistrationIdentification {
    pub vehicle_registration_nation: external::NationNumeric,
    pub vehicle_registration_number: VehicleRegistrationNumber,
}

impl VehicleRegistrationIdentification {
    pub const SIZE: usize = 15;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let vehicle_registration_nation = external::NationNumeric::parse(cursor)?;
        let vehicle_registration_number = VehicleRegistrationNumber::parse(cursor)?;
        Ok(VehicleRegistrationIdentification {
            vehicle_registration_nation,
            vehicle_registration_number,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.vehicle_registration_nation.encode(out)?;
        self.vehicle_registration_number.encode(out)?;
        Ok(())
    }
}

/// [VehicleIdentificationNumber: appendix 2.164.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e25052)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentificationNumber(pub IA5String);

impl VehicleIdentificationNumber {
    pub const SIZE: usize = 17;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VehicleIdentificationNumber(IA5String::parse_dyn_size(
            cursor,
            Self::SIZE,
        )?))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(out)
    }
}

/// [CardNumber: appendix 2.26.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e17629)
///
/// The 16-byte number window is discriminated by the owning card type; a
/// window under an unrecognized type is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardNumber {
    #[serde(rename_all = "camelCase")]
    Driver {
        driver_identification: IA5String,
        card_replacement_index: IA5String,
        card_renewal_index: IA5String,
    },
    #[serde(rename_all = "camelCase")]
    Owner {
        owner_identification: IA5String,
        card_consecutive_index: IA5String,
        card_replacement_index: IA5String,
        card_renewal_index: IA5String,
    },
    Unidentified {
        raw: Vec<u8>,
    },
}

impl CardNumber {
    pub const SIZE: usize = 16;

    pub fn parse_driver(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(CardNumber::Driver {
            driver_identification: IA5String::parse_dyn_size(cursor, 14)?,
            card_replacement_index: IA5String::parse_dyn_size(cursor, 1)?,
            card_renewal_index: IA5String::parse_dyn_size(cursor, 1)?,
        })
    }

    pub fn parse_owner(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(CardNumber::Owner {
            owner_identification: IA5String::parse_dyn_size(cursor, 13)?,
            card_consecutive_index: IA5String::parse_dyn_size(cursor, 1)?,
            card_replacement_index: IA5String::parse_dyn_size(cursor, 1)?,
            card_renewal_index: IA5String::parse_dyn_size(cursor, 1)?,
        })
    }

    pub fn parse_unidentified(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut raw = vec![0u8; Self::SIZE];
        cursor
            .read_exact(&mut raw)
            .context("Failed to read card number window")?;
        Ok(CardNumber::Unidentified { raw })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            CardNumber::Driver {
                driver_identification,
                card_replacement_index,
                card_renewal_index,
            } => {
                driver_identification.encode(out)?;
                card_replacement_index.encode(out)?;
                card_renewal_index.encode(out)?;
            }
            CardNumber::Owner {
                owner_identification,
                card_consecutive_index,
                card_replacement_index,
                card_renewal_index,
            } => {
                owner_identification.encode(out)?;
                card_consecutive_index.encode(out)?;
                card_replacement_index.encode(out)?;
                card_renewal_index.encode(out)?;
            }
            CardNumber::Unidentified { raw } => out.extend_from_slice(raw),
        }
        Ok(())
    }
}

/// [FullCardNumber: appendix 2.73.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e21400)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCardNumber {
    pub card_type: external::EquipmentType,
    pub card_issuing_member_state: external::NationNumeric,
    pub card_number: CardNumber,
}

impl FullCardNumber {
    pub const SIZE: usize = 18;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let card_type = external::EquipmentType::parse(cursor)?;
        let card_issuing_member_state = external::NationNumeric::parse(cursor)?;
        let card_number = match card_type {
            external::EquipmentType::DriverCard => CardNumber::parse_driver(cursor)?,
            external::EquipmentType::WorkshopCard
            | external::EquipmentType::ControlCard
            | external::EquipmentType::CompanyCard => CardNumber::parse_owner(cursor)?,
            _ => CardNumber::parse_unidentified(cursor)?,
        };
        Ok(FullCardNumber {
            card_type,
            card_issuing_member_state,
            card_number,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.card_type.encode(out)?;
        self.card_issuing_member_state.encode(out)?;
        self.card_number.encode(out)?;
        Ok(())
    }
}

/// [CardChipIdentification: appendix 2.13.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e16935)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardChipIdentification {
    pub ic_serial_number: Vec<u8>,
    pub ic_manufacturing_references: Vec<u8>,
}

impl CardChipIdentification {
    pub const SIZE: usize = 8;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut ic_serial_number = [0u8; 4];
        cursor
            .read_exact(&mut ic_serial_number)
            .context("Failed to read ic serial number")?;
        let mut ic_manufacturing_references = [0u8; 4];
        cursor
            .read_exact(&mut ic_manufacturing_references)
            .context("Failed to read ic manufacturing references")?;
        Ok(CardChipIdentification {
            ic_serial_number: ic_serial_number.to_vec(),
            ic_manufacturing_references: ic_manufacturing_references.to_vec(),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        if self.ic_serial_number.len() != 4 || self.ic_manufacturing_references.len() != 4 {
            anyhow::bail!("CardChipIdentification fields must be 4 bytes each");
        }
        out.extend_from_slice(&self.ic_serial_number);
        out.extend_from_slice(&self.ic_manufacturing_references);
        Ok(())
    }
}

/// [EmbedderIcAssemblerId: appendix 2.65.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e20005)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedderIcAssemblerId {
    pub country_code: IA5String,
    pub module_embedder: BcdCounter,
    pub manufacturer_information: u8,
}

impl EmbedderIcAssemblerId {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let country_code = IA5String::parse_dyn_size(cursor, 2)?;
        let module_embedder = BcdCounter::parse(cursor)?;
        let manufacturer_information = cursor
            .read_u8()
            .context("Failed to read manufacturer_information")?;
        Ok(EmbedderIcAssemblerId {
            country_code,
            module_embedder,
            manufacturer_information,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.country_code.encode(out)?;
        self.module_embedder.encode(out)?;
        out.push(self.manufacturer_information);
        Ok(())
    }
}

/// [ExtendedSerialNumber: appendix 2.72.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e21307)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedSerialNumber {
    pub serial_number: u32,
    pub month_year: MonthYear,
    pub equipment_type: external::EquipmentType,
    pub manufacturer_code: external::ManufacturerCode,
}

impl ExtendedSerialNumber {
    pub const SIZE: usize = 8;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let serial_number = cursor
            .read_u32::<BigEndian>()
            .context("Failed to read serial number")?;
        let month_year = MonthYear::parse(cursor)?;
        let equipment_type = external::EquipmentType::parse(cursor)?;
        let manufacturer_code = external::ManufacturerCode::parse(cursor)?;
        Ok(ExtendedSerialNumber {
            serial_number,
            month_year,
            equipment_type,
            manufacturer_code,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u32_be(out, self.serial_number);
        self.month_year.encode(out)?;
        self.equipment_type.encode(out)?;
        self.manufacturer_code.encode(out)?;
        Ok(())
    }
}

/// [CardStructureVersion: appendix 2.36.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e18081)
///
/// Raw version bytes are retained; the generation mapping is an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStructureVersion {
    pub major: u8,
    pub minor: u8,
}

impl CardStructureVersion {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let major = cursor
            .read_u8()
            .context("Failed to read CardStructureVersion major")?;
        let minor = cursor
            .read_u8()
            .context("Failed to read CardStructureVersion minor")?;
        Ok(CardStructureVersion { major, minor })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.major);
        out.push(self.minor);
        Ok(())
    }

    pub fn generation(&self) -> Generation {
        if self.major == 0 {
            Generation::Gen1
        } else {
            Generation::Gen2
        }
    }
}

/// [CardIccIdentification: appendix 2.23.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e17372)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardIccIdentification {
    pub clock_stop: u8,
    pub card_extended_serial_number: ExtendedSerialNumber,
    pub card_approval_number: IA5String,
    pub card_personaliser_id: external::ManufacturerCode,
    pub embedder_ic_assembler_id: EmbedderIcAssemblerId,
    pub ic_identifier: Vec<u8>,
}

impl CardIccIdentification {
    pub const SIZE: usize = 25;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let clock_stop = cursor.read_u8().context("Failed to read clock_stop")?;
        let card_extended_serial_number = ExtendedSerialNumber::parse(cursor)?;
        let card_approval_number = IA5String::parse_dyn_size(cursor, 8)?;
        let card_personaliser_id = external::ManufacturerCode::parse(cursor)?;
        let embedder_ic_assembler_id = EmbedderIcAssemblerId::parse(cursor)?;
        let mut ic_identifier = [0u8; 2];
        cursor
            .read_exact(&mut ic_identifier)
            .context("Failed to read ic_identifier")?;
        Ok(CardIccIdentification {
            clock_stop,
            card_extended_serial_number,
            card_approval_number,
            card_personaliser_id,
            embedder_ic_assembler_id,
            ic_identifier: ic_identifier.to_vec(),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.clock_stop);
        self.card_extended_serial_number.encode(out)?;
        self.card_approval_number.encode(out)?;
        self.card_personaliser_id.encode(out)?;
        self.embedder_ic_assembler_id.encode(out)?;
        if self.ic_identifier.len() != 2 {
            anyhow::bail!("ic_identifier must be 2 bytes");
        }
        out.extend_from_slice(&self.ic_identifier);
        Ok(())
    }
}

/// [CardIdentification: appendix 2.24.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e17430)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardIdentification {
    pub card_issuing_member_state: external::NationNumeric,
    pub card_number: CardNumber,
    pub card_issuing_authority_name: Name,
    pub card_issue_date: TimeReal,
    pub card_validity_begin: TimeReal,
    pub card_expiry_date: TimeReal,
}

impl CardIdentification {
    pub const SIZE: usize = 65;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let card_issuing_member_state = external::NationNumeric::parse(cursor)?;
        // The issuing authority reference is critical: an out-of-table byte
        // here fails the decode instead of being carried as unrecognized.
        if let external::NationNumeric::Unrecognized(value) = card_issuing_member_state {
            return Err(crate::error::Error::InvalidEnumValue {
                location: crate::error::Location::offset(0),
                field: "cardIssuingMemberState",
                value,
            }
            .into());
        }
        // Driver cards are the only card kind this EF appears on.
        let card_number = CardNumber::parse_driver(cursor)?;
        let card_issuing_authority_name = parse_name(cursor)?;
        let card_issue_date = TimeReal::parse(cursor)?;
        let card_validity_begin = TimeReal::parse(cursor)?;
        let card_expiry_date = TimeReal::parse(cursor)?;
        Ok(CardIdentification {
            card_issuing_member_state,
            card_number,
            card_issuing_authority_name,
            card_issue_date,
            card_validity_begin,
            card_expiry_date,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.card_issuing_member_state.encode(out)?;
        self.card_number.encode(out)?;
        self.card_issuing_authority_name.encode(out)?;
        self.card_issue_date.encode(out)?;
        self.card_validity_begin.encode(out)?;
        self.card_expiry_date.encode(out)?;
        Ok(())
    }
}

/// [DriverCardHolderIdentification: appendix 2.62.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e19928)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverCardHolderIdentification {
    pub card_holder_name: HolderName,
    pub card_holder_birth_date: Datef,
    pub card_holder_preferred_language: Language,
}

impl DriverCardHolderIdentification {
    pub const SIZE: usize = 78;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(DriverCardHolderIdentification {
            card_holder_name: HolderName::parse(cursor)?,
            card_holder_birth_date: Datef::parse(cursor)?,
            card_holder_preferred_language: Language::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.card_holder_name.encode(out)?;
        self.card_holder_birth_date.encode(out)?;
        self.card_holder_preferred_language.encode(out)?;
        Ok(())
    }
}

/// EF_Identification of a driver card: 143 bytes by regulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub card_identification: CardIdentification,
    pub driver_card_holder_identification: DriverCardHolderIdentification,
}

impl Identification {
    pub const SIZE: usize = CardIdentification::SIZE + DriverCardHolderIdentification::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(Identification {
            card_identification: CardIdentification::parse(cursor)?,
            driver_card_holder_identification: DriverCardHolderIdentification::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.card_identification.encode(out)?;
        self.driver_card_holder_identification.encode(out)?;
        Ok(())
    }
}

/// [CardDrivingLicenceInformation: appendix 2.18.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e17139)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDrivingLicenceInformation {
    pub driving_licence_issuing_authority: Name,
    pub driving_licence_issuing_nation: external::NationNumeric,
    pub driving_licence_number: IA5String,
}

impl CardDrivingLicenceInformation {
    pub const SIZE: usize = NAME_SIZE + 1 + 16;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(CardDrivingLicenceInformation {
            driving_licence_issuing_authority: parse_name(cursor)?,
            driving_licence_issuing_nation: external::NationNumeric::parse(cursor)?,
            driving_licence_number: IA5String::parse_dyn_size(cursor, 16)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.driving_licence_issuing_authority.encode(out)?;
        self.driving_licence_issuing_nation.encode(out)?;
        self.driving_licence_number.encode(out)?;
        Ok(())
    }
}

/// EF_Card_Download: a single optional download timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDownload {
    pub last_card_download: TimeReal,
}

impl CardDownload {
    pub const SIZE: usize = TimeReal::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(CardDownload {
            last_card_download: TimeReal::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.last_card_download.encode(out)
    }
}

/// [CardCurrentUse: appendix 2.16.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e17059)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCurrentUse {
    pub session_open_time: TimeReal,
    pub session_open_vehicle: VehicleRegistrationIdentification,
}

impl CardCurrentUse {
    pub const SIZE: usize = TimeReal::SIZE + VehicleRegistrationIdentification::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(CardCurrentUse {
            session_open_time: TimeReal::parse(cursor)?,
            session_open_vehicle: VehicleRegistrationIdentification::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.session_open_time.encode(out)?;
        self.session_open_vehicle.encode(out)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityChangeInfoSlot {
    Driver,
    CoDriver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityChangeInfoDrivingStatus {
    Single,
    Crew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityChangeInfoCardStatus {
    Inserted,
    NotInserted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityChangeInfoActivity {
    BreakRest,
    Availability,
    Work,
    Driving,
}

/// [ActivityChangeInfo: appendix 2.1.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e16027)
///
/// `scpaattttttttttt` packed into two bytes, minutes since midnight in the
/// low eleven bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityChangeInfo {
    pub slot: ActivityChangeInfoSlot,
    pub driving_status: ActivityChangeInfoDrivingStatus,
    pub card_status: ActivityChangeInfoCardStatus,
    pub activity: ActivityChangeInfoActivity,
    pub minutes: u16,
}

impl ActivityChangeInfo {
    pub const SIZE: usize = 2;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let bits = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read activity change info")?;
        let slot = if bits >> 15 & 1 == 0 {
            ActivityChangeInfoSlot::Driver
        } else {
            ActivityChangeInfoSlot::CoDriver
        };
        let driving_status = if bits >> 14 & 1 == 0 {
            ActivityChangeInfoDrivingStatus::Single
        } else {
            ActivityChangeInfoDrivingStatus::Crew
        };
        let card_status = if bits >> 13 & 1 == 0 {
            ActivityChangeInfoCardStatus::Inserted
        } else {
            ActivityChangeInfoCardStatus::NotInserted
        };
        let activity = match bits >> 11 & 0b11 {
            0b00 => ActivityChangeInfoActivity::BreakRest,
            0b01 => ActivityChangeInfoActivity::Availability,
            0b10 => ActivityChangeInfoActivity::Work,
            _ => ActivityChangeInfoActivity::Driving,
        };
        let minutes = bits & 0x07FF;
        Ok(ActivityChangeInfo {
            slot,
            driving_status,
            card_status,
            activity,
            minutes,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        if self.minutes >= 1 << 11 {
            anyhow::bail!("activity minute counter {} exceeds 11 bits", self.minutes);
        }
        let mut bits: u16 = self.minutes;
        bits |= match self.activity {
            ActivityChangeInfoActivity::BreakRest => 0b00,
            ActivityChangeInfoActivity::Availability => 0b01,
            ActivityChangeInfoActivity::Work => 0b10,
            ActivityChangeInfoActivity::Driving => 0b11,
        } << 11;
        if matches!(self.card_status, ActivityChangeInfoCardStatus::NotInserted) {
            bits |= 1 << 13;
        }
        if matches!(self.driving_status, ActivityChangeInfoDrivingStatus::Crew) {
            bits |= 1 << 14;
        }
        if matches!(self.slot, ActivityChangeInfoSlot::CoDriver) {
            bits |= 1 << 15;
        }
        write_u16_be(out, bits);
        Ok(())
    }
}

/// [GeoCoordinates: appendix 2.76.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e21534)
///
/// Signed 24-bit DDDMM.M × 10 per axis. The wire integers are the value;
/// decimal degrees are an accessor so the round trip stays exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCoordinates {
    pub latitude: i32,
    pub longitude: i32,
}

impl GeoCoordinates {
    pub const SIZE: usize = 6;
    /// Unknown position marker per the Data Dictionary.
    pub const UNKNOWN: i32 = 0x7FFFFF;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let latitude = Self::read_coordinate(cursor).context("Failed to read latitude")?;
        let longitude = Self::read_coordinate(cursor).context("Failed to read longitude")?;
        Ok(GeoCoordinates {
            latitude,
            longitude,
        })
    }

    fn read_coordinate(cursor: &mut Cursor<&[u8]>) -> Result<i32> {
        let mut buffer = [0u8; 3];
        cursor.read_exact(&mut buffer)?;
        let fill = if buffer[0] & 0x80 > 0 { 0xFF } else { 0x00 };
        Ok(i32::from_be_bytes([fill, buffer[0], buffer[1], buffer[2]]))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        for value in [self.latitude, self.longitude] {
            if value < -(1 << 23) || value >= 1 << 23 {
                anyhow::bail!("coordinate {} does not fit in 24 bits", value);
            }
            out.extend_from_slice(&value.to_be_bytes()[1..]);
        }
        Ok(())
    }

    /// Packs decimal degrees into the DDDMM.M × 10 wire form.
    pub fn pack_degrees(degrees: f64) -> i32 {
        let sign = if degrees < 0.0 { -1.0 } else { 1.0 };
        let degrees = degrees.abs();
        let whole = degrees.trunc();
        let tenth_minutes = ((degrees - whole) * 600.0).round();
        (sign * (whole * 1000.0 + tenth_minutes)) as i32
    }

    pub fn latitude_degrees(&self) -> f64 {
        Self::unpack_degrees(self.latitude)
    }

    pub fn longitude_degrees(&self) -> f64 {
        Self::unpack_degrees(self.longitude)
    }

    fn unpack_degrees(value: i32) -> f64 {
        let sign = if value < 0 { -1.0 } else { 1.0 };
        let value = value.abs() as f64;
        let degrees = (value / 1000.0).trunc();
        let tenth_minutes = value - degrees * 1000.0;
        sign * (degrees + tenth_minutes / 600.0)
    }
}

/// [GNSSPlaceRecord: appendix 2.80.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e21772)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GnssPlaceRecord {
    pub time_stamp: TimeReal,
    pub gnss_accuracy: u8,
    pub geo_coordinates: GeoCoordinates,
}

impl GnssPlaceRecord {
    pub const SIZE: usize = TimeReal::SIZE + 1 + GeoCoordinates::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let time_stamp = TimeReal::parse(cursor)?;
        let gnss_accuracy = cursor.read_u8().context("Failed to read GNSS accuracy")?;
        let geo_coordinates = GeoCoordinates::parse(cursor)?;
        Ok(GnssPlaceRecord {
            time_stamp,
            gnss_accuracy,
            geo_coordinates,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.time_stamp.encode(out)?;
        out.push(self.gnss_accuracy);
        self.geo_coordinates.encode(out)?;
        Ok(())
    }
}

/// Ring-structured EF body: a two-byte newest-record pointer followed by N
/// fixed-size slots. Slot order is the byte order; the semantic order is
/// recovered newest-first modulo N. Pointer 0xFFFF marks an empty ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingArray<T> {
    pub newest_record_pointer: u16,
    pub records: Vec<T>,
    #[serde(skip)]
    raw: Option<Vec<u8>>,
}

pub const EMPTY_RING_POINTER: u16 = 0xFFFF;

impl<T> RingArray<T> {
    pub fn parse<F>(
        cursor: &mut Cursor<&[u8]>,
        total_size: usize,
        record_size: usize,
        parse_record: F,
    ) -> Result<Self>
    where
        F: Fn(&mut Cursor<&[u8]>) -> Result<T>,
    {
        if total_size < 2 || (total_size - 2) % record_size != 0 {
            anyhow::bail!(
                "ring window of {} bytes is not 2 + k * {}",
                total_size,
                record_size
            );
        }
        let start = cursor.position() as usize;
        let newest_record_pointer = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read newest record pointer")?;
        let count = (total_size - 2) / record_size;
        let mut records = Vec::with_capacity(count);
        for index in 0..count {
            let mut window = cursor.take_exact(record_size)?;
            let record = parse_record(&mut window)
                .with_context(|| format!("Failed to parse ring slot {}", index))?;
            records.push(record);
        }
        let raw = cursor.get_ref()[start..start + total_size].to_vec();
        Ok(RingArray {
            newest_record_pointer,
            records,
            raw: Some(raw),
        })
    }

    pub fn encode<F>(&self, out: &mut Vec<u8>, record_size: usize, encode_record: F) -> Result<()>
    where
        F: Fn(&T, &mut Vec<u8>) -> Result<()>,
    {
        let start = out.len();
        write_u16_be(out, self.newest_record_pointer);
        for (index, record) in self.records.iter().enumerate() {
            let before = out.len();
            encode_record(record, out)
                .with_context(|| format!("Failed to encode ring slot {}", index))?;
            if out.len() - before != record_size {
                anyhow::bail!(
                    "ring slot {} encoded to {} bytes, expected {}",
                    index,
                    out.len() - before,
                    record_size
                );
            }
        }
        if let Some(raw) = &self.raw {
            if raw.len() != out.len() - start {
                log::warn!(
                    "ring rebuilt at {} bytes no longer matches its {} byte canvas",
                    out.len() - start,
                    raw.len()
                );
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.newest_record_pointer == EMPTY_RING_POINTER || self.records.is_empty()
    }

    /// Semantic traversal: newest slot first, walking backwards modulo N.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &T> {
        let count = self.records.len();
        let newest = self.newest_record_pointer as usize;
        let empty = self.is_empty() || newest >= count;
        (0..if empty { 0 } else { count })
            .map(move |step| &self.records[(newest + count - step) % count])
    }

    pub fn newest(&self) -> Option<&T> {
        self.iter_newest_first().next()
    }

    pub fn clear_raw(&mut self) {
        self.raw = None;
    }
}

/// State of one card slot, a nibble of [CardSlotsStatus].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSlotStatus {
    NoCardInserted,
    DriverCardInserted,
    WorkshopCardInserted,
    ControlCardInserted,
    CompanyCardInserted,
    Unrecognized(u8),
}

impl CardSlotStatus {
    fn from_nibble(value: u8) -> Self {
        match value {
            0x0 => Self::NoCardInserted,
            0x1 => Self::DriverCardInserted,
            0x2 => Self::WorkshopCardInserted,
            0x3 => Self::ControlCardInserted,
            0x4 => Self::CompanyCardInserted,
            other => Self::Unrecognized(other),
        }
    }

    fn nibble(&self) -> u8 {
        match self {
            Self::NoCardInserted => 0x0,
            Self::DriverCardInserted => 0x1,
            Self::WorkshopCardInserted => 0x2,
            Self::ControlCardInserted => 0x3,
            Self::CompanyCardInserted => 0x4,
            Self::Unrecognized(other) => *other,
        }
    }
}

/// [CardSlotsStatus: appendix 2.34.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e17939)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSlotsStatus {
    pub codriver: CardSlotStatus,
    pub driver: CardSlotStatus,
}

impl CardSlotsStatus {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let status = cursor
            .read_u8()
            .context("Failed to read card slots status")?;
        Ok(CardSlotsStatus {
            codriver: CardSlotStatus::from_nibble(status >> 4),
            driver: CardSlotStatus::from_nibble(status & 0x0F),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.codriver.nibble() << 4 | self.driver.nibble() & 0x0F);
        Ok(())
    }
}

/// [CardSlotNumber: appendix 2.33.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e17911)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSlotNumber {
    DriverSlot,
    CoDriverSlot,
    Unrecognized(u8),
}

impl CardSlotNumber {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read card slot number")?;
        Ok(match value {
            0 => CardSlotNumber::DriverSlot,
            1 => CardSlotNumber::CoDriverSlot,
            other => CardSlotNumber::Unrecognized(other),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(match self {
            CardSlotNumber::DriverSlot => 0,
            CardSlotNumber::CoDriverSlot => 1,
            CardSlotNumber::Unrecognized(other) => *other,
        });
        Ok(())
    }
}

/// [ManualInputFlag: appendix 2.93.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e22225)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualInputFlag {
    NoEntry,
    ManualEntries,
    Unrecognized(u8),
}

impl ManualInputFlag {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read manual input flag")?;
        Ok(match value {
            0 => ManualInputFlag::NoEntry,
            1 => ManualInputFlag::ManualEntries,
            other => ManualInputFlag::Unrecognized(other),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(match self {
            ManualInputFlag::NoEntry => 0,
            ManualInputFlag::ManualEntries => 1,
            ManualInputFlag::Unrecognized(other) => *other,
        });
        Ok(())
    }
}

/// [CardActivityDailyRecord: appendix 2.9.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e16718)
///
/// A variable-length daily record inside the activity ring. The leading
/// previous-record length makes reverse traversal possible; both lengths are
/// part of the canonical byte layout and are carried explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardActivityDailyRecord {
    pub activity_previous_record_length: u16,
    pub activity_record_length: u16,
    pub activity_record_date: TimeReal,
    pub activity_daily_presence_counter: DailyPresenceCounter,
    pub activity_day_distance: Distance,
    pub activity_change_info: Vec<ActivityChangeInfo>,
}

impl CardActivityDailyRecord {
    pub const METADATA_SIZE: usize = 12;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let activity_previous_record_length = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read activity_previous_record_length")?;
        let activity_record_length = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read activity_record_length")?;
        let record_length = activity_record_length as usize;
        if record_length < Self::METADATA_SIZE
            || (record_length - Self::METADATA_SIZE) % ActivityChangeInfo::SIZE != 0
        {
            anyhow::bail!(
                "daily record length {} is not {} + k * {}",
                record_length,
                Self::METADATA_SIZE,
                ActivityChangeInfo::SIZE
            );
        }
        let activity_record_date = TimeReal::parse(cursor)?;
        let activity_daily_presence_counter = DailyPresenceCounter::parse(cursor)?;
        let activity_day_distance = Distance::parse(cursor)?;

        let change_count = (record_length - Self::METADATA_SIZE) / ActivityChangeInfo::SIZE;
        let mut activity_change_info = Vec::with_capacity(change_count);
        for _ in 0..change_count {
            activity_change_info.push(ActivityChangeInfo::parse(cursor)?);
        }
        Ok(CardActivityDailyRecord {
            activity_previous_record_length,
            activity_record_length,
            activity_record_date,
            activity_daily_presence_counter,
            activity_day_distance,
            activity_change_info,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let expected =
            Self::METADATA_SIZE + self.activity_change_info.len() * ActivityChangeInfo::SIZE;
        if self.activity_record_length as usize != expected {
            anyhow::bail!(
                "daily record declares {} bytes but holds {}",
                self.activity_record_length,
                expected
            );
        }
        write_u16_be(out, self.activity_previous_record_length);
        write_u16_be(out, self.activity_record_length);
        self.activity_record_date.encode(out)?;
        self.activity_daily_presence_counter.encode(out)?;
        self.activity_day_distance.encode(out)?;
        for change in &self.activity_change_info {
            change.encode(out)?;
        }
        Ok(())
    }
}

/// A daily record together with its absolute offset inside the ring window,
/// recorded at decode time so re-encoding can paint it back in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecordSlot {
    pub offset: usize,
    pub record: CardActivityDailyRecord,
}

/// EF_Driver_Activity_Data: a pointer pair into a cyclic byte buffer of
/// variable-length daily records. The buffer layout, including slack between
/// `newestEnd` and `oldestBegin`, is canonical; the original window is kept
/// as the paint canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverActivityData {
    pub activity_pointer_oldest_day_record: u16,
    pub activity_pointer_newest_record: u16,
    pub activity_daily_records: Vec<DailyRecordSlot>,
    pub window_length: usize,
    #[serde(skip)]
    canvas: Option<Vec<u8>>,
}

fn ring_byte(window: &[u8], position: usize) -> u8 {
    window[position % window.len()]
}

fn ring_u16(window: &[u8], position: usize) -> u16 {
    u16::from_be_bytes([ring_byte(window, position), ring_byte(window, position + 1)])
}

fn ring_copy(window: &[u8], position: usize, length: usize) -> Vec<u8> {
    (0..length).map(|i| ring_byte(window, position + i)).collect()
}

impl DriverActivityData {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Self> {
        if size < 4 {
            anyhow::bail!("activity window of {} bytes cannot hold its pointers", size);
        }
        let activity_pointer_oldest_day_record = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read activity_pointer_oldest_day_record")?;
        let activity_pointer_newest_record = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read activity_pointer_newest_record")?;
        let window_length = size - 4;
        let mut window = vec![0u8; window_length];
        cursor
            .read_exact(&mut window)
            .context("Failed to read activity ring window")?;

        let mut activity_daily_records = Vec::new();
        let oldest = activity_pointer_oldest_day_record as usize;
        let newest = activity_pointer_newest_record as usize;
        if window_length > 0 && oldest < window_length && newest < window_length {
            let newest_length = ring_u16(&window, newest + 2) as usize;
            if newest_length >= CardActivityDailyRecord::METADATA_SIZE {
                let end = (newest + newest_length) % window_length;
                let mut position = oldest;
                loop {
                    let record_length = ring_u16(&window, position + 2) as usize;
                    if record_length < CardActivityDailyRecord::METADATA_SIZE
                        || record_length > window_length
                    {
                        log::warn!(
                            "activity ring stops at offset {}: implausible record length {}",
                            position,
                            record_length
                        );
                        break;
                    }
                    let bytes = ring_copy(&window, position, record_length);
                    let mut record_cursor = Cursor::new(bytes.as_slice());
                    match CardActivityDailyRecord::parse(&mut record_cursor) {
                        Ok(record) => activity_daily_records.push(DailyRecordSlot {
                            offset: position,
                            record,
                        }),
                        Err(error) => {
                            log::warn!("Failed to parse daily record at {}: {:?}", position, error);
                            break;
                        }
                    }
                    position = (position + record_length) % window_length;
                    if position == end {
                        break;
                    }
                    if activity_daily_records.len() * CardActivityDailyRecord::METADATA_SIZE
                        > window_length
                    {
                        anyhow::bail!("activity ring pointers do not terminate");
                    }
                }
            }
        }

        Ok(DriverActivityData {
            activity_pointer_oldest_day_record,
            activity_pointer_newest_record,
            activity_daily_records,
            window_length,
            canvas: Some(window),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u16_be(out, self.activity_pointer_oldest_day_record);
        write_u16_be(out, self.activity_pointer_newest_record);

        let mut window = match &self.canvas {
            Some(canvas) if canvas.len() == self.window_length => canvas.clone(),
            Some(canvas) => {
                log::warn!(
                    "activity canvas of {} bytes does not match the {} byte window, rebuilding",
                    canvas.len(),
                    self.window_length
                );
                vec![0u8; self.window_length]
            }
            None => {
                log::warn!("activity ring has no canvas, rebuilding from records");
                vec![0u8; self.window_length]
            }
        };

        for slot in &self.activity_daily_records {
            let mut bytes = Vec::with_capacity(slot.record.activity_record_length as usize);
            slot.record.encode(&mut bytes)?;
            if window.is_empty() {
                anyhow::bail!("cannot paint daily records into an empty window");
            }
            for (i, byte) in bytes.iter().enumerate() {
                let position = (slot.offset + i) % window.len();
                window[position] = *byte;
            }
        }
        out.extend_from_slice(&window);
        Ok(())
    }

    /// Daily records in chronological order (the enumeration order).
    pub fn days(&self) -> impl Iterator<Item = &CardActivityDailyRecord> {
        self.activity_daily_records.iter().map(|slot| &slot.record)
    }

    /// Drops the paint canvas; the next encode rebuilds the window from the
    /// records alone and reports the fallback.
    pub fn clear_canvas(&mut self) {
        self.canvas = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_real_zero_is_unset() {
        let bytes = [0u8; 4];
        let mut cursor = Cursor::new(bytes.as_slice());
        let time = TimeReal::parse(&mut cursor).unwrap();
        assert!(!time.is_set());
        let mut out = Vec::new();
        time.encode(&mut out).unwrap();
        assert_eq!(out, vec![0, 0, 0, 0]);
    }

    #[test]
    fn time_real_round_trips() {
        let bytes = 1_600_000_000u32.to_be_bytes();
        let mut cursor = Cursor::new(bytes.as_slice());
        let time = TimeReal::parse(&mut cursor).unwrap();
        assert_eq!(time.0.unwrap().timestamp(), 1_600_000_000);
        let mut out = Vec::new();
        time.encode(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn bcd_date_zero_month_is_unset() {
        let bytes = [0x20, 0x24, 0x00, 0x00];
        let mut cursor = Cursor::new(bytes.as_slice());
        let date = Datef::parse(&mut cursor).unwrap();
        assert!(date.is_unset());
        let mut out = Vec::new();
        date.encode(&mut out).unwrap();
        assert_eq!(out, bytes);

        let set = Datef {
            year: 1985,
            month: 7,
            day: 5,
        };
        assert!(!set.is_unset());
    }

    #[test]
    fn ia5_keeps_odd_padding_until_mutated() {
        let bytes = *b"AB\0\0";
        let mut cursor = Cursor::new(bytes.as_slice());
        let s = IA5String::parse_dyn_size(&mut cursor, 4).unwrap();
        assert_eq!(s.value, "AB");
        let mut out = Vec::new();
        s.encode(&mut out).unwrap();
        assert_eq!(out, bytes);

        let replaced = IA5String::new("CD", 4);
        let mut out = Vec::new();
        replaced.encode(&mut out).unwrap();
        assert_eq!(out, *b"CD  ");
    }

    #[test]
    fn code_page_string_round_trips_latin1() {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(b"M\xFCller   ");
        let mut cursor = Cursor::new(bytes.as_slice());
        let s = CodePageString::parse_dyn_size(&mut cursor, 10).unwrap();
        assert_eq!(s.value, "Müller");
        let mut out = Vec::new();
        s.encode(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn code_page_string_rejects_unrepresentable() {
        let mut s = CodePageString::new("Кирилл", 10);
        s.code_page = 0x01;
        let mut out = Vec::new();
        assert!(s.encode(&mut out).is_err());
    }

    #[test]
    fn activity_change_info_round_trips() {
        let bytes = [0b1011_1000u8, 0b0010_0001];
        let mut cursor = Cursor::new(bytes.as_slice());
        let info = ActivityChangeInfo::parse(&mut cursor).unwrap();
        assert_eq!(info.slot, ActivityChangeInfoSlot::CoDriver);
        assert_eq!(info.activity, ActivityChangeInfoActivity::Driving);
        let mut out = Vec::new();
        info.encode(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn geo_coordinates_pack_and_unpack() {
        let helsinki_lat = GeoCoordinates::pack_degrees(60.17);
        let helsinki_lon = GeoCoordinates::pack_degrees(24.93);
        assert_eq!(helsinki_lat, 60102);
        assert_eq!(helsinki_lon, 24558);
        let coords = GeoCoordinates {
            latitude: helsinki_lat,
            longitude: helsinki_lon,
        };
        assert!((coords.latitude_degrees() - 60.17).abs() < 0.001);
        let mut out = Vec::new();
        coords.encode(&mut out).unwrap();
        let mut cursor = Cursor::new(out.as_slice());
        assert_eq!(GeoCoordinates::parse(&mut cursor).unwrap(), coords);
    }

    #[test]
    fn geo_coordinates_negative_round_trip() {
        let coords = GeoCoordinates {
            latitude: -33555,
            longitude: GeoCoordinates::UNKNOWN,
        };
        let mut out = Vec::new();
        coords.encode(&mut out).unwrap();
        let mut cursor = Cursor::new(out.as_slice());
        assert_eq!(GeoCoordinates::parse(&mut cursor).unwrap(), coords);
    }

    #[test]
    fn ring_array_iterates_newest_first_with_wrap() {
        // 2-byte pointer + 4 one-byte records, newest at slot 1.
        let bytes = [0x00, 0x01, 10, 11, 12, 13];
        let mut cursor = Cursor::new(bytes.as_slice());
        let ring = RingArray::parse(&mut cursor, 6, 1, |c| {
            c.read_u8().context("byte")
        })
        .unwrap();
        let order: Vec<u8> = ring.iter_newest_first().copied().collect();
        assert_eq!(order, vec![11, 10, 13, 12]);
        let mut out = Vec::new();
        ring.encode(&mut out, 1, |r, out| {
            out.push(*r);
            Ok(())
        })
        .unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn empty_ring_yields_no_records() {
        let bytes = [0xFF, 0xFF, 1, 2];
        let mut cursor = Cursor::new(bytes.as_slice());
        let ring = RingArray::parse(&mut cursor, 4, 1, |c| {
            c.read_u8().context("byte")
        })
        .unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.iter_newest_first().count(), 0);
    }

    #[test]
    fn unrecognized_issuing_state_is_critical() {
        let mut bytes = vec![0x33]; // not in the nation table
        bytes.extend_from_slice(&[0x20; 16]); // card number window
        bytes.push(0x01);
        bytes.extend_from_slice(&[0x20; 35]); // authority name
        bytes.extend_from_slice(&[0; 12]); // three unset timestamps
        let mut cursor = Cursor::new(bytes.as_slice());
        assert!(CardIdentification::parse(&mut cursor).is_err());

        // The same byte elsewhere decodes as an unrecognized nation.
        let nation_bytes = [0x33u8];
        let mut cursor = Cursor::new(nation_bytes.as_slice());
        assert_eq!(
            external::NationNumeric::parse(&mut cursor).unwrap(),
            external::NationNumeric::Unrecognized(0x33)
        );
    }

    #[test]
    fn full_card_number_window_is_18_bytes() {
        let mut bytes = vec![0x01, 0x12]; // driver card, Finland
        bytes.extend_from_slice(b"12345678901234");
        bytes.extend_from_slice(b"01");
        let mut cursor = Cursor::new(bytes.as_slice());
        let fcn = FullCardNumber::parse(&mut cursor).unwrap();
        assert_eq!(fcn.card_type, external::EquipmentType::DriverCard);
        let mut out = Vec::new();
        fcn.encode(&mut out).unwrap();
        assert_eq!(out.len(), FullCardNumber::SIZE);
        assert_eq!(out, bytes);
    }

    #[test]
    fn identification_is_regulation_sized() {
        assert_eq!(Identification::SIZE, 143);
        assert_eq!(CardCurrentUse::SIZE, 19);
        assert_eq!(CardDrivingLicenceInformation::SIZE, 53);
        assert_eq!(GnssPlaceRecord::SIZE, 11);
    }

    fn daily_record_bytes(previous_length: u16, date: u32, changes: &[u16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&previous_length.to_be_bytes());
        let length = 12 + 2 * changes.len() as u16;
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&date.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x01]); // presence counter
        bytes.extend_from_slice(&[0x00, 0x2A]); // distance
        for change in changes {
            bytes.extend_from_slice(&change.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn activity_ring_round_trips_with_wrap_and_slack() {
        // 40-byte window; first record at 20, second wraps around the end.
        let first = daily_record_bytes(0, 1_600_000_000, &[0x0020]);
        let second = daily_record_bytes(14, 1_600_086_400, &[0x0021, 0x0022]);
        let mut window = vec![0xEEu8; 40];
        for (i, byte) in first.iter().enumerate() {
            window[20 + i] = *byte;
        }
        for (i, byte) in second.iter().enumerate() {
            window[(34 + i) % 40] = *byte;
        }
        let mut ef = Vec::new();
        ef.extend_from_slice(&20u16.to_be_bytes()); // oldest
        ef.extend_from_slice(&34u16.to_be_bytes()); // newest
        ef.extend_from_slice(&window);

        let mut cursor = Cursor::new(ef.as_slice());
        let activity = DriverActivityData::parse_dyn_size(&mut cursor, ef.len()).unwrap();
        assert_eq!(activity.activity_daily_records.len(), 2);
        assert_eq!(activity.activity_daily_records[0].offset, 20);
        assert_eq!(activity.activity_daily_records[1].offset, 34);
        assert_eq!(
            activity.activity_daily_records[1]
                .record
                .activity_change_info
                .len(),
            2
        );

        // Slack bytes (0xEE) and wrap-around layout must survive re-encoding.
        let mut out = Vec::new();
        activity.encode(&mut out).unwrap();
        assert_eq!(out, ef);
    }

    #[test]
    fn activity_ring_paints_mutated_records_in_place() {
        let first = daily_record_bytes(0, 1_600_000_000, &[0x0020]);
        let mut ef = Vec::new();
        ef.extend_from_slice(&0u16.to_be_bytes());
        ef.extend_from_slice(&0u16.to_be_bytes());
        ef.extend_from_slice(&first);
        ef.extend_from_slice(&[0xAB; 6]); // slack after the only record

        let mut cursor = Cursor::new(ef.as_slice());
        let mut activity = DriverActivityData::parse_dyn_size(&mut cursor, ef.len()).unwrap();
        activity.activity_daily_records[0].record.activity_record_date =
            TimeReal::from_timestamp(1_577_836_800);

        let mut out = Vec::new();
        activity.encode(&mut out).unwrap();
        assert_eq!(&out[8..12], &1_577_836_800u32.to_be_bytes());
        assert_eq!(&out[out.len() - 6..], &[0xAB; 6]);
        assert_eq!(out.len(), ef.len());
    }
}

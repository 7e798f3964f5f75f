mod card;
mod vu;

pub use card::{marshal_raw_card, unmarshal_card};
pub use vu::{marshal_raw_vu, unmarshal_vu};

use crate::dt::{Gen2Version, Generation};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Verification outcome attached to a signable record by the Authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    Valid,
    InvalidSignature,
    MissingCertificate,
    UntrustedChain,
    UnsupportedAlgorithm,
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub outcome: AuthOutcome,
    pub detail: Option<String>,
}

impl AuthResult {
    pub fn new(outcome: AuthOutcome) -> Self {
        AuthResult {
            outcome,
            detail: None,
        }
    }

    pub fn with_detail(outcome: AuthOutcome, detail: impl Into<String>) -> Self {
        AuthResult {
            outcome,
            detail: Some(detail.into()),
        }
    }
}

/// Registry of elementary files addressable in a card download, keyed by the
/// two high bytes of the record tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFileKind {
    Icc,
    Ic,
    ApplicationIdentification,
    EventsData,
    FaultsData,
    DriverActivityData,
    VehiclesUsed,
    Places,
    CurrentUsage,
    ControlActivityData,
    CardDownload,
    Identification,
    DrivingLicenceInfo,
    SpecificConditions,
    VehicleUnitsUsed,
    GnssPlaces,
    ApplicationIdentificationV2,
    CardCertificate,
    CardSignCertificate,
    CaCertificate,
    LinkCertificate,
    Unknown,
}

impl CardFileKind {
    pub fn from_file_id(file_id: u16) -> Self {
        match file_id {
            0x0002 => Self::Icc,
            0x0005 => Self::Ic,
            0x0501 => Self::ApplicationIdentification,
            0x0502 => Self::EventsData,
            0x0503 => Self::FaultsData,
            0x0504 => Self::DriverActivityData,
            0x0505 => Self::VehiclesUsed,
            0x0506 => Self::Places,
            0x0507 => Self::CurrentUsage,
            0x0508 => Self::ControlActivityData,
            0x050E => Self::CardDownload,
            0x0520 => Self::Identification,
            0x0521 => Self::DrivingLicenceInfo,
            0x0522 => Self::SpecificConditions,
            0x0523 => Self::VehicleUnitsUsed,
            0x0524 => Self::GnssPlaces,
            0x0525 => Self::ApplicationIdentificationV2,
            0xC100 => Self::CardCertificate,
            0xC101 => Self::CardSignCertificate,
            0xC108 => Self::CaCertificate,
            0xC109 => Self::LinkCertificate,
            _ => Self::Unknown,
        }
    }

    /// Certificate EFs never carry a signature record of their own.
    pub fn is_certificate(&self) -> bool {
        matches!(
            self,
            Self::CardCertificate | Self::CardSignCertificate | Self::CaCertificate | Self::LinkCertificate
        )
    }
}

/// Whether a framed card record holds data or the signature of the preceding
/// data record, taken from the low bit of the tag appendix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Data,
    Signature,
}

/// One framed card record: `file_id (2) | appendix (1) | length (2) | value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCardRecord {
    pub file_id: u16,
    pub appendix: u8,
    pub content_type: ContentType,
    pub generation: Generation,
    pub kind: CardFileKind,
    pub value: Vec<u8>,
    pub authentication: Option<AuthResult>,
}

impl RawCardRecord {
    pub fn tag(&self) -> u32 {
        (self.file_id as u32) << 8 | self.appendix as u32
    }

    pub fn is_signature(&self) -> bool {
        self.content_type == ContentType::Signature
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCardFile {
    pub records: Vec<RawCardRecord>,
    /// Set at framing time: the record windows are paint material, and the
    /// parser keeps them on the semantic model.
    pub preserve_raw_data: bool,
}

/// A data range and the signature over it, both relative to the start of the
/// owning VU record's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedSpan {
    pub data_start: usize,
    pub data_end: usize,
    pub signature_start: usize,
    pub signature_end: usize,
}

/// One framed VU transfer block: header `0x76 | trep`, value sized by the
/// per-generation block descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVuRecord {
    pub trep: u8,
    pub generation: Generation,
    pub version: Gen2Version,
    pub value: Vec<u8>,
    pub signed_sections: Vec<SignedSpan>,
    pub authentication: Option<AuthResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVuFile {
    pub records: Vec<RawVuRecord>,
    /// Set at framing time; carried for parity with card files. VU block
    /// values are always framed whole, so nothing further hangs off it.
    pub preserve_raw_data: bool,
}

/// The framed view of a .DDD file, still carrying every input byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RawFile {
    Card(RawCardFile),
    VehicleUnit(RawVuFile),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnmarshalOptions {
    /// Fail on unknown tags instead of carrying them as UNKNOWN records.
    pub strict: bool,
    /// Mark the framed windows as paint material: a later parse retains the
    /// original EF bytes on the semantic model for byte-perfect re-emission,
    /// regardless of what the parse options ask for.
    pub preserve_raw_data: bool,
}

pub const VU_TRANSFER_SID: u8 = 0x76;

/// Frames a .DDD byte stream. Card files are recognized by the EF_ICC magic
/// 0x0002, VU downloads by the 0x76 transfer SID.
pub fn unmarshal(bytes: &[u8], options: &UnmarshalOptions) -> Result<RawFile> {
    if bytes.len() < 2 {
        return Err(Error::Truncated {
            location: crate::error::Location::offset(0),
            detail: format!("input of {} bytes is not a download file", bytes.len()),
        });
    }
    match (bytes[0], bytes[1]) {
        (0x76, _) => Ok(RawFile::VehicleUnit(unmarshal_vu(bytes, options)?)),
        (0x00, 0x02) => Ok(RawFile::Card(unmarshal_card(bytes, options)?)),
        (first, second) => Err(Error::Other(anyhow::anyhow!(
            "unrecognized download file, leading bytes {:#04x} {:#04x}",
            first,
            second
        ))),
    }
}

/// Re-emits a framed file byte-for-byte.
pub fn marshal_raw(raw: &RawFile) -> Vec<u8> {
    match raw {
        RawFile::Card(card) => marshal_raw_card(card),
        RawFile::VehicleUnit(vu) => marshal_raw_vu(vu),
    }
}

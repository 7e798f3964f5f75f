use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where inside the input an error was detected. Offsets are relative to the
/// window the failing decoder was handed, record indexes to the framed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub file_id: Option<u16>,
    pub record_index: Option<usize>,
    pub byte_offset: Option<u64>,
}

impl Location {
    pub fn record(index: usize) -> Self {
        Location {
            record_index: Some(index),
            ..Default::default()
        }
    }
    pub fn file_record(file_id: u16, index: usize) -> Self {
        Location {
            file_id: Some(file_id),
            record_index: Some(index),
            ..Default::default()
        }
    }
    pub fn offset(byte_offset: u64) -> Self {
        Location {
            byte_offset: Some(byte_offset),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file_id) = self.file_id {
            write!(f, "file id {:#06x}", file_id)?;
        }
        if let Some(index) = self.record_index {
            write!(f, " record {}", index)?;
        }
        if let Some(offset) = self.byte_offset {
            write!(f, " offset {}", offset)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("truncated input at {location}: {detail}")]
    Truncated { location: Location, detail: String },

    #[error("invalid length at {location}: expected {expected}, got {actual}")]
    InvalidLength {
        location: Location,
        expected: usize,
        actual: usize,
    },

    #[error("unknown tag {file_id:#06x} at record {record_index}")]
    UnknownTag { file_id: u16, record_index: usize },

    #[error("signature record without matching data record at {location}")]
    DanglingSignature { location: Location },

    #[error("invalid value {value:#04x} for {field} at {location}")]
    InvalidEnumValue {
        location: Location,
        field: &'static str,
        value: u8,
    },

    #[error("string cannot be re-encoded in code page {code_page:#04x}: {value:?}")]
    EncodingLoss { code_page: u8, value: String },

    #[error("signature verification failed at {location}")]
    SignatureInvalid { location: Location },

    #[error("certificate chain could not be verified: {detail}")]
    CertificateUntrusted { detail: String },

    #[error("certificate expired at {expired_at}")]
    CertificateExpired { expired_at: String },

    #[error("unsupported curve {oid}")]
    UnsupportedCurve { oid: String },

    #[error("no certificate resolver could provide {chr}")]
    ResolverUnavailable { chr: String },

    #[error("authentication finished with {failed} of {attempted} records failing")]
    AuthenticationFailed { failed: usize, attempted: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to decode {ef} at {location}")]
    EfDecode {
        ef: &'static str,
        location: Location,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to encode {ef}")]
    EfEncode {
        ef: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

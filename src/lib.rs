//! Reads, verifies and rewrites digital tachograph download files (.DDD) as
//! defined by Regulation (EU) 2016/799 and its predecessors.
//!
//! The pipeline is a stack of small passes over the same bytes:
//!
//! ```text
//! bytes ──▶ unmarshal ──▶ RawFile ──▶ authenticate ──▶ parse ──▶ File
//!                            ▲                                    │
//!                            └──────── marshal ◀──── unparse ◀────┘
//! ```
//!
//! The raw view keeps every input byte; the semantic view is freely mutable
//! (the anonymizer operates on it) and serializes back bit-exactly when the
//! original windows were preserved.

pub mod anon;
pub mod auth;
mod bytes;
pub mod card;
pub mod detector;
pub mod dt;
pub mod error;
pub mod raw;
pub mod vu;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use anon::{anonymize, AnonymizeOptions};
pub use auth::{
    authenticate, authenticate_in_place, AuthSummary, AuthenticateOptions, CancelToken,
};
pub use card::{DriverCardFile, ParseOptions};
pub use error::{Error, Result};
pub use raw::{marshal_raw, unmarshal, AuthOutcome, AuthResult, RawFile, UnmarshalOptions};
pub use vu::VehicleUnitFile;

/// Semantic view of a download file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "kind")]
pub enum File {
    DriverCard(DriverCardFile),
    VehicleUnit(VehicleUnitFile),
}

#[derive(Debug, Clone, Copy)]
pub struct MarshalOptions {
    /// Reuse retained original windows (raw-data painting). Without them,
    /// ring slack and padding are re-rendered canonically and signatures
    /// over rebuilt windows no longer verify.
    pub use_raw_data: bool,
}

impl Default for MarshalOptions {
    fn default() -> Self {
        MarshalOptions { use_raw_data: true }
    }
}

/// Builds the semantic model from a framed file.
pub fn parse(raw: &RawFile, options: &ParseOptions) -> Result<File> {
    match raw {
        RawFile::Card(card) => Ok(File::DriverCard(card::parse_card(card, options)?)),
        RawFile::VehicleUnit(vu) => Ok(File::VehicleUnit(vu::parse_vu(vu)?)),
    }
}

/// Rebuilds the framed view from the semantic model (inverse of [`parse`]).
pub fn unparse(file: &File) -> Result<RawFile> {
    match file {
        File::DriverCard(card) => Ok(RawFile::Card(card::unparse_card(card)?)),
        File::VehicleUnit(vu) => Ok(RawFile::VehicleUnit(vu::unparse_vu(vu)?)),
    }
}

/// Serializes the semantic model back to a .DDD byte stream.
pub fn marshal(file: &File, options: &MarshalOptions) -> Result<Vec<u8>> {
    match file {
        File::DriverCard(card) => {
            if options.use_raw_data {
                card::marshal_card(card)
            } else {
                let mut stripped = card.clone();
                card::clear_raw_data(&mut stripped);
                card::marshal_card(&stripped)
            }
        }
        File::VehicleUnit(vu) => vu::marshal_vu(vu),
    }
}

// Convenience entry points in the spirit of a one-call library surface.

pub fn parse_bytes(bytes: &[u8]) -> Result<File> {
    let raw = unmarshal(bytes, &UnmarshalOptions::default())?;
    parse(&raw, &ParseOptions::default())
}

pub fn parse_file(file_path: &str) -> Result<File> {
    let bytes = std::fs::read(file_path)
        .with_context(|| format!("Failed to read {}", file_path))?;
    parse_bytes(&bytes)
}

pub fn parse_bytes_to_json(bytes: &[u8]) -> Result<String> {
    let file = parse_bytes(bytes)?;
    Ok(serde_json::to_string(&file).context("Failed to render JSON")?)
}

pub fn parse_bytes_to_json_pretty(bytes: &[u8]) -> Result<String> {
    let file = parse_bytes(bytes)?;
    Ok(serde_json::to_string_pretty(&file).context("Failed to render JSON")?)
}

pub fn parse_file_to_json(file_path: &str) -> Result<String> {
    let bytes = std::fs::read(file_path)
        .with_context(|| format!("Failed to read {}", file_path))?;
    parse_bytes_to_json(&bytes)
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
    fn unknown_records_survive_a_lenient_round_trip() {
        let mut bytes = record(0x0002, 0x00, &[0u8; 25]);
        let synthetic = record(0xFFFE, 0x00, &[0xDE, 0xAD, 0xBE, 0xEF]);
        bytes.extend_from_slice(&synthetic);

        let raw = unmarshal(&bytes, &UnmarshalOptions::default()).unwrap();
        let file = parse(&raw, &ParseOptions::default()).unwrap();
        let File::DriverCard(card) = &file else {
            panic!("expected card")
        };
        assert_eq!(card.unknown_records.len(), 1);
        assert_eq!(card.unknown_records[0].file_id, 0xFFFE);

        let out = marshal(&file, &MarshalOptions::default()).unwrap();
        assert!(out
            .windows(synthetic.len())
            .any(|window| window == synthetic.as_slice()));
    }

    #[test]
    fn unmarshal_preserve_flag_threads_into_the_parser() {
        let bytes = record(0x0002, 0x00, &[0u8; 25]);

        let options = UnmarshalOptions {
            preserve_raw_data: true,
            ..Default::default()
        };
        let raw = unmarshal(&bytes, &options).unwrap();
        let file = parse(&raw, &ParseOptions::default()).unwrap();
        let File::DriverCard(card) = &file else {
            panic!("expected card")
        };
        assert!(card.icc.as_ref().unwrap().raw.is_some());

        // Without the framing-time flag (and no parse-time request) the
        // windows are not retained.
        let raw = unmarshal(&bytes, &UnmarshalOptions::default()).unwrap();
        let file = parse(&raw, &ParseOptions::default()).unwrap();
        let File::DriverCard(card) = &file else {
            panic!("expected card")
        };
        assert!(card.icc.as_ref().unwrap().raw.is_none());
    }

    #[test]
    fn strict_mode_rejects_unknown_tags() {
        let mut bytes = record(0x0002, 0x00, &[0u8; 25]);
        bytes.extend_from_slice(&record(0xFFFE, 0x00, &[0u8; 4]));
        let options = UnmarshalOptions {
            strict: true,
            ..Default::default()
        };
        assert!(matches!(
            unmarshal(&bytes, &options),
            Err(Error::UnknownTag { file_id: 0xFFFE, .. })
        ));
    }
}

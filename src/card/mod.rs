use crate::dt::{self, gen1, gen2, Generation};
use crate::error::{Error, Location, Result};
use crate::raw::{CardFileKind, ContentType, RawCardFile, RawCardRecord};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// An elementary file in the semantic model: the decoded body, the signature
/// record that followed it (if any), and optionally the original byte window
/// for round-trip diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ef<T> {
    pub data: T,
    pub signature: Option<Vec<u8>>,
    #[serde(skip)]
    pub raw: Option<Vec<u8>>,
}

impl<T> Ef<T> {
    pub fn new(data: T) -> Self {
        Ef {
            data,
            signature: None,
            raw: None,
        }
    }
}

/// A record whose file id is not in the registry, carried verbatim so a
/// lenient unmarshal → marshal trip reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownRecord {
    pub file_id: u16,
    pub appendix: u8,
    pub value: Vec<u8>,
}

/// DF "Tachograph": the Generation 1 application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gen1Df {
    pub application_identification: Option<Ef<gen1::ApplicationIdentification>>,
    pub identification: Option<Ef<dt::Identification>>,
    pub driving_licence_info: Option<Ef<dt::CardDrivingLicenceInformation>>,
    pub events_data: Option<Ef<gen1::CardEventData>>,
    pub faults_data: Option<Ef<gen1::CardFaultData>>,
    pub driver_activity_data: Option<Ef<dt::DriverActivityData>>,
    pub vehicles_used: Option<Ef<gen1::CardVehiclesUsed>>,
    pub places: Option<Ef<gen1::CardPlaceDailyWorkPeriod>>,
    pub current_usage: Option<Ef<dt::CardCurrentUse>>,
    pub control_activity_data: Option<Ef<gen1::CardControlActivityDataRecord>>,
    pub specific_conditions: Option<Ef<gen1::SpecificConditions>>,
    pub card_download: Option<Ef<dt::CardDownload>>,
    pub card_certificate: Option<Ef<gen1::Certificate>>,
    pub ca_certificate: Option<Ef<gen1::Certificate>>,
}

/// DF "Tachograph_G2": the Generation 2 application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gen2Df {
    pub application_identification: Option<Ef<gen2::ApplicationIdentificationGen2>>,
    pub application_identification_v2: Option<Ef<gen2::ApplicationIdentificationV2>>,
    pub identification: Option<Ef<dt::Identification>>,
    pub driving_licence_info: Option<Ef<dt::CardDrivingLicenceInformation>>,
    pub events_data: Option<Ef<gen1::CardEventData>>,
    pub faults_data: Option<Ef<gen1::CardFaultData>>,
    pub driver_activity_data: Option<Ef<dt::DriverActivityData>>,
    pub vehicles_used: Option<Ef<gen2::CardVehiclesUsedGen2>>,
    pub places: Option<Ef<gen2::CardPlaceDailyWorkPeriodGen2>>,
    pub current_usage: Option<Ef<dt::CardCurrentUse>>,
    pub control_activity_data: Option<Ef<gen1::CardControlActivityDataRecord>>,
    pub specific_conditions: Option<Ef<gen1::SpecificConditions>>,
    pub card_download: Option<Ef<dt::CardDownload>>,
    pub vehicle_units_used: Option<Ef<gen2::CardVehicleUnitsUsed>>,
    pub gnss_places: Option<Ef<gen2::GnssAccumulatedDriving>>,
    pub card_ma_certificate: Option<Ef<gen2::CertificateGen2>>,
    pub card_sign_certificate: Option<Ef<gen2::CertificateGen2>>,
    pub ca_certificate: Option<Ef<gen2::CertificateGen2>>,
    pub link_certificate: Option<Ef<gen2::CertificateGen2>>,
}

/// Semantic view of a driver card download: the master file plus up to one
/// DF per generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverCardFile {
    pub icc: Option<Ef<dt::CardIccIdentification>>,
    pub ic: Option<Ef<dt::CardChipIdentification>>,
    pub tachograph: Option<Gen1Df>,
    pub tachograph_g2: Option<Gen2Df>,
    pub unknown_records: Vec<UnknownRecord>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Keep original EF windows on the semantic model. Also enabled when
    /// the RawFile was framed with `UnmarshalOptions::preserve_raw_data`.
    pub preserve_raw_data: bool,
}

fn ef_fixed<T>(
    record: &RawCardRecord,
    index: usize,
    ef_name: &'static str,
    expected_size: usize,
    preserve_raw_data: bool,
    parse: impl FnOnce(&mut Cursor<&[u8]>) -> anyhow::Result<T>,
) -> Result<Ef<T>> {
    if record.value.len() != expected_size {
        return Err(Error::InvalidLength {
            location: Location::file_record(record.file_id, index),
            expected: expected_size,
            actual: record.value.len(),
        });
    }
    ef_dyn(record, index, ef_name, preserve_raw_data, |cursor, _| {
        parse(cursor)
    })
}

fn ef_dyn<T>(
    record: &RawCardRecord,
    index: usize,
    ef_name: &'static str,
    preserve_raw_data: bool,
    parse: impl FnOnce(&mut Cursor<&[u8]>, usize) -> anyhow::Result<T>,
) -> Result<Ef<T>> {
    let mut cursor = Cursor::new(record.value.as_slice());
    let data = parse(&mut cursor, record.value.len()).map_err(|source| Error::EfDecode {
        ef: ef_name,
        location: Location {
            file_id: Some(record.file_id),
            record_index: Some(index),
            byte_offset: Some(cursor.position()),
        },
        source,
    })?;
    let consumed = cursor.position() as usize;
    if consumed < record.value.len() {
        log::warn!(
            "{} left {} of {} bytes unread",
            ef_name,
            record.value.len() - consumed,
            record.value.len()
        );
    }
    Ok(Ef {
        data,
        signature: None,
        raw: preserve_raw_data.then(|| record.value.clone()),
    })
}

macro_rules! set_ef {
    ($slot:expr, $name:literal, $ef:expr, $signature:expr) => {{
        if $slot.is_some() {
            return Err(Error::Other(anyhow::anyhow!(
                "duplicate {} record in card file",
                $name
            )));
        }
        let mut ef = $ef;
        ef.signature = $signature;
        $slot = Some(ef);
    }};
}

/// Builds the semantic card model from framed records. Records are visited
/// in framing order; the signature record following a data record (same file
/// id, signature appendix bit set) is attached to the decoded EF. Original
/// windows are retained when either the parse options or the framing-time
/// flag on the RawFile ask for it.
pub fn parse_card(raw: &RawCardFile, options: &ParseOptions) -> Result<DriverCardFile> {
    let preserve = options.preserve_raw_data || raw.preserve_raw_data;
    let mut file = DriverCardFile::default();

    let mut index = 0usize;
    while index < raw.records.len() {
        let record = &raw.records[index];
        if record.content_type == ContentType::Signature {
            // The framer pairs signatures with their data record; reaching
            // one here means the pairing invariant was broken upstream.
            return Err(Error::DanglingSignature {
                location: Location::file_record(record.file_id, index),
            });
        }

        // Lookahead for this record's signature, identified by the appendix
        // bit rather than by adjacency alone.
        let signature = raw
            .records
            .get(index + 1)
            .filter(|next| {
                next.content_type == ContentType::Signature
                    && next.file_id == record.file_id
                    && next.generation == record.generation
            })
            .map(|next| next.value.clone());
        let consumed = 1 + usize::from(signature.is_some());

        if record.kind == CardFileKind::Unknown {
            log::debug!(
                "Skipping unknown file id {:#06x} at record {}",
                record.file_id,
                index
            );
            file.unknown_records.push(UnknownRecord {
                file_id: record.file_id,
                appendix: record.appendix,
                value: record.value.clone(),
            });
            if let Some(next) = raw.records.get(index + 1) {
                if signature.is_some() {
                    file.unknown_records.push(UnknownRecord {
                        file_id: next.file_id,
                        appendix: next.appendix,
                        value: next.value.clone(),
                    });
                }
            }
            index += consumed;
            continue;
        }

        match (record.kind, record.generation) {
            (CardFileKind::Icc, _) => {
                let ef = ef_fixed(
                    record,
                    index,
                    "EF_ICC",
                    dt::CardIccIdentification::SIZE,
                    preserve,
                    dt::CardIccIdentification::parse,
                )?;
                set_ef!(file.icc, "EF_ICC", ef, signature);
            }
            (CardFileKind::Ic, _) => {
                let ef = ef_fixed(
                    record,
                    index,
                    "EF_IC",
                    dt::CardChipIdentification::SIZE,
                    preserve,
                    dt::CardChipIdentification::parse,
                )?;
                set_ef!(file.ic, "EF_IC", ef, signature);
            }
            (kind, Generation::Gen1) => {
                let df = file.tachograph.get_or_insert_with(Gen1Df::default);
                match kind {
                    CardFileKind::ApplicationIdentification => set_ef!(
                        df.application_identification,
                        "EF_Application_Identification",
                        ef_fixed(
                            record,
                            index,
                            "EF_Application_Identification",
                            gen1::ApplicationIdentification::SIZE,
                            preserve,
                            gen1::ApplicationIdentification::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::Identification => set_ef!(
                        df.identification,
                        "EF_Identification",
                        ef_fixed(
                            record,
                            index,
                            "EF_Identification",
                            dt::Identification::SIZE,
                            preserve,
                            dt::Identification::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::DrivingLicenceInfo => set_ef!(
                        df.driving_licence_info,
                        "EF_Driving_Licence_Info",
                        ef_fixed(
                            record,
                            index,
                            "EF_Driving_Licence_Info",
                            dt::CardDrivingLicenceInformation::SIZE,
                            preserve,
                            dt::CardDrivingLicenceInformation::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::EventsData => set_ef!(
                        df.events_data,
                        "EF_Events_Data",
                        ef_dyn(
                            record,
                            index,
                            "EF_Events_Data",
                            preserve,
                            gen1::CardEventData::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::FaultsData => set_ef!(
                        df.faults_data,
                        "EF_Faults_Data",
                        ef_dyn(
                            record,
                            index,
                            "EF_Faults_Data",
                            preserve,
                            gen1::CardFaultData::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::DriverActivityData => set_ef!(
                        df.driver_activity_data,
                        "EF_Driver_Activity_Data",
                        ef_dyn(
                            record,
                            index,
                            "EF_Driver_Activity_Data",
                            preserve,
                            dt::DriverActivityData::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::VehiclesUsed => set_ef!(
                        df.vehicles_used,
                        "EF_Vehicles_Used",
                        ef_dyn(
                            record,
                            index,
                            "EF_Vehicles_Used",
                            preserve,
                            gen1::CardVehiclesUsed::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::Places => set_ef!(
                        df.places,
                        "EF_Places",
                        ef_dyn(
                            record,
                            index,
                            "EF_Places",
                            preserve,
                            gen1::CardPlaceDailyWorkPeriod::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CurrentUsage => set_ef!(
                        df.current_usage,
                        "EF_Current_Usage",
                        ef_fixed(
                            record,
                            index,
                            "EF_Current_Usage",
                            dt::CardCurrentUse::SIZE,
                            preserve,
                            dt::CardCurrentUse::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::ControlActivityData => set_ef!(
                        df.control_activity_data,
                        "EF_Control_Activity_Data",
                        ef_fixed(
                            record,
                            index,
                            "EF_Control_Activity_Data",
                            gen1::CardControlActivityDataRecord::SIZE,
                            preserve,
                            gen1::CardControlActivityDataRecord::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::SpecificConditions => set_ef!(
                        df.specific_conditions,
                        "EF_Specific_Conditions",
                        ef_dyn(
                            record,
                            index,
                            "EF_Specific_Conditions",
                            preserve,
                            gen1::SpecificConditions::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CardDownload => set_ef!(
                        df.card_download,
                        "EF_Card_Download",
                        ef_fixed(
                            record,
                            index,
                            "EF_Card_Download",
                            dt::CardDownload::SIZE,
                            preserve,
                            dt::CardDownload::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::CardCertificate => set_ef!(
                        df.card_certificate,
                        "EF_Card_Certificate",
                        ef_dyn(
                            record,
                            index,
                            "EF_Card_Certificate",
                            preserve,
                            gen1::Certificate::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CaCertificate => set_ef!(
                        df.ca_certificate,
                        "EF_CA_Certificate",
                        ef_dyn(
                            record,
                            index,
                            "EF_CA_Certificate",
                            preserve,
                            gen1::Certificate::parse_dyn_size,
                        )?,
                        signature
                    ),
                    _ => {
                        log::warn!(
                            "File id {:#06x} is not part of the Gen1 DF, carrying verbatim",
                            record.file_id
                        );
                        file.unknown_records.push(UnknownRecord {
                            file_id: record.file_id,
                            appendix: record.appendix,
                            value: record.value.clone(),
                        });
                    }
                }
            }
            (kind, Generation::Gen2) => {
                let df = file.tachograph_g2.get_or_insert_with(Gen2Df::default);
                match kind {
                    CardFileKind::ApplicationIdentification => set_ef!(
                        df.application_identification,
                        "EF_Application_Identification_G2",
                        ef_fixed(
                            record,
                            index,
                            "EF_Application_Identification_G2",
                            gen2::ApplicationIdentificationGen2::SIZE,
                            preserve,
                            gen2::ApplicationIdentificationGen2::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::ApplicationIdentificationV2 => set_ef!(
                        df.application_identification_v2,
                        "EF_Application_Identification_V2",
                        ef_fixed(
                            record,
                            index,
                            "EF_Application_Identification_V2",
                            gen2::ApplicationIdentificationV2::SIZE,
                            preserve,
                            gen2::ApplicationIdentificationV2::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::Identification => set_ef!(
                        df.identification,
                        "EF_Identification_G2",
                        ef_fixed(
                            record,
                            index,
                            "EF_Identification_G2",
                            dt::Identification::SIZE,
                            preserve,
                            dt::Identification::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::DrivingLicenceInfo => set_ef!(
                        df.driving_licence_info,
                        "EF_Driving_Licence_Info_G2",
                        ef_fixed(
                            record,
                            index,
                            "EF_Driving_Licence_Info_G2",
                            dt::CardDrivingLicenceInformation::SIZE,
                            preserve,
                            dt::CardDrivingLicenceInformation::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::EventsData => set_ef!(
                        df.events_data,
                        "EF_Events_Data_G2",
                        ef_dyn(
                            record,
                            index,
                            "EF_Events_Data_G2",
                            preserve,
                            gen1::CardEventData::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::FaultsData => set_ef!(
                        df.faults_data,
                        "EF_Faults_Data_G2",
                        ef_dyn(
                            record,
                            index,
                            "EF_Faults_Data_G2",
                            preserve,
                            gen1::CardFaultData::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::DriverActivityData => set_ef!(
                        df.driver_activity_data,
                        "EF_Driver_Activity_Data_G2",
                        ef_dyn(
                            record,
                            index,
                            "EF_Driver_Activity_Data_G2",
                            preserve,
                            dt::DriverActivityData::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::VehiclesUsed => set_ef!(
                        df.vehicles_used,
                        "EF_Vehicles_Used_G2",
                        ef_dyn(
                            record,
                            index,
                            "EF_Vehicles_Used_G2",
                            preserve,
                            gen2::CardVehiclesUsedGen2::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::Places => set_ef!(
                        df.places,
                        "EF_Places_G2",
                        ef_dyn(
                            record,
                            index,
                            "EF_Places_G2",
                            preserve,
                            gen2::CardPlaceDailyWorkPeriodGen2::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CurrentUsage => set_ef!(
                        df.current_usage,
                        "EF_Current_Usage_G2",
                        ef_fixed(
                            record,
                            index,
                            "EF_Current_Usage_G2",
                            dt::CardCurrentUse::SIZE,
                            preserve,
                            dt::CardCurrentUse::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::ControlActivityData => set_ef!(
                        df.control_activity_data,
                        "EF_Control_Activity_Data_G2",
                        ef_fixed(
                            record,
                            index,
                            "EF_Control_Activity_Data_G2",
                            gen1::CardControlActivityDataRecord::SIZE,
                            preserve,
                            gen1::CardControlActivityDataRecord::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::SpecificConditions => set_ef!(
                        df.specific_conditions,
                        "EF_Specific_Conditions_G2",
                        ef_dyn(
                            record,
                            index,
                            "EF_Specific_Conditions_G2",
                            preserve,
                            gen1::SpecificConditions::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CardDownload => set_ef!(
                        df.card_download,
                        "EF_Card_Download_G2",
                        ef_fixed(
                            record,
                            index,
                            "EF_Card_Download_G2",
                            dt::CardDownload::SIZE,
                            preserve,
                            dt::CardDownload::parse,
                        )?,
                        signature
                    ),
                    CardFileKind::VehicleUnitsUsed => set_ef!(
                        df.vehicle_units_used,
                        "EF_VehicleUnits_Used",
                        ef_dyn(
                            record,
                            index,
                            "EF_VehicleUnits_Used",
                            preserve,
                            gen2::CardVehicleUnitsUsed::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::GnssPlaces => set_ef!(
                        df.gnss_places,
                        "EF_GNSS_Places",
                        ef_dyn(
                            record,
                            index,
                            "EF_GNSS_Places",
                            preserve,
                            gen2::GnssAccumulatedDriving::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CardCertificate => set_ef!(
                        df.card_ma_certificate,
                        "EF_CardMA_Certificate",
                        ef_dyn(
                            record,
                            index,
                            "EF_CardMA_Certificate",
                            preserve,
                            gen2::CertificateGen2::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CardSignCertificate => set_ef!(
                        df.card_sign_certificate,
                        "EF_CardSign_Certificate",
                        ef_dyn(
                            record,
                            index,
                            "EF_CardSign_Certificate",
                            preserve,
                            gen2::CertificateGen2::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::CaCertificate => set_ef!(
                        df.ca_certificate,
                        "EF_CA_Certificate_G2",
                        ef_dyn(
                            record,
                            index,
                            "EF_CA_Certificate_G2",
                            preserve,
                            gen2::CertificateGen2::parse_dyn_size,
                        )?,
                        signature
                    ),
                    CardFileKind::LinkCertificate => set_ef!(
                        df.link_certificate,
                        "EF_Link_Certificate",
                        ef_dyn(
                            record,
                            index,
                            "EF_Link_Certificate",
                            preserve,
                            gen2::CertificateGen2::parse_dyn_size,
                        )?,
                        signature
                    ),
                    _ => {
                        log::warn!(
                            "File id {:#06x} is not part of the Gen2 DF, carrying verbatim",
                            record.file_id
                        );
                        file.unknown_records.push(UnknownRecord {
                            file_id: record.file_id,
                            appendix: record.appendix,
                            value: record.value.clone(),
                        });
                    }
                }
            }
        }
        index += consumed;
    }

    Ok(file)
}

fn data_appendix(generation: Generation) -> u8 {
    match generation {
        Generation::Gen1 => 0x00,
        Generation::Gen2 => 0x02,
    }
}

fn push_ef<T>(
    records: &mut Vec<RawCardRecord>,
    ef: &Option<Ef<T>>,
    ef_name: &'static str,
    file_id: u16,
    generation: Generation,
    encode: impl Fn(&T, &mut Vec<u8>) -> anyhow::Result<()>,
) -> Result<()> {
    let Some(ef) = ef else { return Ok(()) };
    let mut value = Vec::new();
    encode(&ef.data, &mut value).map_err(|source| Error::EfEncode {
        ef: ef_name,
        source,
    })?;
    if let Some(raw) = &ef.raw {
        if raw.len() != value.len() {
            log::warn!(
                "{} rebuilt at {} bytes instead of the original {}; signatures over it will not verify",
                ef_name,
                value.len(),
                raw.len()
            );
        }
    }
    let appendix = data_appendix(generation);
    let kind = CardFileKind::from_file_id(file_id);
    records.push(RawCardRecord {
        file_id,
        appendix,
        content_type: ContentType::Data,
        generation,
        kind,
        value,
        authentication: None,
    });
    if let Some(signature) = &ef.signature {
        records.push(RawCardRecord {
            file_id,
            appendix: appendix | 0x01,
            content_type: ContentType::Signature,
            generation,
            kind,
            value: signature.clone(),
            authentication: None,
        });
    }
    Ok(())
}

/// Rebuilds the framed view from the semantic model. Records are emitted in
/// regulation order (MF, Gen1 DF, Gen2 DF, certificates last within each
/// DF), which need not match the order of the parsed input. Unknown records
/// are re-emitted after everything else.
pub fn unparse_card(file: &DriverCardFile) -> Result<RawCardFile> {
    let mut records = Vec::new();

    push_ef(
        &mut records,
        &file.icc,
        "EF_ICC",
        0x0002,
        Generation::Gen1,
        dt::CardIccIdentification::encode,
    )?;
    push_ef(
        &mut records,
        &file.ic,
        "EF_IC",
        0x0005,
        Generation::Gen1,
        dt::CardChipIdentification::encode,
    )?;

    if let Some(df) = &file.tachograph {
        let gen = Generation::Gen1;
        push_ef(
            &mut records,
            &df.application_identification,
            "EF_Application_Identification",
            0x0501,
            gen,
            gen1::ApplicationIdentification::encode,
        )?;
        push_ef(
            &mut records,
            &df.identification,
            "EF_Identification",
            0x0520,
            gen,
            dt::Identification::encode,
        )?;
        push_ef(
            &mut records,
            &df.driving_licence_info,
            "EF_Driving_Licence_Info",
            0x0521,
            gen,
            dt::CardDrivingLicenceInformation::encode,
        )?;
        push_ef(
            &mut records,
            &df.events_data,
            "EF_Events_Data",
            0x0502,
            gen,
            gen1::CardEventData::encode,
        )?;
        push_ef(
            &mut records,
            &df.faults_data,
            "EF_Faults_Data",
            0x0503,
            gen,
            gen1::CardFaultData::encode,
        )?;
        push_ef(
            &mut records,
            &df.driver_activity_data,
            "EF_Driver_Activity_Data",
            0x0504,
            gen,
            dt::DriverActivityData::encode,
        )?;
        push_ef(
            &mut records,
            &df.vehicles_used,
            "EF_Vehicles_Used",
            0x0505,
            gen,
            gen1::CardVehiclesUsed::encode,
        )?;
        push_ef(
            &mut records,
            &df.places,
            "EF_Places",
            0x0506,
            gen,
            gen1::CardPlaceDailyWorkPeriod::encode,
        )?;
        push_ef(
            &mut records,
            &df.current_usage,
            "EF_Current_Usage",
            0x0507,
            gen,
            dt::CardCurrentUse::encode,
        )?;
        push_ef(
            &mut records,
            &df.control_activity_data,
            "EF_Control_Activity_Data",
            0x0508,
            gen,
            gen1::CardControlActivityDataRecord::encode,
        )?;
        push_ef(
            &mut records,
            &df.specific_conditions,
            "EF_Specific_Conditions",
            0x0522,
            gen,
            gen1::SpecificConditions::encode,
        )?;
        push_ef(
            &mut records,
            &df.card_download,
            "EF_Card_Download",
            0x050E,
            gen,
            dt::CardDownload::encode,
        )?;
        push_ef(
            &mut records,
            &df.card_certificate,
            "EF_Card_Certificate",
            0xC100,
            gen,
            gen1::Certificate::encode,
        )?;
        push_ef(
            &mut records,
            &df.ca_certificate,
            "EF_CA_Certificate",
            0xC108,
            gen,
            gen1::Certificate::encode,
        )?;
    }

    if let Some(df) = &file.tachograph_g2 {
        let gen = Generation::Gen2;
        push_ef(
            &mut records,
            &df.application_identification,
            "EF_Application_Identification_G2",
            0x0501,
            gen,
            gen2::ApplicationIdentificationGen2::encode,
        )?;
        push_ef(
            &mut records,
            &df.application_identification_v2,
            "EF_Application_Identification_V2",
            0x0525,
            gen,
            gen2::ApplicationIdentificationV2::encode,
        )?;
        push_ef(
            &mut records,
            &df.identification,
            "EF_Identification_G2",
            0x0520,
            gen,
            dt::Identification::encode,
        )?;
        push_ef(
            &mut records,
            &df.driving_licence_info,
            "EF_Driving_Licence_Info_G2",
            0x0521,
            gen,
            dt::CardDrivingLicenceInformation::encode,
        )?;
        push_ef(
            &mut records,
            &df.events_data,
            "EF_Events_Data_G2",
            0x0502,
            gen,
            gen1::CardEventData::encode,
        )?;
        push_ef(
            &mut records,
            &df.faults_data,
            "EF_Faults_Data_G2",
            0x0503,
            gen,
            gen1::CardFaultData::encode,
        )?;
        push_ef(
            &mut records,
            &df.driver_activity_data,
            "EF_Driver_Activity_Data_G2",
            0x0504,
            gen,
            dt::DriverActivityData::encode,
        )?;
        push_ef(
            &mut records,
            &df.vehicles_used,
            "EF_Vehicles_Used_G2",
            0x0505,
            gen,
            gen2::CardVehiclesUsedGen2::encode,
        )?;
        push_ef(
            &mut records,
            &df.places,
            "EF_Places_G2",
            0x0506,
            gen,
            gen2::CardPlaceDailyWorkPeriodGen2::encode,
        )?;
        push_ef(
            &mut records,
            &df.current_usage,
            "EF_Current_Usage_G2",
            0x0507,
            gen,
            dt::CardCurrentUse::encode,
        )?;
        push_ef(
            &mut records,
            &df.control_activity_data,
            "EF_Control_Activity_Data_G2",
            0x0508,
            gen,
            gen1::CardControlActivityDataRecord::encode,
        )?;
        push_ef(
            &mut records,
            &df.specific_conditions,
            "EF_Specific_Conditions_G2",
            0x0522,
            gen,
            gen1::SpecificConditions::encode,
        )?;
        push_ef(
            &mut records,
            &df.card_download,
            "EF_Card_Download_G2",
            0x050E,
            gen,
            dt::CardDownload::encode,
        )?;
        push_ef(
            &mut records,
            &df.vehicle_units_used,
            "EF_VehicleUnits_Used",
            0x0523,
            gen,
            gen2::CardVehicleUnitsUsed::encode,
        )?;
        push_ef(
            &mut records,
            &df.gnss_places,
            "EF_GNSS_Places",
            0x0524,
            gen,
            gen2::GnssAccumulatedDriving::encode,
        )?;
        push_ef(
            &mut records,
            &df.card_ma_certificate,
            "EF_CardMA_Certificate",
            0xC100,
            gen,
            gen2::CertificateGen2::encode,
        )?;
        push_ef(
            &mut records,
            &df.card_sign_certificate,
            "EF_CardSign_Certificate",
            0xC101,
            gen,
            gen2::CertificateGen2::encode,
        )?;
        push_ef(
            &mut records,
            &df.ca_certificate,
            "EF_CA_Certificate_G2",
            0xC108,
            gen,
            gen2::CertificateGen2::encode,
        )?;
        push_ef(
            &mut records,
            &df.link_certificate,
            "EF_Link_Certificate",
            0xC109,
            gen,
            gen2::CertificateGen2::encode,
        )?;
    }

    for unknown in &file.unknown_records {
        let content_type = if unknown.appendix & 0x01 == 0 {
            ContentType::Data
        } else {
            ContentType::Signature
        };
        let generation = if unknown.appendix & 0x02 == 0 {
            Generation::Gen1
        } else {
            Generation::Gen2
        };
        records.push(RawCardRecord {
            file_id: unknown.file_id,
            appendix: unknown.appendix,
            content_type,
            generation,
            kind: CardFileKind::Unknown,
            value: unknown.value.clone(),
            authentication: None,
        });
    }

    // The emitted record values are exact canonical windows, so the framed
    // view qualifies as paint material.
    Ok(RawCardFile {
        records,
        preserve_raw_data: true,
    })
}

/// Clears every signature slot; used after anonymization, where re-encoded
/// content can no longer match the original signatures.
pub fn clear_signatures(file: &mut DriverCardFile) {
    fn clear<T>(ef: &mut Option<Ef<T>>) {
        if let Some(ef) = ef {
            ef.signature = None;
        }
    }
    clear(&mut file.icc);
    clear(&mut file.ic);
    if let Some(df) = &mut file.tachograph {
        clear(&mut df.application_identification);
        clear(&mut df.identification);
        clear(&mut df.driving_licence_info);
        clear(&mut df.events_data);
        clear(&mut df.faults_data);
        clear(&mut df.driver_activity_data);
        clear(&mut df.vehicles_used);
        clear(&mut df.places);
        clear(&mut df.current_usage);
        clear(&mut df.control_activity_data);
        clear(&mut df.specific_conditions);
        clear(&mut df.card_download);
    }
    if let Some(df) = &mut file.tachograph_g2 {
        clear(&mut df.application_identification);
        clear(&mut df.application_identification_v2);
        clear(&mut df.identification);
        clear(&mut df.driving_licence_info);
        clear(&mut df.events_data);
        clear(&mut df.faults_data);
        clear(&mut df.driver_activity_data);
        clear(&mut df.vehicles_used);
        clear(&mut df.places);
        clear(&mut df.current_usage);
        clear(&mut df.control_activity_data);
        clear(&mut df.specific_conditions);
        clear(&mut df.card_download);
        clear(&mut df.vehicle_units_used);
        clear(&mut df.gnss_places);
    }
}

/// Drops every retained original window, forcing the next marshal to
/// rebuild all EF bodies from semantic state alone. Slack bytes are then
/// re-rendered canonically, which breaks signature validity over rebuilt
/// windows; the encoders log the fallback.
pub fn clear_raw_data(file: &mut DriverCardFile) {
    fn clear_ef<T>(ef: &mut Option<Ef<T>>, clear_inner: impl Fn(&mut T)) {
        if let Some(ef) = ef {
            ef.raw = None;
            clear_inner(&mut ef.data);
        }
    }
    fn keep<T>(_: &mut T) {}

    clear_ef(&mut file.icc, keep);
    clear_ef(&mut file.ic, keep);
    if let Some(df) = &mut file.tachograph {
        clear_ef(&mut df.application_identification, keep);
        clear_ef(&mut df.identification, keep);
        clear_ef(&mut df.driving_licence_info, keep);
        clear_ef(&mut df.events_data, |data| data.0.clear_raw());
        clear_ef(&mut df.faults_data, |data| data.0.clear_raw());
        clear_ef(&mut df.driver_activity_data, |data| data.clear_canvas());
        clear_ef(&mut df.vehicles_used, |data| data.0.clear_raw());
        clear_ef(&mut df.places, |data| data.0.clear_raw());
        clear_ef(&mut df.current_usage, keep);
        clear_ef(&mut df.control_activity_data, keep);
        clear_ef(&mut df.specific_conditions, |data| data.0.clear_raw());
        clear_ef(&mut df.card_download, keep);
        clear_ef(&mut df.card_certificate, keep);
        clear_ef(&mut df.ca_certificate, keep);
    }
    if let Some(df) = &mut file.tachograph_g2 {
        clear_ef(&mut df.application_identification, keep);
        clear_ef(&mut df.application_identification_v2, keep);
        clear_ef(&mut df.identification, keep);
        clear_ef(&mut df.driving_licence_info, keep);
        clear_ef(&mut df.events_data, |data| data.0.clear_raw());
        clear_ef(&mut df.faults_data, |data| data.0.clear_raw());
        clear_ef(&mut df.driver_activity_data, |data| data.clear_canvas());
        clear_ef(&mut df.vehicles_used, |data| data.0.clear_raw());
        clear_ef(&mut df.places, |data| data.0.clear_raw());
        clear_ef(&mut df.current_usage, keep);
        clear_ef(&mut df.control_activity_data, keep);
        clear_ef(&mut df.specific_conditions, |data| data.0.clear_raw());
        clear_ef(&mut df.card_download, keep);
        clear_ef(&mut df.vehicle_units_used, |data| data.0.clear_raw());
        clear_ef(&mut df.gnss_places, |data| data.0.clear_raw());
        clear_ef(&mut df.card_ma_certificate, keep);
        clear_ef(&mut df.card_sign_certificate, keep);
        clear_ef(&mut df.ca_certificate, keep);
        clear_ef(&mut df.link_certificate, keep);
    }
}

/// Frames and serializes in one step.
pub fn marshal_card(file: &DriverCardFile) -> Result<Vec<u8>> {
    Ok(crate::raw::marshal_raw_card(&unparse_card(file)?))
}

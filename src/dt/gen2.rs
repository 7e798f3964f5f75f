use super::external::*;
use super::gen1::{
    PlaceRecord, VuDetailedSpeedBlock, VuDownloadablePeriod, VuIdentification,
    VuOverSpeedingControlData,
};
use super::*;
use crate::bytes::{write_u16_be, TakeExact};
use anyhow::{Context, Result};
use byteorder::{BigEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};

/// One-byte generation indicator attached to Gen2 card numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationIndicator {
    Gen1,
    Gen2,
    Unrecognized(u8),
}

impl GenerationIndicator {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read generation indicator")?;
        Ok(match value {
            0x01 => Self::Gen1,
            0x02 => Self::Gen2,
            other => Self::Unrecognized(other),
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(match self {
            Self::Gen1 => 0x01,
            Self::Gen2 => 0x02,
            Self::Unrecognized(other) => *other,
        });
        Ok(())
    }
}

/// [FullCardNumberAndGeneration: appendix 2.74.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e21464)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullCardNumberAndGeneration {
    pub full_card_number: FullCardNumber,
    pub generation: GenerationIndicator,
}

impl FullCardNumberAndGeneration {
    pub const SIZE: usize = FullCardNumber::SIZE + 1;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(FullCardNumberAndGeneration {
            full_card_number: FullCardNumber::parse(cursor)?,
            generation: GenerationIndicator::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full_card_number.encode(out)?;
        self.generation.encode(out)?;
        Ok(())
    }
}

/// [DriverCardApplicationIdentification: appendix 2.61.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e19806) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationIdentificationGen2 {
    pub type_of_tachograph_card_id: EquipmentType,
    pub card_structure_version: CardStructureVersion,
    pub no_of_events_per_type: u8,
    pub no_of_faults_per_type: u8,
    pub activity_structure_length: u16,
    pub no_of_card_vehicle_records: u16,
    pub no_of_card_place_records: u16,
    pub no_of_gnss_ad_records: u16,
    pub no_of_specific_condition_records: u16,
    pub no_of_card_vehicle_unit_records: u16,
}

impl ApplicationIdentificationGen2 {
    pub const SIZE: usize = 17;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(ApplicationIdentificationGen2 {
            type_of_tachograph_card_id: EquipmentType::parse(cursor)?,
            card_structure_version: CardStructureVersion::parse(cursor)?,
            no_of_events_per_type: cursor
                .read_u8()
                .context("Failed to read no_of_events_per_type")?,
            no_of_faults_per_type: cursor
                .read_u8()
                .context("Failed to read no_of_faults_per_type")?,
            activity_structure_length: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read activity_structure_length")?,
            no_of_card_vehicle_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_card_vehicle_records")?,
            no_of_card_place_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_card_place_records")?,
            no_of_gnss_ad_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_gnss_ad_records")?,
            no_of_specific_condition_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_specific_condition_records")?,
            no_of_card_vehicle_unit_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_card_vehicle_unit_records")?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.type_of_tachograph_card_id.encode(out)?;
        self.card_structure_version.encode(out)?;
        out.push(self.no_of_events_per_type);
        out.push(self.no_of_faults_per_type);
        write_u16_be(out, self.activity_structure_length);
        write_u16_be(out, self.no_of_card_vehicle_records);
        write_u16_be(out, self.no_of_card_place_records);
        write_u16_be(out, self.no_of_gnss_ad_records);
        write_u16_be(out, self.no_of_specific_condition_records);
        write_u16_be(out, self.no_of_card_vehicle_unit_records);
        Ok(())
    }
}

/// EF_Application_Identification_V2: counters added by the second version of
/// the Generation 2 card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationIdentificationV2 {
    pub no_of_border_crossing_records: u16,
    pub no_of_load_unload_records: u16,
    pub no_of_load_type_entry_records: u16,
    pub vu_configuration_length_range: u16,
}

impl ApplicationIdentificationV2 {
    pub const SIZE: usize = 8;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(ApplicationIdentificationV2 {
            no_of_border_crossing_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_border_crossing_records")?,
            no_of_load_unload_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_load_unload_records")?,
            no_of_load_type_entry_records: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read no_of_load_type_entry_records")?,
            vu_configuration_length_range: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read vu_configuration_length_range")?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u16_be(out, self.no_of_border_crossing_records);
        write_u16_be(out, self.no_of_load_unload_records);
        write_u16_be(out, self.no_of_load_type_entry_records);
        write_u16_be(out, self.vu_configuration_length_range);
        Ok(())
    }
}

/// [CardVehicleRecord: appendix 2.37.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e18163) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVehicleRecordGen2 {
    pub vehicle_odometer_begin: OdometerShort,
    pub vehicle_odometer_end: OdometerShort,
    pub vehicle_first_use: TimeReal,
    pub vehicle_last_use: TimeReal,
    pub vehicle_registration: VehicleRegistrationIdentification,
    pub vu_data_block_counter: VuDataBlockCounter,
    pub vehicle_identification_number: VehicleIdentificationNumber,
}

impl CardVehicleRecordGen2 {
    pub const SIZE: usize = 48;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(CardVehicleRecordGen2 {
            vehicle_odometer_begin: OdometerShort::parse(cursor)?,
            vehicle_odometer_end: OdometerShort::parse(cursor)?,
            vehicle_first_use: TimeReal::parse(cursor)?,
            vehicle_last_use: TimeReal::parse(cursor)?,
            vehicle_registration: VehicleRegistrationIdentification::parse(cursor)?,
            vu_data_block_counter: VuDataBlockCounter::parse(cursor)?,
            vehicle_identification_number: VehicleIdentificationNumber::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.vehicle_odometer_begin.encode(out)?;
        self.vehicle_odometer_end.encode(out)?;
        self.vehicle_first_use.encode(out)?;
        self.vehicle_last_use.encode(out)?;
        self.vehicle_registration.encode(out)?;
        self.vu_data_block_counter.encode(out)?;
        self.vehicle_identification_number.encode(out)?;
        Ok(())
    }
}

/// EF_Vehicles_Used body, Generation 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVehiclesUsedGen2(pub RingArray<CardVehicleRecordGen2>);

impl CardVehiclesUsedGen2 {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Self> {
        Ok(CardVehiclesUsedGen2(RingArray::parse(
            cursor,
            size,
            CardVehicleRecordGen2::SIZE,
            CardVehicleRecordGen2::parse,
        )?))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(
            out,
            CardVehicleRecordGen2::SIZE,
            CardVehicleRecordGen2::encode,
        )
    }
}

/// [PlaceRecord: appendix 2.117.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e23122) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecordGen2 {
    pub entry_time: TimeReal,
    pub entry_type_daily_work_period: EntryTypeDailyWorkPeriod,
    pub daily_work_period_country: NationNumeric,
    pub daily_work_period_region: u8,
    pub vehicle_odometer_value: OdometerShort,
    pub entry_gnss_place_record: GnssPlaceRecord,
}

impl PlaceRecordGen2 {
    pub const SIZE: usize = PlaceRecord::SIZE + GnssPlaceRecord::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(PlaceRecordGen2 {
            entry_time: TimeReal::parse(cursor)?,
            entry_type_daily_work_period: EntryTypeDailyWorkPeriod::parse(cursor)?,
            daily_work_period_country: NationNumeric::parse(cursor)?,
            daily_work_period_region: cursor.read_u8().context("Failed to read region")?,
            vehicle_odometer_value: OdometerShort::parse(cursor)?,
            entry_gnss_place_record: GnssPlaceRecord::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.entry_time.encode(out)?;
        self.entry_type_daily_work_period.encode(out)?;
        self.daily_work_period_country.encode(out)?;
        out.push(self.daily_work_period_region);
        self.vehicle_odometer_value.encode(out)?;
        self.entry_gnss_place_record.encode(out)?;
        Ok(())
    }
}

/// EF_Places body, Generation 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlaceDailyWorkPeriodGen2(pub RingArray<PlaceRecordGen2>);

impl CardPlaceDailyWorkPeriodGen2 {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Self> {
        Ok(CardPlaceDailyWorkPeriodGen2(RingArray::parse(
            cursor,
            size,
            PlaceRecordGen2::SIZE,
            PlaceRecordGen2::parse,
        )?))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0
            .encode(out, PlaceRecordGen2::SIZE, PlaceRecordGen2::encode)
    }
}

/// [GNSSAccumulatedDrivingRecord: appendix 2.79.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e21678)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GnssAccumulatedDrivingRecord {
    pub time_stamp: TimeReal,
    pub gnss_place_record: GnssPlaceRecord,
    pub vehicle_odometer_value: OdometerShort,
}

impl GnssAccumulatedDrivingRecord {
    pub const SIZE: usize = TimeReal::SIZE + GnssPlaceRecord::SIZE + OdometerShort::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(GnssAccumulatedDrivingRecord {
            time_stamp: TimeReal::parse(cursor)?,
            gnss_place_record: GnssPlaceRecord::parse(cursor)?,
            vehicle_odometer_value: OdometerShort::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.time_stamp.encode(out)?;
        self.gnss_place_record.encode(out)?;
        self.vehicle_odometer_value.encode(out)?;
        Ok(())
    }
}

/// EF_GNSS_Places body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GnssAccumulatedDriving(pub RingArray<GnssAccumulatedDrivingRecord>);

impl GnssAccumulatedDriving {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Self> {
        Ok(GnssAccumulatedDriving(RingArray::parse(
            cursor,
            size,
            GnssAccumulatedDrivingRecord::SIZE,
            GnssAccumulatedDrivingRecord::parse,
        )?))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(
            out,
            GnssAccumulatedDrivingRecord::SIZE,
            GnssAccumulatedDrivingRecord::encode,
        )
    }
}

/// [CardVehicleUnitRecord: appendix 2.38.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e18229)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVehicleUnitRecord {
    pub time_stamp: TimeReal,
    pub manufacturer_code: ManufacturerCode,
    pub device_id: u8,
    pub vu_software_version: IA5String,
}

impl CardVehicleUnitRecord {
    pub const SIZE: usize = 10;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(CardVehicleUnitRecord {
            time_stamp: TimeReal::parse(cursor)?,
            manufacturer_code: ManufacturerCode::parse(cursor)?,
            device_id: cursor.read_u8().context("Failed to read device id")?,
            vu_software_version: IA5String::parse_dyn_size(cursor, 4)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.time_stamp.encode(out)?;
        self.manufacturer_code.encode(out)?;
        out.push(self.device_id);
        self.vu_software_version.encode(out)?;
        Ok(())
    }
}

/// EF_VehicleUnits_Used body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVehicleUnitsUsed(pub RingArray<CardVehicleUnitRecord>);

impl CardVehicleUnitsUsed {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Self> {
        Ok(CardVehicleUnitsUsed(RingArray::parse(
            cursor,
            size,
            CardVehicleUnitRecord::SIZE,
            CardVehicleUnitRecord::parse,
        )?))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.0.encode(
            out,
            CardVehicleUnitRecord::SIZE,
            CardVehicleUnitRecord::encode,
        )
    }
}

/// [Certificate: appendix 2.41.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e18396) (Generation 2)
///
/// An ECC card-verifiable certificate, DER with outer tag 0x7F21. Carried
/// opaque here; the authentication suite parses the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateGen2 {
    pub value: Vec<u8>,
}

impl CertificateGen2 {
    pub fn parse_dyn_size(cursor: &mut Cursor<&[u8]>, size: usize) -> Result<Self> {
        let mut value = vec![0u8; size];
        cursor
            .read_exact(&mut value)
            .context("Failed to read certificate")?;
        Ok(CertificateGen2 { value })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Vehicle unit record arrays (TREP 0x21 .. 0x25 and 0x31 .. 0x35)
// ---------------------------------------------------------------------------

/// [RecordType: appendix 2.120.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e23342)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    ActivityChangeInfo,
    CardSlotsStatus,
    CurrentDateTime,
    MemberStateCertificate,
    OdometerValueMidnight,
    DateOfDayDownloaded,
    SensorPaired,
    Signature,
    SpecificConditionRecord,
    VehicleIdentificationNumber,
    VehicleRegistrationNumber,
    VuCalibrationRecord,
    VuCardIWRecord,
    VuCardRecord,
    VuCertificate,
    VuCompanyLocksRecord,
    VuControlActivityRecord,
    VuDetailedSpeedBlock,
    VuDownloadablePeriod,
    VuDownloadActivityData,
    VuEventRecord,
    VuGnssAdRecord,
    VuItsConsentRecord,
    VuFaultRecord,
    VuIdentification,
    VuOverSpeedingControlData,
    VuOverSpeedingEventRecord,
    VuPlaceDailyWorkPeriodRecord,
    VuTimeAdjustmentGnssRecord,
    VuTimeAdjustmentRecord,
    VuPowerSupplyInterruptionRecord,
    SensorPairedRecord,
    SensorExternalGnssCoupledRecord,
    Unrecognized(u8),
}

impl RecordType {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x01 => Self::ActivityChangeInfo,
            0x02 => Self::CardSlotsStatus,
            0x03 => Self::CurrentDateTime,
            0x04 => Self::MemberStateCertificate,
            0x05 => Self::OdometerValueMidnight,
            0x06 => Self::DateOfDayDownloaded,
            0x07 => Self::SensorPaired,
            0x08 => Self::Signature,
            0x09 => Self::SpecificConditionRecord,
            0x0A => Self::VehicleIdentificationNumber,
            0x0B => Self::VehicleRegistrationNumber,
            0x0C => Self::VuCalibrationRecord,
            0x0D => Self::VuCardIWRecord,
            0x0E => Self::VuCardRecord,
            0x0F => Self::VuCertificate,
            0x10 => Self::VuCompanyLocksRecord,
            0x11 => Self::VuControlActivityRecord,
            0x12 => Self::VuDetailedSpeedBlock,
            0x13 => Self::VuDownloadablePeriod,
            0x14 => Self::VuDownloadActivityData,
            0x15 => Self::VuEventRecord,
            0x16 => Self::VuGnssAdRecord,
            0x17 => Self::VuItsConsentRecord,
            0x18 => Self::VuFaultRecord,
            0x19 => Self::VuIdentification,
            0x1A => Self::VuOverSpeedingControlData,
            0x1B => Self::VuOverSpeedingEventRecord,
            0x1C => Self::VuPlaceDailyWorkPeriodRecord,
            0x1D => Self::VuTimeAdjustmentGnssRecord,
            0x1E => Self::VuTimeAdjustmentRecord,
            0x1F => Self::VuPowerSupplyInterruptionRecord,
            0x20 => Self::SensorPairedRecord,
            0x21 => Self::SensorExternalGnssCoupledRecord,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::ActivityChangeInfo => 0x01,
            Self::CardSlotsStatus => 0x02,
            Self::CurrentDateTime => 0x03,
            Self::MemberStateCertificate => 0x04,
            Self::OdometerValueMidnight => 0x05,
            Self::DateOfDayDownloaded => 0x06,
            Self::SensorPaired => 0x07,
            Self::Signature => 0x08,
            Self::SpecificConditionRecord => 0x09,
            Self::VehicleIdentificationNumber => 0x0A,
            Self::VehicleRegistrationNumber => 0x0B,
            Self::VuCalibrationRecord => 0x0C,
            Self::VuCardIWRecord => 0x0D,
            Self::VuCardRecord => 0x0E,
            Self::VuCertificate => 0x0F,
            Self::VuCompanyLocksRecord => 0x10,
            Self::VuControlActivityRecord => 0x11,
            Self::VuDetailedSpeedBlock => 0x12,
            Self::VuDownloadablePeriod => 0x13,
            Self::VuDownloadActivityData => 0x14,
            Self::VuEventRecord => 0x15,
            Self::VuGnssAdRecord => 0x16,
            Self::VuItsConsentRecord => 0x17,
            Self::VuFaultRecord => 0x18,
            Self::VuIdentification => 0x19,
            Self::VuOverSpeedingControlData => 0x1A,
            Self::VuOverSpeedingEventRecord => 0x1B,
            Self::VuPlaceDailyWorkPeriodRecord => 0x1C,
            Self::VuTimeAdjustmentGnssRecord => 0x1D,
            Self::VuTimeAdjustmentRecord => 0x1E,
            Self::VuPowerSupplyInterruptionRecord => 0x1F,
            Self::SensorPairedRecord => 0x20,
            Self::SensorExternalGnssCoupledRecord => 0x21,
            Self::Unrecognized(other) => *other,
        }
    }
}

/// [VuCardIWRecord: appendix 2.177.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e25900) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuCardIWRecordGen2 {
    pub card_holder_name: HolderName,
    pub full_card_number_and_generation: FullCardNumberAndGeneration,
    pub card_expiry_date: TimeReal,
    pub card_insertion_time: TimeReal,
    pub vehicle_odometer_value_at_insertion: OdometerShort,
    pub card_slot_number: CardSlotNumber,
    pub card_withdrawal_time: TimeReal,
    pub vehicle_odometer_value_at_withdrawal: OdometerShort,
    pub previous_vehicle_info: PreviousVehicleInfoGen2,
    pub manual_input_flag: ManualInputFlag,
}

/// [PreviousVehicleInfo: appendix 2.118.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e23250) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousVehicleInfoGen2 {
    pub vehicle_registration_identification: VehicleRegistrationIdentification,
    pub card_withdrawal_time: TimeReal,
    pub vu_generation: GenerationIndicator,
}

impl PreviousVehicleInfoGen2 {
    pub const SIZE: usize = VehicleRegistrationIdentification::SIZE + TimeReal::SIZE + 1;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(PreviousVehicleInfoGen2 {
            vehicle_registration_identification: VehicleRegistrationIdentification::parse(cursor)?,
            card_withdrawal_time: TimeReal::parse(cursor)?,
            vu_generation: GenerationIndicator::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.vehicle_registration_identification.encode(out)?;
        self.card_withdrawal_time.encode(out)?;
        self.vu_generation.encode(out)?;
        Ok(())
    }
}

impl VuCardIWRecordGen2 {
    pub const SIZE: usize = 131;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuCardIWRecordGen2 {
            card_holder_name: HolderName::parse(cursor)?,
            full_card_number_and_generation: FullCardNumberAndGeneration::parse(cursor)?,
            card_expiry_date: TimeReal::parse(cursor)?,
            card_insertion_time: TimeReal::parse(cursor)?,
            vehicle_odometer_value_at_insertion: OdometerShort::parse(cursor)?,
            card_slot_number: CardSlotNumber::parse(cursor)?,
            card_withdrawal_time: TimeReal::parse(cursor)?,
            vehicle_odometer_value_at_withdrawal: OdometerShort::parse(cursor)?,
            previous_vehicle_info: PreviousVehicleInfoGen2::parse(cursor)?,
            manual_input_flag: ManualInputFlag::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.card_holder_name.encode(out)?;
        self.full_card_number_and_generation.encode(out)?;
        self.card_expiry_date.encode(out)?;
        self.card_insertion_time.encode(out)?;
        self.vehicle_odometer_value_at_insertion.encode(out)?;
        self.card_slot_number.encode(out)?;
        self.card_withdrawal_time.encode(out)?;
        self.vehicle_odometer_value_at_withdrawal.encode(out)?;
        self.previous_vehicle_info.encode(out)?;
        self.manual_input_flag.encode(out)?;
        Ok(())
    }
}

/// [VuGNSSADRecord: appendix 2.203.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e27552)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuGnssAdRecord {
    pub time_stamp: TimeReal,
    pub card_number_driver_slot: FullCardNumberAndGeneration,
    pub card_number_codriver_slot: FullCardNumberAndGeneration,
    pub gnss_place_record: GnssPlaceRecord,
    pub vehicle_odometer_value: OdometerShort,
}

impl VuGnssAdRecord {
    pub const SIZE: usize = TimeReal::SIZE
        + 2 * FullCardNumberAndGeneration::SIZE
        + GnssPlaceRecord::SIZE
        + OdometerShort::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuGnssAdRecord {
            time_stamp: TimeReal::parse(cursor)?,
            card_number_driver_slot: FullCardNumberAndGeneration::parse(cursor)?,
            card_number_codriver_slot: FullCardNumberAndGeneration::parse(cursor)?,
            gnss_place_record: GnssPlaceRecord::parse(cursor)?,
            vehicle_odometer_value: OdometerShort::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.time_stamp.encode(out)?;
        self.card_number_driver_slot.encode(out)?;
        self.card_number_codriver_slot.encode(out)?;
        self.gnss_place_record.encode(out)?;
        self.vehicle_odometer_value.encode(out)?;
        Ok(())
    }
}

/// [VuPlaceDailyWorkPeriodRecord: appendix 2.219.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e28330) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuPlaceDailyWorkPeriodRecordGen2 {
    pub full_card_number_and_generation: FullCardNumberAndGeneration,
    pub place_record: PlaceRecordGen2,
}

impl VuPlaceDailyWorkPeriodRecordGen2 {
    pub const SIZE: usize = FullCardNumberAndGeneration::SIZE + PlaceRecordGen2::SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuPlaceDailyWorkPeriodRecordGen2 {
            full_card_number_and_generation: FullCardNumberAndGeneration::parse(cursor)?,
            place_record: PlaceRecordGen2::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full_card_number_and_generation.encode(out)?;
        self.place_record.encode(out)?;
        Ok(())
    }
}

/// [VuEventRecord: appendix 2.195.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e26726) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuEventRecordGen2 {
    pub event_type: EventFaultType,
    pub event_record_purpose: EventFaultRecordPurpose,
    pub event_begin_time: TimeReal,
    pub event_end_time: TimeReal,
    pub card_number_driver_slot_begin: FullCardNumberAndGeneration,
    pub card_number_codriver_slot_begin: FullCardNumberAndGeneration,
    pub card_number_driver_slot_end: FullCardNumberAndGeneration,
    pub card_number_codriver_slot_end: FullCardNumberAndGeneration,
    pub similar_events_number: u8,
}

impl VuEventRecordGen2 {
    pub const SIZE: usize = 87;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuEventRecordGen2 {
            event_type: EventFaultType::parse(cursor)?,
            event_record_purpose: EventFaultRecordPurpose::parse(cursor)?,
            event_begin_time: TimeReal::parse(cursor)?,
            event_end_time: TimeReal::parse(cursor)?,
            card_number_driver_slot_begin: FullCardNumberAndGeneration::parse(cursor)?,
            card_number_codriver_slot_begin: FullCardNumberAndGeneration::parse(cursor)?,
            card_number_driver_slot_end: FullCardNumberAndGeneration::parse(cursor)?,
            card_number_codriver_slot_end: FullCardNumberAndGeneration::parse(cursor)?,
            similar_events_number: cursor
                .read_u8()
                .context("Failed to read similar events number")?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.event_type.encode(out)?;
        self.event_record_purpose.encode(out)?;
        self.event_begin_time.encode(out)?;
        self.event_end_time.encode(out)?;
        self.card_number_driver_slot_begin.encode(out)?;
        self.card_number_codriver_slot_begin.encode(out)?;
        self.card_number_driver_slot_end.encode(out)?;
        self.card_number_codriver_slot_end.encode(out)?;
        out.push(self.similar_events_number);
        Ok(())
    }
}

/// [VuFaultRecord: appendix 2.196.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e26798) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuFaultRecordGen2 {
    pub fault_type: EventFaultType,
    pub fault_record_purpose: EventFaultRecordPurpose,
    pub fault_begin_time: TimeReal,
    pub fault_end_time: TimeReal,
    pub card_number_driver_slot_begin: FullCardNumberAndGeneration,
    pub card_number_codriver_slot_begin: FullCardNumberAndGeneration,
    pub card_number_driver_slot_end: FullCardNumberAndGeneration,
    pub card_number_codriver_slot_end: FullCardNumberAndGeneration,
}

impl VuFaultRecordGen2 {
    pub const SIZE: usize = 86;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuFaultRecordGen2 {
            fault_type: EventFaultType::parse(cursor)?,
            fault_record_purpose: EventFaultRecordPurpose::parse(cursor)?,
            fault_begin_time: TimeReal::parse(cursor)?,
            fault_end_time: TimeReal::parse(cursor)?,
            card_number_driver_slot_begin: FullCardNumberAndGeneration::parse(cursor)?,
            card_number_codriver_slot_begin: FullCardNumberAndGeneration::parse(cursor)?,
            card_number_driver_slot_end: FullCardNumberAndGeneration::parse(cursor)?,
            card_number_codriver_slot_end: FullCardNumberAndGeneration::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.fault_type.encode(out)?;
        self.fault_record_purpose.encode(out)?;
        self.fault_begin_time.encode(out)?;
        self.fault_end_time.encode(out)?;
        self.card_number_driver_slot_begin.encode(out)?;
        self.card_number_codriver_slot_begin.encode(out)?;
        self.card_number_driver_slot_end.encode(out)?;
        self.card_number_codriver_slot_end.encode(out)?;
        Ok(())
    }
}

/// [VuOverSpeedingEventRecord: appendix 2.214.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e28106) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuOverSpeedingEventRecordGen2 {
    pub event_type: EventFaultType,
    pub event_record_purpose: EventFaultRecordPurpose,
    pub event_begin_time: TimeReal,
    pub event_end_time: TimeReal,
    pub max_speed_value: SpeedMax,
    pub average_speed_value: SpeedAverage,
    pub card_number_driver_slot_begin: FullCardNumberAndGeneration,
    pub similar_events_number: u8,
}

impl VuOverSpeedingEventRecordGen2 {
    pub const SIZE: usize = 32;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuOverSpeedingEventRecordGen2 {
            event_type: EventFaultType::parse(cursor)?,
            event_record_purpose: EventFaultRecordPurpose::parse(cursor)?,
            event_begin_time: TimeReal::parse(cursor)?,
            event_end_time: TimeReal::parse(cursor)?,
            max_speed_value: Speed::parse(cursor)?,
            average_speed_value: Speed::parse(cursor)?,
            card_number_driver_slot_begin: FullCardNumberAndGeneration::parse(cursor)?,
            similar_events_number: cursor
                .read_u8()
                .context("Failed to read similar events number")?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.event_type.encode(out)?;
        self.event_record_purpose.encode(out)?;
        self.event_begin_time.encode(out)?;
        self.event_end_time.encode(out)?;
        self.max_speed_value.encode(out)?;
        self.average_speed_value.encode(out)?;
        self.card_number_driver_slot_begin.encode(out)?;
        out.push(self.similar_events_number);
        Ok(())
    }
}

/// [VuTimeAdjustmentRecord: appendix 2.231.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e28797) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuTimeAdjustmentRecordGen2 {
    pub old_time_value: TimeReal,
    pub new_time_value: TimeReal,
    pub workshop_name: Name,
    pub workshop_address: Address,
    pub workshop_card_number_and_generation: FullCardNumberAndGeneration,
}

impl VuTimeAdjustmentRecordGen2 {
    pub const SIZE: usize = 99;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuTimeAdjustmentRecordGen2 {
            old_time_value: TimeReal::parse(cursor)?,
            new_time_value: TimeReal::parse(cursor)?,
            workshop_name: parse_name(cursor)?,
            workshop_address: parse_name(cursor)?,
            workshop_card_number_and_generation: FullCardNumberAndGeneration::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.old_time_value.encode(out)?;
        self.new_time_value.encode(out)?;
        self.workshop_name.encode(out)?;
        self.workshop_address.encode(out)?;
        self.workshop_card_number_and_generation.encode(out)?;
        Ok(())
    }
}

/// [VuCompanyLocksRecord: appendix 2.185.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e26310) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuCompanyLocksRecordGen2 {
    pub lock_in_time: TimeReal,
    pub lock_out_time: TimeReal,
    pub company_name: Name,
    pub company_address: Address,
    pub company_card_number_and_generation: FullCardNumberAndGeneration,
}

impl VuCompanyLocksRecordGen2 {
    pub const SIZE: usize = 99;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuCompanyLocksRecordGen2 {
            lock_in_time: TimeReal::parse(cursor)?,
            lock_out_time: TimeReal::parse(cursor)?,
            company_name: parse_name(cursor)?,
            company_address: parse_name(cursor)?,
            company_card_number_and_generation: FullCardNumberAndGeneration::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.lock_in_time.encode(out)?;
        self.lock_out_time.encode(out)?;
        self.company_name.encode(out)?;
        self.company_address.encode(out)?;
        self.company_card_number_and_generation.encode(out)?;
        Ok(())
    }
}

/// [VuControlActivityRecord: appendix 2.187.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e26420) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuControlActivityRecordGen2 {
    pub control_type: super::gen1::ControlType,
    pub control_time: TimeReal,
    pub control_card_number_and_generation: FullCardNumberAndGeneration,
    pub download_period_begin: TimeReal,
    pub download_period_end: TimeReal,
}

impl VuControlActivityRecordGen2 {
    pub const SIZE: usize = 32;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuControlActivityRecordGen2 {
            control_type: super::gen1::ControlType::parse(cursor)?,
            control_time: TimeReal::parse(cursor)?,
            control_card_number_and_generation: FullCardNumberAndGeneration::parse(cursor)?,
            download_period_begin: TimeReal::parse(cursor)?,
            download_period_end: TimeReal::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.control_type.encode(out)?;
        self.control_time.encode(out)?;
        self.control_card_number_and_generation.encode(out)?;
        self.download_period_begin.encode(out)?;
        self.download_period_end.encode(out)?;
        Ok(())
    }
}

/// [VuDownloadActivityData: appendix 2.192.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e26628) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuDownloadActivityDataGen2 {
    pub downloading_time: TimeReal,
    pub full_card_number_and_generation: FullCardNumberAndGeneration,
    pub company_or_workshop_name: Name,
}

impl VuDownloadActivityDataGen2 {
    pub const SIZE: usize = TimeReal::SIZE + FullCardNumberAndGeneration::SIZE + NAME_SIZE;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuDownloadActivityDataGen2 {
            downloading_time: TimeReal::parse(cursor)?,
            full_card_number_and_generation: FullCardNumberAndGeneration::parse(cursor)?,
            company_or_workshop_name: parse_name(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.downloading_time.encode(out)?;
        self.full_card_number_and_generation.encode(out)?;
        self.company_or_workshop_name.encode(out)?;
        Ok(())
    }
}

/// [VuITSConsentRecord: appendix 2.207.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e27823)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuItsConsentRecord {
    pub full_card_number_and_generation: FullCardNumberAndGeneration,
    pub consent: u8,
}

impl VuItsConsentRecord {
    pub const SIZE: usize = FullCardNumberAndGeneration::SIZE + 1;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(VuItsConsentRecord {
            full_card_number_and_generation: FullCardNumberAndGeneration::parse(cursor)?,
            consent: cursor.read_u8().context("Failed to read consent flag")?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.full_card_number_and_generation.encode(out)?;
        out.push(self.consent);
        Ok(())
    }
}

/// One record array of a Generation 2 VU transfer:
/// `record type (1) | record size (2) | number of records (2) | records`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VuRecordArray {
    pub record_type: RecordType,
    pub record_size: u16,
    pub payload: VuRecordArrayPayload,
}

/// Typed payloads for the record types the codec understands; anything else
/// is carried verbatim so the byte stream survives a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VuRecordArrayPayload {
    Signature(Vec<Vec<u8>>),
    MemberStateCertificate(Vec<CertificateGen2>),
    VuCertificate(Vec<CertificateGen2>),
    VehicleIdentificationNumber(Vec<VehicleIdentificationNumber>),
    VehicleRegistrationNumber(Vec<VehicleRegistrationNumber>),
    CurrentDateTime(Vec<TimeReal>),
    DateOfDayDownloaded(Vec<TimeReal>),
    OdometerValueMidnight(Vec<OdometerShort>),
    VuDownloadablePeriod(Vec<VuDownloadablePeriod>),
    CardSlotsStatus(Vec<CardSlotsStatus>),
    VuDownloadActivityData(Vec<VuDownloadActivityDataGen2>),
    VuCompanyLocks(Vec<VuCompanyLocksRecordGen2>),
    VuControlActivity(Vec<VuControlActivityRecordGen2>),
    VuCardIWRecords(Vec<VuCardIWRecordGen2>),
    ActivityChangeInfo(Vec<ActivityChangeInfo>),
    VuPlaceDailyWorkPeriod(Vec<VuPlaceDailyWorkPeriodRecordGen2>),
    VuGnssAd(Vec<VuGnssAdRecord>),
    SpecificConditions(Vec<SpecificConditionRecordGen2>),
    VuEvents(Vec<VuEventRecordGen2>),
    VuFaults(Vec<VuFaultRecordGen2>),
    VuOverSpeedingControl(Vec<VuOverSpeedingControlData>),
    VuOverSpeedingEvents(Vec<VuOverSpeedingEventRecordGen2>),
    VuTimeAdjustments(Vec<VuTimeAdjustmentRecordGen2>),
    VuItsConsent(Vec<VuItsConsentRecord>),
    VuDetailedSpeedBlocks(Vec<VuDetailedSpeedBlock>),
    VuIdentification(Vec<VuIdentification>),
    Opaque(Vec<Vec<u8>>),
}

/// [SpecificConditionRecord: appendix 2.152.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e24614) (Generation 2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificConditionRecordGen2 {
    pub specific_condition_record_id: u16,
    pub entry_time: TimeReal,
    pub specific_condition_type: SpecificConditionType,
}

impl SpecificConditionRecordGen2 {
    pub const SIZE: usize = 7;

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        Ok(SpecificConditionRecordGen2 {
            specific_condition_record_id: cursor
                .read_u16::<BigEndian>()
                .context("Failed to read specific condition record id")?,
            entry_time: TimeReal::parse(cursor)?,
            specific_condition_type: SpecificConditionType::parse(cursor)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_u16_be(out, self.specific_condition_record_id);
        self.entry_time.encode(out)?;
        self.specific_condition_type.encode(out)?;
        Ok(())
    }
}

fn parse_records<T, F>(
    cursor: &mut Cursor<&[u8]>,
    record_size: usize,
    count: usize,
    parse_record: F,
) -> Result<Vec<T>>
where
    F: Fn(&mut Cursor<&[u8]>) -> Result<T>,
{
    let mut records = Vec::with_capacity(count);
    for index in 0..count {
        let mut window = cursor.take_exact(record_size)?;
        let record = parse_record(&mut window)
            .with_context(|| format!("Failed to parse record {} of array", index))?;
        records.push(record);
    }
    Ok(records)
}

fn parse_raw_records(
    cursor: &mut Cursor<&[u8]>,
    record_size: usize,
    count: usize,
) -> Result<Vec<Vec<u8>>> {
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let mut record = vec![0u8; record_size];
        cursor
            .read_exact(&mut record)
            .context("Failed to read raw record")?;
        records.push(record);
    }
    Ok(records)
}

impl VuRecordArray {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let type_byte = cursor.read_u8().context("Failed to read record type")?;
        let record_type = RecordType::from_byte(type_byte);
        let record_size = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read record size")?;
        let count = cursor
            .read_u16::<BigEndian>()
            .context("Failed to read record count")?;
        let size = record_size as usize;
        let count = count as usize;

        use RecordType as RT;
        use VuRecordArrayPayload as P;
        // Typed decoding is gated on the advertised record size so that a
        // newer dialect with extended records degrades to verbatim carry.
        let payload = match (record_type, size) {
            (RT::Signature, _) => P::Signature(parse_raw_records(cursor, size, count)?),
            (RT::MemberStateCertificate, _) => P::MemberStateCertificate(parse_records(
                cursor,
                size,
                count,
                |c| CertificateGen2::parse_dyn_size(c, size),
            )?),
            (RT::VuCertificate, _) => {
                P::VuCertificate(parse_records(cursor, size, count, |c| {
                    CertificateGen2::parse_dyn_size(c, size)
                })?)
            }
            (RT::VehicleIdentificationNumber, VehicleIdentificationNumber::SIZE) => {
                P::VehicleIdentificationNumber(parse_records(
                    cursor,
                    size,
                    count,
                    VehicleIdentificationNumber::parse,
                )?)
            }
            (RT::VehicleRegistrationNumber, 14) => P::VehicleRegistrationNumber(parse_records(
                cursor,
                size,
                count,
                VehicleRegistrationNumber::parse,
            )?),
            (RT::CurrentDateTime, TimeReal::SIZE) => {
                P::CurrentDateTime(parse_records(cursor, size, count, TimeReal::parse)?)
            }
            (RT::DateOfDayDownloaded, TimeReal::SIZE) => {
                P::DateOfDayDownloaded(parse_records(cursor, size, count, TimeReal::parse)?)
            }
            (RT::OdometerValueMidnight, OdometerShort::SIZE) => {
                P::OdometerValueMidnight(parse_records(cursor, size, count, OdometerShort::parse)?)
            }
            (RT::VuDownloadablePeriod, 8) => P::VuDownloadablePeriod(parse_records(
                cursor,
                size,
                count,
                VuDownloadablePeriod::parse,
            )?),
            (RT::CardSlotsStatus, 1) => {
                P::CardSlotsStatus(parse_records(cursor, size, count, CardSlotsStatus::parse)?)
            }
            (RT::VuDownloadActivityData, VuDownloadActivityDataGen2::SIZE) => {
                P::VuDownloadActivityData(parse_records(
                    cursor,
                    size,
                    count,
                    VuDownloadActivityDataGen2::parse,
                )?)
            }
            (RT::VuCompanyLocksRecord, VuCompanyLocksRecordGen2::SIZE) => P::VuCompanyLocks(
                parse_records(cursor, size, count, VuCompanyLocksRecordGen2::parse)?,
            ),
            (RT::VuControlActivityRecord, VuControlActivityRecordGen2::SIZE) => {
                P::VuControlActivity(parse_records(
                    cursor,
                    size,
                    count,
                    VuControlActivityRecordGen2::parse,
                )?)
            }
            (RT::VuCardIWRecord, VuCardIWRecordGen2::SIZE) => {
                P::VuCardIWRecords(parse_records(cursor, size, count, VuCardIWRecordGen2::parse)?)
            }
            (RT::ActivityChangeInfo, ActivityChangeInfo::SIZE) => P::ActivityChangeInfo(
                parse_records(cursor, size, count, ActivityChangeInfo::parse)?,
            ),
            (RT::VuPlaceDailyWorkPeriodRecord, VuPlaceDailyWorkPeriodRecordGen2::SIZE) => {
                P::VuPlaceDailyWorkPeriod(parse_records(
                    cursor,
                    size,
                    count,
                    VuPlaceDailyWorkPeriodRecordGen2::parse,
                )?)
            }
            (RT::VuGnssAdRecord, VuGnssAdRecord::SIZE) => {
                P::VuGnssAd(parse_records(cursor, size, count, VuGnssAdRecord::parse)?)
            }
            (RT::SpecificConditionRecord, SpecificConditionRecordGen2::SIZE) => {
                P::SpecificConditions(parse_records(
                    cursor,
                    size,
                    count,
                    SpecificConditionRecordGen2::parse,
                )?)
            }
            (RT::VuEventRecord, VuEventRecordGen2::SIZE) => {
                P::VuEvents(parse_records(cursor, size, count, VuEventRecordGen2::parse)?)
            }
            (RT::VuFaultRecord, VuFaultRecordGen2::SIZE) => {
                P::VuFaults(parse_records(cursor, size, count, VuFaultRecordGen2::parse)?)
            }
            (RT::VuOverSpeedingControlData, VuOverSpeedingControlData::SIZE) => {
                P::VuOverSpeedingControl(parse_records(
                    cursor,
                    size,
                    count,
                    VuOverSpeedingControlData::parse,
                )?)
            }
            (RT::VuOverSpeedingEventRecord, VuOverSpeedingEventRecordGen2::SIZE) => {
                P::VuOverSpeedingEvents(parse_records(
                    cursor,
                    size,
                    count,
                    VuOverSpeedingEventRecordGen2::parse,
                )?)
            }
            (RT::VuTimeAdjustmentRecord, VuTimeAdjustmentRecordGen2::SIZE) => {
                P::VuTimeAdjustments(parse_records(
                    cursor,
                    size,
                    count,
                    VuTimeAdjustmentRecordGen2::parse,
                )?)
            }
            (RT::VuItsConsentRecord, VuItsConsentRecord::SIZE) => {
                P::VuItsConsent(parse_records(cursor, size, count, VuItsConsentRecord::parse)?)
            }
            (RT::VuDetailedSpeedBlock, VuDetailedSpeedBlock::SIZE) => P::VuDetailedSpeedBlocks(
                parse_records(cursor, size, count, VuDetailedSpeedBlock::parse)?,
            ),
            (RT::VuIdentification, VuIdentification::SIZE) => {
                P::VuIdentification(parse_records(cursor, size, count, VuIdentification::parse)?)
            }
            (record_type, size) => {
                log::debug!(
                    "Carrying record array {:?} with {} records of {} bytes verbatim",
                    record_type,
                    count,
                    size
                );
                P::Opaque(parse_raw_records(cursor, size, count)?)
            }
        };

        Ok(VuRecordArray {
            record_type,
            record_size,
            payload,
        })
    }

    pub fn record_count(&self) -> usize {
        use VuRecordArrayPayload as P;
        match &self.payload {
            P::Signature(records) | P::Opaque(records) => records.len(),
            P::MemberStateCertificate(records) | P::VuCertificate(records) => records.len(),
            P::VehicleIdentificationNumber(records) => records.len(),
            P::VehicleRegistrationNumber(records) => records.len(),
            P::CurrentDateTime(records) | P::DateOfDayDownloaded(records) => records.len(),
            P::OdometerValueMidnight(records) => records.len(),
            P::VuDownloadablePeriod(records) => records.len(),
            P::CardSlotsStatus(records) => records.len(),
            P::VuDownloadActivityData(records) => records.len(),
            P::VuCompanyLocks(records) => records.len(),
            P::VuControlActivity(records) => records.len(),
            P::VuCardIWRecords(records) => records.len(),
            P::ActivityChangeInfo(records) => records.len(),
            P::VuPlaceDailyWorkPeriod(records) => records.len(),
            P::VuGnssAd(records) => records.len(),
            P::SpecificConditions(records) => records.len(),
            P::VuEvents(records) => records.len(),
            P::VuFaults(records) => records.len(),
            P::VuOverSpeedingControl(records) => records.len(),
            P::VuOverSpeedingEvents(records) => records.len(),
            P::VuTimeAdjustments(records) => records.len(),
            P::VuItsConsent(records) => records.len(),
            P::VuDetailedSpeedBlocks(records) => records.len(),
            P::VuIdentification(records) => records.len(),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.record_type.code());
        write_u16_be(out, self.record_size);
        write_u16_be(
            out,
            u16::try_from(self.record_count()).context("too many records in array")?,
        );
        let body_start = out.len();

        use VuRecordArrayPayload as P;
        match &self.payload {
            P::Signature(records) | P::Opaque(records) => {
                for record in records {
                    out.extend_from_slice(record);
                }
            }
            P::MemberStateCertificate(records) | P::VuCertificate(records) => {
                for record in records {
                    record.encode(out)?;
                }
            }
            P::VehicleIdentificationNumber(records) => encode_all(records, out, VehicleIdentificationNumber::encode)?,
            P::VehicleRegistrationNumber(records) => encode_all(records, out, VehicleRegistrationNumber::encode)?,
            P::CurrentDateTime(records) | P::DateOfDayDownloaded(records) => {
                encode_all(records, out, TimeReal::encode)?
            }
            P::OdometerValueMidnight(records) => encode_all(records, out, OdometerShort::encode)?,
            P::VuDownloadablePeriod(records) => encode_all(records, out, VuDownloadablePeriod::encode)?,
            P::CardSlotsStatus(records) => encode_all(records, out, CardSlotsStatus::encode)?,
            P::VuDownloadActivityData(records) => {
                encode_all(records, out, VuDownloadActivityDataGen2::encode)?
            }
            P::VuCompanyLocks(records) => encode_all(records, out, VuCompanyLocksRecordGen2::encode)?,
            P::VuControlActivity(records) => {
                encode_all(records, out, VuControlActivityRecordGen2::encode)?
            }
            P::VuCardIWRecords(records) => encode_all(records, out, VuCardIWRecordGen2::encode)?,
            P::ActivityChangeInfo(records) => encode_all(records, out, ActivityChangeInfo::encode)?,
            P::VuPlaceDailyWorkPeriod(records) => {
                encode_all(records, out, VuPlaceDailyWorkPeriodRecordGen2::encode)?
            }
            P::VuGnssAd(records) => encode_all(records, out, VuGnssAdRecord::encode)?,
            P::SpecificConditions(records) => {
                encode_all(records, out, SpecificConditionRecordGen2::encode)?
            }
            P::VuEvents(records) => encode_all(records, out, VuEventRecordGen2::encode)?,
            P::VuFaults(records) => encode_all(records, out, VuFaultRecordGen2::encode)?,
            P::VuOverSpeedingControl(records) => {
                encode_all(records, out, VuOverSpeedingControlData::encode)?
            }
            P::VuOverSpeedingEvents(records) => {
                encode_all(records, out, VuOverSpeedingEventRecordGen2::encode)?
            }
            P::VuTimeAdjustments(records) => {
                encode_all(records, out, VuTimeAdjustmentRecordGen2::encode)?
            }
            P::VuItsConsent(records) => encode_all(records, out, VuItsConsentRecord::encode)?,
            P::VuDetailedSpeedBlocks(records) => encode_all(records, out, VuDetailedSpeedBlock::encode)?,
            P::VuIdentification(records) => encode_all(records, out, VuIdentification::encode)?,
        }

        let expected = self.record_size as usize * self.record_count();
        if out.len() - body_start != expected {
            anyhow::bail!(
                "record array {:?} encoded {} bytes, header declares {}",
                self.record_type,
                out.len() - body_start,
                expected
            );
        }
        Ok(())
    }

    pub fn is_signature(&self) -> bool {
        matches!(self.record_type, RecordType::Signature)
    }
}

fn encode_all<T, F>(records: &[T], out: &mut Vec<u8>, encode_record: F) -> Result<()>
where
    F: Fn(&T, &mut Vec<u8>) -> Result<()>,
{
    for record in records {
        encode_record(record, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen2_record_sizes_match_regulation() {
        assert_eq!(ApplicationIdentificationGen2::SIZE, 17);
        assert_eq!(CardVehicleRecordGen2::SIZE, 48);
        assert_eq!(PlaceRecordGen2::SIZE, 21);
        assert_eq!(GnssAccumulatedDrivingRecord::SIZE, 18);
        assert_eq!(CardVehicleUnitRecord::SIZE, 10);
        assert_eq!(FullCardNumberAndGeneration::SIZE, 19);
        assert_eq!(VuCardIWRecordGen2::SIZE, 131);
        assert_eq!(VuGnssAdRecord::SIZE, 56);
        assert_eq!(VuPlaceDailyWorkPeriodRecordGen2::SIZE, 40);
        assert_eq!(VuEventRecordGen2::SIZE, 87);
        assert_eq!(VuFaultRecordGen2::SIZE, 86);
        assert_eq!(VuOverSpeedingEventRecordGen2::SIZE, 32);
        assert_eq!(VuTimeAdjustmentRecordGen2::SIZE, 99);
    }

    #[test]
    fn record_array_round_trips_typed_payload() {
        let mut bytes = vec![0x03]; // CurrentDateTime
        bytes.extend_from_slice(&4u16.to_be_bytes());
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&1_600_000_000u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());

        let mut cursor = Cursor::new(bytes.as_slice());
        let array = VuRecordArray::parse(&mut cursor).unwrap();
        assert_eq!(array.record_type, RecordType::CurrentDateTime);
        assert_eq!(array.record_count(), 2);
        match &array.payload {
            VuRecordArrayPayload::CurrentDateTime(records) => {
                assert!(records[0].is_set());
                assert!(!records[1].is_set());
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let mut out = Vec::new();
        array.encode(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn record_array_carries_unknown_types_verbatim() {
        let mut bytes = vec![0x7E]; // manufacturer specific type
        bytes.extend_from_slice(&3u16.to_be_bytes());
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);

        let mut cursor = Cursor::new(bytes.as_slice());
        let array = VuRecordArray::parse(&mut cursor).unwrap();
        assert!(matches!(array.payload, VuRecordArrayPayload::Opaque(_)));

        let mut out = Vec::new();
        array.encode(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn record_array_rejects_undersized_typed_records() {
        // VuEventRecord with a Gen2v2-extended size falls back to opaque.
        let mut bytes = vec![0x15];
        bytes.extend_from_slice(&90u16.to_be_bytes());
        bytes.extend_from_slice(&1u16.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 90]);

        let mut cursor = Cursor::new(bytes.as_slice());
        let array = VuRecordArray::parse(&mut cursor).unwrap();
        assert!(matches!(array.payload, VuRecordArrayPayload::Opaque(_)));
        let mut out = Vec::new();
        array.encode(&mut out).unwrap();
        assert_eq!(out, bytes);
    }
}

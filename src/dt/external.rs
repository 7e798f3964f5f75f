use anyhow::{Context, Result};
use byteorder::ReadBytesExt;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// [NationNumeric: appendix 2.101.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e22450)
///
/// Every variant carries the protocol value assigned by the regulation;
/// bytes outside the table survive a round trip through `Unrecognized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NationNumeric {
    NoInformation,
    Austria,
    Albania,
    Andorra,
    Armenia,
    Azerbaijan,
    Belgium,
    Bulgaria,
    BosniaHerzegovina,
    Belarus,
    Switzerland,
    Cyprus,
    CzechRepublic,
    Germany,
    Denmark,
    Spain,
    Estonia,
    France,
    Finland,
    Liechtenstein,
    FaroeIslands,
    UnitedKingdom,
    Georgia,
    Greece,
    Hungary,
    Croatia,
    Italy,
    Ireland,
    Iceland,
    Kazakhstan,
    Luxembourg,
    Lithuania,
    Latvia,
    Malta,
    Monaco,
    Moldova,
    NorthMacedonia,
    Norway,
    Netherlands,
    Portugal,
    Poland,
    Romania,
    SanMarino,
    Russia,
    Sweden,
    Slovakia,
    Slovenia,
    Turkmenistan,
    Turkiye,
    Ukraine,
    VaticanCity,
    Montenegro,
    Serbia,
    Uzbekistan,
    Tajikistan,
    KyrgyzRepublic,
    EuropeanCommunity,
    RestOfEurope,
    RestOfTheWorld,
    Unrecognized(u8),
}

impl NationNumeric {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => Self::NoInformation,
            0x01 => Self::Austria,
            0x02 => Self::Albania,
            0x03 => Self::Andorra,
            0x04 => Self::Armenia,
            0x05 => Self::Azerbaijan,
            0x06 => Self::Belgium,
            0x07 => Self::Bulgaria,
            0x08 => Self::BosniaHerzegovina,
            0x09 => Self::Belarus,
            0x0A => Self::Switzerland,
            0x0B => Self::Cyprus,
            0x0C => Self::CzechRepublic,
            0x0D => Self::Germany,
            0x0E => Self::Denmark,
            0x0F => Self::Spain,
            0x10 => Self::Estonia,
            0x11 => Self::France,
            0x12 => Self::Finland,
            0x13 => Self::Liechtenstein,
            0x14 => Self::FaroeIslands,
            0x15 => Self::UnitedKingdom,
            0x16 => Self::Georgia,
            0x17 => Self::Greece,
            0x18 => Self::Hungary,
            0x19 => Self::Croatia,
            0x1A => Self::Italy,
            0x1B => Self::Ireland,
            0x1C => Self::Iceland,
            0x1D => Self::Kazakhstan,
            0x1E => Self::Luxembourg,
            0x1F => Self::Lithuania,
            0x20 => Self::Latvia,
            0x21 => Self::Malta,
            0x22 => Self::Monaco,
            0x23 => Self::Moldova,
            0x24 => Self::NorthMacedonia,
            0x25 => Self::Norway,
            0x26 => Self::Netherlands,
            0x27 => Self::Portugal,
            0x28 => Self::Poland,
            0x29 => Self::Romania,
            0x2A => Self::SanMarino,
            0x2B => Self::Russia,
            0x2C => Self::Sweden,
            0x2D => Self::Slovakia,
            0x2E => Self::Slovenia,
            0x2F => Self::Turkmenistan,
            0x30 => Self::Turkiye,
            0x31 => Self::Ukraine,
            0x32 => Self::VaticanCity,
            0x34 => Self::Montenegro,
            0x35 => Self::Serbia,
            0x36 => Self::Uzbekistan,
            0x37 => Self::Tajikistan,
            0x38 => Self::KyrgyzRepublic,
            0xFD => Self::EuropeanCommunity,
            0xFE => Self::RestOfEurope,
            0xFF => Self::RestOfTheWorld,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::NoInformation => 0x00,
            Self::Austria => 0x01,
            Self::Albania => 0x02,
            Self::Andorra => 0x03,
            Self::Armenia => 0x04,
            Self::Azerbaijan => 0x05,
            Self::Belgium => 0x06,
            Self::Bulgaria => 0x07,
            Self::BosniaHerzegovina => 0x08,
            Self::Belarus => 0x09,
            Self::Switzerland => 0x0A,
            Self::Cyprus => 0x0B,
            Self::CzechRepublic => 0x0C,
            Self::Germany => 0x0D,
            Self::Denmark => 0x0E,
            Self::Spain => 0x0F,
            Self::Estonia => 0x10,
            Self::France => 0x11,
            Self::Finland => 0x12,
            Self::Liechtenstein => 0x13,
            Self::FaroeIslands => 0x14,
            Self::UnitedKingdom => 0x15,
            Self::Georgia => 0x16,
            Self::Greece => 0x17,
            Self::Hungary => 0x18,
            Self::Croatia => 0x19,
            Self::Italy => 0x1A,
            Self::Ireland => 0x1B,
            Self::Iceland => 0x1C,
            Self::Kazakhstan => 0x1D,
            Self::Luxembourg => 0x1E,
            Self::Lithuania => 0x1F,
            Self::Latvia => 0x20,
            Self::Malta => 0x21,
            Self::Monaco => 0x22,
            Self::Moldova => 0x23,
            Self::NorthMacedonia => 0x24,
            Self::Norway => 0x25,
            Self::Netherlands => 0x26,
            Self::Portugal => 0x27,
            Self::Poland => 0x28,
            Self::Romania => 0x29,
            Self::SanMarino => 0x2A,
            Self::Russia => 0x2B,
            Self::Sweden => 0x2C,
            Self::Slovakia => 0x2D,
            Self::Slovenia => 0x2E,
            Self::Turkmenistan => 0x2F,
            Self::Turkiye => 0x30,
            Self::Ukraine => 0x31,
            Self::VaticanCity => 0x32,
            Self::Montenegro => 0x34,
            Self::Serbia => 0x35,
            Self::Uzbekistan => 0x36,
            Self::Tajikistan => 0x37,
            Self::KyrgyzRepublic => 0x38,
            Self::EuropeanCommunity => 0xFD,
            Self::RestOfEurope => 0xFE,
            Self::RestOfTheWorld => 0xFF,
            Self::Unrecognized(other) => *other,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor.read_u8().context("Failed to read nation numeric")?;
        Ok(Self::from_byte(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code());
        Ok(())
    }
}

/// [ManufacturerCode: appendix 2.94.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e22253)
///
/// The registry changes between regulation updates, so the wire byte is the
/// value; the registered name is a lookup on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerCode(pub u8);

impl ManufacturerCode {
    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let code = cursor.read_u8().context("Failed to read ManufacturerCode")?;
        Ok(ManufacturerCode(code))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.0);
        Ok(())
    }

    pub fn name(&self) -> Option<&'static str> {
        let name = match self.0 {
            0x10 => "Actia S.A.",
            0x11 => "Security Printing and Systems Ltd.",
            0x12 => "Austria Card Plastikkarten und Ausweissysteme GmbH",
            0x17 => "Real Casa de la Moneda",
            0x20 => "CETIS d.d.",
            0x21 => "certSIGN",
            0x29 => "DVLA",
            0x30 => "IDEMIA The Netherlands BV",
            0x38 => "Fábrica Nacional de Moneda y Timbre",
            0x40 => "Giesecke & Devrient GmbH",
            0x43 => "Giesecke & Devrient GB Ltd.",
            0x48 => "Hungarian Banknote Printing Co. Ltd.",
            0x50 => "Imprimerie Nationale",
            0x51 => "Imprensa Nacional-Casa da Moeda, SA",
            0x53 => "Intellic Germany GmbH - ZF Group CVS",
            0x60 => "Kraftfahrt-Bundesamt (KBA)",
            0x81 => "Morpho e-documents",
            0x84 => "ORGA Kartensysteme GmbH",
            0x89 => "Polska Wytwórnia Papierów Wartosciowych S.A.",
            0xA1 => "Continental Automotive Technologies",
            0xA2 => "Stoneridge Electronics AB",
            0xA3 => "Thales",
            0xA5 => "STMicroelectronics - Incard Division",
            0xAB => "T-Systems International GmbH",
            0xAC => "Thales DIS Schweiz AG",
            _ => return None,
        };
        Some(name)
    }
}

/// [EquipmentType: appendix 2.67.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e20100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentType {
    Reserved,
    DriverCard,
    WorkshopCard,
    ControlCard,
    CompanyCard,
    ManufacturingCard,
    VehicleUnit,
    MotionSensor,
    Unrecognized(u8),
}

impl EquipmentType {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0 => Self::Reserved,
            1 => Self::DriverCard,
            2 => Self::WorkshopCard,
            3 => Self::ControlCard,
            4 => Self::CompanyCard,
            5 => Self::ManufacturingCard,
            6 => Self::VehicleUnit,
            7 => Self::MotionSensor,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Reserved => 0,
            Self::DriverCard => 1,
            Self::WorkshopCard => 2,
            Self::ControlCard => 3,
            Self::CompanyCard => 4,
            Self::ManufacturingCard => 5,
            Self::VehicleUnit => 6,
            Self::MotionSensor => 7,
            Self::Unrecognized(other) => *other,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor.read_u8().context("Failed to read equipment type")?;
        Ok(Self::from_byte(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code());
        Ok(())
    }
}

/// [EventFaultType: appendix 2.70.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e20338)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFaultType {
    NoFurtherDetails,
    InsertionOfNonValidCard,
    CardConflict,
    TimeOverlap,
    DrivingWithoutAppropriateCard,
    CardInsertionWhileDriving,
    LastCardSessionNotCorrectlyClosed,
    OverSpeeding,
    PowerSupplyInterruption,
    MotionDataError,
    VehicleMotionConflict,
    VuSecurityBreachAttemptNoFurtherDetails,
    MotionSensorAuthenticationFailure,
    TachographCardAuthenticationFailure,
    UnauthorizedChangeOfMotionSensor,
    CardDataInputIntegrityError,
    StoredUserDataIntegrityError,
    InternalDataTransferError,
    UnauthorizedCaseOpening,
    HardwareSabotage,
    SensorSecurityBreachAttemptNoFurtherDetails,
    SensorAuthenticationFailure,
    SensorStoredDataIntegrityError,
    SensorInternalDataTransferError,
    SensorUnauthorizedCaseOpening,
    SensorHardwareSabotage,
    ControlDeviceFaultNoFurtherDetails,
    VuInternalFault,
    PrinterFault,
    DisplayFault,
    DownloadingFault,
    SensorFault,
    CardFaultNoFurtherDetails,
    Unrecognized(u8),
}

impl EventFaultType {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => Self::NoFurtherDetails,
            0x01 => Self::InsertionOfNonValidCard,
            0x02 => Self::CardConflict,
            0x03 => Self::TimeOverlap,
            0x04 => Self::DrivingWithoutAppropriateCard,
            0x05 => Self::CardInsertionWhileDriving,
            0x06 => Self::LastCardSessionNotCorrectlyClosed,
            0x07 => Self::OverSpeeding,
            0x08 => Self::PowerSupplyInterruption,
            0x09 => Self::MotionDataError,
            0x0A => Self::VehicleMotionConflict,
            0x10 => Self::VuSecurityBreachAttemptNoFurtherDetails,
            0x11 => Self::MotionSensorAuthenticationFailure,
            0x12 => Self::TachographCardAuthenticationFailure,
            0x13 => Self::UnauthorizedChangeOfMotionSensor,
            0x14 => Self::CardDataInputIntegrityError,
            0x15 => Self::StoredUserDataIntegrityError,
            0x16 => Self::InternalDataTransferError,
            0x17 => Self::UnauthorizedCaseOpening,
            0x18 => Self::HardwareSabotage,
            0x20 => Self::SensorSecurityBreachAttemptNoFurtherDetails,
            0x21 => Self::SensorAuthenticationFailure,
            0x22 => Self::SensorStoredDataIntegrityError,
            0x23 => Self::SensorInternalDataTransferError,
            0x24 => Self::SensorUnauthorizedCaseOpening,
            0x25 => Self::SensorHardwareSabotage,
            0x30 => Self::ControlDeviceFaultNoFurtherDetails,
            0x31 => Self::VuInternalFault,
            0x32 => Self::PrinterFault,
            0x33 => Self::DisplayFault,
            0x34 => Self::DownloadingFault,
            0x35 => Self::SensorFault,
            0x40 => Self::CardFaultNoFurtherDetails,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::NoFurtherDetails => 0x00,
            Self::InsertionOfNonValidCard => 0x01,
            Self::CardConflict => 0x02,
            Self::TimeOverlap => 0x03,
            Self::DrivingWithoutAppropriateCard => 0x04,
            Self::CardInsertionWhileDriving => 0x05,
            Self::LastCardSessionNotCorrectlyClosed => 0x06,
            Self::OverSpeeding => 0x07,
            Self::PowerSupplyInterruption => 0x08,
            Self::MotionDataError => 0x09,
            Self::VehicleMotionConflict => 0x0A,
            Self::VuSecurityBreachAttemptNoFurtherDetails => 0x10,
            Self::MotionSensorAuthenticationFailure => 0x11,
            Self::TachographCardAuthenticationFailure => 0x12,
            Self::UnauthorizedChangeOfMotionSensor => 0x13,
            Self::CardDataInputIntegrityError => 0x14,
            Self::StoredUserDataIntegrityError => 0x15,
            Self::InternalDataTransferError => 0x16,
            Self::UnauthorizedCaseOpening => 0x17,
            Self::HardwareSabotage => 0x18,
            Self::SensorSecurityBreachAttemptNoFurtherDetails => 0x20,
            Self::SensorAuthenticationFailure => 0x21,
            Self::SensorStoredDataIntegrityError => 0x22,
            Self::SensorInternalDataTransferError => 0x23,
            Self::SensorUnauthorizedCaseOpening => 0x24,
            Self::SensorHardwareSabotage => 0x25,
            Self::ControlDeviceFaultNoFurtherDetails => 0x30,
            Self::VuInternalFault => 0x31,
            Self::PrinterFault => 0x32,
            Self::DisplayFault => 0x33,
            Self::DownloadingFault => 0x34,
            Self::SensorFault => 0x35,
            Self::CardFaultNoFurtherDetails => 0x40,
            Self::Unrecognized(other) => *other,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read value for EventFaultType")?;
        Ok(Self::from_byte(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code());
        Ok(())
    }
}

/// [EventFaultRecordPurpose: appendix 2.69.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e20262)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFaultRecordPurpose {
    OneOfTenMostRecentOrLast,
    LongestEventLastTenDays,
    OneOfFiveLongestEventsLastYear,
    LastEventLastTenDays,
    MostSeriousEventLastTenDays,
    OneOfFiveMostSeriousEventsLastYear,
    FirstEventAfterLastCalibration,
    ActiveOrOngoing,
    Unrecognized(u8),
}

impl EventFaultRecordPurpose {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => Self::OneOfTenMostRecentOrLast,
            0x01 => Self::LongestEventLastTenDays,
            0x02 => Self::OneOfFiveLongestEventsLastYear,
            0x03 => Self::LastEventLastTenDays,
            0x04 => Self::MostSeriousEventLastTenDays,
            0x05 => Self::OneOfFiveMostSeriousEventsLastYear,
            0x06 => Self::FirstEventAfterLastCalibration,
            0x07 => Self::ActiveOrOngoing,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::OneOfTenMostRecentOrLast => 0x00,
            Self::LongestEventLastTenDays => 0x01,
            Self::OneOfFiveLongestEventsLastYear => 0x02,
            Self::LastEventLastTenDays => 0x03,
            Self::MostSeriousEventLastTenDays => 0x04,
            Self::OneOfFiveMostSeriousEventsLastYear => 0x05,
            Self::FirstEventAfterLastCalibration => 0x06,
            Self::ActiveOrOngoing => 0x07,
            Self::Unrecognized(other) => *other,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read EventFaultRecordPurpose")?;
        Ok(Self::from_byte(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code());
        Ok(())
    }
}

/// [SpecificConditionType: appendix 2.154.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e24685)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecificConditionType {
    OutOfScopeBegin,
    OutOfScopeEnd,
    FerryTrainCrossingBegin,
    FerryTrainCrossingEnd,
    Unrecognized(u8),
}

impl SpecificConditionType {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x1 => Self::OutOfScopeBegin,
            0x2 => Self::OutOfScopeEnd,
            0x3 => Self::FerryTrainCrossingBegin,
            0x4 => Self::FerryTrainCrossingEnd,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::OutOfScopeBegin => 0x1,
            Self::OutOfScopeEnd => 0x2,
            Self::FerryTrainCrossingBegin => 0x3,
            Self::FerryTrainCrossingEnd => 0x4,
            Self::Unrecognized(other) => *other,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read value for SpecificConditionType")?;
        Ok(Self::from_byte(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code());
        Ok(())
    }
}

/// [CalibrationPurpose: appendix 2.8.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e16597)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationPurpose {
    Reserved,
    Activation,
    FirstInstallation,
    Installation,
    PeriodicInspection,
    Unrecognized(u8),
}

impl CalibrationPurpose {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => Self::Reserved,
            0x01 => Self::Activation,
            0x02 => Self::FirstInstallation,
            0x03 => Self::Installation,
            0x04 => Self::PeriodicInspection,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Reserved => 0x00,
            Self::Activation => 0x01,
            Self::FirstInstallation => 0x02,
            Self::Installation => 0x03,
            Self::PeriodicInspection => 0x04,
            Self::Unrecognized(other) => *other,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read CalibrationPurpose")?;
        Ok(Self::from_byte(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code());
        Ok(())
    }
}

/// [EntryTypeDailyWorkPeriod: appendix 2.66.](https://eur-lex.europa.eu/legal-content/EN/TXT/PDF/?uri=CELEX:02016R0799-20230821#cons_toc_d1e20045)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryTypeDailyWorkPeriod {
    BeginRelatedTimeCardInsertion,
    EndRelatedTimeCardWithdrawal,
    BeginRelatedTimeManualEntry,
    EndRelatedTimeManualEntry,
    BeginRelatedTimeAssumedByVu,
    EndRelatedTimeAssumedByVu,
    Unrecognized(u8),
}

impl EntryTypeDailyWorkPeriod {
    pub fn from_byte(value: u8) -> Self {
        match value {
            0x00 => Self::BeginRelatedTimeCardInsertion,
            0x01 => Self::EndRelatedTimeCardWithdrawal,
            0x02 => Self::BeginRelatedTimeManualEntry,
            0x03 => Self::EndRelatedTimeManualEntry,
            0x04 => Self::BeginRelatedTimeAssumedByVu,
            0x05 => Self::EndRelatedTimeAssumedByVu,
            other => Self::Unrecognized(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::BeginRelatedTimeCardInsertion => 0x00,
            Self::EndRelatedTimeCardWithdrawal => 0x01,
            Self::BeginRelatedTimeManualEntry => 0x02,
            Self::EndRelatedTimeManualEntry => 0x03,
            Self::BeginRelatedTimeAssumedByVu => 0x04,
            Self::EndRelatedTimeAssumedByVu => 0x05,
            Self::Unrecognized(other) => *other,
        }
    }

    pub fn parse(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let value = cursor
            .read_u8()
            .context("Failed to read EntryTypeDailyWorkPeriod")?;
        Ok(Self::from_byte(value))
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(self.code());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nation_bi_map_round_trips_known_and_unknown() {
        assert_eq!(NationNumeric::from_byte(0x12), NationNumeric::Finland);
        assert_eq!(NationNumeric::Finland.code(), 0x12);
        let rfu = NationNumeric::from_byte(0x33);
        assert_eq!(rfu, NationNumeric::Unrecognized(0x33));
        assert_eq!(rfu.code(), 0x33);
    }

    #[test]
    fn event_fault_type_preserves_manufacturer_bytes() {
        let value = EventFaultType::from_byte(0x83);
        assert_eq!(value, EventFaultType::Unrecognized(0x83));
        assert_eq!(value.code(), 0x83);
        assert_eq!(EventFaultType::from_byte(0x07), EventFaultType::OverSpeeding);
        assert_eq!(EventFaultType::OverSpeeding.code(), 0x07);
    }

    #[test]
    fn manufacturer_code_keeps_wire_byte() {
        let code = ManufacturerCode(0xA2);
        assert_eq!(code.name(), Some("Stoneridge Electronics AB"));
        assert_eq!(ManufacturerCode(0x01).name(), None);
    }
}

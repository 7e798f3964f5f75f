use crate::card::{self, DriverCardFile, Ef};
use crate::dt::{
    self, external::NationNumeric, CardNumber, CodePageString, Datef, FullCardNumber,
    GeoCoordinates, GnssPlaceRecord, IA5String, OdometerShort, TimeReal,
    VehicleRegistrationIdentification,
};
use crate::vu::{self, VehicleUnitFile, VuBlockGen1, VuTransfer};
use crate::File;

/// Epoch anchor for scrubbed timestamps: 2020-01-01T00:00:00Z.
pub const ANCHOR: i64 = 1_577_836_800;
const HOUR: i64 = 3_600;
const HALF_HOUR: i64 = 1_800;
const DAY: i64 = 86_400;

const PLACEHOLDER_SURNAME: &str = "Doe";
const PLACEHOLDER_FIRST_NAMES: &str = "John";
const PLACEHOLDER_AUTHORITY: &str = "Card Issuing Authority";
const PLACEHOLDER_COMPANY: &str = "Test Company";
const PLACEHOLDER_ADDRESS: &str = "Example Street 1";
const PLACEHOLDER_VRN: &str = "TEST-VRN";
const PLACEHOLDER_VIN: &str = "TESTVIN";

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymizeOptions {
    pub preserve_timestamps: bool,
    pub preserve_distance_and_trips: bool,
}

/// Deterministic PII scrub. Every replacement keeps the declared field
/// length and every categorical byte (enums, flags, code pages), so the
/// anonymized file still serializes into a structurally identical stream.
pub fn anonymize(file: &File, options: &AnonymizeOptions) -> File {
    match file {
        File::DriverCard(card) => File::DriverCard(anonymize_card(card, options)),
        File::VehicleUnit(vu) => File::VehicleUnit(anonymize_vu(vu, options)),
    }
}

struct Scrubber {
    preserve_timestamps: bool,
    preserve_distance_and_trips: bool,
}

impl Scrubber {
    fn new(options: &AnonymizeOptions) -> Self {
        Scrubber {
            preserve_timestamps: options.preserve_timestamps,
            preserve_distance_and_trips: options.preserve_distance_and_trips,
        }
    }

    /// Unset timestamps stay unset; anything else lands on the anchor plus
    /// the record's ordinal offset.
    fn time(&self, time: &mut TimeReal, offset: i64) {
        if self.preserve_timestamps || !time.is_set() {
            return;
        }
        *time = TimeReal::from_timestamp(ANCHOR + offset);
    }

    fn odometer(&self, odometer: &mut OdometerShort) {
        if !self.preserve_distance_and_trips {
            odometer.0 -= odometer.0 % 100;
        }
    }

    fn distance(&self, distance: &mut dt::Distance) {
        if !self.preserve_distance_and_trips {
            distance.0 -= distance.0 % 100;
        }
    }

    fn name(&self, name: &mut CodePageString, placeholder: &str) {
        name.set_value(placeholder);
    }

    fn ia5(&self, value: &mut IA5String, placeholder: &str) {
        let truncated: String = placeholder.chars().take(value.length).collect();
        value.set_value(truncated);
    }

    fn zero_ia5(&self, value: &mut IA5String) {
        value.set_value("0".repeat(value.length));
    }

    fn holder_name(&self, holder: &mut dt::HolderName) {
        self.name(&mut holder.holder_surname, PLACEHOLDER_SURNAME);
        self.name(&mut holder.holder_first_names, PLACEHOLDER_FIRST_NAMES);
    }

    fn card_number(&self, number: &mut CardNumber) {
        match number {
            CardNumber::Driver {
                driver_identification,
                ..
            } => self.zero_ia5(driver_identification),
            CardNumber::Owner {
                owner_identification,
                ..
            } => self.zero_ia5(owner_identification),
            CardNumber::Unidentified { raw } => raw.fill(0x30),
        }
    }

    fn full_card_number(&self, number: &mut FullCardNumber) {
        self.card_number(&mut number.card_number);
    }

    fn full_card_number_and_generation(&self, number: &mut dt::gen2::FullCardNumberAndGeneration) {
        self.full_card_number(&mut number.full_card_number);
    }

    fn vehicle_registration(&self, registration: &mut VehicleRegistrationIdentification) {
        registration.vehicle_registration_nation = NationNumeric::Finland;
        registration
            .vehicle_registration_number
            .0
            .set_value(PLACEHOLDER_VRN);
    }

    fn vin(&self, vin: &mut dt::VehicleIdentificationNumber) {
        self.ia5(&mut vin.0, PLACEHOLDER_VIN);
    }

    fn coordinates(&self, coordinates: &mut GeoCoordinates) {
        // Helsinki, 60.17 N 24.93 E.
        coordinates.latitude = GeoCoordinates::pack_degrees(60.17);
        coordinates.longitude = GeoCoordinates::pack_degrees(24.93);
    }

    fn gnss_place(&self, place: &mut GnssPlaceRecord, offset: i64) {
        self.time(&mut place.time_stamp, offset);
        self.coordinates(&mut place.geo_coordinates);
    }

    fn birth_date(&self, date: &mut Datef) {
        if !date.is_unset() {
            *date = Datef {
                year: 1990,
                month: 1,
                day: 1,
            };
        }
    }
}

fn scrub_identification(scrubber: &Scrubber, ef: &mut Ef<dt::Identification>) {
    let identification = &mut ef.data;
    scrubber.card_number(&mut identification.card_identification.card_number);
    scrubber.name(
        &mut identification.card_identification.card_issuing_authority_name,
        PLACEHOLDER_AUTHORITY,
    );
    scrubber.time(&mut identification.card_identification.card_issue_date, 0);
    scrubber.time(&mut identification.card_identification.card_validity_begin, 0);
    scrubber.time(&mut identification.card_identification.card_expiry_date, 0);
    scrubber.holder_name(
        &mut identification
            .driver_card_holder_identification
            .card_holder_name,
    );
    scrubber.birth_date(
        &mut identification
            .driver_card_holder_identification
            .card_holder_birth_date,
    );
}

fn scrub_gen1_df(scrubber: &Scrubber, df: &mut card::Gen1Df) {
    if let Some(ef) = &mut df.identification {
        scrub_identification(scrubber, ef);
    }
    if let Some(ef) = &mut df.driving_licence_info {
        scrubber.name(
            &mut ef.data.driving_licence_issuing_authority,
            PLACEHOLDER_AUTHORITY,
        );
        scrubber.zero_ia5(&mut ef.data.driving_licence_number);
    }
    if let Some(ef) = &mut df.events_data {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * HALF_HOUR;
            scrubber.time(&mut record.event_begin_time, offset);
            scrubber.time(&mut record.event_end_time, offset);
            scrubber.vehicle_registration(&mut record.event_vehicle_registration);
        }
    }
    if let Some(ef) = &mut df.faults_data {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * HALF_HOUR;
            scrubber.time(&mut record.fault_begin_time, offset);
            scrubber.time(&mut record.fault_end_time, offset);
            scrubber.vehicle_registration(&mut record.fault_vehicle_registration);
        }
    }
    if let Some(ef) = &mut df.driver_activity_data {
        for (index, slot) in ef.data.activity_daily_records.iter_mut().enumerate() {
            scrubber.time(
                &mut slot.record.activity_record_date,
                index as i64 * HOUR,
            );
            scrubber.distance(&mut slot.record.activity_day_distance);
        }
    }
    if let Some(ef) = &mut df.vehicles_used {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * DAY;
            scrubber.time(&mut record.vehicle_first_use, offset);
            scrubber.time(&mut record.vehicle_last_use, offset);
            scrubber.odometer(&mut record.vehicle_odometer_begin);
            scrubber.odometer(&mut record.vehicle_odometer_end);
            scrubber.vehicle_registration(&mut record.vehicle_registration);
        }
    }
    if let Some(ef) = &mut df.places {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            scrubber.time(&mut record.entry_time, index as i64 * HOUR);
            scrubber.odometer(&mut record.vehicle_odometer_value);
        }
    }
    if let Some(ef) = &mut df.current_usage {
        scrubber.time(&mut ef.data.session_open_time, 0);
        scrubber.vehicle_registration(&mut ef.data.session_open_vehicle);
    }
    if let Some(ef) = &mut df.control_activity_data {
        scrubber.time(&mut ef.data.control_time, 0);
        scrubber.full_card_number(&mut ef.data.control_card_number);
        scrubber.vehicle_registration(&mut ef.data.control_vehicle_registration);
        scrubber.time(&mut ef.data.control_download_period_begin, 0);
        scrubber.time(&mut ef.data.control_download_period_end, 0);
    }
    if let Some(ef) = &mut df.specific_conditions {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            scrubber.time(&mut record.entry_time, index as i64 * HOUR);
        }
    }
    if let Some(ef) = &mut df.card_download {
        scrubber.time(&mut ef.data.last_card_download, 0);
    }
}

fn scrub_gen2_df(scrubber: &Scrubber, df: &mut card::Gen2Df) {
    if let Some(ef) = &mut df.identification {
        scrub_identification(scrubber, ef);
    }
    if let Some(ef) = &mut df.driving_licence_info {
        scrubber.name(
            &mut ef.data.driving_licence_issuing_authority,
            PLACEHOLDER_AUTHORITY,
        );
        scrubber.zero_ia5(&mut ef.data.driving_licence_number);
    }
    if let Some(ef) = &mut df.events_data {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * HALF_HOUR;
            scrubber.time(&mut record.event_begin_time, offset);
            scrubber.time(&mut record.event_end_time, offset);
            scrubber.vehicle_registration(&mut record.event_vehicle_registration);
        }
    }
    if let Some(ef) = &mut df.faults_data {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * HALF_HOUR;
            scrubber.time(&mut record.fault_begin_time, offset);
            scrubber.time(&mut record.fault_end_time, offset);
            scrubber.vehicle_registration(&mut record.fault_vehicle_registration);
        }
    }
    if let Some(ef) = &mut df.driver_activity_data {
        for (index, slot) in ef.data.activity_daily_records.iter_mut().enumerate() {
            scrubber.time(&mut slot.record.activity_record_date, index as i64 * HOUR);
            scrubber.distance(&mut slot.record.activity_day_distance);
        }
    }
    if let Some(ef) = &mut df.vehicles_used {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * DAY;
            scrubber.time(&mut record.vehicle_first_use, offset);
            scrubber.time(&mut record.vehicle_last_use, offset);
            scrubber.odometer(&mut record.vehicle_odometer_begin);
            scrubber.odometer(&mut record.vehicle_odometer_end);
            scrubber.vehicle_registration(&mut record.vehicle_registration);
            scrubber.vin(&mut record.vehicle_identification_number);
        }
    }
    if let Some(ef) = &mut df.places {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * HOUR;
            scrubber.time(&mut record.entry_time, offset);
            scrubber.odometer(&mut record.vehicle_odometer_value);
            scrubber.gnss_place(&mut record.entry_gnss_place_record, offset);
        }
    }
    if let Some(ef) = &mut df.current_usage {
        scrubber.time(&mut ef.data.session_open_time, 0);
        scrubber.vehicle_registration(&mut ef.data.session_open_vehicle);
    }
    if let Some(ef) = &mut df.control_activity_data {
        scrubber.time(&mut ef.data.control_time, 0);
        scrubber.full_card_number(&mut ef.data.control_card_number);
        scrubber.vehicle_registration(&mut ef.data.control_vehicle_registration);
        scrubber.time(&mut ef.data.control_download_period_begin, 0);
        scrubber.time(&mut ef.data.control_download_period_end, 0);
    }
    if let Some(ef) = &mut df.specific_conditions {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            scrubber.time(&mut record.entry_time, index as i64 * HOUR);
        }
    }
    if let Some(ef) = &mut df.card_download {
        scrubber.time(&mut ef.data.last_card_download, 0);
    }
    if let Some(ef) = &mut df.vehicle_units_used {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            scrubber.time(&mut record.time_stamp, index as i64 * HOUR);
        }
    }
    if let Some(ef) = &mut df.gnss_places {
        for (index, record) in ef.data.0.records.iter_mut().enumerate() {
            let offset = index as i64 * HOUR;
            scrubber.time(&mut record.time_stamp, offset);
            scrubber.gnss_place(&mut record.gnss_place_record, offset);
            scrubber.odometer(&mut record.vehicle_odometer_value);
        }
    }
}

pub fn anonymize_card(file: &DriverCardFile, options: &AnonymizeOptions) -> DriverCardFile {
    let scrubber = Scrubber::new(options);
    let mut file = file.clone();

    if let Some(ef) = &mut file.icc {
        // The extended serial number identifies the physical card.
        ef.data.card_extended_serial_number.serial_number = 0;
    }
    if let Some(ef) = &mut file.ic {
        ef.data.ic_serial_number.fill(0);
    }
    if let Some(df) = &mut file.tachograph {
        scrub_gen1_df(&scrubber, df);
    }
    if let Some(df) = &mut file.tachograph_g2 {
        scrub_gen2_df(&scrubber, df);
    }
    if !file.unknown_records.is_empty() {
        log::warn!(
            "Dropping {} unknown records; their contents cannot be scrubbed",
            file.unknown_records.len()
        );
        file.unknown_records.clear();
    }
    card::clear_signatures(&mut file);
    file
}

fn scrub_gen1_block(scrubber: &Scrubber, block: &mut VuBlockGen1) {
    match block {
        VuBlockGen1::Overview(overview) => {
            scrubber.vin(&mut overview.vehicle_identification_number);
            scrubber.vehicle_registration(&mut overview.vehicle_registration_identification);
            scrubber.time(&mut overview.current_date_time, 0);
            scrubber.time(&mut overview.vu_downloadable_period.min_downloadable_time, 0);
            scrubber.time(&mut overview.vu_downloadable_period.max_downloadable_time, 0);
            scrubber.time(&mut overview.vu_download_activity_data.downloading_time, 0);
            scrubber.full_card_number(&mut overview.vu_download_activity_data.full_card_number);
            scrubber.name(
                &mut overview.vu_download_activity_data.company_or_workshop_name,
                PLACEHOLDER_COMPANY,
            );
            for (index, lock) in overview.vu_company_locks.iter_mut().enumerate() {
                let offset = index as i64 * HOUR;
                scrubber.time(&mut lock.lock_in_time, offset);
                scrubber.time(&mut lock.lock_out_time, offset);
                scrubber.name(&mut lock.company_name, PLACEHOLDER_COMPANY);
                scrubber.name(&mut lock.company_address, PLACEHOLDER_ADDRESS);
                scrubber.full_card_number(&mut lock.company_card_number);
            }
            for (index, control) in overview.vu_control_activities.iter_mut().enumerate() {
                let offset = index as i64 * HOUR;
                scrubber.time(&mut control.control_time, offset);
                scrubber.full_card_number(&mut control.control_card_number);
                scrubber.time(&mut control.download_period_begin, offset);
                scrubber.time(&mut control.download_period_end, offset);
            }
        }
        VuBlockGen1::Activities(activities) => {
            scrubber.time(&mut activities.date_of_day_downloaded, 0);
            scrubber.odometer(&mut activities.odometer_value_midnight);
            for (index, record) in activities.vu_card_iw_records.iter_mut().enumerate() {
                let offset = index as i64 * HOUR;
                scrubber.holder_name(&mut record.card_holder_name);
                scrubber.full_card_number(&mut record.full_card_number);
                scrubber.time(&mut record.card_expiry_date, offset);
                scrubber.time(&mut record.card_insertion_time, offset);
                scrubber.odometer(&mut record.vehicle_odometer_value_at_insertion);
                scrubber.time(&mut record.card_withdrawal_time, offset);
                scrubber.odometer(&mut record.vehicle_odometer_value_at_withdrawal);
                scrubber.vehicle_registration(
                    &mut record.previous_vehicle_info.vehicle_registration_identification,
                );
                scrubber.time(&mut record.previous_vehicle_info.card_withdrawal_time, offset);
            }
            for (index, place) in activities.vu_place_daily_work_periods.iter_mut().enumerate() {
                let offset = index as i64 * HOUR;
                scrubber.full_card_number(&mut place.full_card_number);
                scrubber.time(&mut place.place_record.entry_time, offset);
                scrubber.odometer(&mut place.place_record.vehicle_odometer_value);
            }
            for (index, condition) in activities.vu_specific_conditions.iter_mut().enumerate() {
                scrubber.time(&mut condition.entry_time, index as i64 * HOUR);
            }
        }
        VuBlockGen1::EventsAndFaults(events) => {
            for (index, fault) in events.vu_faults.iter_mut().enumerate() {
                let offset = index as i64 * HALF_HOUR;
                scrubber.time(&mut fault.fault_begin_time, offset);
                scrubber.time(&mut fault.fault_end_time, offset);
                scrubber.full_card_number(&mut fault.card_number_driver_slot_begin);
                scrubber.full_card_number(&mut fault.card_number_codriver_slot_begin);
                scrubber.full_card_number(&mut fault.card_number_driver_slot_end);
                scrubber.full_card_number(&mut fault.card_number_codriver_slot_end);
            }
            for (index, event) in events.vu_events.iter_mut().enumerate() {
                let offset = index as i64 * HALF_HOUR;
                scrubber.time(&mut event.event_begin_time, offset);
                scrubber.time(&mut event.event_end_time, offset);
                scrubber.full_card_number(&mut event.card_number_driver_slot_begin);
                scrubber.full_card_number(&mut event.card_number_codriver_slot_begin);
                scrubber.full_card_number(&mut event.card_number_driver_slot_end);
                scrubber.full_card_number(&mut event.card_number_codriver_slot_end);
            }
            scrubber.time(
                &mut events.vu_overspeeding_control_data.last_overspeed_control_time,
                0,
            );
            scrubber.time(&mut events.vu_overspeeding_control_data.first_overspeed_since, 0);
            for (index, event) in events.vu_overspeeding_events.iter_mut().enumerate() {
                let offset = index as i64 * HALF_HOUR;
                scrubber.time(&mut event.event_begin_time, offset);
                scrubber.time(&mut event.event_end_time, offset);
                scrubber.full_card_number(&mut event.card_number_driver_slot_begin);
            }
            for (index, adjustment) in events.vu_time_adjustments.iter_mut().enumerate() {
                let offset = index as i64 * HOUR;
                scrubber.time(&mut adjustment.old_time_value, offset);
                scrubber.time(&mut adjustment.new_time_value, offset);
                scrubber.name(&mut adjustment.workshop_name, PLACEHOLDER_COMPANY);
                scrubber.name(&mut adjustment.workshop_address, PLACEHOLDER_ADDRESS);
                scrubber.full_card_number(&mut adjustment.workshop_card_number);
            }
        }
        VuBlockGen1::DetailedSpeed(speed) => {
            for (index, block) in speed.vu_detailed_speed_blocks.iter_mut().enumerate() {
                scrubber.time(&mut block.speed_block_begin_date, index as i64 * HOUR);
            }
        }
        VuBlockGen1::TechnicalData(technical) => {
            scrubber.time(&mut technical.vu_identification.vu_manufacturing_date, 0);
            scrubber.time(
                &mut technical
                    .vu_identification
                    .vu_software_identification
                    .vu_soft_installation_date,
                0,
            );
            technical.vu_identification.vu_serial_number.serial_number = 0;
            technical.sensor_paired.sensor_serial_number.serial_number = 0;
            scrubber.time(&mut technical.sensor_paired.sensor_pairing_date_first, 0);
            for (index, calibration) in technical.vu_calibration_records.iter_mut().enumerate() {
                let offset = index as i64 * DAY;
                scrubber.name(&mut calibration.workshop_name, PLACEHOLDER_COMPANY);
                scrubber.name(&mut calibration.workshop_address, PLACEHOLDER_ADDRESS);
                scrubber.full_card_number(&mut calibration.workshop_card_number);
                scrubber.time(&mut calibration.workshop_card_expiry_date, offset);
                scrubber.vin(&mut calibration.vehicle_identification_number);
                scrubber.vehicle_registration(&mut calibration.vehicle_registration_identification);
                scrubber.odometer(&mut calibration.old_odometer_value);
                scrubber.odometer(&mut calibration.new_odometer_value);
                scrubber.time(&mut calibration.old_time_value, offset);
                scrubber.time(&mut calibration.new_time_value, offset);
                scrubber.time(&mut calibration.next_calibration_date, offset);
            }
        }
    }
}

fn scrub_gen2_arrays(scrubber: &Scrubber, arrays: &mut [dt::gen2::VuRecordArray]) {
    use dt::gen2::VuRecordArrayPayload as P;
    for array in arrays.iter_mut() {
        match &mut array.payload {
            P::VehicleIdentificationNumber(records) => {
                for vin in records {
                    scrubber.vin(vin);
                }
            }
            P::VehicleRegistrationNumber(records) => {
                for vrn in records {
                    vrn.0.set_value(PLACEHOLDER_VRN);
                }
            }
            P::CurrentDateTime(records) | P::DateOfDayDownloaded(records) => {
                for (index, time) in records.iter_mut().enumerate() {
                    scrubber.time(time, index as i64 * HOUR);
                }
            }
            P::OdometerValueMidnight(records) => {
                for odometer in records {
                    scrubber.odometer(odometer);
                }
            }
            P::VuDownloadablePeriod(records) => {
                for period in records {
                    scrubber.time(&mut period.min_downloadable_time, 0);
                    scrubber.time(&mut period.max_downloadable_time, 0);
                }
            }
            P::VuDownloadActivityData(records) => {
                for record in records {
                    scrubber.time(&mut record.downloading_time, 0);
                    scrubber
                        .full_card_number_and_generation(&mut record.full_card_number_and_generation);
                    scrubber.name(&mut record.company_or_workshop_name, PLACEHOLDER_COMPANY);
                }
            }
            P::VuCompanyLocks(records) => {
                for (index, lock) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HOUR;
                    scrubber.time(&mut lock.lock_in_time, offset);
                    scrubber.time(&mut lock.lock_out_time, offset);
                    scrubber.name(&mut lock.company_name, PLACEHOLDER_COMPANY);
                    scrubber.name(&mut lock.company_address, PLACEHOLDER_ADDRESS);
                    scrubber.full_card_number_and_generation(
                        &mut lock.company_card_number_and_generation,
                    );
                }
            }
            P::VuControlActivity(records) => {
                for (index, control) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HOUR;
                    scrubber.time(&mut control.control_time, offset);
                    scrubber.full_card_number_and_generation(
                        &mut control.control_card_number_and_generation,
                    );
                    scrubber.time(&mut control.download_period_begin, offset);
                    scrubber.time(&mut control.download_period_end, offset);
                }
            }
            P::VuCardIWRecords(records) => {
                for (index, record) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HOUR;
                    scrubber.holder_name(&mut record.card_holder_name);
                    scrubber.full_card_number_and_generation(
                        &mut record.full_card_number_and_generation,
                    );
                    scrubber.time(&mut record.card_expiry_date, offset);
                    scrubber.time(&mut record.card_insertion_time, offset);
                    scrubber.odometer(&mut record.vehicle_odometer_value_at_insertion);
                    scrubber.time(&mut record.card_withdrawal_time, offset);
                    scrubber.odometer(&mut record.vehicle_odometer_value_at_withdrawal);
                    scrubber.vehicle_registration(
                        &mut record.previous_vehicle_info.vehicle_registration_identification,
                    );
                    scrubber
                        .time(&mut record.previous_vehicle_info.card_withdrawal_time, offset);
                }
            }
            P::VuPlaceDailyWorkPeriod(records) => {
                for (index, record) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HOUR;
                    scrubber.full_card_number_and_generation(
                        &mut record.full_card_number_and_generation,
                    );
                    scrubber.time(&mut record.place_record.entry_time, offset);
                    scrubber.odometer(&mut record.place_record.vehicle_odometer_value);
                    scrubber.gnss_place(&mut record.place_record.entry_gnss_place_record, offset);
                }
            }
            P::VuGnssAd(records) => {
                for (index, record) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HOUR;
                    scrubber.time(&mut record.time_stamp, offset);
                    scrubber
                        .full_card_number_and_generation(&mut record.card_number_driver_slot);
                    scrubber
                        .full_card_number_and_generation(&mut record.card_number_codriver_slot);
                    scrubber.gnss_place(&mut record.gnss_place_record, offset);
                    scrubber.odometer(&mut record.vehicle_odometer_value);
                }
            }
            P::SpecificConditions(records) => {
                for (index, record) in records.iter_mut().enumerate() {
                    scrubber.time(&mut record.entry_time, index as i64 * HOUR);
                }
            }
            P::VuEvents(records) => {
                for (index, event) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HALF_HOUR;
                    scrubber.time(&mut event.event_begin_time, offset);
                    scrubber.time(&mut event.event_end_time, offset);
                    scrubber.full_card_number_and_generation(
                        &mut event.card_number_driver_slot_begin,
                    );
                    scrubber.full_card_number_and_generation(
                        &mut event.card_number_codriver_slot_begin,
                    );
                    scrubber
                        .full_card_number_and_generation(&mut event.card_number_driver_slot_end);
                    scrubber.full_card_number_and_generation(
                        &mut event.card_number_codriver_slot_end,
                    );
                }
            }
            P::VuFaults(records) => {
                for (index, fault) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HALF_HOUR;
                    scrubber.time(&mut fault.fault_begin_time, offset);
                    scrubber.time(&mut fault.fault_end_time, offset);
                    scrubber.full_card_number_and_generation(
                        &mut fault.card_number_driver_slot_begin,
                    );
                    scrubber.full_card_number_and_generation(
                        &mut fault.card_number_codriver_slot_begin,
                    );
                    scrubber
                        .full_card_number_and_generation(&mut fault.card_number_driver_slot_end);
                    scrubber.full_card_number_and_generation(
                        &mut fault.card_number_codriver_slot_end,
                    );
                }
            }
            P::VuOverSpeedingControl(records) => {
                for record in records {
                    scrubber.time(&mut record.last_overspeed_control_time, 0);
                    scrubber.time(&mut record.first_overspeed_since, 0);
                }
            }
            P::VuOverSpeedingEvents(records) => {
                for (index, event) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HALF_HOUR;
                    scrubber.time(&mut event.event_begin_time, offset);
                    scrubber.time(&mut event.event_end_time, offset);
                    scrubber.full_card_number_and_generation(
                        &mut event.card_number_driver_slot_begin,
                    );
                }
            }
            P::VuTimeAdjustments(records) => {
                for (index, adjustment) in records.iter_mut().enumerate() {
                    let offset = index as i64 * HOUR;
                    scrubber.time(&mut adjustment.old_time_value, offset);
                    scrubber.time(&mut adjustment.new_time_value, offset);
                    scrubber.name(&mut adjustment.workshop_name, PLACEHOLDER_COMPANY);
                    scrubber.name(&mut adjustment.workshop_address, PLACEHOLDER_ADDRESS);
                    scrubber.full_card_number_and_generation(
                        &mut adjustment.workshop_card_number_and_generation,
                    );
                }
            }
            P::VuItsConsent(records) => {
                for record in records {
                    scrubber.full_card_number_and_generation(
                        &mut record.full_card_number_and_generation,
                    );
                }
            }
            P::VuDetailedSpeedBlocks(records) => {
                for (index, block) in records.iter_mut().enumerate() {
                    scrubber.time(&mut block.speed_block_begin_date, index as i64 * HOUR);
                }
            }
            P::VuIdentification(records) => {
                for record in records {
                    scrubber.time(&mut record.vu_manufacturing_date, 0);
                    scrubber.time(
                        &mut record.vu_software_identification.vu_soft_installation_date,
                        0,
                    );
                    record.vu_serial_number.serial_number = 0;
                }
            }
            P::ActivityChangeInfo(_) => {}
            P::MemberStateCertificate(_) | P::VuCertificate(_) => {}
            P::CardSlotsStatus(_) => {}
            P::Signature(_) => {}
            P::Opaque(_) => {
                log::warn!(
                    "Record array {:?} is carried opaque and was not scrubbed",
                    array.record_type
                );
            }
        }
    }
}

pub fn anonymize_vu(file: &VehicleUnitFile, options: &AnonymizeOptions) -> VehicleUnitFile {
    let scrubber = Scrubber::new(options);
    let mut file = file.clone();
    for transfer in &mut file.transfers {
        match transfer {
            VuTransfer::Gen1(block) => scrub_gen1_block(&scrubber, block),
            VuTransfer::Gen2(block) => scrub_gen2_arrays(&scrubber, &mut block.record_arrays),
        }
    }
    vu::clear_signatures(&mut file);
    file
}

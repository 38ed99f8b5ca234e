use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::plate::Plate;
use crate::domain::venue::VenueId;

/// Normalized fee lookup result shared by every venue integration.
///
/// Field names follow the wire shape the flow consumes (`resCode`,
/// `inTime`, `chargeMoney`). `chargeMoney` is in minor currency units and
/// may be empty when the upstream has not computed a charge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRecord {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(rename = "resCode", default)]
    pub res_code: i64,
    #[serde(rename = "inTime", default)]
    pub in_time: String,
    #[serde(rename = "chargeMoney", default)]
    pub charge_money: String,
}

impl FeeRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.res_code == 0
    }
}

/// Normalized car-location lookup result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavRecord {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_no: i64,
    #[serde(default)]
    pub data: Option<NavLocation>,
}

impl NavRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.error_no == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLocation {
    #[serde(rename = "floorName", default)]
    pub floor_name: String,
    #[serde(rename = "spaceNo", default)]
    pub space_no: String,
}

/// Venue-agnostic record assembled per plate from a fee lookup and an
/// optional location lookup. Built fresh per user query, never cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParkingInfo {
    pub venue: VenueId,
    pub plate: String,
    pub parking_time: String,
    pub parking_fee: String,
    pub end_floor: String,
    pub end_position: String,
    pub end_name: String,
}

impl ParkingInfo {
    /// Builds the record from a successful fee lookup. The fee is converted
    /// to major units and the elapsed duration is computed against the
    /// caller-supplied `now`.
    pub fn from_fee(venue: VenueId, plate: &Plate, fee: &FeeRecord, now: NaiveDateTime) -> Self {
        Self {
            venue,
            plate: plate.as_str().to_owned(),
            parking_time: elapsed_since(&fee.in_time, now),
            parking_fee: minor_to_major(&fee.charge_money),
            end_floor: String::new(),
            end_position: String::new(),
            end_name: String::new(),
        }
    }

    /// Folds a car location into the record, including the combined
    /// `"{floor}-{space}"` display name.
    pub fn apply_location(&mut self, location: &NavLocation) {
        self.end_floor = location.floor_name.clone();
        self.end_position = location.space_no.clone();
        self.end_name = format!("{}-{}", self.end_floor, self.end_position);
    }
}

/// Converts a minor-unit amount string to major units with two decimal
/// places ("500" becomes "5.00"). Empty or unparseable input yields an
/// empty string, which downstream means "no charge computed".
pub fn minor_to_major(minor: &str) -> String {
    let trimmed = minor.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.parse::<i64>() {
        Ok(value) => Decimal::new(value, 2).to_string(),
        Err(_) => String::new(),
    }
}

/// Renders the elapsed time since an upstream entry timestamp
/// (`YYYY-MM-DD HH:MM:SS`) as a human-readable duration. Unparseable or
/// future timestamps yield an empty string.
pub fn elapsed_since(in_time: &str, now: NaiveDateTime) -> String {
    let Ok(entered) = NaiveDateTime::parse_from_str(in_time.trim(), "%Y-%m-%d %H:%M:%S") else {
        return String::new();
    };
    let elapsed = now.signed_duration_since(entered);
    if elapsed.num_seconds() < 0 {
        return String::new();
    }

    let total_minutes = elapsed.num_minutes();
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{days} days {hours} hours")
    } else if hours > 0 {
        format!("{hours} hours {minutes} minutes")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        "less than a minute".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{elapsed_since, minor_to_major, FeeRecord, NavLocation, ParkingInfo};
    use crate::domain::plate::Plate;
    use crate::domain::venue::VenueId;

    fn noon() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 1).and_then(|d| d.and_hms_opt(12, 0, 0)).unwrap()
    }

    #[test]
    fn minor_units_convert_to_major_with_two_decimals() {
        assert_eq!(minor_to_major("500"), "5.00");
        assert_eq!(minor_to_major("0"), "0.00");
        assert_eq!(minor_to_major("12345"), "123.45");
    }

    #[test]
    fn empty_or_garbage_amounts_mean_no_charge() {
        assert_eq!(minor_to_major(""), "");
        assert_eq!(minor_to_major("   "), "");
        assert_eq!(minor_to_major("five hundred"), "");
    }

    #[test]
    fn elapsed_duration_is_human_readable() {
        assert_eq!(elapsed_since("2025-07-01 08:40:00", noon()), "3 hours 20 minutes");
        assert_eq!(elapsed_since("2025-07-01 11:15:00", noon()), "45 minutes");
        assert_eq!(elapsed_since("2025-07-01 11:59:30", noon()), "less than a minute");
        assert_eq!(elapsed_since("2025-06-29 10:00:00", noon()), "2 days 2 hours");
    }

    #[test]
    fn bad_or_future_entry_times_yield_empty_duration() {
        assert_eq!(elapsed_since("not a timestamp", noon()), "");
        assert_eq!(elapsed_since("2025-07-01 13:00:00", noon()), "");
    }

    #[test]
    fn fee_success_requires_absent_error_and_zero_code() {
        let ok = FeeRecord { res_code: 0, ..FeeRecord::default() };
        assert!(ok.is_success());

        let errored =
            FeeRecord { error: Some("boom".to_owned()), res_code: 0, ..FeeRecord::default() };
        assert!(!errored.is_success());

        let business_failure = FeeRecord { res_code: 1, ..FeeRecord::default() };
        assert!(!business_failure.is_success());
    }

    #[test]
    fn record_assembly_converts_fee_and_folds_location() {
        let fee = FeeRecord {
            error: None,
            res_code: 0,
            in_time: "2025-07-01 09:55:00".to_owned(),
            charge_money: "500".to_owned(),
        };

        let mut info = ParkingInfo::from_fee(VenueId(702), &Plate::from("辽A66D6J"), &fee, noon());
        assert_eq!(info.venue, VenueId(702));
        assert_eq!(info.plate, "辽A66D6J");
        assert_eq!(info.parking_fee, "5.00");
        assert_eq!(info.parking_time, "2 hours 5 minutes");
        assert_eq!(info.end_name, "");

        info.apply_location(&NavLocation {
            floor_name: "B2".to_owned(),
            space_no: "A001".to_owned(),
        });
        assert_eq!(info.end_floor, "B2");
        assert_eq!(info.end_position, "A001");
        assert_eq!(info.end_name, "B2-A001");
    }

    #[test]
    fn wire_field_names_round_trip() {
        let fee: FeeRecord = serde_json::from_str(
            r#"{"error": null, "resCode": 0, "inTime": "2025-07-01 08:00:00", "chargeMoney": "500"}"#,
        )
        .unwrap();
        assert_eq!(fee.in_time, "2025-07-01 08:00:00");
        assert_eq!(fee.charge_money, "500");

        let nav: super::NavRecord = serde_json::from_str(
            r#"{"error": null, "error_no": 0, "data": {"floorName": "B2", "spaceNo": "A001"}}"#,
        )
        .unwrap();
        assert!(nav.is_success());
        assert_eq!(nav.data.unwrap().floor_name, "B2");
    }
}

//! Facility catalog rows and timestamped availability readings.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Placeholder used by the source data when a count is not known.
pub const UNKNOWN: i64 = -9;

/// Display and CSV format for reading timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn unknown() -> i64 {
    UNKNOWN
}

/// Static attributes of a parking facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub official_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub address: String,

    // capacity, UNKNOWN when the source has no value
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    pub total_parking_spaces: i64,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    pub total_motorcycle_spaces: i64,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    pub total_charging_stations: i64,
}

impl FacilityRecord {
    /// A record with only the identifying fields set and every count unknown.
    pub fn new(official_id: &str, name: &str, county: &str, district: &str) -> Self {
        FacilityRecord {
            official_id: official_id.to_string(),
            name: name.to_string(),
            description: String::new(),
            county: county.to_string(),
            district: district.to_string(),
            address: String::new(),
            total_parking_spaces: UNKNOWN,
            total_motorcycle_spaces: UNKNOWN,
            total_charging_stations: UNKNOWN,
        }
    }
}

/// One timestamped availability observation for a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReading {
    #[serde(with = "reading_time")]
    pub time: NaiveDateTime,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    pub remaining_parking_spaces: i64,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    pub remaining_motorcycle_spaces: i64,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    pub remaining_charging_stations: i64,
}

impl AvailabilityReading {
    /// A reading with only the car-space count known.
    pub fn new(time: NaiveDateTime, remaining_parking_spaces: i64) -> Self {
        AvailabilityReading {
            time,
            remaining_parking_spaces,
            remaining_motorcycle_spaces: UNKNOWN,
            remaining_charging_stations: UNKNOWN,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.remaining_parking_spaces == UNKNOWN
    }

    /// The column names of the tabular view, in display order.
    pub fn columns() -> [&'static str; 4] {
        [
            "time",
            "remaining_parking_spaces",
            "remaining_motorcycle_spaces",
            "remaining_charging_stations",
        ]
    }
}

/// Parses a reading timestamp, accepting both `T` and space separators and
/// optional fractional seconds.
pub fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

pub(crate) mod count {
    use serde::{Deserialize, Deserializer};

    // Empty CSV cells and JSON nulls both mean "unknown".
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(Option::<i64>::deserialize(d)?.unwrap_or(super::UNKNOWN))
    }
}

pub(crate) mod reading_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format(super::TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).ok_or_else(|| D::Error::custom(format!("invalid time '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_time_accepts_both_separators() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();

        assert_eq!(parse_time("2024-03-04 10:15:00"), Some(expected));
        assert_eq!(parse_time("2024-03-04T10:15:00"), Some(expected));
        assert_eq!(parse_time("2024-03-04T10:15:00.000"), Some(expected));
        assert_eq!(parse_time("not a time"), None);
    }

    #[test]
    fn test_reading_json_uses_display_format() {
        let reading = AvailabilityReading::new(parse_time("2024-03-04 10:15:00").unwrap(), 12);
        let json = serde_json::to_value(&reading).unwrap();

        assert_eq!(json["time"], "2024-03-04 10:15:00");
        assert_eq!(json["remaining_parking_spaces"], 12);
        assert_eq!(json["remaining_motorcycle_spaces"], UNKNOWN);
    }

    #[test]
    fn test_missing_counts_deserialize_as_unknown() {
        let json = r#"{"time": "2024-03-04 10:15:00", "remaining_parking_spaces": null}"#;
        let reading: AvailabilityReading = serde_json::from_str(json).unwrap();

        assert!(reading.is_unknown());
        assert_eq!(reading.remaining_charging_stations, UNKNOWN);
    }

    #[test]
    fn test_facility_defaults() {
        let facility = FacilityRecord::new("P001", "City Hall", "Taipei", "");

        assert_eq!(facility.total_parking_spaces, UNKNOWN);
        assert!(facility.district.is_empty());
    }
}

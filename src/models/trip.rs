use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::dates::{self, DateValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "fecha_inicio", default)]
    pub start_date: Option<DateValue>,
    #[serde(rename = "fecha_fin", default)]
    pub end_date: Option<DateValue>,
    #[serde(default, deserialize_with = "nullable_days")]
    pub total_days: i64,
    #[serde(default)]
    pub destinations: Vec<Destination>,
}

impl Default for Trip {
    fn default() -> Self {
        Self::draft("", None, None)
    }
}

impl Trip {
    pub fn draft(
        name: impl Into<String>,
        start_date: Option<DateValue>,
        end_date: Option<DateValue>,
    ) -> Self {
        let mut trip = Self {
            id: None,
            name: name.into(),
            start_date,
            end_date,
            total_days: 0,
            destinations: Vec::new(),
        };
        trip.recompute_total_days();
        trip
    }

    pub fn start(&self) -> Option<NaiveDate> {
        dates::normalize(self.start_date.as_ref())
    }

    pub fn end(&self) -> Option<NaiveDate> {
        dates::normalize(self.end_date.as_ref())
    }

    /// Zero unless both dates are readable and in order.
    pub fn recompute_total_days(&mut self) {
        self.total_days = match (self.start(), self.end()) {
            (Some(start), Some(end)) if end >= start => {
                dates::day_count(self.start_date.as_ref(), self.end_date.as_ref())
            }
            _ => 0,
        };
    }

    /// Copy with dates rewritten the way the trip endpoints expect them.
    pub fn to_server(&self) -> Self {
        let mut payload = self.clone();
        payload.start_date = self.start_date.as_ref().map(trip_date_for_server);
        payload.end_date = self.end_date.as_ref().map(trip_date_for_server);
        payload
    }
}

fn trip_date_for_server(value: &DateValue) -> DateValue {
    match value {
        DateValue::Date(date) => DateValue::Text(dates::format_trip_date_for_server(*date)),
        DateValue::Text(text) if !text.contains('T') => DateValue::Text(format!("{text}T00:00:00")),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub trip_id: i64,
    pub name: String,
    pub country: String,
    #[serde(rename = "fecha_inicio", default)]
    pub start_date: Option<DateValue>,
    #[serde(rename = "fecha_fin", default)]
    pub end_date: Option<DateValue>,
    #[serde(default, deserialize_with = "nullable_days")]
    pub days: i64,
}

impl Destination {
    pub fn draft(
        trip_id: i64,
        name: impl Into<String>,
        country: impl Into<String>,
        start_date: Option<DateValue>,
        end_date: Option<DateValue>,
    ) -> Self {
        Self {
            id: None,
            trip_id,
            name: name.into(),
            country: country.into(),
            start_date,
            end_date,
            days: 0,
        }
    }

    pub fn span_days(&self) -> i64 {
        dates::day_count(self.start_date.as_ref(), self.end_date.as_ref())
    }

    /// Copy with dates rewritten as plain `YYYY-MM-DD` values.
    pub fn to_server(&self) -> Self {
        let mut payload = self.clone();
        payload.start_date = self.start_date.as_ref().map(destination_date_for_server);
        payload.end_date = self.end_date.as_ref().map(destination_date_for_server);
        payload
    }
}

fn destination_date_for_server(value: &DateValue) -> DateValue {
    value
        .to_date()
        .map(DateValue::Date)
        .unwrap_or_else(|| value.clone())
}

fn nullable_days<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_days_needs_both_dates_in_order() {
        let trip = Trip::draft("Iberia", Some("2025-06-01".into()), Some("2025-06-10".into()));
        assert_eq!(trip.total_days, 10);

        let backwards = Trip::draft("Iberia", Some("2025-06-10".into()), Some("2025-06-01".into()));
        assert_eq!(backwards.total_days, 0);

        let open = Trip::draft("Iberia", Some("2025-06-10".into()), None);
        assert_eq!(open.total_days, 0);
    }

    #[test]
    fn trip_payload_uses_midnight_timestamps() {
        let trip = Trip::draft(
            "Iberia",
            Some(DateValue::Date(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())),
            Some("2025-06-10".into()),
        );
        let payload = serde_json::to_value(trip.to_server()).unwrap();
        assert_eq!(payload["fecha_inicio"], "2025-06-01T00:00:00");
        assert_eq!(payload["fecha_fin"], "2025-06-10T00:00:00");
        assert!(payload.get("id").is_none());
    }

    #[test]
    fn destination_payload_uses_plain_dates() {
        let dest = Destination::draft(
            3,
            "Lisbon",
            "Portugal",
            Some("2025-06-02T00:00:00".into()),
            Some("2025-06-04".into()),
        );
        let payload = serde_json::to_value(dest.to_server()).unwrap();
        assert_eq!(payload["fecha_inicio"], "2025-06-02");
        assert_eq!(payload["fecha_fin"], "2025-06-04");
        assert_eq!(payload["trip_id"], 3);
    }

    #[test]
    fn backend_trips_with_null_counts_deserialize() {
        let raw = r#"{
            "id": 4,
            "name": "Alps",
            "fecha_inicio": "2025-07-01T00:00:00",
            "fecha_fin": "2025-07-03T00:00:00",
            "total_days": null,
            "destinations": [
                {"id": 9, "trip_id": 4, "name": "Zermatt", "country": "Switzerland",
                 "fecha_inicio": "2025-07-01", "fecha_fin": "2025-07-02", "days": null}
            ]
        }"#;
        let trip: Trip = serde_json::from_str(raw).unwrap();
        assert_eq!(trip.total_days, 0);
        assert_eq!(trip.destinations[0].days, 0);
        assert_eq!(trip.destinations[0].span_days(), 2);
        assert_eq!(trip.start(), NaiveDate::from_ymd_opt(2025, 7, 1));
    }
}

//! Wire codecs shared by every entity.
//!
//! Timestamps are accepted in any of the formats clients historically sent
//! (`YYYY-MM-DD`, RFC3339, RFC3339 with nanoseconds, or a zone-less
//! `YYYY-MM-DDTHH:MM:SS[.ffffff]` which is read as UTC) and always emitted as
//! RFC3339 with trimmed nanoseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub fn format_rfc3339_nano(dt: &DateTime<Utc>) -> String {
    let base = dt.format("%Y-%m-%dT%H:%M:%S");
    let nanos = dt.timestamp_subsec_nanos();
    if nanos == 0 {
        return format!("{base}Z");
    }
    let frac = format!("{nanos:09}");
    format!("{base}.{}Z", frac.trim_end_matches('0'))
}

pub fn parse_flexible(raw: &str) -> Result<DateTime<Utc>, String> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!("unrecognized timestamp {raw:?}"))
}

/// Parses a wall-clock time such as `18:30` or `18:30:00`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Opaque payloads (drafts, templates) must at least be JSON objects.
pub fn ensure_object(value: &Value, field: &str) -> AppResult<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{field} must be a JSON object")))
    }
}

pub mod flexible_datetime {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_rfc3339_nano(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_flexible(&raw).map_err(de::Error::custom)
    }
}

pub mod flexible_datetime_opt {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => s.serialize_some(&format_rfc3339_nano(dt)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_flexible(&raw).map(Some).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use serde::Serialize;

    #[test]
    fn accepts_every_legacy_input_format() {
        let date_only = parse_flexible("2025-03-01").unwrap();
        assert_eq!(date_only, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());

        let rfc = parse_flexible("2025-03-01T18:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 16);

        let nano = parse_flexible("2025-03-01T18:30:00.123456789Z").unwrap();
        assert_eq!(nano.timestamp_subsec_nanos(), 123_456_789);

        let naive = parse_flexible("2025-03-01T18:30:00").unwrap();
        assert_eq!(naive.minute(), 30);

        let naive_micros = parse_flexible("2025-03-01T18:30:00.250000").unwrap();
        assert_eq!(naive_micros.timestamp_subsec_micros(), 250_000);
        assert_eq!(naive_micros.day(), 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_flexible("next tuesday").is_err());
        assert!(parse_flexible("2025-13-01").is_err());
    }

    #[test]
    fn output_trims_fractional_zeros() {
        let whole = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_rfc3339_nano(&whole), "2025-01-02T03:04:05Z");

        let frac = whole + chrono::Duration::milliseconds(120);
        assert_eq!(format_rfc3339_nano(&frac), "2025-01-02T03:04:05.12Z");
    }

    #[derive(Serialize, Deserialize)]
    struct Window {
        #[serde(with = "flexible_datetime")]
        starts: DateTime<Utc>,
        #[serde(with = "flexible_datetime_opt", default)]
        ends: Option<DateTime<Utc>>,
    }

    #[test]
    fn serde_modules_normalize_output() {
        let w: Window = serde_json::from_str(r#"{"starts":"2025-06-01"}"#).unwrap();
        assert!(w.ends.is_none());
        let out = serde_json::to_value(&w).unwrap();
        assert_eq!(out["starts"], "2025-06-01T00:00:00Z");
        assert!(out["ends"].is_null());

        let w: Window =
            serde_json::from_str(r#"{"starts":"2025-06-01","ends":""}"#).unwrap();
        assert!(w.ends.is_none());
    }

    #[test]
    fn clock_times() {
        assert!(parse_clock("18:30").is_some());
        assert!(parse_clock("18:30:15").is_some());
        assert!(parse_clock("25:00").is_none());
    }

    #[test]
    fn opaque_payload_must_be_object() {
        assert!(ensure_object(&serde_json::json!({"name": "x"}), "draft_data").is_ok());
        assert!(matches!(
            ensure_object(&serde_json::json!([1, 2]), "draft_data"),
            Err(AppError::Validation(_))
        ));
    }
}

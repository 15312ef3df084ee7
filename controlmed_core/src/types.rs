//! Core domain types for the ControlMed medication tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medication records and their creation/update shapes
//! - Derived dose projections (occurrences, next-dose labels)
//! - The serde mapping that pins the persisted JSON contract

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Medication Entity
// ============================================================================

/// A medication record with its dosing schedule.
///
/// The serde names below are the stable contract of the persisted JSON form,
/// inherited from earlier ControlMed data files, and must round-trip exactly.
/// The Rust field names are free to be idiomatic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: Uuid,
    #[serde(rename = "nombreMedicamento")]
    pub name: String,
    #[serde(rename = "nombreEnfermedad")]
    pub condition: String,
    /// First calendar day of the treatment (inclusive).
    #[serde(rename = "fechaInicio")]
    pub start_date: NaiveDate,
    /// Last calendar day of the treatment (inclusive); `end_date >= start_date`.
    #[serde(rename = "fechaFin")]
    pub end_date: NaiveDate,
    /// Time of day of the first daily dose.
    #[serde(rename = "horaInicio", with = "hhmm")]
    pub first_dose_time: NaiveTime,
    /// Hours between doses, in [1, 24]. Doses per day = 24 / interval, rounded down.
    #[serde(rename = "intervaloHoras")]
    pub interval_hours: u32,
    /// Lifecycle flag: true from creation until the archive sweep observes
    /// that `end_date` has passed. Never flips back to true.
    #[serde(rename = "activo")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    /// Whether `date` falls inside the treatment range (inclusive on both ends).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Input for creating a medication.
///
/// The store assigns the id, the timestamps and the initial lifecycle flag.
#[derive(Clone, Debug)]
pub struct MedicationDraft {
    pub name: String,
    pub condition: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub first_dose_time: NaiveTime,
    pub interval_hours: u32,
}

/// Partial update for a medication; absent fields are left untouched.
///
/// The lifecycle flag is deliberately not patchable. Only the archive sweep
/// writes it, and only in one direction.
#[derive(Clone, Debug, Default)]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub condition: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub first_dose_time: Option<NaiveTime>,
    pub interval_hours: Option<u32>,
}

// ============================================================================
// Derived Projections
// ============================================================================

/// One scheduled administration time on one calendar date.
///
/// A computed projection for calendar views; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct DoseOccurrence {
    pub date: NaiveDate,
    pub time_of_day: NaiveTime,
    pub medication_id: Uuid,
    pub medication_name: String,
}

/// The next upcoming dose for a medication, relative to some "now".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextDose {
    Today(NaiveTime),
    Tomorrow(NaiveTime),
}

impl fmt::Display for NextDose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextDose::Today(time) => write!(f, "today at {}", time.format("%H:%M")),
            NextDose::Tomorrow(time) => write!(f, "tomorrow at {}", time.format("%H:%M")),
        }
    }
}

// ============================================================================
// Wire Format Helpers
// ============================================================================

/// Serde adapter for the `horaInicio` wire form, which carries hours and
/// minutes only ("08:00"). Accepts an optional seconds component on input.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_medication() -> Medication {
        Medication {
            id: Uuid::new_v4(),
            name: "Paracetamol 500mg".into(),
            condition: "Gripe común".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
            first_dose_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            interval_hours: 8,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_serializes_contract_field_names() {
        let med = sample_medication();
        let json = serde_json::to_string(&med).unwrap();

        for field in [
            "\"id\"",
            "\"nombreMedicamento\"",
            "\"nombreEnfermedad\"",
            "\"fechaInicio\"",
            "\"fechaFin\"",
            "\"horaInicio\"",
            "\"intervaloHoras\"",
            "\"activo\"",
            "\"createdAt\"",
            "\"updatedAt\"",
        ] {
            assert!(json.contains(field), "missing {} in {}", field, json);
        }
    }

    #[test]
    fn test_first_dose_time_serialized_without_seconds() {
        let med = sample_medication();
        let value: serde_json::Value = serde_json::to_value(&med).unwrap();

        assert_eq!(value["horaInicio"], "08:00");
        assert_eq!(value["fechaInicio"], "2025-01-10");
    }

    #[test]
    fn test_deserializes_legacy_blob_shape() {
        let raw = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440003",
            "nombreMedicamento": "Amoxicilina 500mg",
            "nombreEnfermedad": "Infección de garganta",
            "fechaInicio": "2025-01-10",
            "fechaFin": "2025-01-17",
            "horaInicio": "06:00",
            "intervaloHoras": 6,
            "activo": false,
            "createdAt": "2025-01-10T09:00:00Z",
            "updatedAt": "2025-01-18T00:00:00Z"
        }"#;

        let med: Medication = serde_json::from_str(raw).unwrap();

        assert_eq!(med.name, "Amoxicilina 500mg");
        assert_eq!(med.condition, "Infección de garganta");
        assert_eq!(med.interval_hours, 6);
        assert!(!med.active);
        assert_eq!(med.first_dose_time, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
    }

    #[test]
    fn test_roundtrip_preserves_record() {
        let med = sample_medication();
        let json = serde_json::to_string(&med).unwrap();
        let parsed: Medication = serde_json::from_str(&json).unwrap();

        assert_eq!(med, parsed);
    }

    #[test]
    fn test_covers_is_inclusive_on_both_ends() {
        let med = sample_medication();

        assert!(med.covers(med.start_date));
        assert!(med.covers(med.end_date));
        assert!(!med.covers(med.start_date.pred_opt().unwrap()));
        assert!(!med.covers(med.end_date.succ_opt().unwrap()));
    }

    #[test]
    fn test_next_dose_labels() {
        let time = NaiveTime::from_hms_opt(16, 30, 0).unwrap();

        assert_eq!(NextDose::Today(time).to_string(), "today at 16:30");
        assert_eq!(NextDose::Tomorrow(time).to_string(), "tomorrow at 16:30");
    }
}

//! Built-in demo data for first-run seeding.
//!
//! When the medication blob has never been written, the store seeds it with
//! three example treatments spanning the active and archived cases so a
//! fresh install has something to show.

use crate::Medication;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

fn dose_time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Build the demo records, dated relative to `today`.
///
/// Two ongoing treatments plus one that ended three weeks ago and is
/// already archived.
pub fn demo_medications(today: NaiveDate) -> Vec<Medication> {
    let now = Utc::now();

    vec![
        Medication {
            id: Uuid::new_v4(),
            name: "Paracetamol 500mg".into(),
            condition: "Gripe común".into(),
            start_date: today,
            end_date: today + Duration::days(7),
            first_dose_time: dose_time(8),
            interval_hours: 8,
            active: true,
            created_at: now,
            updated_at: now,
        },
        Medication {
            id: Uuid::new_v4(),
            name: "Omeprazol 20mg".into(),
            condition: "Gastritis crónica".into(),
            start_date: today,
            end_date: today + Duration::days(30),
            first_dose_time: dose_time(7),
            interval_hours: 24,
            active: true,
            created_at: now,
            updated_at: now,
        },
        Medication {
            id: Uuid::new_v4(),
            name: "Amoxicilina 500mg".into(),
            condition: "Infección de garganta".into(),
            start_date: today - Duration::days(28),
            end_date: today - Duration::days(21),
            first_dose_time: dose_time(6),
            interval_hours: 6,
            active: false,
            created_at: now - Duration::days(28),
            updated_at: now - Duration::days(20),
        },
    ]
}

//! Pure dose-schedule computations.
//!
//! Given a medication's dosing parameters these functions compute the times
//! of day doses occur, the dose occurrences over a date range, the next
//! upcoming dose and the doses for an arbitrary date. No state and no clock
//! access; callers pass "now" in.

use crate::{DoseOccurrence, Medication, NextDose};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Compute the times of day this medication is taken, sorted ascending.
///
/// Starting at `first_dose_time`, doses repeat every `interval_hours`,
/// wrapping modulo 24 hours, for `24 / interval_hours` (rounded down)
/// occurrences. When the interval does not divide 24 evenly the schedule
/// drifts across midnight instead of re-anchoring at `first_dose_time` the
/// next day; that drift is part of the documented behavior.
pub fn times_of_day(medication: &Medication) -> Vec<NaiveTime> {
    if medication.interval_hours == 0 {
        // Out-of-range input; there is no sensible schedule to produce.
        return Vec::new();
    }

    let doses_per_day = 24 / medication.interval_hours;
    let mut times: Vec<NaiveTime> = (0..doses_per_day)
        .map(|i| {
            medication.first_dose_time
                + Duration::hours(i64::from(i * medication.interval_hours))
        })
        .collect();
    times.sort();
    times
}

/// Expand a medication's schedule into per-day dose occurrences over an
/// inclusive date range.
///
/// The range defaults to the medication's own start/end dates and is not
/// clipped to them: a caller asking for a wider window gets the daily
/// schedule replicated across every requested day. Callers must pass a
/// bounded range.
pub fn occurrences_in_range(
    medication: &Medication,
    range_start: Option<NaiveDate>,
    range_end: Option<NaiveDate>,
) -> Vec<DoseOccurrence> {
    let start = range_start.unwrap_or(medication.start_date);
    let end = range_end.unwrap_or(medication.end_date);
    let times = times_of_day(medication);

    let mut occurrences = Vec::new();
    let mut day = start;
    while day <= end {
        for &time_of_day in &times {
            occurrences.push(DoseOccurrence {
                date: day,
                time_of_day,
                medication_id: medication.id,
                medication_name: medication.name.clone(),
            });
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    occurrences
}

/// Find the next upcoming dose relative to `now`.
///
/// A dose time equal to the current time counts as already taken; only
/// strictly later times today qualify. Once today is exhausted the first
/// dose of tomorrow is next, provided tomorrow still falls within the
/// treatment range.
pub fn next_dose(medication: &Medication, now: NaiveDateTime) -> Option<NextDose> {
    if now.date() > medication.end_date {
        return None;
    }

    let times = times_of_day(medication);
    if let Some(&time) = times.iter().find(|&&t| t > now.time()) {
        return Some(NextDose::Today(time));
    }

    let tomorrow = now.date().succ_opt()?;
    if medication.covers(tomorrow) {
        if let Some(&first) = times.first() {
            return Some(NextDose::Tomorrow(first));
        }
    }

    None
}

/// Dose times for one calendar day: empty outside the treatment range, the
/// full daily schedule inside it.
pub fn doses_on_date(medication: &Medication, date: NaiveDate) -> Vec<NaiveTime> {
    if !medication.covers(date) {
        return Vec::new();
    }
    times_of_day(medication)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, min, 0).unwrap()
    }

    fn test_medication(first_dose: NaiveTime, interval_hours: u32) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            name: "Paracetamol 500mg".into(),
            condition: "Gripe común".into(),
            start_date: d(2025, 1, 10),
            end_date: d(2025, 1, 17),
            first_dose_time: first_dose,
            interval_hours,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_every_eight_hours_wraps_and_sorts() {
        let med = test_medication(t(8, 0), 8);

        assert_eq!(times_of_day(&med), vec![t(0, 0), t(8, 0), t(16, 0)]);
    }

    #[test]
    fn test_daily_interval_yields_single_dose() {
        let med = test_medication(t(7, 30), 24);

        assert_eq!(times_of_day(&med), vec![t(7, 30)]);
    }

    #[test]
    fn test_dose_count_is_floor_of_24_over_interval() {
        for interval in 1..=24u32 {
            let med = test_medication(t(9, 15), interval);
            let times = times_of_day(&med);

            assert_eq!(times.len() as u32, 24 / interval, "interval {}", interval);

            // Entries are strictly ascending, so no duplicates either.
            for pair in times.windows(2) {
                assert!(pair[0] < pair[1], "interval {}", interval);
            }
        }
    }

    #[test]
    fn test_non_divisor_interval_drifts_past_midnight() {
        // 20:00 every 5h: 20:00, 01:00, 06:00, 11:00. The 01:00 dose belongs
        // to the previous evening's chain; the schedule does not re-anchor
        // at 20:00 the next day.
        let med = test_medication(t(20, 0), 5);

        assert_eq!(
            times_of_day(&med),
            vec![t(1, 0), t(6, 0), t(11, 0), t(20, 0)]
        );
    }

    #[test]
    fn test_minutes_are_preserved_across_the_wrap() {
        let med = test_medication(t(22, 45), 12);

        assert_eq!(times_of_day(&med), vec![t(10, 45), t(22, 45)]);
    }

    #[test]
    fn test_zero_interval_yields_empty_schedule() {
        let med = test_medication(t(8, 0), 0);

        assert!(times_of_day(&med).is_empty());
    }

    #[test]
    fn test_occurrences_default_to_medication_range() {
        let mut med = test_medication(t(8, 0), 8);
        med.end_date = d(2025, 1, 12); // three days

        let occurrences = occurrences_in_range(&med, None, None);

        assert_eq!(occurrences.len(), 9);
        assert_eq!(occurrences[0].date, d(2025, 1, 10));
        assert_eq!(occurrences[0].time_of_day, t(0, 0));
        assert_eq!(occurrences[8].date, d(2025, 1, 12));
        assert_eq!(occurrences[8].time_of_day, t(16, 0));
        assert_eq!(occurrences[0].medication_name, med.name);
        assert_eq!(occurrences[0].medication_id, med.id);
    }

    #[test]
    fn test_occurrences_are_not_clipped_to_medication_dates() {
        let med = test_medication(t(6, 0), 24);

        // One day before the treatment starts; still emitted.
        let occurrences =
            occurrences_in_range(&med, Some(d(2025, 1, 9)), Some(d(2025, 1, 9)));

        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].date, d(2025, 1, 9));
    }

    #[test]
    fn test_occurrences_empty_for_inverted_range() {
        let med = test_medication(t(6, 0), 24);

        let occurrences =
            occurrences_in_range(&med, Some(d(2025, 1, 17)), Some(d(2025, 1, 10)));

        assert!(occurrences.is_empty());
    }

    #[test]
    fn test_next_dose_later_today() {
        let med = test_medication(t(8, 0), 8);
        let now = d(2025, 1, 12).and_time(t(9, 30));

        assert_eq!(next_dose(&med, now), Some(NextDose::Today(t(16, 0))));
    }

    #[test]
    fn test_next_dose_exact_time_counts_as_passed() {
        let med = test_medication(t(8, 0), 8);
        let now = d(2025, 1, 12).and_time(t(16, 0));

        // 16:00 exactly is already taken; the next dose is tomorrow's 00:00.
        assert_eq!(next_dose(&med, now), Some(NextDose::Tomorrow(t(0, 0))));
    }

    #[test]
    fn test_next_dose_rolls_to_tomorrow_after_last_dose() {
        let med = test_medication(t(8, 0), 8);
        let now = d(2025, 1, 12).and_time(t(23, 0));

        assert_eq!(next_dose(&med, now), Some(NextDose::Tomorrow(t(0, 0))));
    }

    #[test]
    fn test_next_dose_absent_when_tomorrow_is_past_the_end() {
        let med = test_medication(t(8, 0), 8);
        let now = med.end_date.and_time(t(23, 0));

        assert_eq!(next_dose(&med, now), None);
    }

    #[test]
    fn test_next_dose_absent_after_end_date() {
        let med = test_medication(t(8, 0), 8);
        let now = d(2025, 1, 20).and_time(t(9, 0));

        assert_eq!(next_dose(&med, now), None);
    }

    #[test]
    fn test_doses_on_date_inside_and_outside_range() {
        let med = test_medication(t(8, 0), 8);

        assert_eq!(
            doses_on_date(&med, d(2025, 1, 12)),
            vec![t(0, 0), t(8, 0), t(16, 0)]
        );
        assert!(doses_on_date(&med, d(2025, 1, 9)).is_empty());
        assert!(doses_on_date(&med, d(2025, 1, 18)).is_empty());
    }
}

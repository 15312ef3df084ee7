//! Medication repository over the blob persistence port.
//!
//! Owns the canonical collection. Every operation is a full
//! read-modify-write of the single blob; the system is single-user and
//! operations do not interleave. Loading is fail-soft: an unreadable or
//! corrupt blob behaves like an empty collection, and a blob that has never
//! been written is seeded with demo data.

use crate::{seed, BlobStore, Medication, MedicationDraft, MedicationPatch, Result};
use chrono::{Local, NaiveDate, Utc};
use uuid::Uuid;

/// Stateful repository for medication records.
///
/// The persistence backend is injected, so callers can run against a file
/// on disk or plain memory interchangeably.
pub struct MedicationStore<S: BlobStore> {
    blob: S,
}

impl<S: BlobStore> MedicationStore<S> {
    pub fn new(blob: S) -> Self {
        Self { blob }
    }

    /// Load the whole collection, seeding demo data on first run.
    ///
    /// Never fails: an unreadable or corrupt blob is reported as a warning
    /// and treated as an empty collection.
    fn load_all(&mut self) -> Vec<Medication> {
        match self.blob.read_blob() {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(medications) => medications,
                Err(e) => {
                    tracing::warn!("Corrupt medication blob: {}. Treating as empty.", e);
                    Vec::new()
                }
            },
            Ok(None) => {
                let seeded = seed::demo_medications(Local::now().date_naive());
                if let Err(e) = self.persist(&seeded) {
                    tracing::warn!("Unable to persist seed data: {}", e);
                }
                tracing::info!("No medication blob found, seeded {} demo records", seeded.len());
                seeded
            }
            Err(e) => {
                tracing::warn!("Unable to read medication blob: {}. Treating as empty.", e);
                Vec::new()
            }
        }
    }

    fn persist(&mut self, medications: &[Medication]) -> Result<()> {
        let contents = serde_json::to_string(medications)?;
        self.blob.write_blob(&contents)
    }

    /// Create a new medication from a draft.
    ///
    /// Assigns the id and timestamps and starts the record active. Field
    /// validation (date order, interval range) is the caller's job.
    pub fn create(&mut self, draft: MedicationDraft) -> Result<Medication> {
        let mut medications = self.load_all();
        let now = Utc::now();

        let medication = Medication {
            id: Uuid::new_v4(),
            name: draft.name,
            condition: draft.condition,
            start_date: draft.start_date,
            end_date: draft.end_date,
            first_dose_time: draft.first_dose_time,
            interval_hours: draft.interval_hours,
            active: true,
            created_at: now,
            updated_at: now,
        };

        medications.push(medication.clone());
        self.persist(&medications)?;

        tracing::debug!("Created medication {}", medication.id);
        Ok(medication)
    }

    pub fn get_by_id(&mut self, id: Uuid) -> Option<Medication> {
        self.load_all().into_iter().find(|m| m.id == id)
    }

    /// Active treatments, oldest start first.
    ///
    /// Runs the archive sweep before filtering, so records whose end date
    /// has passed drop out of this listing on first observation.
    pub fn list_active(&mut self, today: NaiveDate) -> Result<Vec<Medication>> {
        self.archive_expired(today)?;

        let mut medications: Vec<Medication> = self
            .load_all()
            .into_iter()
            .filter(|m| m.active)
            .collect();
        medications.sort_by_key(|m| m.start_date);
        Ok(medications)
    }

    /// Archived treatments, most recently finished first.
    pub fn list_historical(&mut self) -> Vec<Medication> {
        let mut medications: Vec<Medication> = self
            .load_all()
            .into_iter()
            .filter(|m| !m.active)
            .collect();
        medications.sort_by(|a, b| b.end_date.cmp(&a.end_date));
        medications
    }

    /// Active treatments whose date range overlaps `[range_start, range_end]`,
    /// ordered by first dose time.
    pub fn list_by_date_range(
        &mut self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Vec<Medication> {
        let mut medications: Vec<Medication> = self
            .load_all()
            .into_iter()
            .filter(|m| m.active && m.start_date <= range_end && m.end_date >= range_start)
            .collect();
        medications.sort_by_key(|m| m.first_dose_time);
        medications
    }

    /// Merge the present patch fields into an existing record.
    ///
    /// Returns `None` for an unknown id. `updated_at` is refreshed on every
    /// successful update.
    pub fn update(&mut self, id: Uuid, patch: MedicationPatch) -> Result<Option<Medication>> {
        let mut medications = self.load_all();

        let Some(medication) = medications.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            medication.name = name;
        }
        if let Some(condition) = patch.condition {
            medication.condition = condition;
        }
        if let Some(start_date) = patch.start_date {
            medication.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            medication.end_date = end_date;
        }
        if let Some(first_dose_time) = patch.first_dose_time {
            medication.first_dose_time = first_dose_time;
        }
        if let Some(interval_hours) = patch.interval_hours {
            medication.interval_hours = interval_hours;
        }
        medication.updated_at = Utc::now();

        let updated = medication.clone();
        self.persist(&medications)?;

        tracing::debug!("Updated medication {}", id);
        Ok(Some(updated))
    }

    /// Remove a record. Returns false for an unknown id.
    pub fn delete(&mut self, id: Uuid) -> Result<bool> {
        let medications = self.load_all();
        let remaining: Vec<Medication> = medications
            .iter()
            .filter(|m| m.id != id)
            .cloned()
            .collect();

        if remaining.len() == medications.len() {
            return Ok(false);
        }

        self.persist(&remaining)?;
        tracing::debug!("Deleted medication {}", id);
        Ok(true)
    }

    /// Case-insensitive substring search against name or condition.
    ///
    /// Active records sort first; within each group the most recently
    /// finishing treatment comes first.
    pub fn search(&mut self, query: &str) -> Vec<Medication> {
        let needle = query.to_lowercase();
        let mut medications: Vec<Medication> = self
            .load_all()
            .into_iter()
            .filter(|m| {
                m.name.to_lowercase().contains(&needle)
                    || m.condition.to_lowercase().contains(&needle)
            })
            .collect();
        medications.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then_with(|| b.end_date.cmp(&a.end_date))
        });
        medications
    }

    /// Archive every active record whose end date has passed.
    ///
    /// Persists only when something changed and returns the number of
    /// records flipped. Idempotent; this is the only writer of `active`,
    /// and it only ever clears it.
    pub fn archive_expired(&mut self, today: NaiveDate) -> Result<usize> {
        let mut medications = self.load_all();
        let now = Utc::now();
        let mut changed = 0;

        for medication in medications.iter_mut() {
            if medication.active && medication.end_date < today {
                medication.active = false;
                medication.updated_at = now;
                changed += 1;
            }
        }

        if changed > 0 {
            self.persist(&medications)?;
            tracing::info!("Archived {} expired medication(s)", changed);
        }

        Ok(changed)
    }
}

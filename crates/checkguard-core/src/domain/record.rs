use crate::domain::amount::CheckAmount;
use crate::domain::ids::RecordId;
use crate::domain::phone::PhoneNumber;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A blocked phone number and its most recent incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedRecord {
    pub id: RecordId,
    pub phone_number: PhoneNumber,
    pub reason: String,
    pub store_location: String,
    pub incident_date: NaiveDate,
    pub check_amount: Option<CheckAmount>,
    /// Newest note first, separated by [`crate::NOTES_SEPARATOR`].
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl BlockedRecord {
    pub fn summary(&self) -> BlockedSummary {
        BlockedSummary {
            id: self.id,
            phone_number: self.phone_number.clone(),
            created_at: self.created_at,
        }
    }

    pub fn note_entries(&self) -> Vec<&str> {
        match self.notes.as_deref() {
            Some(notes) => notes.split(crate::NOTES_SEPARATOR).collect(),
            None => Vec::new(),
        }
    }
}

/// Listing projection of a [`BlockedRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSummary {
    pub id: RecordId,
    pub phone_number: PhoneNumber,
    pub created_at: i64,
}

use crate::domain::{BlockedRecord, BlockedSummary, RecordId};
use crate::time::format_date;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedRecordDto {
    pub id: RecordId,
    pub phone_number: String,
    pub reason: String,
    pub store_location: String,
    pub incident_date: String,
    pub check_amount: Option<f64>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&BlockedRecord> for BlockedRecordDto {
    fn from(record: &BlockedRecord) -> Self {
        Self {
            id: record.id,
            phone_number: record.phone_number.to_string(),
            reason: record.reason.clone(),
            store_location: record.store_location.clone(),
            incident_date: format_date(record.incident_date),
            check_amount: record.check_amount.map(|amount| amount.as_dollars()),
            notes: record.notes.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedSummaryDto {
    pub id: RecordId,
    pub phone_number: String,
    pub created_at: i64,
}

impl From<&BlockedSummary> for BlockedSummaryDto {
    fn from(summary: &BlockedSummary) -> Self {
        Self {
            id: summary.id,
            phone_number: summary.phone_number.to_string(),
            created_at: summary.created_at,
        }
    }
}

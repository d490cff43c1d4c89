use crate::domain::{normalize_note, CheckAmount, PhoneNumber};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

pub const MAX_REASON_CHARS: usize = 100;
pub const MAX_STORE_LOCATION_CHARS: usize = 100;

/// A checked incident report, ready for `create_or_merge`.
///
/// Constructing one guarantees a canonical phone number, a non-empty reason
/// and store location within column limits, and blank notes mapped to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReport {
    pub phone_number: PhoneNumber,
    pub reason: String,
    pub store_location: String,
    pub check_amount: Option<CheckAmount>,
    pub notes: Option<String>,
}

impl BlockReport {
    pub fn new(
        phone_number: PhoneNumber,
        reason: &str,
        store_location: &str,
        check_amount: Option<CheckAmount>,
        notes: Option<&str>,
    ) -> Result<Self, CoreError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(CoreError::EmptyReason);
        }
        let reason_len = reason.chars().count();
        if reason_len > MAX_REASON_CHARS {
            return Err(CoreError::ReasonTooLong(reason_len));
        }

        let store_location = store_location.trim();
        if store_location.is_empty() {
            return Err(CoreError::EmptyStoreLocation);
        }
        let location_len = store_location.chars().count();
        if location_len > MAX_STORE_LOCATION_CHARS {
            return Err(CoreError::StoreLocationTooLong(location_len));
        }

        Ok(Self {
            phone_number,
            reason: reason.to_string(),
            store_location: store_location.to_string(),
            check_amount,
            notes: normalize_note(notes),
        })
    }
}

/// Raw clerk input for blocking a number, as typed.
#[derive(Debug, Clone, Default)]
pub struct BlockRequest<'a> {
    pub phone_number: &'a str,
    pub reason: &'a str,
    pub store_location: &'a str,
    pub check_amount: &'a str,
    pub notes: Option<&'a str>,
}

/// Intake checks for a new incident: the phone must normalize to canonical
/// form and the check amount is required and must be positive.
pub fn validate_block_request(request: &BlockRequest<'_>) -> Result<BlockReport, CoreError> {
    let phone_number = PhoneNumber::parse(request.phone_number)?;
    let check_amount = CheckAmount::parse(request.check_amount)?;
    if !check_amount.is_positive() {
        return Err(CoreError::InvalidCheckAmount(
            request.check_amount.trim().to_string(),
        ));
    }
    BlockReport::new(
        phone_number,
        request.reason,
        request.store_location,
        Some(check_amount),
        request.notes,
    )
}

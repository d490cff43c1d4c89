use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("phone number is required")]
    EmptyPhoneNumber,
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("reason is required")]
    EmptyReason,
    #[error("reason is too long ({0} characters, max 100)")]
    ReasonTooLong(usize),
    #[error("store location is required")]
    EmptyStoreLocation,
    #[error("store location is too long ({0} characters, max 100)")]
    StoreLocationTooLong(usize),
    #[error("check amount is required")]
    MissingCheckAmount,
    #[error("invalid check amount: {0}")]
    InvalidCheckAmount(String),
    #[error("invalid timestamp")]
    InvalidTimestamp,
}

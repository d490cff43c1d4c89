pub mod amount;
pub mod ids;
pub mod notes;
pub mod phone;
pub mod record;

pub use amount::{CheckAmount, MAX_CHECK_AMOUNT_CENTS};
pub use ids::RecordId;
pub use notes::{merge_notes, normalize_note, NOTES_SEPARATOR};
pub use phone::{is_valid_phone, normalize_phone, PhoneNumber};
pub use record::{BlockedRecord, BlockedSummary};

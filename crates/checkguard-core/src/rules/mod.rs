pub mod intake;

pub use intake::{
    validate_block_request, BlockReport, BlockRequest, MAX_REASON_CHARS,
    MAX_STORE_LOCATION_CHARS,
};

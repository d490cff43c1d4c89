pub mod blocked_numbers;

pub use blocked_numbers::BlockedNumbersRepo;

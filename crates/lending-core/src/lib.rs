pub mod authz;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod rates;
pub mod recommendation;
pub mod schedule;
pub mod store;
pub mod types;
pub mod workflow;

pub use error::LendingError;
pub use types::*;

/// Standard result type for all lending operations
pub type LendingResult<T> = Result<T, LendingError>;

//! # hallway-shared
//!
//! Domain vocabulary shared between the Hallway store and server crates:
//! institution kinds and lifecycle statuses, class levels, vote kinds,
//! input validation bounds, and the signed admin session token.

pub mod constants;
pub mod session;
pub mod types;
pub mod validation;

pub use session::{SessionError, SessionKey};
pub use types::{ClassLevel, InstitutionKind, InstitutionStatus, ParseEnumError, VoteKind};
pub use validation::ValidationError;

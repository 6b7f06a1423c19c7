//! Waitlist signups: validation, duplicate detection, queue position, estimated access and
//! aggregate statistics over the `waitlist_users` table.

pub mod access;
pub mod domain;
pub mod router;
pub mod service;
pub(crate) mod stats;
pub mod token;

#[cfg(test)]
mod tests;

pub use access::EstimatedAccess;
pub use domain::{
    EmailCheck, JoinOutcome, JoinResponse, LanguageCount, ReasonCount, SignupRequest,
    SignupValidationError, WaitlistCandidate, WaitlistStats, WaitlistUser, WAITLIST_TABLE,
};
pub use router::waitlist_router;
pub use service::{DatabaseHealth, WaitlistError, WaitlistService};

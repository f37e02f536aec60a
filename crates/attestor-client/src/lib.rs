pub mod client;
pub mod submission;

pub use client::{AttestationClient, AttestationOutcome, RequestSpec};
pub use submission::{HttpSubmission, SubmissionInterface};

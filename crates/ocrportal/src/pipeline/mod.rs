//! The OCR job state machine.

pub mod runner;
pub mod submission;

pub use runner::{OcrPipeline, SubmitOutcome, DEFAULT_JOB_LIMIT};
pub use submission::{Submission, Upload};

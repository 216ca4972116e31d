//! Contact form submission: validation, throttling, delivery and retry.

mod backoff;
mod error;
mod pipeline;
mod relay;

pub use self::backoff::BackoffConfig;
pub use self::error::{AttemptFailure, SubmissionError};
pub use self::pipeline::{
    Delivery, PipelineState, SUCCESS_MESSAGE, SubmissionPipeline, SubmissionReport,
};
pub use self::relay::{HttpRelay, Payload, Relay, RelayError, RelayResponse};

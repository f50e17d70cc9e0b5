//! ElevenLabs conversation → Tuner call record.
//!
//! Pure mapping, no I/O: [`map_transcript`] turns an ordered provider
//! transcript into the validated segment timeline, and [`build_call_request`]
//! aggregates one enriched conversation into the outbound call record.

mod call;
mod error;
mod transcript;

pub use call::build_call_request;
pub use error::Error;
pub use transcript::map_transcript;

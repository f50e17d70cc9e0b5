//! Unified call-timeline segments.
//!
//! One validated shape for everything that happens on a call: user and agent
//! speech, tool invocations and their results, and workflow node transitions.
//! All timing is in integer milliseconds relative to call start; construction
//! goes through [`SegmentBuilder`], which enforces the timing invariants
//! eagerly rather than at serialization time.

pub mod segment;

pub use segment::{
    NodeTransition, Role, Segment, SegmentBuilder, SegmentKind, Speaker, Speech, ToolInvocation,
    ToolOutcome, ValidationError, Word,
};

//! Workout generation pipeline.
//!
//! Validation, quota gating, prompt construction, model invocation with a
//! bounded repair loop, exercise canonicalization, summary computation, and
//! persistence, wired together by [`pipeline::generate_workout`].

pub mod catalog;
pub mod generation;
pub mod matcher;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod quota;
pub mod request;
pub mod store;
pub mod summary;

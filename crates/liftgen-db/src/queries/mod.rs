//! Query functions, one module per table family.

pub mod exercises;
pub mod profiles;
pub mod workouts;

//! PostgreSQL persistence for liftgen: schema migrations, row models, and
//! query functions for workouts, canonical exercises, and profiles.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;

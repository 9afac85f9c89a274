//! Aggregate fields derived from a workout's final exercise list.

use serde::Serialize;

/// Seconds of work assumed for every set.
pub const SECONDS_PER_SET: u32 = 30;

/// The per-exercise values the summary is computed from.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub primary_muscles: &'a [String],
    pub equipment: Option<&'a str>,
    pub sets: u32,
    pub rest_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkoutSummary {
    pub total_sets: u32,
    pub total_exercises: u32,
    /// Unique primary muscles, in first-seen order.
    pub primary_muscles_targeted: Vec<String>,
    /// Unique equipment, in first-seen order. Exercises without equipment
    /// are skipped.
    pub equipment_needed: Vec<String>,
    pub estimated_duration_minutes: u32,
}

/// Compute the summary.
///
/// Duration is `ceil((total_sets * 30 + sum(sets * rest)) / 60)` minutes.
pub fn calculate_summary(exercises: &[SummaryInput<'_>]) -> WorkoutSummary {
    let mut total_sets: u32 = 0;
    let mut rest_total: u64 = 0;
    let mut muscles: Vec<String> = Vec::new();
    let mut equipment: Vec<String> = Vec::new();

    for ex in exercises {
        total_sets = total_sets.saturating_add(ex.sets);
        rest_total = rest_total.saturating_add(u64::from(ex.sets) * u64::from(ex.rest_seconds));

        for m in ex.primary_muscles {
            if !muscles.contains(m) {
                muscles.push(m.clone());
            }
        }

        if let Some(eq) = ex.equipment.map(str::trim).filter(|e| !e.is_empty()) {
            if !equipment.iter().any(|known| known == eq) {
                equipment.push(eq.to_owned());
            }
        }
    }

    let work = u64::from(total_sets) * u64::from(SECONDS_PER_SET);
    let minutes = work.saturating_add(rest_total).div_ceil(60);

    WorkoutSummary {
        total_sets,
        total_exercises: u32::try_from(exercises.len()).unwrap_or(u32::MAX),
        primary_muscles_targeted: muscles,
        equipment_needed: equipment,
        estimated_duration_minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
    }
}

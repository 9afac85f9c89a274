//! Name normalization and keyword heuristics for canonical exercises.
//!
//! Everything here is pure. Keywords are written in search-key form
//! (lowercase, punctuation removed), so "Push-Up" has to be matched as
//! `pushup` as well as `push up`.

use liftgen_db::models::MovementType;

/// Deduplication identity of an exercise name.
///
/// Lowercases, drops every character that is neither alphanumeric nor
/// whitespace, collapses whitespace runs, and trims.
pub fn search_key(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Equipment vocabulary in match order. The first entry whose keyword
/// starts a word in the search key wins.
const EQUIPMENT: &[(&str, &[&str])] = &[
    ("ez bar", &["ez bar", "ezbar", "ez curl bar"]),
    ("trap bar", &["trap bar", "trapbar", "hex bar", "hexbar"]),
    ("barbell", &["barbell"]),
    ("dumbbell", &["dumbbell", "db "]),
    ("kettlebell", &["kettlebell", "kb "]),
    ("cable", &["cable"]),
    ("resistance band", &["resistance band", "band"]),
    (
        "machine",
        &["machine", "smith", "leg press", "pec deck", "lat pulldown", "hack squat"],
    ),
    ("box", &["box"]),
    (
        "bodyweight",
        &[
            "bodyweight",
            "body weight",
            "push up",
            "pushup",
            "pull up",
            "pullup",
            "chin up",
            "chinup",
            "dip",
            "plank",
            "burpee",
            "air squat",
            "jump",
            "sprint",
            "mountain climber",
        ],
    ),
    ("bar", &["bar"]),
];

const ISOLATION: &[&str] = &[
    "curl",
    "raise",
    "extension",
    "fly",
    "flye",
    "kickback",
    "pushdown",
    "shrug",
    "crossover",
    "pec deck",
    "pullover",
];

const COMPOUND: &[&str] = &[
    "press",
    "squat",
    "deadlift",
    "row",
    "pull up",
    "pullup",
    "chin up",
    "chinup",
    "dip",
    "lunge",
    "clean",
    "snatch",
    "thrust",
    "push up",
    "pushup",
    "step up",
    "stepup",
    "jerk",
    "swing",
];

/// True when `keyword` begins at a word boundary in `key`.
fn has_word_prefix(key: &str, keyword: &str) -> bool {
    let padded = format!(" {key} ");
    padded.contains(&format!(" {keyword}"))
}

/// Guess the equipment from an exercise name.
pub fn infer_equipment(name: &str) -> Option<&'static str> {
    let key = search_key(name);
    EQUIPMENT
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| has_word_prefix(&key, kw)))
        .map(|(equipment, _)| *equipment)
}

/// Guess compound vs. isolation from the name, falling back to the number
/// of primary muscles.
pub fn infer_movement_type(name: &str, primary_muscles: &[String]) -> MovementType {
    let key = search_key(name);
    if ISOLATION.iter().any(|kw| has_word_prefix(&key, kw)) {
        return MovementType::Isolation;
    }
    if COMPOUND.iter().any(|kw| has_word_prefix(&key, kw)) {
        return MovementType::Compound;
    }
    if primary_muscles.len() >= 2 {
        MovementType::Compound
    } else {
        MovementType::Isolation
    }
}

/// Map a model-supplied equipment string onto the vocabulary. Blank and
/// "none" mean no equipment was given; unrecognized values are kept
/// lowercased.
pub fn normalize_equipment(raw: &str) -> Option<String> {
    let key = search_key(raw);
    if key.is_empty() || key == "none" || key == "n a" || key == "na" {
        return None;
    }
    Some(
        infer_equipment(&key)
            .map(str::to_owned)
            .unwrap_or(key),
    )
}

/// Lowercase, trim, drop blanks and duplicates, keeping first-seen order.
pub fn normalize_muscles(muscles: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(muscles.len());
    for m in muscles {
        let m = m.trim().to_lowercase();
        if !m.is_empty() && !out.contains(&m) {
            out.push(m);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_key_normalizes() {
        let cases = [
            ("Barbell Bench Press", "barbell bench press"),
            ("barbell   bench press", "barbell bench press"),
            ("  Barbell Bench-Press!! ", "barbell benchpress"),
            ("Push-Up", "pushup"),
            ("EZ-Bar Curl (Close Grip)", "ezbar curl close grip"),
            ("Dumbbell\tRow\n", "dumbbell row"),
            ("!!!", ""),
        ];
        for (name, expected) in cases {
            assert_eq!(search_key(name), expected, "for {name:?}");
        }
    }

    #[test]
    fn equipment_fixture_table() {
        let cases: &[(&str, Option<&str>)] = &[
            ("Barbell Back Squat", Some("barbell")),
            ("Incline Dumbbell Bench Press", Some("dumbbell")),
            ("Dumbbells Lateral Raise", Some("dumbbell")),
            ("EZ-Bar Preacher Curl", Some("ez bar")),
            ("EZ Bar Skull Crusher", Some("ez bar")),
            ("Trap Bar Deadlift", Some("trap bar")),
            ("Kettlebell Swing", Some("kettlebell")),
            ("Cable Crossover", Some("cable")),
            ("Resistance Band Pull-Apart", Some("resistance band")),
            ("Banded Glute Bridge", Some("resistance band")),
            ("Smith Machine Squat", Some("machine")),
            ("Leg Press", Some("machine")),
            ("Lat Pulldown", Some("machine")),
            ("Box Jump", Some("box")),
            ("Push-Up", Some("bodyweight")),
            ("Pull Up", Some("bodyweight")),
            ("Parallel Bar Dips", Some("bodyweight")),
            ("Plank", Some("bodyweight")),
            ("Jumping Lunges", Some("bodyweight")),
            ("Hill Sprints", Some("bodyweight")),
            ("Bar Hang", Some("bar")),
            ("Romanian Deadlift", None),
            ("Hip Thrust", None),
        ];
        for (name, expected) in cases {
            assert_eq!(infer_equipment(name), *expected, "for {name:?}");
        }
    }

    #[test]
    fn movement_type_fixture_table() {
        let chest = vec!["chest".to_owned()];
        let legs = vec!["glutes".to_owned(), "hamstrings".to_owned()];
        let none: &[String] = &[];
        let (one, two) = (chest.as_slice(), legs.as_slice());
        let cases: &[(&str, &[String], MovementType)] = &[
            ("Dumbbell Bicep Curl", two, MovementType::Isolation),
            ("Dumbbell Lateral Raise", one, MovementType::Isolation),
            ("Leg Extension", one, MovementType::Isolation),
            ("Cable Fly", two, MovementType::Isolation),
            ("Dumbbell Flyes", one, MovementType::Isolation),
            ("Cable Triceps Pushdown", one, MovementType::Isolation),
            ("Barbell Shrug", one, MovementType::Isolation),
            ("Barbell Bench Press", one, MovementType::Compound),
            ("Goblet Squat", one, MovementType::Compound),
            ("Bent-Over Barbell Row", one, MovementType::Compound),
            ("Chin-Up", one, MovementType::Compound),
            ("Walking Lunges", one, MovementType::Compound),
            ("Power Clean", one, MovementType::Compound),
            ("Hip Thrust", one, MovementType::Compound),
            ("Kettlebell Swing", one, MovementType::Compound),
            ("Nordic Hamstring Curl", two, MovementType::Isolation),
            ("Face Pull", one, MovementType::Isolation),
            ("Good Morning", two, MovementType::Compound),
            ("Plank", none, MovementType::Isolation),
        ];
        for (name, muscles, expected) in cases {
            assert_eq!(infer_movement_type(name, muscles), *expected, "for {name:?}");
        }
    }

    #[test]
    fn normalize_equipment_maps_to_vocabulary() {
        assert_eq!(normalize_equipment("Dumbbells"), Some("dumbbell".to_owned()));
        assert_eq!(normalize_equipment("EZ-bar"), Some("ez bar".to_owned()));
        assert_eq!(normalize_equipment("Bench"), Some("bench".to_owned()));
        assert_eq!(normalize_equipment("  "), None);
        assert_eq!(normalize_equipment("None"), None);
    }

    #[test]
    fn normalize_muscles_dedups_in_order() {
        let raw = vec![" Chest".to_owned(), "triceps".to_owned(), "CHEST".to_owned(), "".to_owned()];
        assert_eq!(normalize_muscles(&raw), vec!["chest", "triceps"]);
    }
}

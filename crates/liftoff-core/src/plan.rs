//! Workout plans.
//!
//! A plan is the static, ordered list of exercises an athlete works through in
//! one session. It is validated once at construction and never mutated while a
//! session runs.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};

/// Read-only display data for the underlying exercise definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub equipment: String,
    /// Target muscle group.
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub body_part: String,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    /// Instructional media (GIF/video) reference.
    #[serde(default)]
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStep {
    pub id: String,
    pub exercise: ExerciseInfo,
    #[serde(default)]
    pub target_sets: Option<u32>,
    #[serde(default)]
    pub target_reps: Option<u32>,
    #[serde(default)]
    pub target_weight: Option<f64>,
    #[serde(default)]
    pub target_duration_secs: Option<u32>,
    #[serde(default)]
    pub round: Option<String>,
}

impl ExerciseStep {
    /// Number of sets the athlete performs for this step.
    ///
    /// An absent target means exactly one set, never "unlimited" or zero.
    pub fn effective_target_sets(&self) -> u32 {
        self.target_sets.unwrap_or(1)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let field = |name: &str| format!("{}.{name}", self.id);
        if self.target_sets == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: field("target_sets"),
                message: "must be positive when present".into(),
            });
        }
        if self.target_reps == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: field("target_reps"),
                message: "must be positive when present".into(),
            });
        }
        if self.target_duration_secs == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: field("target_duration_secs"),
                message: "must be positive when present".into(),
            });
        }
        if let Some(weight) = self.target_weight {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(ValidationError::InvalidValue {
                    field: field("target_weight"),
                    message: format!("must be a positive number, got {weight}"),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePlan {
    /// Dedicated workout identifier, used as the rewards reference.
    pub workout_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseStep>,
}

impl ExercisePlan {
    /// Build a validated plan.
    ///
    /// # Errors
    /// Returns an error if the plan is empty, step ids repeat, or a numeric
    /// target is present but not positive.
    pub fn new(
        workout_id: impl Into<String>,
        exercises: Vec<ExerciseStep>,
    ) -> Result<Self, ValidationError> {
        let plan = Self {
            workout_id: workout_id.into(),
            name: None,
            exercises,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Check the invariants `new` enforces. Plans that arrive through
    /// deserialization must pass through here before use.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workout_id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "workout_id".into(),
                message: "must not be empty".into(),
            });
        }
        if self.exercises.is_empty() {
            return Err(ValidationError::EmptyCollection("plan exercises".into()));
        }
        let mut seen = HashSet::new();
        let mut total_sets: u32 = 0;
        for step in &self.exercises {
            if !seen.insert(step.id.as_str()) {
                return Err(ValidationError::DuplicateId {
                    collection: "exercise step".into(),
                    id: step.id.clone(),
                });
            }
            step.validate()?;
            total_sets = total_sets
                .checked_add(step.effective_target_sets())
                .ok_or_else(|| ValidationError::InvalidValue {
                    field: format!("{}.target_sets", step.id),
                    message: format!("plan total exceeds {} sets", u32::MAX),
                })?;
        }
        Ok(())
    }

    /// Load a plan from a `.toml` or `.json` file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the plan
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let plan: ExercisePlan = match ext.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| ValidationError::InvalidValue {
                field: path.display().to_string(),
                message: e.to_string(),
            })?,
            "json" => serde_json::from_str(&content)?,
            other => return Err(ValidationError::UnsupportedFormat(other.to_string()).into()),
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&ExerciseStep> {
        self.exercises.get(index)
    }

    /// Sets across the whole plan, derived from the static targets.
    ///
    /// Saturates for plans that skipped `validate`.
    pub fn total_sets(&self) -> u32 {
        self.exercises
            .iter()
            .map(ExerciseStep::effective_target_sets)
            .fold(0, u32::saturating_add)
    }

    /// A small full-body plan used by `plan sample` and tests.
    pub fn sample() -> Self {
        fn info(id: &str, name: &str, equipment: &str, target: &str, body_part: &str) -> ExerciseInfo {
            ExerciseInfo {
                id: id.into(),
                name: name.into(),
                equipment: equipment.into(),
                target: target.into(),
                body_part: body_part.into(),
                secondary_muscles: Vec::new(),
                media_url: None,
            }
        }

        Self {
            workout_id: "sample-full-body".into(),
            name: Some("Full Body Starter".into()),
            exercises: vec![
                ExerciseStep {
                    id: "step-1".into(),
                    exercise: ExerciseInfo {
                        secondary_muscles: vec!["hamstrings".into(), "glutes".into()],
                        ..info("ex-squat", "Barbell Squat", "barbell", "quads", "upper legs")
                    },
                    target_sets: Some(3),
                    target_reps: Some(8),
                    target_weight: Some(60.0),
                    target_duration_secs: None,
                    round: Some("Strength".into()),
                },
                ExerciseStep {
                    id: "step-2".into(),
                    exercise: ExerciseInfo {
                        secondary_muscles: vec!["triceps".into(), "shoulders".into()],
                        ..info("ex-pushup", "Push-up", "body weight", "pectorals", "chest")
                    },
                    target_sets: Some(2),
                    target_reps: Some(12),
                    target_weight: None,
                    target_duration_secs: None,
                    round: Some("Strength".into()),
                },
                ExerciseStep {
                    id: "step-3".into(),
                    exercise: info("ex-plank", "Plank", "body weight", "abs", "waist"),
                    target_sets: None,
                    target_reps: None,
                    target_weight: None,
                    target_duration_secs: Some(60),
                    round: Some("Core".into()),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str, sets: Option<u32>) -> ExerciseStep {
        ExerciseStep {
            target_sets: sets,
            id: id.into(),
            ..ExercisePlan::sample().exercises[2].clone()
        }
    }

    #[test]
    fn absent_target_sets_counts_as_one() {
        assert_eq!(step("a", None).effective_target_sets(), 1);
        assert_eq!(step("a", Some(4)).effective_target_sets(), 4);
    }

    #[test]
    fn sample_plan_totals() {
        let plan = ExercisePlan::sample();
        assert!(plan.validate().is_ok());
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.total_sets(), 3 + 2 + 1);
    }

    #[test]
    fn rejects_empty_plan() {
        let err = ExercisePlan::new("w", Vec::new()).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyCollection(_)));
    }

    #[test]
    fn rejects_zero_sets() {
        let err = ExercisePlan::new("w", vec![step("a", Some(0))]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "a.target_sets"));
    }

    #[test]
    fn rejects_non_positive_weight() {
        let mut s = step("a", Some(2));
        s.target_weight = Some(-5.0);
        assert!(ExercisePlan::new("w", vec![s]).is_err());
    }

    #[test]
    fn rejects_duplicate_step_ids() {
        let err = ExercisePlan::new("w", vec![step("a", None), step("a", Some(2))]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateId {
                collection: "exercise step".into(),
                id: "a".into()
            }
        );
    }

    #[test]
    fn rejects_plan_whose_total_sets_overflow() {
        let err =
            ExercisePlan::new("w", vec![step("a", Some(u32::MAX)), step("b", Some(2))]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "b.target_sets"));

        let plan = ExercisePlan::new("w", vec![step("a", Some(u32::MAX - 1)), step("b", None)]).unwrap();
        assert_eq!(plan.total_sets(), u32::MAX);
    }

    #[test]
    fn total_sets_saturates_for_unvalidated_plans() {
        let plan = ExercisePlan {
            workout_id: "w".into(),
            name: None,
            exercises: vec![step("a", Some(u32::MAX)), step("b", Some(2))],
        };
        assert_eq!(plan.total_sets(), u32::MAX);
    }

    #[test]
    fn rejects_blank_workout_id() {
        assert!(ExercisePlan::new("  ", vec![step("a", None)]).is_err());
    }

    #[test]
    fn load_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let plan = ExercisePlan::sample();

        let toml_path = dir.path().join("plan.toml");
        std::fs::write(&toml_path, toml::to_string_pretty(&plan).unwrap()).unwrap();
        assert_eq!(ExercisePlan::load(&toml_path).unwrap(), plan);

        let json_path = dir.path().join("plan.json");
        std::fs::write(&json_path, serde_json::to_string(&plan).unwrap()).unwrap();
        assert_eq!(ExercisePlan::load(&json_path).unwrap(), plan);
    }

    #[test]
    fn load_rejects_unknown_extension_and_empty_plan() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("plan.yaml");
        std::fs::write(&yaml, "workout_id: x").unwrap();
        assert!(matches!(
            ExercisePlan::load(&yaml),
            Err(CoreError::Validation(ValidationError::UnsupportedFormat(_)))
        ));

        let empty = dir.path().join("empty.toml");
        std::fs::write(&empty, "workout_id = \"w\"\nexercises = []\n").unwrap();
        assert!(matches!(
            ExercisePlan::load(&empty),
            Err(CoreError::Validation(ValidationError::EmptyCollection(_)))
        ));
    }
}

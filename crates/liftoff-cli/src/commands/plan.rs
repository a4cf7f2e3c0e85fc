use std::path::PathBuf;

use clap::Subcommand;
use liftoff_core::ExercisePlan;

#[derive(Subcommand)]
pub enum PlanAction {
    /// Validate a plan file and print it with its totals
    Show {
        /// Plan file (.toml or .json); the built-in sample plan when omitted
        file: Option<PathBuf>,
    },
    /// Print the built-in sample plan as TOML, as a template for new plans
    Sample,
}

pub fn load_plan(file: Option<&PathBuf>) -> Result<ExercisePlan, Box<dyn std::error::Error>> {
    Ok(match file {
        Some(path) => ExercisePlan::load(path)?,
        None => ExercisePlan::sample(),
    })
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PlanAction::Show { file } => {
            let plan = load_plan(file.as_ref())?;
            let summary = serde_json::json!({
                "workout_id": plan.workout_id,
                "name": plan.name,
                "total_exercises": plan.len(),
                "total_sets": plan.total_sets(),
                "exercises": plan.exercises,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        PlanAction::Sample => {
            print!("{}", toml::to_string_pretty(&ExercisePlan::sample())?);
        }
    }
    Ok(())
}

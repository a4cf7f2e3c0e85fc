use clap::Subcommand;
use liftoff_core::Database;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Recently completed workouts
    List {
        /// Maximum number of workouts to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Totals across all completed workouts
    Stats,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => {
            let workouts = db.list_workouts(limit)?;
            println!("{}", serde_json::to_string_pretty(&workouts)?);
        }
        HistoryAction::Stats => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

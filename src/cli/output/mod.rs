use crate::timers::engine::Outcome;

/// Prints what the user asked to see. Changes to timers are reported through logs instead.
pub fn print_outcome(outcome: &Outcome) {
    if let Outcome::Viewed(views) = outcome {
        for view in views {
            println!("{view}");
        }
    }
}

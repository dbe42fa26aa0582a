//! Outcome labeling
//!
//! Offline helpers that turn recorded ticks into KNN training data

mod outcome;
mod training;

pub use outcome::{label_outcomes, OutcomeLabel};
pub use training::{training_rows, TrainingFilter};

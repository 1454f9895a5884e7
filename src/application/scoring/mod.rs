pub mod ai_scorer;
pub mod cost_tracker;
pub mod prompt;

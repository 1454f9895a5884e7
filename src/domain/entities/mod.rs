pub mod candidate;
pub mod run;
pub mod trade_intent;
pub mod trade_recommendation;

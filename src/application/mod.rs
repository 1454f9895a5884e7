pub mod capacity;
pub mod gates;
pub mod metrics;
pub mod ranker;
pub mod run_funnel;
pub mod runs;
pub mod scoring;
pub mod screener;
pub mod system_context;
pub mod trade_intent;

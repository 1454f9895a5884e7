pub mod ai_cache;
pub mod migrations;
pub mod run_repo;

pub mod account_provider;
pub mod ai_cache;
pub mod ai_provider;
pub mod indicator_provider;
pub mod notifier;
pub mod run_repository;

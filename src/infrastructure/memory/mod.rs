pub mod ai_cache;

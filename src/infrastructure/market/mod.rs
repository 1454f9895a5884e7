pub mod static_provider;

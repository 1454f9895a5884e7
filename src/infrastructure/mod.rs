pub mod account;
pub mod ai;
pub mod market;
pub mod memory;
pub mod notify;
pub mod sqlite;

pub mod auth;
pub mod generate;
pub mod prune;
pub mod start;

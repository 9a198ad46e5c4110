pub mod add;
pub mod auth;
pub mod common;
pub mod config;
pub mod delete;
pub mod edit;
pub mod list;
pub mod queue;
pub mod show;
pub mod status;
pub mod sync;

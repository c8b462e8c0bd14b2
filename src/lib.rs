//! my-workout - Personal workout schedule viewer
//!
//! Shows a per-user plan of dated sessions, one exercise group at a time,
//! and keeps a completion counter per group and date.

pub mod config;
pub mod counter;
pub mod db;
pub mod loader;
pub mod plan;
pub mod selection;
pub mod tui;
pub mod view;

pub use db::Database;

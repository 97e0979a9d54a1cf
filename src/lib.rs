//! gymbot - Personal strength training assistant
//!
//! Serves a fixed four-day plan and adjusts working weights after every logged set.

pub mod bot;
pub mod coach;
pub mod db;
pub mod event;
pub mod plan;
pub mod progression;
pub mod tui;

pub use coach::Coach;
pub use db::Database;

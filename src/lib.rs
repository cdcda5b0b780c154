//! botdash: a terminal dashboard for a chat-summary bot's web service.
//!
//! Shows the bot's lifecycle status, drives its control endpoints, and
//! keeps a locally cached task history that feeds a per-day trend chart.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod history;
pub mod notify;
pub mod store;

//! Scenario runner for the cross-session verification engine.

pub mod cli;
pub mod logging;
pub mod report;
pub mod scenarios;
pub mod styles;

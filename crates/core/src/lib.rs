//! Core planning logic for personalized learning plans.
//!
//! The pipeline is `Profile -> Matcher -> Scheduler -> Reviewer`, driven by
//! [`planner::Planner`]. Only the optional text generator can fail, and every
//! call to it has a deterministic fallback.

pub mod activity;
pub mod catalog;
pub mod history;
pub mod llm_client;
pub mod matcher;
pub mod planner;
pub mod profile;
pub mod prompts;
pub mod reviewer;
pub mod scheduler;
pub mod theme;
pub mod topic;

pub use catalog::Catalog;
pub use planner::{Confidence, PlanOutput, Planner};
pub use profile::Profile;

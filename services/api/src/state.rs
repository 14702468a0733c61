//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the planning
//! pipeline and configuration shared by every handler.

use crate::config::Config;
use kidplan_core::Planner;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<Planner>,
    pub config: Arc<Config>,
}

// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::chatbot::CompletionBackend;
use crate::services::portfolio::Portfolio;
use crate::services::session_manager::SessionManager;
use crate::widget::WidgetConfig;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub sessions: SessionManager,
    pub backend: Arc<dyn CompletionBackend>,
    pub portfolio: Portfolio,
    pub system_prompt: String,
    pub widget: WidgetConfig,
}

impl AppState {
    pub fn new(config: &Config, portfolio: Portfolio, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            sessions: SessionManager::new(config.session_ttl, config.history_limit),
            backend,
            system_prompt: portfolio.system_prompt(),
            widget: WidgetConfig::for_portfolio(&portfolio),
            portfolio,
        }
    }
}

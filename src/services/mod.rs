pub mod chatbot;
pub mod portfolio;
pub mod session_manager;

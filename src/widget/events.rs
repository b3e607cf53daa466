use async_trait::async_trait;

pub const CLEAR_CONFIRMATION: &str = "Are you sure you want to clear the chat history?";
pub const CLEAR_FAILED: &str = "Failed to clear chat. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

/// Everything a host can feed into the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// The text field's value changed.
    Input(String),
    Submit,
    /// A quick-question button carrying this preset was clicked.
    QuickQuestion(String),
    ClearRequested,
    KeyDown { key: Key, shift: bool },
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The widget consumed the event; the host must not apply its default.
    Handled,
    /// The host should apply its default behavior (e.g. insert a newline).
    Default,
}

/// Blocking prompts owned by the host.
#[async_trait]
pub trait Dialogs: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;

    async fn alert(&self, message: &str);
}

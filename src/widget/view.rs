//! View model for the chat widget.
//!
//! `ChatView` is everything a host needs to draw the widget: the rendered
//! messages, the one-time quick-question panel, the draft in the input field
//! and the enabled/typing flags.

use chrono::{Local, NaiveTime};

use super::render::format_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub role: Role,
    /// `H:MM AM/PM`, taken when the message was appended.
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, role: Role, at: NaiveTime) -> Self {
        Self { text: text.into(), role, timestamp: format_timestamp(at) }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickQuestion {
    pub label: String,
    pub question: String,
}

impl QuickQuestion {
    pub fn new(label: impl Into<String>, question: impl Into<String>) -> Self {
        Self { label: label.into(), question: question.into() }
    }
}

/// `disabled` is mirrored onto both the text field and the submit control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub disabled: bool,
    pub typing: bool,
    pub focused: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub quick_questions: Option<Vec<QuickQuestion>>,
    pub draft: String,
    pub input: InputState,
    scroll_requested: bool,
}

impl ChatView {
    pub fn new(welcome: Vec<ChatMessage>, quick_questions: Vec<QuickQuestion>) -> Self {
        Self {
            messages: welcome,
            quick_questions: (!quick_questions.is_empty()).then_some(quick_questions),
            ..Self::default()
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.scroll_requested = true;
    }

    /// Drops the suggestion panel. Calling it again is a no-op.
    pub fn remove_quick_questions(&mut self) -> bool {
        self.quick_questions.take().is_some()
    }

    /// Mirrors `disabled` onto the field and submit control. Enabling
    /// also returns focus to the field.
    pub fn set_input_disabled(&mut self, disabled: bool) {
        self.input.disabled = disabled;
        self.input.focused = !disabled;
    }

    pub fn show_typing(&mut self, visible: bool) {
        self.input.typing = visible;
        if visible {
            self.scroll_requested = true;
        }
    }

    /// Returns whether the host should scroll the message list to its end,
    /// and resets the request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    pub fn has_quick_questions(&self) -> bool {
        self.quick_questions.is_some()
    }
}

/// Source of wall-clock time for message timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

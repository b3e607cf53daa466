//! The chat widget: a UI controller that owns its view model, talks to the
//! backend through a [`ChatApi`] and asks the host for confirmations through
//! [`Dialogs`].
//!
//! The view lives in a `watch` channel so a host can subscribe and redraw
//! whenever it changes, including while a request is in flight.

pub mod api;
pub mod events;
pub mod render;
pub mod view;

use tokio::sync::watch;

use crate::services::portfolio::Portfolio;
use api::ChatApi;
use events::{CLEAR_CONFIRMATION, CLEAR_FAILED, Dialogs, EventOutcome, Key, WidgetEvent};
use render::PageOptions;
use view::{ChatMessage, ChatView, Clock, LocalClock, QuickQuestion, Role};

/// Static content of the widget: page chrome, welcome text and the
/// quick-question presets.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub page: PageOptions,
    pub welcome: String,
    pub quick_questions: Vec<QuickQuestion>,
}

impl WidgetConfig {
    pub fn for_portfolio(portfolio: &Portfolio) -> Self {
        Self {
            page: PageOptions {
                title: portfolio.name.clone(),
                subtitle: portfolio.role.clone(),
                bot_avatar: portfolio.initials(),
                placeholder: "Ask me anything about my work...".to_string(),
            },
            welcome: format!(
                "Hi! I'm {}'s portfolio assistant.\nAsk me about skills, projects, experience or how to get in touch.",
                portfolio.first_name()
            ),
            quick_questions: vec![
                QuickQuestion::new("Experience", "What is your experience?"),
                QuickQuestion::new("Skills", "What are your skills?"),
                QuickQuestion::new("Projects", "Tell me about your projects"),
                QuickQuestion::new("Contact", "How can I contact you?"),
            ],
        }
    }

    pub fn bot_avatar(&self) -> &str {
        &self.page.bot_avatar
    }

    /// The view every visitor starts from.
    pub fn initial_view(&self, clock: &dyn Clock) -> ChatView {
        ChatView::new(
            vec![ChatMessage::new(self.welcome.clone(), Role::Bot, clock.now())],
            self.quick_questions.clone(),
        )
    }
}

pub struct ChatWidget<A, D> {
    api: A,
    dialogs: D,
    clock: Box<dyn Clock>,
    initial: ChatView,
    view: watch::Sender<ChatView>,
}

impl<A: ChatApi, D: Dialogs> ChatWidget<A, D> {
    pub fn new(api: A, dialogs: D, config: &WidgetConfig) -> Self {
        Self::with_clock(api, dialogs, config, Box::new(LocalClock))
    }

    pub fn with_clock(api: A, dialogs: D, config: &WidgetConfig, clock: Box<dyn Clock>) -> Self {
        let initial = config.initial_view(clock.as_ref());
        let (view, _) = watch::channel(initial.clone());
        Self { api, dialogs, clock, initial, view }
    }

    pub fn view(&self) -> watch::Ref<'_, ChatView> {
        self.view.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view.subscribe()
    }

    /// Whether the host should scroll to the newest message. Resets the flag
    /// without waking subscribers.
    pub fn take_scroll_request(&self) -> bool {
        let mut requested = false;
        self.view.send_if_modified(|v| {
            requested = v.take_scroll_request();
            false
        });
        requested
    }

    /// Dispatches one host event.
    pub async fn handle(&mut self, event: WidgetEvent) -> EventOutcome {
        match event {
            WidgetEvent::Input(text) => {
                self.view.send_modify(|v| v.draft = text);
                EventOutcome::Default
            }
            WidgetEvent::Submit => {
                self.submit().await;
                EventOutcome::Handled
            }
            WidgetEvent::QuickQuestion(question) => {
                self.view.send_modify(|v| v.draft = question);
                self.submit().await;
                EventOutcome::Handled
            }
            WidgetEvent::ClearRequested => {
                if self.dialogs.confirm(CLEAR_CONFIRMATION).await && !self.clear_chat().await {
                    self.dialogs.alert(CLEAR_FAILED).await;
                }
                EventOutcome::Handled
            }
            WidgetEvent::KeyDown { key: Key::Enter, shift: false } => {
                self.submit().await;
                EventOutcome::Handled
            }
            WidgetEvent::KeyDown { .. } => EventOutcome::Default,
            WidgetEvent::Loaded => {
                self.view.send_modify(|v| v.input.focused = true);
                EventOutcome::Default
            }
        }
    }

    /// Sends the current draft. Returns `false` (and touches nothing) when
    /// the trimmed draft is empty.
    pub async fn submit(&mut self) -> bool {
        let text = self.view.borrow().draft.trim().to_string();
        if text.is_empty() {
            return false;
        }

        let sent_at = self.clock.now();
        let user_message = ChatMessage::new(text.clone(), Role::User, sent_at);
        self.view.send_modify(|v| {
            v.remove_quick_questions();
            v.append(user_message);
            v.draft.clear();
            v.set_input_disabled(true);
            v.show_typing(true);
        });

        let reply = self.api.send_message(&text).await;
        if !reply.success {
            tracing::debug!(reply = %reply.message, "showing error reply");
        }

        let bot_message = ChatMessage::new(reply.message, Role::Bot, self.clock.now());
        self.view.send_modify(|v| {
            v.show_typing(false);
            v.append(bot_message);
            v.set_input_disabled(false);
        });
        true
    }

    /// Clears the backend conversation, then restores the initial view.
    /// On failure the view is left as it was.
    pub async fn clear_chat(&mut self) -> bool {
        match self.api.clear_chat().await {
            Ok(()) => {
                let initial = self.initial.clone();
                self.view.send_modify(|v| {
                    let draft = std::mem::take(&mut v.draft);
                    let input = v.input;
                    *v = initial;
                    v.draft = draft;
                    v.input = input;
                });
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "clearing chat failed");
                false
            }
        }
    }
}

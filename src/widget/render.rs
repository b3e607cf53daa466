//! HTML rendering for the widget.
//!
//! Chat text is never interpreted as markup. It is escaped first; only the
//! formatting in [`format_bubble_text`] is produced afterwards.

use std::fmt::Write as _;

use chrono::{NaiveTime, Timelike};

use super::api::{DEFAULT_ERROR, NETWORK_ERROR};
use super::events::{CLEAR_CONFIRMATION, CLEAR_FAILED};
use super::view::{ChatMessage, ChatView, QuickQuestion, Role};

pub const USER_AVATAR: &str = "U";

/// `H:MM AM/PM`, hour without leading zero, midnight and noon as 12.
pub fn format_timestamp(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    format!("{}:{:02} {}", hour, time.minute(), if pm { "PM" } else { "AM" })
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes `text`, then applies the formatting allowlist:
/// newlines become `<br>` and balanced `**bold**` runs become `<strong>`.
pub fn format_bubble_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .split('\n')
        .map(|line| embolden(&escape_html(line)))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn embolden(line: &str) -> String {
    let parts: Vec<&str> = line.split("**").collect();
    // An even part count means one marker is unpaired; its text stays literal.
    let paired = if parts.len() % 2 == 0 { parts.len() - 1 } else { parts.len() };
    let mut out = String::with_capacity(line.len());
    for (i, part) in parts.iter().enumerate() {
        if i >= paired {
            out.push_str("**");
            out.push_str(part);
        } else if i % 2 == 1 {
            let _ = write!(out, "<strong>{part}</strong>");
        } else {
            out.push_str(part);
        }
    }
    out
}

pub fn render_message(message: &ChatMessage, bot_avatar: &str) -> String {
    let (class, avatar) = match message.role {
        Role::User => ("user-message", USER_AVATAR),
        Role::Bot => ("bot-message", bot_avatar),
    };
    format!(
        "<div class=\"message {class}\">\
         <div class=\"message-avatar\"><span>{avatar}</span></div>\
         <div class=\"message-content\">\
         <div class=\"message-bubble\">{bubble}</div>\
         <span class=\"message-time\">{time}</span>\
         </div></div>",
        avatar = escape_html(avatar),
        bubble = format_bubble_text(&message.text),
        time = escape_html(&message.timestamp),
    )
}

pub fn render_quick_questions(questions: &[QuickQuestion]) -> String {
    let mut out = String::from("<div class=\"quick-questions\">");
    for q in questions {
        let _ = write!(
            out,
            "<button type=\"button\" class=\"quick-btn\" data-question=\"{}\">{}</button>",
            escape_html(&q.question),
            escape_html(&q.label)
        );
    }
    out.push_str("</div>");
    out
}

/// Page-level settings that are not part of the view model.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub title: String,
    pub subtitle: String,
    pub bot_avatar: String,
    pub placeholder: String,
}

/// The message list (plus the quick-question panel, when still present).
pub fn render_messages(view: &ChatView, bot_avatar: &str) -> String {
    let mut out = String::new();
    for message in &view.messages {
        out.push_str(&render_message(message, bot_avatar));
    }
    if let Some(questions) = &view.quick_questions {
        out.push_str(&render_quick_questions(questions));
    }
    out
}

/// Full widget page for the given view.
///
/// Self-contained: styles and the browser wiring are inline. The script
/// mirrors [`format_bubble_text`] so replies rendered in the browser follow
/// the same escape-then-allowlist rule.
pub fn render_page(view: &ChatView, options: &PageOptions) -> String {
    let disabled = if view.input.disabled { " disabled" } else { "" };
    let autofocus = if view.input.focused { " autofocus" } else { "" };
    let typing_style = if view.input.typing { "flex" } else { "none" };
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box}}
body{{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#f4f6fb;color:#1f2937;height:100vh;display:flex;justify-content:center}}
.chat-container{{width:100%;max-width:760px;height:100vh;display:flex;flex-direction:column;background:#fff;box-shadow:0 0 24px #0000001a}}
.chat-header{{padding:16px 20px;background:#4f46e5;color:#fff;display:flex;align-items:center;justify-content:space-between}}
.chat-header h1{{font-size:18px;font-weight:600}}
.chat-header p{{font-size:13px;opacity:.85}}
.clear-btn{{padding:6px 14px;background:#ffffff26;color:#fff;border:1px solid #ffffff59;border-radius:6px;cursor:pointer}}
.chat-messages{{flex:1;overflow-y:auto;padding:20px;display:flex;flex-direction:column;gap:14px}}
.message{{display:flex;gap:10px;max-width:85%}}
.user-message{{align-self:flex-end;flex-direction:row-reverse}}
.message-avatar{{width:34px;height:34px;border-radius:50%;background:#4f46e5;color:#fff;display:flex;align-items:center;justify-content:center;font-size:13px;font-weight:600;flex-shrink:0}}
.user-message .message-avatar{{background:#10b981}}
.message-content{{display:flex;flex-direction:column;gap:4px}}
.message-bubble{{padding:10px 14px;border-radius:12px;background:#eef0f6;font-size:14px;line-height:1.5;word-wrap:break-word}}
.user-message .message-bubble{{background:#4f46e5;color:#fff}}
.message-time{{font-size:11px;color:#9ca3af}}
.user-message .message-time{{text-align:right}}
.quick-questions{{display:flex;flex-wrap:wrap;gap:8px}}
.quick-btn{{padding:6px 12px;border:1px solid #4f46e5;border-radius:16px;background:#fff;color:#4f46e5;font-size:13px;cursor:pointer}}
.typing-indicator{{padding:0 20px 10px;gap:4px}}
.typing-indicator span{{width:8px;height:8px;border-radius:50%;background:#9ca3af;animation:blink 1.2s infinite}}
.typing-indicator span:nth-child(2){{animation-delay:.2s}}
.typing-indicator span:nth-child(3){{animation-delay:.4s}}
@keyframes blink{{0%,80%,100%{{opacity:.3}}40%{{opacity:1}}}}
.chat-form{{padding:14px 20px;border-top:1px solid #e5e7eb;display:flex;gap:8px}}
.chat-form textarea{{flex:1;padding:10px 14px;border:1px solid #d1d5db;border-radius:8px;font-size:14px;font-family:inherit;resize:none;outline:none;max-height:120px}}
.chat-form textarea:focus{{border-color:#4f46e5}}
.chat-form button{{padding:10px 20px;background:#4f46e5;color:#fff;border:none;border-radius:8px;font-weight:600;cursor:pointer}}
.chat-form button:disabled,.chat-form textarea:disabled{{opacity:.5;cursor:not-allowed}}
</style>
</head>
<body>
<div class="chat-container" data-bot-avatar="{bot_avatar}" data-user-avatar="{user_avatar}" data-default-error="{default_error}" data-network-error="{network_error}" data-clear-confirmation="{clear_confirmation}" data-clear-failed="{clear_failed}">
<header class="chat-header">
<div class="header-info"><h1>{title}</h1><p>{subtitle}</p></div>
<button type="button" id="clearBtn" class="clear-btn">Clear</button>
</header>
<div class="chat-messages" id="chatMessages">{messages}</div>
<div class="typing-indicator" id="typingIndicator" style="display: {typing_style}"><span></span><span></span><span></span></div>
<form class="chat-form" id="chatForm">
<textarea id="userInput" rows="1" placeholder="{placeholder}"{disabled}{autofocus}>{draft}</textarea>
<button type="submit" id="sendBtn"{disabled}>Send</button>
</form>
</div>
<script>
(() => {{
const root = document.querySelector(".chat-container");
const texts = root.dataset;
const msgs = document.getElementById("chatMessages");
const form = document.getElementById("chatForm");
const inp = document.getElementById("userInput");
const sendBtn = document.getElementById("sendBtn");
const clearBtn = document.getElementById("clearBtn");
const typing = document.getElementById("typingIndicator");
const initial = msgs.innerHTML;

const ESC = {{ "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#39;" }};
const escapeHtml = (s) => String(s).replace(/[&<>"']/g, (c) => ESC[c]);
const embolden = (line) => {{
  const parts = line.split("**");
  const paired = parts.length % 2 === 0 ? parts.length - 1 : parts.length;
  return parts.map((p, i) => i >= paired ? "**" + p : i % 2 === 1 ? "<strong>" + p + "</strong>" : p).join("");
}};
const formatText = (s) => s.replace(/\r\n/g, "\n").split("\n").map((l) => embolden(escapeHtml(l))).join("<br>");
const timestamp = () => {{
  const now = new Date();
  const h = now.getHours() % 12 || 12;
  const m = String(now.getMinutes()).padStart(2, "0");
  return h + ":" + m + " " + (now.getHours() < 12 ? "AM" : "PM");
}};
const scrollToEnd = () => {{ msgs.scrollTop = msgs.scrollHeight; }};

function appendMessage(text, role) {{
  const el = document.createElement("div");
  const user = role === "user";
  el.className = "message " + (user ? "user-message" : "bot-message");
  el.innerHTML = '<div class="message-avatar"><span>' + escapeHtml(user ? texts.userAvatar : texts.botAvatar) + '</span></div>'
    + '<div class="message-content"><div class="message-bubble">' + formatText(text) + '</div>'
    + '<span class="message-time">' + timestamp() + '</span></div>';
  msgs.appendChild(el);
  scrollToEnd();
}}

function setInputDisabled(disabled) {{
  inp.disabled = disabled;
  sendBtn.disabled = disabled;
  if (!disabled) inp.focus();
}}

function showTyping(show) {{
  typing.style.display = show ? "flex" : "none";
  if (show) scrollToEnd();
}}

async function sendMessage(message) {{
  let data;
  try {{
    const res = await fetch("/api/chat", {{
      method: "POST",
      headers: {{ "Content-Type": "application/json" }},
      credentials: "same-origin",
      body: JSON.stringify({{ message }}),
    }});
    data = await res.json();
    if (res.ok && data.status === "success") {{
      return typeof data.response === "string" ? data.response : texts.defaultError;
    }}
  }} catch (err) {{
    console.error("chat request failed", err);
    return texts.networkError;
  }}
  return (data && data.error) || texts.defaultError;
}}

async function submit() {{
  const message = inp.value.trim();
  if (!message || inp.disabled) return;
  const panel = msgs.querySelector(".quick-questions");
  if (panel) panel.remove();
  appendMessage(message, "user");
  inp.value = "";
  setInputDisabled(true);
  showTyping(true);
  const reply = await sendMessage(message);
  showTyping(false);
  appendMessage(reply, "bot");
  setInputDisabled(false);
}}

async function clearChat() {{
  if (!confirm(texts.clearConfirmation)) return;
  try {{
    const res = await fetch("/api/clear", {{ method: "POST", credentials: "same-origin" }});
    if (!res.ok) throw new Error("HTTP " + res.status);
    msgs.innerHTML = initial;
    scrollToEnd();
  }} catch (err) {{
    console.error("clear failed", err);
    alert(texts.clearFailed);
  }}
}}

form.addEventListener("submit", (e) => {{ e.preventDefault(); submit(); }});
inp.addEventListener("keydown", (e) => {{
  if (e.key === "Enter" && !e.shiftKey) {{ e.preventDefault(); submit(); }}
}});
msgs.addEventListener("click", (e) => {{
  const btn = e.target.closest(".quick-btn");
  if (!btn) return;
  inp.value = btn.dataset.question;
  submit();
}});
clearBtn.addEventListener("click", clearChat);
window.addEventListener("load", () => inp.focus());
}})();
</script>
</body>
</html>
"##,
        title = escape_html(&options.title),
        subtitle = escape_html(&options.subtitle),
        bot_avatar = escape_html(&options.bot_avatar),
        user_avatar = USER_AVATAR,
        default_error = escape_html(DEFAULT_ERROR),
        network_error = escape_html(NETWORK_ERROR),
        clear_confirmation = escape_html(CLEAR_CONFIRMATION),
        clear_failed = escape_html(CLEAR_FAILED),
        messages = render_messages(view, &options.bot_avatar),
        placeholder = escape_html(&options.placeholder),
        draft = escape_html(&view.draft),
    )
}

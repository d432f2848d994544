//! Capped in-page message table
//!
//! Keeps the most recent status messages and renders them as table rows
//! into the page's `msg_tbl` element, oldest first.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

use crate::ui::page::Page;
use crate::utils::format::timestamp_string;

/// Number of messages kept in the log table
pub const MAX_MESSAGES: usize = 5;

/// Id of the table the log renders into
pub const MESSAGE_TABLE: &str = "msg_tbl";

/// Severity of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

impl MessageLevel {
    /// Numeric level shown in the table
    pub fn code(&self) -> u8 {
        match self {
            MessageLevel::Info => 1,
            MessageLevel::Warning => 2,
            MessageLevel::Error => 3,
        }
    }

}

/// One row of the log
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub timestamp: DateTime<Local>,
    pub level: MessageLevel,
    pub text: String,
}

impl LogMessage {
    pub fn new(text: impl Into<String>, level: MessageLevel) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            text: text.into(),
        }
    }

    /// Table row markup for this message
    pub fn render_row(&self) -> String {
        format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td></td></tr>",
            timestamp_string(&self.timestamp),
            self.level.code(),
            escape_html(&self.text)
        )
    }
}

/// The most recent messages, capped at a fixed capacity
#[derive(Debug)]
pub struct MessageLog {
    messages: VecDeque<LogMessage>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(MAX_MESSAGES)
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of 0 is bumped to 1 so the newest message always shows
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add(&mut self, text: impl Into<String>, level: MessageLevel) {
        self.push(LogMessage::new(text, level));
    }

    pub fn push(&mut self, message: LogMessage) {
        while self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &LogMessage> {
        self.messages.iter()
    }

    pub fn latest(&self) -> Option<&LogMessage> {
        self.messages.back()
    }

    pub fn render_rows(&self) -> String {
        self.messages.iter().map(LogMessage::render_row).collect()
    }

    /// Write the rendered rows into the message table, if the page has one
    pub fn render_into(&self, page: &mut Page) {
        match page.element_mut(MESSAGE_TABLE) {
            Some(table) => table.set_content(self.render_rows()),
            None => tracing::debug!("Message table was not found"),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

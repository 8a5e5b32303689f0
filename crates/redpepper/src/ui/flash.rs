//! Transient flash notifications.
//!
//! A queue of short-lived messages composited over the main view.
//! Messages expire on the tick cadence or can be dismissed oldest
//! first; command failures land here so the loop never dies on them.

use std::time::{Duration, Instant};

const FLASH_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub text: String,
    pub level: FlashLevel,
    expires_at: Instant,
}

pub struct FlashQueue {
    messages: Vec<FlashMessage>,
}

impl FlashQueue {
    pub fn new() -> Self {
        FlashQueue {
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, level: FlashLevel, text: impl Into<String>) {
        self.messages.push(FlashMessage {
            text: text.into(),
            level,
            expires_at: Instant::now() + FLASH_TTL,
        });
    }

    pub fn any(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn delete_oldest(&mut self) {
        if !self.messages.is_empty() {
            self.messages.remove(0);
        }
    }

    /// Drop expired messages; called on every tick.
    pub fn expire(&mut self, now: Instant) {
        self.messages.retain(|message| message.expires_at > now);
    }

    pub fn lines(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|message| match message.level {
                FlashLevel::Info => format!("[info] {}", message.text),
                FlashLevel::Error => format!("[error] {}", message.text),
            })
            .collect()
    }
}

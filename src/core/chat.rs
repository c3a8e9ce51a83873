//! Mock conversation behind the chat panel.

use crate::core::traits::Replier;
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
        }
    }
}

/// Messages shown in the panel, oldest first. Lives as long as the page view.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Conversation {
        Conversation::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Appends the trimmed input as a user message. Blank input appends nothing.
    pub fn submit(&mut self, input: &str) -> Option<ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let message = ChatMessage::new(Sender::User, text);
        self.messages.push(message.clone());
        Some(message)
    }

    pub fn receive(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage::new(Sender::Bot, text));
        &self.messages[self.messages.len() - 1]
    }

    /// One full turn: the user message is appended before the replier is asked.
    pub async fn exchange<R>(&mut self, input: &str, replier: &R) -> Option<&ChatMessage>
    where
        R: Replier + ?Sized,
    {
        let message = self.submit(input)?;
        let reply = replier.reply(&message.text).await;
        Some(self.receive(reply))
    }
}

/// Replies with fixed text after a fixed delay.
#[derive(Debug, Clone)]
pub struct CannedReplier {
    pub text: String,
    pub delay: Duration,
}

impl Default for CannedReplier {
    fn default() -> Self {
        CannedReplier {
            text: "Hello!".to_owned(),
            delay: Duration::from_secs(1),
        }
    }
}

#[async_trait]
impl Replier for CannedReplier {
    async fn reply(&self, message: &str) -> String {
        debug!("simulating reply for: {message}");
        tokio::time::sleep(self.delay).await;
        self.text.clone()
    }
}

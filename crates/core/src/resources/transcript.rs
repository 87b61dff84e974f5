// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Chat transcript: messages in arrival order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{apply_list, decode_remove, decode_upsert, invert_list, Keyed, ListPatch};
use crate::error::{Error, Result};
use crate::protocol::ClientFrame;
use crate::resource::{Decoder, Planned, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Keyed for Message {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Transcript {
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// User actions on a transcript.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptIntent {
    /// Post a message. The id is chosen by the client.
    Send { id: String, content: String },
}

impl Resource for Transcript {
    type Patch = ListPatch<Message>;
    type Intent = TranscriptIntent;

    const KIND: &'static str = "transcript";

    fn routes() -> Vec<(&'static str, Decoder<Self::Patch>)> {
        let upsert: Decoder<Self::Patch> = decode_upsert;
        let remove: Decoder<Self::Patch> = decode_remove;
        vec![
            ("message", upsert),
            ("message_created", upsert),
            ("message_updated", upsert),
            ("message_deleted", remove),
        ]
    }

    fn apply(mut self, patch: &Self::Patch) -> Self {
        apply_list(&mut self.messages, patch);
        self
    }

    fn invert(&self, patch: &Self::Patch) -> Self::Patch {
        invert_list(&self.messages, patch)
    }

    fn plan(&self, intent: &Self::Intent) -> Result<Planned<Self::Patch>> {
        match intent {
            TranscriptIntent::Send { id, content } => {
                if id.is_empty() {
                    return Err(Error::InvalidInput("message id is empty".to_string()));
                }
                if content.trim().is_empty() {
                    return Err(Error::InvalidInput("message content is empty".to_string()));
                }
                if self.get(id).is_some() {
                    return Err(Error::DuplicateMessage(id.clone()));
                }
                let message = Message {
                    id: id.clone(),
                    role: "user".to_string(),
                    content: content.clone(),
                    created_at: None,
                };
                Ok(Planned {
                    forward: ListPatch::Upsert(message),
                    frame: ClientFrame::new("send_message")
                        .with("id", id.as_str())
                        .with("content", content.as_str()),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;

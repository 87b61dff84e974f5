// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Guided interview: ordered questions, recorded answers and a pointer to
//! the current question.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{apply_list, decode_upsert, invert_list, Keyed, ListPatch};
use crate::error::{Error, Result};
use crate::protocol::ClientFrame;
use crate::resource::{Decoder, Planned, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Keyed for Question {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Index of the current question.
    #[serde(default)]
    pub current: usize,
    /// Answers keyed by question id.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub status: InterviewStatus,
}

impl Interview {
    pub fn index_of(&self, question_id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterviewPatch {
    Questions(ListPatch<Question>),
    /// Sets (or clears) an answer, optionally moving the pointer.
    Answer {
        question_id: String,
        answer: Option<String>,
        current: Option<usize>,
    },
    Pointer { current: usize },
    Status(InterviewStatus),
}

/// User actions on an interview.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterviewIntent {
    /// Answer a question and advance to the next one.
    Answer { question_id: String, answer: String },
    /// Jump to a question.
    GoTo { index: usize },
}

#[derive(Deserialize)]
struct AnswerPayload {
    question_id: String,
    answer: Option<String>,
    #[serde(default)]
    current: Option<usize>,
}

#[derive(Deserialize)]
struct PointerPayload {
    #[serde(alias = "index")]
    current: usize,
}

fn decode_question(data: &Value) -> std::result::Result<InterviewPatch, serde_json::Error> {
    decode_upsert(data).map(InterviewPatch::Questions)
}

fn decode_answer(data: &Value) -> std::result::Result<InterviewPatch, serde_json::Error> {
    AnswerPayload::deserialize(data).map(|p| InterviewPatch::Answer {
        question_id: p.question_id,
        answer: p.answer,
        current: p.current,
    })
}

fn decode_pointer(data: &Value) -> std::result::Result<InterviewPatch, serde_json::Error> {
    PointerPayload::deserialize(data).map(|p| InterviewPatch::Pointer { current: p.current })
}

fn decode_completed(_: &Value) -> std::result::Result<InterviewPatch, serde_json::Error> {
    Ok(InterviewPatch::Status(InterviewStatus::Completed))
}

impl Resource for Interview {
    type Patch = InterviewPatch;
    type Intent = InterviewIntent;

    const KIND: &'static str = "interview";

    fn routes() -> Vec<(&'static str, Decoder<Self::Patch>)> {
        let question: Decoder<Self::Patch> = decode_question;
        let answer: Decoder<Self::Patch> = decode_answer;
        let pointer: Decoder<Self::Patch> = decode_pointer;
        let completed: Decoder<Self::Patch> = decode_completed;
        vec![
            ("question_added", question),
            ("answer_recorded", answer),
            ("pointer_moved", pointer),
            ("interview_completed", completed),
        ]
    }

    fn apply(mut self, patch: &Self::Patch) -> Self {
        match patch {
            InterviewPatch::Questions(p) => apply_list(&mut self.questions, p),
            InterviewPatch::Answer {
                question_id,
                answer,
                current,
            } => {
                match answer {
                    Some(a) => self.answers.insert(question_id.clone(), a.clone()),
                    None => self.answers.remove(question_id),
                };
                if let Some(c) = current {
                    self.current = *c;
                }
            }
            InterviewPatch::Pointer { current } => self.current = *current,
            InterviewPatch::Status(status) => self.status = *status,
        }
        self
    }

    fn invert(&self, patch: &Self::Patch) -> Self::Patch {
        match patch {
            InterviewPatch::Questions(p) => {
                InterviewPatch::Questions(invert_list(&self.questions, p))
            }
            InterviewPatch::Answer { question_id, .. } => InterviewPatch::Answer {
                question_id: question_id.clone(),
                answer: self.answers.get(question_id).cloned(),
                current: Some(self.current),
            },
            InterviewPatch::Pointer { .. } => InterviewPatch::Pointer {
                current: self.current,
            },
            InterviewPatch::Status(_) => InterviewPatch::Status(self.status),
        }
    }

    fn plan(&self, intent: &Self::Intent) -> Result<Planned<Self::Patch>> {
        if self.status == InterviewStatus::Completed {
            return Err(Error::InvalidInput("interview is completed".to_string()));
        }
        match intent {
            InterviewIntent::Answer {
                question_id,
                answer,
            } => {
                let index = self
                    .index_of(question_id)
                    .ok_or_else(|| Error::QuestionNotFound(question_id.clone()))?;
                let next = (index + 1).min(self.questions.len().saturating_sub(1));
                Ok(Planned {
                    forward: InterviewPatch::Answer {
                        question_id: question_id.clone(),
                        answer: Some(answer.clone()),
                        current: Some(next),
                    },
                    frame: ClientFrame::new("submit_answer")
                        .with("question_id", question_id.as_str())
                        .with("answer", answer.as_str()),
                })
            }
            InterviewIntent::GoTo { index } => {
                if *index >= self.questions.len() {
                    return Err(Error::InvalidInput(format!(
                        "question index {} out of range (0..{})",
                        index,
                        self.questions.len()
                    )));
                }
                Ok(Planned {
                    forward: InterviewPatch::Pointer { current: *index },
                    frame: ClientFrame::new("move_pointer").with("index", *index),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "interview_tests.rs"]
mod tests;

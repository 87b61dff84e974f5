// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Kanban board: tasks keyed by id, each in one column.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::ClientFrame;
use crate::resource::{Decoder, Planned, Resource};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
}

impl Board {
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Tasks in `column`, ordered by id.
    pub fn column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.values().filter(move |t| t.column == column)
    }
}

impl FromIterator<Task> for Board {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Board {
            tasks: iter.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardPatch {
    Upsert(Task),
    /// Field replacement of `column`.
    Move { id: String, column: String },
    Remove { id: String },
}

/// User actions on a board.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardIntent {
    Move { task_id: String, column: String },
    Create { task: Task },
    Delete { task_id: String },
}

#[derive(Deserialize)]
struct MovePayload {
    #[serde(alias = "task_id")]
    id: String,
    column: String,
}

#[derive(Deserialize)]
struct RemovePayload {
    #[serde(alias = "task_id")]
    id: String,
}

/// Snapshot payload: `{"tasks": [...]}` or `{"tasks": {"T1": {...}}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskList {
    List(Vec<Task>),
    Map(BTreeMap<String, Task>),
}

#[derive(Deserialize)]
struct Snapshot {
    #[serde(default)]
    tasks: Option<TaskList>,
}

fn decode_task(data: &Value) -> std::result::Result<BoardPatch, serde_json::Error> {
    Task::deserialize(data).map(BoardPatch::Upsert)
}

fn decode_move(data: &Value) -> std::result::Result<BoardPatch, serde_json::Error> {
    MovePayload::deserialize(data).map(|p| BoardPatch::Move {
        id: p.id,
        column: p.column,
    })
}

fn decode_delete(data: &Value) -> std::result::Result<BoardPatch, serde_json::Error> {
    RemovePayload::deserialize(data).map(|p| BoardPatch::Remove { id: p.id })
}

impl Resource for Board {
    type Patch = BoardPatch;
    type Intent = BoardIntent;

    const KIND: &'static str = "board";

    fn routes() -> Vec<(&'static str, Decoder<Self::Patch>)> {
        let upsert: Decoder<Self::Patch> = decode_task;
        let moved: Decoder<Self::Patch> = decode_move;
        let deleted: Decoder<Self::Patch> = decode_delete;
        vec![
            ("task_created", upsert),
            ("task_updated", upsert),
            ("task_moved", moved),
            ("task_deleted", deleted),
        ]
    }

    fn from_snapshot(data: &Value) -> std::result::Result<Self, serde_json::Error> {
        let snapshot = Snapshot::deserialize(data)?;
        Ok(match snapshot.tasks {
            Some(TaskList::List(tasks)) => tasks.into_iter().collect(),
            Some(TaskList::Map(tasks)) => Board { tasks },
            None => Board::default(),
        })
    }

    fn apply(mut self, patch: &Self::Patch) -> Self {
        match patch {
            BoardPatch::Upsert(task) => {
                self.tasks.insert(task.id.clone(), task.clone());
            }
            BoardPatch::Move { id, column } => {
                if let Some(task) = self.tasks.get_mut(id) {
                    task.column = column.clone();
                }
            }
            BoardPatch::Remove { id } => {
                self.tasks.remove(id);
            }
        }
        self
    }

    fn invert(&self, patch: &Self::Patch) -> Self::Patch {
        match patch {
            BoardPatch::Upsert(task) => match self.tasks.get(&task.id) {
                Some(old) => BoardPatch::Upsert(old.clone()),
                None => BoardPatch::Remove {
                    id: task.id.clone(),
                },
            },
            BoardPatch::Move { id, column } => BoardPatch::Move {
                id: id.clone(),
                column: self
                    .tasks
                    .get(id)
                    .map(|t| t.column.clone())
                    .unwrap_or_else(|| column.clone()),
            },
            BoardPatch::Remove { id } => match self.tasks.get(id) {
                Some(old) => BoardPatch::Upsert(old.clone()),
                None => BoardPatch::Remove { id: id.clone() },
            },
        }
    }

    fn plan(&self, intent: &Self::Intent) -> Result<Planned<Self::Patch>> {
        match intent {
            BoardIntent::Move { task_id, column } => {
                if !self.tasks.contains_key(task_id) {
                    return Err(Error::TaskNotFound(task_id.clone()));
                }
                if column.is_empty() {
                    return Err(Error::InvalidInput("column is empty".to_string()));
                }
                Ok(Planned {
                    forward: BoardPatch::Move {
                        id: task_id.clone(),
                        column: column.clone(),
                    },
                    frame: ClientFrame::new("move_task")
                        .with("task_id", task_id.as_str())
                        .with("column", column.as_str()),
                })
            }
            BoardIntent::Create { task } => {
                if task.id.is_empty() {
                    return Err(Error::InvalidInput("task id is empty".to_string()));
                }
                if self.tasks.contains_key(&task.id) {
                    return Err(Error::InvalidInput(format!(
                        "task already exists: {}",
                        task.id
                    )));
                }
                Ok(Planned {
                    forward: BoardPatch::Upsert(task.clone()),
                    frame: ClientFrame::new("create_task")
                        .with("task", serde_json::to_value(task)?),
                })
            }
            BoardIntent::Delete { task_id } => {
                if !self.tasks.contains_key(task_id) {
                    return Err(Error::TaskNotFound(task_id.clone()));
                }
                Ok(Planned {
                    forward: BoardPatch::Remove {
                        id: task_id.clone(),
                    },
                    frame: ClientFrame::new("delete_task").with("task_id", task_id.as_str()),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;

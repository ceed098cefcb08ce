use serde::{Deserialize, Serialize};

/// A server-owned todo item. Ids are assigned by the server and only ever
/// echoed back by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub task: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoRequest {
    pub task: String,
}

/// Partial update body for `PUT /todos/{id}`. A patch carries exactly one
/// concern: either the description or the completion flag, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn task(task: String) -> Self {
        Self {
            task: Some(task),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            task: None,
            completed: Some(completed),
        }
    }
}

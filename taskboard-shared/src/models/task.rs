/// Task document model
///
/// A task is a schema-free JSON document. The only field this layer knows
/// about is `id`, which doubles as the partition key in the `tasks`
/// container. Everything else (title, completion flag, database system
/// properties such as `_etag` or `_ts`) is carried through untouched.
///
/// # Wire Shape
///
/// ```json
/// {
///   "id": "t1",
///   "title": "buy milk",
///   "done": false
/// }
/// ```
///
/// # Example
///
/// ```
/// use taskboard_shared::models::task::{NewTask, Task};
/// use serde_json::json;
///
/// let draft: NewTask = serde_json::from_value(json!({"title": "buy milk"})).unwrap();
/// let task: Task = draft.into_task();
///
/// assert!(!task.id.is_empty());
/// assert_eq!(task.get("title"), Some(&json!("buy milk")));
/// ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// A stored task document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier and partition key
    pub id: String,

    /// Every other field of the document, in whatever shape the caller sent
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

impl Task {
    /// Creates an empty task document with the given id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Sets a field, replacing any previous value
    ///
    /// Setting `id` through this method is ignored; the id lives in its own
    /// field so the flattened map never carries a second copy.
    pub fn set(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        let key = key.into();
        if key != "id" {
            self.fields.insert(key, value);
        }
        self
    }

    /// Looks up a non-id field
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }
}

/// Payload for creating a task
///
/// Unlike [`Task`], the id is optional. When it is missing, `null` or an
/// empty string a UUID v4 is generated on conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    /// Caller-supplied id, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Remaining document fields
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

impl NewTask {
    /// Converts the payload into a storable task, assigning an id if needed
    pub fn into_task(self) -> Task {
        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };

        Task {
            id,
            fields: self.fields,
        }
    }
}

impl From<Task> for NewTask {
    fn from(task: Task) -> Self {
        Self {
            id: Some(task.id),
            fields: task.fields,
        }
    }
}

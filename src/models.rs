// Data models for gig

use serde::{Deserialize, Serialize};

/// A named grouping of done tasks. The name is the lookup key; the id is a
/// display id drawn from the root sequence at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

/// A single completed-work record, owned by one category. This is exactly
/// the record persisted in the category's keyspace and exported to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    /// Creation time, formatted `MM-DD-YYYY hh:mm:ss`.
    pub created: String,
}

/// One element of the export document: a category and all of its tasks in
/// ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryExport {
    pub category: String,
    pub tasks: Vec<Task>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_serialization_field_names() {
        let task = Task {
            id: 1,
            description: "Finished chapter 3".to_string(),
            created: "01-02-2026 15:04:05".to_string(),
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["description"], "Finished chapter 3");
        assert_eq!(value["created"], "01-02-2026 15:04:05");
    }

    #[test]
    fn test_task_round_trip() {
        let task = Task {
            id: 7,
            description: "Fixed the fence".to_string(),
            created: "03-14-2026 09:00:00".to_string(),
        };

        let json = serde_json::to_string(&task).unwrap();
        let deserialized: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, task);
    }

    #[test]
    fn test_export_schema() {
        let export = vec![CategoryExport {
            category: "reading".to_string(),
            tasks: vec![Task {
                id: 1,
                description: "Finished chapter 3".to_string(),
                created: "01-02-2026 15:04:05".to_string(),
            }],
        }];

        let value = serde_json::to_value(&export).unwrap();
        assert_eq!(value[0]["category"], "reading");
        assert_eq!(value[0]["tasks"][0]["id"], 1);
        assert_eq!(value[0]["tasks"][0]["description"], "Finished chapter 3");
    }
}

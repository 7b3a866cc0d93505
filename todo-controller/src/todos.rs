use serde::{Deserialize, Serialize};

/// The subset of a todo list response we care about
#[derive(Deserialize, Debug, Default)]
pub struct TodoList {
    #[serde(default)]
    pub items: Vec<Todo>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Todo {
    #[serde(default)]
    pub spec: TodoSpec,
}

#[derive(Deserialize, Debug, Default)]
pub struct TodoSpec {
    #[serde(default)]
    pub name: String,
}

/// Body of a successful `/api/todos` response
#[derive(Serialize, Debug)]
pub struct TodoNames<'a> {
    pub items: Vec<String>,
    pub namespace: &'a str,
}

impl TodoList {
    /// Keeps only the names, in list order
    pub fn names(self) -> Vec<String> {
        self.items.into_iter().map(|todo| todo.spec.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_follow_list_order() {
        let list: TodoList = serde_json::from_value(json!({
            "apiVersion": "patrickdap.com/v1",
            "kind": "TodoList",
            "items": [
                { "metadata": { "name": "b" }, "spec": { "name": "Buy milk" } },
                { "metadata": { "name": "a" }, "spec": { "name": "Walk the dog" } },
            ]
        }))
        .unwrap();
        assert_eq!(list.names(), vec!["Buy milk", "Walk the dog"]);
    }

    #[test]
    fn missing_fields_decode_to_empty() {
        let list: TodoList = serde_json::from_value(json!({ "items": [{}] })).unwrap();
        assert_eq!(list.names(), vec![""]);

        let list: TodoList = serde_json::from_value(json!({})).unwrap();
        assert!(list.names().is_empty());
    }
}

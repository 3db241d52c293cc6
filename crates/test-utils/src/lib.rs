//! Intranet test utilities.
//!
//! Helpers for integration testing: request-body builders for menus and
//! menu items, and assertion utilities for the JSON response envelope.

use serde_json::{Value as JsonValue, json};

/// Create a test menu body with default values.
pub fn test_menu(name: &str, location: &str) -> TestMenu {
    TestMenu {
        name: name.to_string(),
        location: location.to_string(),
    }
}

/// A test menu builder for creating request bodies.
#[derive(Debug, Clone)]
pub struct TestMenu {
    pub name: String,
    pub location: String,
}

impl TestMenu {
    /// Render as a `POST /menus` body.
    pub fn to_json(&self) -> JsonValue {
        json!({
            "name": self.name,
            "location": self.location,
        })
    }
}

/// Create a top-level test item (level 1, no parent).
pub fn test_item(menu_id: i64, title: &str, url: &str) -> TestMenuItem {
    TestMenuItem {
        menu_id,
        parent_id: None,
        level: 1,
        title: title.to_string(),
        url: url.to_string(),
        target: None,
        order_position: None,
    }
}

/// A test menu item builder for creating request bodies.
#[derive(Debug, Clone)]
pub struct TestMenuItem {
    pub menu_id: i64,
    pub parent_id: Option<i64>,
    pub level: i64,
    pub title: String,
    pub url: String,
    pub target: Option<String>,
    pub order_position: Option<i64>,
}

impl TestMenuItem {
    /// Place under a parent at the given level.
    pub fn under(mut self, parent_id: i64, level: i64) -> Self {
        self.parent_id = Some(parent_id);
        self.level = level;
        self
    }

    /// Set the level explicitly.
    pub fn with_level(mut self, level: i64) -> Self {
        self.level = level;
        self
    }

    /// Set the link target.
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    /// Set the sibling position.
    pub fn at_position(mut self, order_position: i64) -> Self {
        self.order_position = Some(order_position);
        self
    }

    /// Render as a `POST /menus/items` body. Unset optional fields are omitted.
    pub fn to_json(&self) -> JsonValue {
        let mut body = json!({
            "menu_id": self.menu_id,
            "level": self.level,
            "title": self.title,
            "url": self.url,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(parent_id) = self.parent_id {
                obj.insert("parent_id".to_string(), json!(parent_id));
            }
            if let Some(ref target) = self.target {
                obj.insert("target".to_string(), json!(target));
            }
            if let Some(order_position) = self.order_position {
                obj.insert("order_position".to_string(), json!(order_position));
            }
        }
        body
    }
}

/// Assertion helpers for JSON responses.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert a successful envelope and return its `data`.
    pub fn success(body: &Value) -> &Value {
        assert_eq!(
            body["success"],
            Value::Bool(true),
            "Expected success envelope, got: {body}"
        );
        &body["data"]
    }

    /// Assert a failed envelope whose error contains `needle`.
    pub fn failure(body: &Value, needle: &str) {
        assert_eq!(
            body["success"],
            Value::Bool(false),
            "Expected failure envelope, got: {body}"
        );
        let message = body["error"].as_str().unwrap_or_default();
        assert!(
            message.contains(needle),
            "Expected error to contain '{needle}'\nActual: {message}"
        );
    }

    /// Collect the `id` field of every object in a JSON array.
    pub fn ids(value: &Value) -> Vec<i64> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(|i| i["id"].as_i64()).collect())
            .unwrap_or_default()
    }
}

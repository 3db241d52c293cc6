//! Menu item model for hierarchical navigation entries.
//!
//! Items belong to exactly one navigation menu and may reference a parent
//! item of the same menu. Sibling groups (same `menu_id` and `parent_id`)
//! are ordered by `order_position`, ties broken by `id`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Default link target.
pub const DEFAULT_TARGET: &str = "_self";

/// Menu item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuItem {
    /// Serial identifier (increases with insertion order).
    pub id: i32,

    /// Owning menu.
    pub menu_id: i32,

    /// Parent item in the same menu, `None` for top-level items.
    pub parent_id: Option<i32>,

    /// Depth indicator, 1 = top-level.
    pub level: i32,

    /// Display title.
    pub title: String,

    /// Link destination.
    pub url: String,

    /// Link-open behavior (e.g., "_self", "_blank").
    pub target: String,

    /// Sort position among siblings (lower = first).
    pub order_position: i32,

    /// Whether the item is rendered.
    pub is_active: bool,

    /// Whether at least one item references this one as parent.
    pub has_children: bool,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,
}

impl MenuItem {
    /// Sibling ordering: `order_position`, then insertion id.
    pub fn sibling_cmp(&self, other: &Self) -> Ordering {
        (self.order_position, self.id).cmp(&(other.order_position, other.id))
    }

    /// Flat listing ordering: `level`, then sibling ordering.
    pub fn listing_cmp(&self, other: &Self) -> Ordering {
        self.level
            .cmp(&other.level)
            .then_with(|| self.sibling_cmp(other))
    }
}

/// Input for creating a menu item.
///
/// Required fields are optional here so that a missing field is reported
/// as a validation error naming the field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMenuItem {
    pub menu_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub level: Option<i32>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub order_position: Option<i32>,
}

/// Validated input handed to storage.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub menu_id: i32,
    pub parent_id: Option<i32>,
    pub level: i32,
    pub title: String,
    pub url: String,
    pub target: String,
    pub order_position: i32,
}

/// Input for updating a menu item. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMenuItem {
    pub title: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub level: Option<i32>,
    pub is_active: Option<bool>,
    pub order_position: Option<i32>,
}

impl UpdateMenuItem {
    /// Apply the supplied fields on top of an existing item.
    pub fn apply(self, mut item: MenuItem, now: i64) -> MenuItem {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(url) = self.url {
            item.url = url;
        }
        if let Some(target) = self.target {
            item.target = target;
        }
        if let Some(level) = self.level {
            item.level = level;
        }
        if let Some(is_active) = self.is_active {
            item.is_active = is_active;
        }
        if let Some(order_position) = self.order_position {
            item.order_position = order_position;
        }
        item.changed = now;
        item
    }
}

/// Outcome of deleting an item together with its subtree.
#[derive(Debug, Clone, Serialize)]
pub struct DeletedItem {
    /// The item the delete was requested for.
    pub item: MenuItem,

    /// Ids of every removed row (the item and all descendants).
    pub removed: Vec<i32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn item(id: i32, level: i32, order_position: i32) -> MenuItem {
        MenuItem {
            id,
            menu_id: 1,
            parent_id: None,
            level,
            title: format!("Item {id}"),
            url: "/".to_string(),
            target: DEFAULT_TARGET.to_string(),
            order_position,
            is_active: true,
            has_children: false,
            created: 1000,
            changed: 1000,
        }
    }

    #[test]
    fn sibling_ties_break_by_id() {
        let a = item(2, 1, 0);
        let b = item(1, 1, 0);
        assert_eq!(a.sibling_cmp(&b), Ordering::Greater);
        assert_eq!(item(5, 1, 0).sibling_cmp(&item(1, 1, 1)), Ordering::Less);
    }

    #[test]
    fn listing_orders_by_level_first() {
        assert_eq!(item(1, 2, 0).listing_cmp(&item(9, 1, 9)), Ordering::Greater);
    }

    #[test]
    fn update_applies_only_supplied_fields() {
        let before = item(1, 1, 3);
        let updated = UpdateMenuItem {
            title: Some("Renamed".to_string()),
            is_active: Some(false),
            ..Default::default()
        }
        .apply(before.clone(), 2000);

        assert_eq!(updated.title, "Renamed");
        assert!(!updated.is_active);
        assert_eq!(updated.url, before.url);
        assert_eq!(updated.order_position, 3);
        assert_eq!(updated.changed, 2000);
        assert_eq!(updated.created, 1000);
    }
}

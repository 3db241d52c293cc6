//! Menu storage abstraction layer.
//!
//! All menu and menu-item reads and writes go through [`MenuStorage`].
//! Implementations must make every multi-step write atomic: an item insert
//! and its parent's `has_children` flag, a subtree delete and the parent
//! recount, a reorder and all of its position updates.
//!
//! - [`PgMenuStorage`]: PostgreSQL via sqlx, one transaction per write
//! - [`MemoryMenuStorage`]: in-process maps behind a single lock

mod memory;
mod pg;

use async_trait::async_trait;

pub use memory::MemoryMenuStorage;
pub use pg::PgMenuStorage;

use crate::menu::{MenuError, MenuResult};
use crate::models::{
    DeletedItem, MenuChanges, MenuItem, MenuLocation, NavigationMenu, NewMenu, NewMenuItem,
    UpdateMenuItem,
};

/// The core trait for menu storage.
#[async_trait]
pub trait MenuStorage: Send + Sync {
    /// List every menu, ordered by location, name and id.
    async fn list_menus(&self) -> MenuResult<Vec<NavigationMenu>>;

    /// Load a menu by id.
    async fn find_menu(&self, id: i32) -> MenuResult<Option<NavigationMenu>>;

    /// Load the active menu at a location with the lowest id.
    async fn find_active_menu(&self, location: MenuLocation)
    -> MenuResult<Option<NavigationMenu>>;

    /// Insert a menu (active by default).
    async fn create_menu(&self, input: NewMenu) -> MenuResult<NavigationMenu>;

    /// Apply a partial update. Returns `None` if the menu doesn't exist.
    async fn update_menu(
        &self,
        id: i32,
        changes: MenuChanges,
    ) -> MenuResult<Option<NavigationMenu>>;

    /// Delete a menu and all of its items.
    ///
    /// Returns `true` if a menu was deleted, `false` if it didn't exist.
    async fn delete_menu(&self, id: i32) -> MenuResult<bool>;

    /// Load an item by id.
    async fn find_item(&self, id: i32) -> MenuResult<Option<MenuItem>>;

    /// All items of a menu ordered by `(level, order_position, id)`.
    async fn list_items(&self, menu_id: i32) -> MenuResult<Vec<MenuItem>>;

    /// Insert an item and mark its parent as having children.
    ///
    /// The menu must exist, and the parent (if any) must exist in the same
    /// menu with `level == input.level - 1`; otherwise a validation error
    /// is returned and nothing is written.
    async fn create_item(&self, input: NewMenuItem) -> MenuResult<MenuItem>;

    /// Apply a partial update. Returns `None` if the item doesn't exist.
    async fn update_item(&self, id: i32, input: UpdateMenuItem) -> MenuResult<Option<MenuItem>>;

    /// Delete an item with its whole subtree and recompute the former
    /// parent's `has_children`. Returns `None` if the item doesn't exist.
    async fn delete_item(&self, id: i32) -> MenuResult<Option<DeletedItem>>;

    /// Assign `order_position = index` to each listed item.
    ///
    /// Returns `false`, leaving every position unchanged, if any id is not
    /// an item of `menu_id`. A missing menu is reported as not found.
    async fn reorder_items(&self, menu_id: i32, ordered_ids: &[i32]) -> MenuResult<bool>;

    /// Check whether the backend is reachable.
    async fn healthy(&self) -> bool {
        true
    }
}

/// Error message shared by backends when a parent reference is invalid.
pub(crate) fn parent_mismatch(parent_id: i32, menu_id: i32) -> String {
    format!("parent item {parent_id} does not exist in menu {menu_id}")
}

/// Error message shared by backends when a level disagrees with its parent.
pub(crate) fn level_mismatch(level: i32, expected: i32) -> String {
    format!("level {level} does not match parent position (expected {expected})")
}

/// Level a child of `parent_level` must have.
pub(crate) fn child_level(parent_level: i32) -> MenuResult<i32> {
    parent_level.checked_add(1).ok_or_else(|| {
        MenuError::validation(format!("parent level {parent_level} is too deep"))
    })
}

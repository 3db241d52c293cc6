//! Menu service.
//!
//! Validates caller input, delegates persistence to a [`MenuStorage`]
//! backend, and assembles hierarchical views of menu items.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{MenuError, MenuResult};
use super::tree::{self, MenuItemNode};
use crate::models::{
    CreateMenu, CreateMenuItem, DEFAULT_TARGET, DeletedItem, MenuChanges, MenuItem, MenuLocation,
    NavigationMenu, NewMenu, NewMenuItem, UpdateMenu, UpdateMenuItem,
};
use crate::storage::MenuStorage;

/// A rendered navigation: the active menu at a location and its visible items.
#[derive(Debug, Clone, Serialize)]
pub struct Navigation {
    pub menu: NavigationMenu,
    pub items: Vec<MenuItemNode>,
}

/// Service for managing navigation menus and their items.
pub struct MenuService {
    storage: Arc<dyn MenuStorage>,
}

impl MenuService {
    /// Create a new MenuService over a storage backend.
    pub fn new(storage: Arc<dyn MenuStorage>) -> Arc<Self> {
        Arc::new(Self { storage })
    }

    /// Check whether the storage backend is reachable.
    pub async fn healthy(&self) -> bool {
        self.storage.healthy().await
    }

    // -------------------------------------------------------------------------
    // Menu operations
    // -------------------------------------------------------------------------

    /// List all menus.
    pub async fn list_menus(&self) -> MenuResult<Vec<NavigationMenu>> {
        self.storage.list_menus().await
    }

    /// Get a menu by ID.
    pub async fn get_menu(&self, id: i32) -> MenuResult<NavigationMenu> {
        self.storage
            .find_menu(id)
            .await?
            .ok_or(MenuError::NotFound("menu"))
    }

    /// Create a new, active menu.
    pub async fn create_menu(&self, input: CreateMenu) -> MenuResult<NavigationMenu> {
        let name = required_text("name", Some(input.name))?;
        let location = parse_location(&input.location)?;

        let menu = self.storage.create_menu(NewMenu { name, location }).await?;
        info!(menu_id = menu.id, location = %menu.location, "menu created");
        Ok(menu)
    }

    /// Update a menu. Returns `None` if it doesn't exist.
    pub async fn update_menu(
        &self,
        id: i32,
        input: UpdateMenu,
    ) -> MenuResult<Option<NavigationMenu>> {
        let changes = MenuChanges {
            name: input
                .name
                .map(|name| required_text("name", Some(name)))
                .transpose()?,
            location: input
                .location
                .as_deref()
                .map(parse_location)
                .transpose()?,
            is_active: input.is_active,
        };

        let menu = self.storage.update_menu(id, changes).await?;
        if menu.is_some() {
            info!(menu_id = id, "menu updated");
        }
        Ok(menu)
    }

    /// Delete a menu together with all of its items.
    pub async fn delete_menu(&self, id: i32) -> MenuResult<()> {
        if !self.storage.delete_menu(id).await? {
            return Err(MenuError::NotFound("menu"));
        }
        info!(menu_id = id, "menu deleted");
        Ok(())
    }

    /// The active menu at a location with inactive items pruned.
    ///
    /// Returns `None` when no active menu is placed there.
    pub async fn navigation_for(&self, location: MenuLocation) -> MenuResult<Option<Navigation>> {
        let Some(menu) = self.storage.find_active_menu(location).await? else {
            return Ok(None);
        };
        let items = tree::prune_inactive(self.items_hierarchical(menu.id).await?);
        Ok(Some(Navigation { menu, items }))
    }

    // -------------------------------------------------------------------------
    // Item operations
    // -------------------------------------------------------------------------

    /// Get a menu item by ID.
    pub async fn get_item(&self, id: i32) -> MenuResult<MenuItem> {
        self.storage
            .find_item(id)
            .await?
            .ok_or(MenuError::NotFound("menu item"))
    }

    /// Flat list of a menu's items ordered by level, position and id.
    pub async fn items_flat(&self, menu_id: i32) -> MenuResult<Vec<MenuItem>> {
        self.storage.list_items(menu_id).await
    }

    /// A menu's items nested into a tree. Unknown or empty menus yield `[]`.
    pub async fn items_hierarchical(&self, menu_id: i32) -> MenuResult<Vec<MenuItemNode>> {
        let rows = self.storage.list_items(menu_id).await?;
        let count = rows.len();
        let forest = tree::build_tree(rows);
        debug!(menu_id, items = count, roots = forest.len(), "built menu tree");
        Ok(forest)
    }

    /// Create a menu item, marking its parent as having children.
    pub async fn create_item(&self, input: CreateMenuItem) -> MenuResult<MenuItem> {
        let new_item = validate_new_item(input)?;
        let item = self.storage.create_item(new_item).await?;
        info!(
            menu_id = item.menu_id,
            item_id = item.id,
            parent_id = ?item.parent_id,
            level = item.level,
            "menu item created"
        );
        Ok(item)
    }

    /// Update a menu item. Returns `None` if it doesn't exist.
    pub async fn update_item(
        &self,
        id: i32,
        input: UpdateMenuItem,
    ) -> MenuResult<Option<MenuItem>> {
        let input = validate_item_update(input)?;
        let item = self.storage.update_item(id, input).await?;
        if item.is_some() {
            info!(item_id = id, "menu item updated");
        }
        Ok(item)
    }

    /// Delete a menu item with its entire subtree.
    pub async fn delete_item(&self, id: i32) -> MenuResult<DeletedItem> {
        let deleted = self
            .storage
            .delete_item(id)
            .await?
            .ok_or(MenuError::NotFound("menu item"))?;
        info!(
            menu_id = deleted.item.menu_id,
            item_id = id,
            removed = deleted.removed.len(),
            "menu item deleted"
        );
        Ok(deleted)
    }

    /// Assign sequential 0-based positions to items in the given order.
    ///
    /// Returns `false` if the list names an item outside the menu; no
    /// position is changed in that case.
    pub async fn reorder_items(&self, menu_id: i32, ordered_ids: &[i32]) -> MenuResult<bool> {
        let mut seen = HashSet::with_capacity(ordered_ids.len());
        if let Some(dup) = ordered_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(MenuError::validation(format!(
                "item {dup} appears more than once"
            )));
        }

        let reordered = self.storage.reorder_items(menu_id, ordered_ids).await?;
        if reordered {
            info!(menu_id, items = ordered_ids.len(), "menu items reordered");
        } else {
            warn!(menu_id, ids = ?ordered_ids, "reorder rejected: item outside menu");
        }
        Ok(reordered)
    }
}

/// Trim a required text field, rejecting missing or blank values.
fn required_text(field: &str, value: Option<String>) -> MenuResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(MenuError::validation(format!("{field} is required"))),
    }
}

fn parse_location(raw: &str) -> MenuResult<MenuLocation> {
    if raw.trim().is_empty() {
        return Err(MenuError::validation("location is required"));
    }
    raw.parse()
        .map_err(|e: crate::models::UnknownLocation| MenuError::validation(e.to_string()))
}

fn validate_level(level: i32) -> MenuResult<i32> {
    if level < 1 {
        return Err(MenuError::validation("level must be at least 1"));
    }
    Ok(level)
}

fn validate_new_item(input: CreateMenuItem) -> MenuResult<NewMenuItem> {
    let menu_id = input
        .menu_id
        .ok_or_else(|| MenuError::validation("menu_id is required"))?;
    let level = validate_level(
        input
            .level
            .ok_or_else(|| MenuError::validation("level is required"))?,
    )?;
    let title = required_text("title", input.title)?;
    let url = required_text("url", input.url)?;

    if input.parent_id.is_none() && level != 1 {
        return Err(MenuError::validation("top-level items must have level 1"));
    }

    let target = input
        .target
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TARGET.to_string());

    Ok(NewMenuItem {
        menu_id,
        parent_id: input.parent_id,
        level,
        title,
        url,
        target,
        order_position: input.order_position.unwrap_or(0),
    })
}

fn validate_item_update(input: UpdateMenuItem) -> MenuResult<UpdateMenuItem> {
    Ok(UpdateMenuItem {
        title: input
            .title
            .map(|t| required_text("title", Some(t)))
            .transpose()?,
        url: input
            .url
            .map(|u| required_text("url", Some(u)))
            .transpose()?,
        target: input
            .target
            .map(|t| required_text("target", Some(t)))
            .transpose()?,
        level: input.level.map(validate_level).transpose()?,
        is_active: input.is_active,
        order_position: input.order_position,
    })
}

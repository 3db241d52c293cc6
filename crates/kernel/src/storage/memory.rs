//! In-process implementation of MenuStorage.
//!
//! Every write holds the table lock for its whole duration, which gives the
//! same all-or-nothing behavior the PostgreSQL backend gets from
//! transactions. Ids are assigned from per-table counters starting at 1.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{MenuStorage, child_level, level_mismatch, parent_mismatch};
use crate::menu::{MenuError, MenuResult};
use crate::models::{
    DeletedItem, MenuChanges, MenuItem, MenuLocation, NavigationMenu, NewMenu, NewMenuItem,
    UpdateMenuItem,
};

#[derive(Debug, Default)]
struct Tables {
    menus: BTreeMap<i32, NavigationMenu>,
    items: BTreeMap<i32, MenuItem>,
    last_menu_id: i32,
    last_item_id: i32,
}

impl Tables {
    /// Ids of `root` and every descendant, root first.
    fn subtree_ids(&self, root: i32) -> Vec<i32> {
        let mut ids = vec![root];
        let mut cursor = 0;
        while cursor < ids.len() {
            let current = ids[cursor];
            ids.extend(
                self.items
                    .values()
                    .filter(|item| item.parent_id == Some(current))
                    .map(|item| item.id),
            );
            cursor += 1;
        }
        ids
    }

    fn has_children(&self, id: i32) -> bool {
        self.items.values().any(|item| item.parent_id == Some(id))
    }
}

/// Menu storage kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryMenuStorage {
    tables: RwLock<Tables>,
}

impl MemoryMenuStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[async_trait]
impl MenuStorage for MemoryMenuStorage {
    async fn list_menus(&self) -> MenuResult<Vec<NavigationMenu>> {
        let tables = self.tables.read();
        let mut menus: Vec<NavigationMenu> = tables.menus.values().cloned().collect();
        menus.sort_by(|a, b| {
            (a.location.as_str(), &a.name, a.id).cmp(&(b.location.as_str(), &b.name, b.id))
        });
        Ok(menus)
    }

    async fn find_menu(&self, id: i32) -> MenuResult<Option<NavigationMenu>> {
        Ok(self.tables.read().menus.get(&id).cloned())
    }

    async fn find_active_menu(
        &self,
        location: MenuLocation,
    ) -> MenuResult<Option<NavigationMenu>> {
        let tables = self.tables.read();
        Ok(tables
            .menus
            .values()
            .find(|menu| menu.location == location && menu.is_active)
            .cloned())
    }

    async fn create_menu(&self, input: NewMenu) -> MenuResult<NavigationMenu> {
        let mut tables = self.tables.write();
        tables.last_menu_id += 1;
        let now = now();
        let menu = NavigationMenu {
            id: tables.last_menu_id,
            name: input.name,
            location: input.location,
            is_active: true,
            created: now,
            changed: now,
        };
        tables.menus.insert(menu.id, menu.clone());
        Ok(menu)
    }

    async fn update_menu(
        &self,
        id: i32,
        changes: MenuChanges,
    ) -> MenuResult<Option<NavigationMenu>> {
        let mut tables = self.tables.write();
        let Some(menu) = tables.menus.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            menu.name = name;
        }
        if let Some(location) = changes.location {
            menu.location = location;
        }
        if let Some(is_active) = changes.is_active {
            menu.is_active = is_active;
        }
        menu.changed = now();
        Ok(Some(menu.clone()))
    }

    async fn delete_menu(&self, id: i32) -> MenuResult<bool> {
        let mut tables = self.tables.write();
        if tables.menus.remove(&id).is_none() {
            return Ok(false);
        }
        tables.items.retain(|_, item| item.menu_id != id);
        Ok(true)
    }

    async fn find_item(&self, id: i32) -> MenuResult<Option<MenuItem>> {
        Ok(self.tables.read().items.get(&id).cloned())
    }

    async fn list_items(&self, menu_id: i32) -> MenuResult<Vec<MenuItem>> {
        let tables = self.tables.read();
        let mut items: Vec<MenuItem> = tables
            .items
            .values()
            .filter(|item| item.menu_id == menu_id)
            .cloned()
            .collect();
        items.sort_by(MenuItem::listing_cmp);
        Ok(items)
    }

    async fn create_item(&self, input: NewMenuItem) -> MenuResult<MenuItem> {
        let mut tables = self.tables.write();

        if !tables.menus.contains_key(&input.menu_id) {
            return Err(MenuError::validation(format!(
                "menu {} does not exist",
                input.menu_id
            )));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = tables
                .items
                .get(&parent_id)
                .filter(|parent| parent.menu_id == input.menu_id)
                .ok_or_else(|| MenuError::validation(parent_mismatch(parent_id, input.menu_id)))?;
            let expected = child_level(parent.level)?;
            if input.level != expected {
                return Err(MenuError::validation(level_mismatch(input.level, expected)));
            }
        }

        tables.last_item_id += 1;
        let now = now();
        let item = MenuItem {
            id: tables.last_item_id,
            menu_id: input.menu_id,
            parent_id: input.parent_id,
            level: input.level,
            title: input.title,
            url: input.url,
            target: input.target,
            order_position: input.order_position,
            is_active: true,
            has_children: false,
            created: now,
            changed: now,
        };
        tables.items.insert(item.id, item.clone());

        if let Some(parent) = input.parent_id.and_then(|id| tables.items.get_mut(&id)) {
            parent.has_children = true;
            parent.changed = now;
        }

        Ok(item)
    }

    async fn update_item(&self, id: i32, input: UpdateMenuItem) -> MenuResult<Option<MenuItem>> {
        let mut tables = self.tables.write();
        let Some(existing) = tables.items.get(&id).cloned() else {
            return Ok(None);
        };
        let updated = input.apply(existing, now());
        tables.items.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_item(&self, id: i32) -> MenuResult<Option<DeletedItem>> {
        let mut tables = self.tables.write();
        let Some(item) = tables.items.get(&id).cloned() else {
            return Ok(None);
        };

        let removed = tables.subtree_ids(id);
        for removed_id in &removed {
            tables.items.remove(removed_id);
        }

        if let Some(parent_id) = item.parent_id {
            let still_has_children = tables.has_children(parent_id);
            if let Some(parent) = tables.items.get_mut(&parent_id) {
                parent.has_children = still_has_children;
                parent.changed = now();
            }
        }

        Ok(Some(DeletedItem { item, removed }))
    }

    async fn reorder_items(&self, menu_id: i32, ordered_ids: &[i32]) -> MenuResult<bool> {
        let mut tables = self.tables.write();
        if !tables.menus.contains_key(&menu_id) {
            return Err(MenuError::NotFound("menu"));
        }

        let all_in_menu = ordered_ids.iter().all(|id| {
            tables
                .items
                .get(id)
                .is_some_and(|item| item.menu_id == menu_id)
        });
        if !all_in_menu {
            return Ok(false);
        }

        let now = now();
        for (position, id) in ordered_ids.iter().enumerate() {
            if let Some(item) = tables.items.get_mut(id) {
                item.order_position = i32::try_from(position).unwrap_or(i32::MAX);
                item.changed = now;
            }
        }
        Ok(true)
    }
}

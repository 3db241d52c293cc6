//! PostgreSQL implementation of MenuStorage.
//!
//! Multi-step writes run in a single transaction. Writes that touch a
//! menu's tree (item create, item delete, reorder) first lock the owning
//! `navigation_menu` row with `FOR UPDATE`, so they serialize per menu
//! instead of racing on `has_children` or `order_position`.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::{MenuStorage, child_level, level_mismatch, parent_mismatch};
use crate::menu::{MenuError, MenuResult};
use crate::models::{
    DeletedItem, MenuChanges, MenuItem, MenuLocation, NavigationMenu, NewMenu, NewMenuItem,
    UpdateMenuItem,
};

const MENU_COLUMNS: &str = "id, name, location, is_active, created, changed";

const ITEM_COLUMNS: &str = "id, menu_id, parent_id, level, title, url, target, order_position, \
     is_active, has_children, created, changed";

/// Direct database implementation of MenuStorage.
#[derive(Clone)]
pub struct PgMenuStorage {
    pool: PgPool,
}

impl PgMenuStorage {
    /// Create a new PgMenuStorage with a database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Lock a menu row for the rest of the transaction.
///
/// Every write that changes the shape of a menu's tree takes this lock
/// first, so structural writes to one menu run one at a time and never
/// acquire item locks in conflicting orders.
async fn lock_menu(tx: &mut PgConnection, menu_id: i32) -> MenuResult<bool> {
    let locked: Option<i32> =
        sqlx::query_scalar("SELECT id FROM navigation_menu WHERE id = $1 FOR UPDATE")
            .bind(menu_id)
            .fetch_optional(tx)
            .await
            .context("failed to lock menu")?;
    Ok(locked.is_some())
}

#[async_trait]
impl MenuStorage for PgMenuStorage {
    async fn list_menus(&self) -> MenuResult<Vec<NavigationMenu>> {
        let menus = sqlx::query_as::<_, NavigationMenu>(&format!(
            "SELECT {MENU_COLUMNS} FROM navigation_menu ORDER BY location, name, id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list menus")?;

        Ok(menus)
    }

    async fn find_menu(&self, id: i32) -> MenuResult<Option<NavigationMenu>> {
        let menu = sqlx::query_as::<_, NavigationMenu>(&format!(
            "SELECT {MENU_COLUMNS} FROM navigation_menu WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch menu by id")?;

        Ok(menu)
    }

    async fn find_active_menu(
        &self,
        location: MenuLocation,
    ) -> MenuResult<Option<NavigationMenu>> {
        let menu = sqlx::query_as::<_, NavigationMenu>(&format!(
            r#"
            SELECT {MENU_COLUMNS} FROM navigation_menu
            WHERE location = $1 AND is_active
            ORDER BY id
            LIMIT 1
            "#
        ))
        .bind(location.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch active menu by location")?;

        Ok(menu)
    }

    async fn create_menu(&self, input: NewMenu) -> MenuResult<NavigationMenu> {
        let now = now();
        let menu = sqlx::query_as::<_, NavigationMenu>(&format!(
            r#"
            INSERT INTO navigation_menu (name, location, is_active, created, changed)
            VALUES ($1, $2, TRUE, $3, $3)
            RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(input.location.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("failed to create menu")?;

        Ok(menu)
    }

    async fn update_menu(
        &self,
        id: i32,
        changes: MenuChanges,
    ) -> MenuResult<Option<NavigationMenu>> {
        let Some(existing) = self.find_menu(id).await? else {
            return Ok(None);
        };

        let name = changes.name.unwrap_or(existing.name);
        let location = changes.location.unwrap_or(existing.location);
        let is_active = changes.is_active.unwrap_or(existing.is_active);

        let updated = sqlx::query_as::<_, NavigationMenu>(&format!(
            r#"
            UPDATE navigation_menu
            SET name = $1, location = $2, is_active = $3, changed = $4
            WHERE id = $5
            RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(location.as_str())
        .bind(is_active)
        .bind(now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update menu")?;

        Ok(updated)
    }

    async fn delete_menu(&self, id: i32) -> MenuResult<bool> {
        // menu_item rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM navigation_menu WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete menu")?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_item(&self, id: i32) -> MenuResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch menu item by id")?;

        Ok(item)
    }

    async fn list_items(&self, menu_id: i32) -> MenuResult<Vec<MenuItem>> {
        let items = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM menu_item
            WHERE menu_id = $1
            ORDER BY level ASC, order_position ASC, id ASC
            "#
        ))
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list menu items")?;

        Ok(items)
    }

    async fn create_item(&self, input: NewMenuItem) -> MenuResult<MenuItem> {
        let now = now();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to start transaction")?;

        if !lock_menu(&mut tx, input.menu_id).await? {
            return Err(MenuError::validation(format!(
                "menu {} does not exist",
                input.menu_id
            )));
        }

        if let Some(parent_id) = input.parent_id {
            let parent: Option<(i32, i32)> =
                sqlx::query_as("SELECT menu_id, level FROM menu_item WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .context("failed to load parent menu item")?;

            let Some((_, parent_level)) = parent.filter(|(menu, _)| *menu == input.menu_id)
            else {
                return Err(MenuError::validation(parent_mismatch(
                    parent_id,
                    input.menu_id,
                )));
            };
            let expected = child_level(parent_level)?;
            if input.level != expected {
                return Err(MenuError::validation(level_mismatch(input.level, expected)));
            }
        }

        let item = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            INSERT INTO menu_item
                (menu_id, parent_id, level, title, url, target, order_position,
                 is_active, has_children, created, changed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, FALSE, $8, $8)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(input.menu_id)
        .bind(input.parent_id)
        .bind(input.level)
        .bind(&input.title)
        .bind(&input.url)
        .bind(&input.target)
        .bind(input.order_position)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .context("failed to insert menu item")?;

        if let Some(parent_id) = input.parent_id {
            sqlx::query("UPDATE menu_item SET has_children = TRUE, changed = $1 WHERE id = $2")
                .bind(now)
                .bind(parent_id)
                .execute(&mut *tx)
                .await
                .context("failed to flag parent as having children")?;
        }

        tx.commit().await.context("failed to commit transaction")?;

        Ok(item)
    }

    async fn update_item(&self, id: i32, input: UpdateMenuItem) -> MenuResult<Option<MenuItem>> {
        let Some(existing) = self.find_item(id).await? else {
            return Ok(None);
        };
        let merged = input.apply(existing, now());

        let updated = sqlx::query_as::<_, MenuItem>(&format!(
            r#"
            UPDATE menu_item
            SET title = $1, url = $2, target = $3, level = $4, is_active = $5,
                order_position = $6, changed = $7
            WHERE id = $8
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&merged.title)
        .bind(&merged.url)
        .bind(&merged.target)
        .bind(merged.level)
        .bind(merged.is_active)
        .bind(merged.order_position)
        .bind(merged.changed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update menu item")?;

        Ok(updated)
    }

    async fn delete_item(&self, id: i32) -> MenuResult<Option<DeletedItem>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to start transaction")?;

        let menu_id: Option<i32> =
            sqlx::query_scalar("SELECT menu_id FROM menu_item WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("failed to look up menu item")?;
        let Some(menu_id) = menu_id else {
            return Ok(None);
        };
        lock_menu(&mut tx, menu_id).await?;

        // Re-read under the menu lock; a concurrent delete may have won
        let item = sqlx::query_as::<_, MenuItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_item WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to load menu item")?;
        let Some(item) = item else {
            return Ok(None);
        };

        let removed: Vec<i32> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM menu_item WHERE id = $1
                UNION ALL
                SELECT child.id FROM menu_item child
                JOIN subtree ON child.parent_id = subtree.id
            )
            SELECT id FROM subtree
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .context("failed to collect menu item subtree")?;

        sqlx::query("DELETE FROM menu_item WHERE id = ANY($1)")
            .bind(&removed)
            .execute(&mut *tx)
            .await
            .context("failed to delete menu item subtree")?;

        if let Some(parent_id) = item.parent_id {
            sqlx::query(
                r#"
                UPDATE menu_item
                SET has_children = EXISTS(SELECT 1 FROM menu_item WHERE parent_id = $1),
                    changed = $2
                WHERE id = $1
                "#,
            )
            .bind(parent_id)
            .bind(now())
            .execute(&mut *tx)
            .await
            .context("failed to recompute parent has_children")?;
        }

        tx.commit().await.context("failed to commit transaction")?;

        Ok(Some(DeletedItem { item, removed }))
    }

    async fn reorder_items(&self, menu_id: i32, ordered_ids: &[i32]) -> MenuResult<bool> {
        let now = now();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to start transaction")?;

        if !lock_menu(&mut tx, menu_id).await? {
            return Err(MenuError::NotFound("menu"));
        }

        for (position, id) in ordered_ids.iter().enumerate() {
            let position = i32::try_from(position).context("reorder list too long")?;
            let result = sqlx::query(
                r#"
                UPDATE menu_item SET order_position = $1, changed = $2
                WHERE id = $3 AND menu_id = $4
                "#,
            )
            .bind(position)
            .bind(now)
            .bind(id)
            .bind(menu_id)
            .execute(&mut *tx)
            .await
            .context("failed to update menu item position")?;

            if result.rows_affected() == 0 {
                tx.rollback().await.context("failed to roll back reorder")?;
                return Ok(false);
            }
        }

        tx.commit().await.context("failed to commit transaction")?;

        Ok(true)
    }

    async fn healthy(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}

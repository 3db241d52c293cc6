#![allow(clippy::unwrap_used, clippy::expect_used)]
//! PostgreSQL storage tests.
//!
//! Require a database: set `DATABASE_URL` to run them. Without it every
//! test returns early. Each test works in its own freshly created menu so
//! they can share one database.

use std::sync::Arc;

use intranet_kernel::db;
use intranet_kernel::menu::MenuError;
use intranet_kernel::models::{
    MenuChanges, MenuItem, MenuLocation, NavigationMenu, NewMenu, NewMenuItem, UpdateMenuItem,
};
use intranet_kernel::storage::{MenuStorage, PgMenuStorage};

async fn storage() -> Option<PgMenuStorage> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL storage test");
        return None;
    };
    let pool = db::create_pool(&url, 2).await.expect("connect");
    db::run_migrations(&pool).await.expect("migrate");
    Some(PgMenuStorage::new(pool))
}

async fn fresh_menu(storage: &PgMenuStorage, name: &str) -> NavigationMenu {
    storage
        .create_menu(NewMenu {
            name: name.to_string(),
            location: MenuLocation::Sidebar,
        })
        .await
        .unwrap()
}

fn new_item(menu_id: i32, parent: Option<&MenuItem>, title: &str) -> NewMenuItem {
    NewMenuItem {
        menu_id,
        parent_id: parent.map(|p| p.id),
        level: parent.map_or(1, |p| p.level + 1),
        title: title.to_string(),
        url: format!("/{}", title.to_lowercase()),
        target: "_self".to_string(),
        order_position: 0,
    }
}

#[tokio::test]
async fn test_pg_health() {
    let Some(storage) = storage().await else {
        return;
    };
    assert!(storage.healthy().await);
}

#[tokio::test]
async fn test_pg_create_child_sets_parent_flag() {
    let Some(storage) = storage().await else {
        return;
    };
    let menu = fresh_menu(&storage, "pg flag").await;
    let parent = storage
        .create_item(new_item(menu.id, None, "SMUL"))
        .await
        .unwrap();
    assert!(!parent.has_children);

    storage
        .create_item(new_item(menu.id, Some(&parent), "Institucional"))
        .await
        .unwrap();

    let parent = storage.find_item(parent.id).await.unwrap().unwrap();
    assert!(parent.has_children);
}

#[tokio::test]
async fn test_pg_create_rejects_level_mismatch() {
    let Some(storage) = storage().await else {
        return;
    };
    let menu = fresh_menu(&storage, "pg level").await;
    let parent = storage
        .create_item(new_item(menu.id, None, "Root"))
        .await
        .unwrap();

    let mut bad = new_item(menu.id, Some(&parent), "Deep");
    bad.level = 3;
    let result = storage.create_item(bad).await;
    assert!(matches!(result, Err(MenuError::Validation(_))));

    let parent = storage.find_item(parent.id).await.unwrap().unwrap();
    assert!(!parent.has_children, "failed insert must not flag parent");
}

#[tokio::test]
async fn test_pg_create_rejects_missing_menu() {
    let Some(storage) = storage().await else {
        return;
    };
    let result = storage.create_item(new_item(i32::MAX, None, "Orphan")).await;
    assert!(matches!(result, Err(MenuError::Validation(_))));
}

#[tokio::test]
async fn test_pg_delete_removes_subtree_and_recounts() {
    let Some(storage) = storage().await else {
        return;
    };
    let menu = fresh_menu(&storage, "pg subtree").await;
    let root = storage
        .create_item(new_item(menu.id, None, "Root"))
        .await
        .unwrap();
    let mid = storage
        .create_item(new_item(menu.id, Some(&root), "Mid"))
        .await
        .unwrap();
    let leaf = storage
        .create_item(new_item(menu.id, Some(&mid), "Leaf"))
        .await
        .unwrap();
    let deepest = storage
        .create_item(new_item(menu.id, Some(&leaf), "Deepest"))
        .await
        .unwrap();

    let deleted = storage.delete_item(mid.id).await.unwrap().unwrap();
    let mut removed = deleted.removed.clone();
    removed.sort_unstable();
    assert_eq!(removed, vec![mid.id, leaf.id, deepest.id]);

    let remaining = storage.list_items(menu.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, root.id);
    assert!(!remaining[0].has_children);

    assert!(storage.delete_item(mid.id).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pg_concurrent_parent_and_child_delete() {
    let Some(storage) = storage().await else {
        return;
    };
    let storage = Arc::new(storage);
    let menu = fresh_menu(&storage, "pg concurrent delete").await;
    let top = storage
        .create_item(new_item(menu.id, None, "Top"))
        .await
        .unwrap();

    for round in 0..20 {
        let parent = storage
            .create_item(new_item(menu.id, Some(&top), &format!("Parent {round}")))
            .await
            .unwrap();
        let mut children = Vec::new();
        for n in 0..5 {
            children.push(
                storage
                    .create_item(new_item(menu.id, Some(&parent), &format!("Child {n}")))
                    .await
                    .unwrap(),
            );
        }

        let parent_delete = {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move { storage.delete_item(parent.id).await })
        };
        let child_delete = {
            let storage = Arc::clone(&storage);
            let child_id = children[2].id;
            tokio::spawn(async move { storage.delete_item(child_id).await })
        };

        // Either may find its row already gone, but neither may fail
        assert!(parent_delete.await.unwrap().is_ok(), "round {round}");
        assert!(child_delete.await.unwrap().is_ok(), "round {round}");
    }

    let remaining = storage.list_items(menu.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(!remaining[0].has_children);
}

#[tokio::test]
async fn test_pg_reorder_is_all_or_nothing() {
    let Some(storage) = storage().await else {
        return;
    };
    let menu = fresh_menu(&storage, "pg reorder").await;
    let other = fresh_menu(&storage, "pg reorder other").await;

    let mut ids = Vec::new();
    for title in ["A", "B", "C"] {
        ids.push(
            storage
                .create_item(new_item(menu.id, None, title))
                .await
                .unwrap()
                .id,
        );
    }
    let foreign = storage
        .create_item(new_item(other.id, None, "X"))
        .await
        .unwrap();

    assert!(
        !storage
            .reorder_items(menu.id, &[ids[2], foreign.id])
            .await
            .unwrap()
    );
    let positions: Vec<i32> = storage
        .list_items(menu.id)
        .await
        .unwrap()
        .iter()
        .map(|i| i.order_position)
        .collect();
    assert_eq!(positions, vec![0, 0, 0]);

    assert!(
        storage
            .reorder_items(menu.id, &[ids[2], ids[0], ids[1]])
            .await
            .unwrap()
    );
    let ordered: Vec<i32> = storage
        .list_items(menu.id)
        .await
        .unwrap()
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ordered, vec![ids[2], ids[0], ids[1]]);

    assert!(matches!(
        storage.reorder_items(i32::MAX, &[]).await,
        Err(MenuError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_pg_update_and_menu_cascade() {
    let Some(storage) = storage().await else {
        return;
    };
    let menu = fresh_menu(&storage, "pg cascade").await;
    let root = storage
        .create_item(new_item(menu.id, None, "Root"))
        .await
        .unwrap();

    let updated = storage
        .update_item(
            root.id,
            UpdateMenuItem {
                title: Some("Renamed".to_string()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert!(!updated.is_active);
    assert_eq!(updated.url, root.url);

    let renamed = storage
        .update_menu(
            menu.id,
            MenuChanges {
                name: Some("pg cascade renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.location, MenuLocation::Sidebar);

    assert!(storage.delete_menu(menu.id).await.unwrap());
    assert!(storage.find_item(root.id).await.unwrap().is_none());
    assert!(!storage.delete_menu(menu.id).await.unwrap());
}

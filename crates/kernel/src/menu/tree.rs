//! Tree assembly for menu items.
//!
//! Rows are loaded flat in one query, then grouped by `parent_id` and
//! nested in memory. Each row is reachable from at most one parent, so the
//! recursion visits every node at most once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::MenuItem;

/// A menu item together with its ordered children.
///
/// Serializes as the item's own fields plus a `children` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemNode {
    #[serde(flatten)]
    pub item: MenuItem,
    pub children: Vec<MenuItemNode>,
}

impl MenuItemNode {
    /// Total number of nodes in this subtree, including self.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(MenuItemNode::size).sum::<usize>()
    }
}

/// Build a forest of top-level items from flat rows.
///
/// Sibling groups are ordered by `(order_position, id)` regardless of the
/// input order. Rows whose parent is not among `rows` cannot be reached
/// from a root and are left out.
pub fn build_tree(rows: Vec<MenuItem>) -> Vec<MenuItemNode> {
    let total = rows.len();

    let mut by_parent: HashMap<Option<i32>, Vec<usize>> = HashMap::new();
    for (idx, row) in rows.iter().enumerate() {
        by_parent.entry(row.parent_id).or_default().push(idx);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|&a, &b| rows[a].sibling_cmp(&rows[b]));
    }

    let mut slots: Vec<Option<MenuItem>> = rows.into_iter().map(Some).collect();
    let roots = attach(None, &by_parent, &mut slots);

    let placed: usize = roots.iter().map(MenuItemNode::size).sum();
    if placed < total {
        let orphans: Vec<i32> = slots.iter().flatten().map(|item| item.id).collect();
        warn!(
            orphaned = total - placed,
            ids = ?orphans,
            "menu items with unreachable parents left out of tree"
        );
    }

    roots
}

fn attach(
    parent: Option<i32>,
    by_parent: &HashMap<Option<i32>, Vec<usize>>,
    slots: &mut [Option<MenuItem>],
) -> Vec<MenuItemNode> {
    let Some(indices) = by_parent.get(&parent) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(indices.len());
    for &idx in indices {
        let Some(item) = slots[idx].take() else {
            continue;
        };
        let children = attach(Some(item.id), by_parent, slots);
        nodes.push(MenuItemNode { item, children });
    }
    nodes
}

/// Drop inactive nodes together with their descendants.
pub fn prune_inactive(nodes: Vec<MenuItemNode>) -> Vec<MenuItemNode> {
    nodes
        .into_iter()
        .filter(|node| node.item.is_active)
        .map(|node| MenuItemNode {
            item: node.item,
            children: prune_inactive(node.children),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_TARGET;

    fn row(id: i32, parent_id: Option<i32>, level: i32, order_position: i32) -> MenuItem {
        MenuItem {
            id,
            menu_id: 1,
            parent_id,
            level,
            title: format!("Item {id}"),
            url: format!("/item-{id}"),
            target: DEFAULT_TARGET.to_string(),
            order_position,
            is_active: true,
            has_children: false,
            created: 1000,
            changed: 1000,
        }
    }

    fn ids(nodes: &[MenuItemNode]) -> Vec<i32> {
        nodes.iter().map(|n| n.item.id).collect()
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        assert!(build_tree(Vec::new()).is_empty());
    }

    #[test]
    fn top_level_items_ordered_by_position_then_id() {
        let rows = vec![
            row(1, None, 1, 2),
            row(2, None, 1, 0),
            row(3, None, 1, 2),
            row(4, None, 1, 1),
        ];
        let tree = build_tree(rows);
        assert_eq!(ids(&tree), vec![2, 4, 1, 3]);
        assert!(tree.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn children_attach_to_matching_parent() {
        let rows = vec![
            row(1, None, 1, 0),
            row(2, None, 1, 1),
            row(3, Some(1), 2, 1),
            row(4, Some(1), 2, 0),
            row(5, Some(2), 2, 0),
        ];
        let tree = build_tree(rows);
        assert_eq!(ids(&tree), vec![1, 2]);
        assert_eq!(ids(&tree[0].children), vec![4, 3]);
        assert_eq!(ids(&tree[1].children), vec![5]);
    }

    #[test]
    fn input_order_does_not_matter() {
        let rows = vec![
            row(4, Some(2), 3, 0),
            row(3, Some(1), 2, 0),
            row(2, Some(1), 2, 0),
            row(1, None, 1, 0),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(build_tree(rows), build_tree(reversed));
    }

    #[test]
    fn four_levels_nest_fully() {
        let rows = vec![
            row(1, None, 1, 0),
            row(2, Some(1), 2, 0),
            row(3, Some(2), 3, 0),
            row(4, Some(3), 4, 0),
        ];
        let tree = build_tree(rows);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].size(), 4);
        let leaf = &tree[0].children[0].children[0].children[0];
        assert_eq!(leaf.item.id, 4);
        assert!(leaf.children.is_empty());
    }

    #[test]
    fn orphans_are_left_out() {
        let rows = vec![row(1, None, 1, 0), row(2, Some(99), 2, 0)];
        let tree = build_tree(rows);
        assert_eq!(ids(&tree), vec![1]);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn cycle_without_root_is_unreachable() {
        let rows = vec![row(1, Some(2), 2, 0), row(2, Some(1), 2, 0)];
        assert!(build_tree(rows).is_empty());
    }

    #[test]
    fn building_twice_is_identical() {
        let rows = vec![row(1, None, 1, 0), row(2, Some(1), 2, 0), row(3, None, 1, 0)];
        assert_eq!(build_tree(rows.clone()), build_tree(rows));
    }

    #[test]
    fn serializes_flattened_with_children() {
        let tree = build_tree(vec![row(1, None, 1, 0), row(2, Some(1), 2, 0)]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["id"], 1);
        assert_eq!(json[0]["title"], "Item 1");
        assert_eq!(json[0]["children"][0]["id"], 2);
        assert_eq!(json[0]["children"][0]["children"], serde_json::json!([]));
    }

    #[test]
    fn prune_drops_inactive_subtrees() {
        let mut hidden = row(2, Some(1), 2, 0);
        hidden.is_active = false;
        let rows = vec![
            row(1, None, 1, 0),
            hidden,
            row(3, Some(2), 3, 0),
            row(4, Some(1), 2, 1),
        ];
        let pruned = prune_inactive(build_tree(rows));
        assert_eq!(ids(&pruned), vec![1]);
        assert_eq!(ids(&pruned[0].children), vec![4]);
    }
}

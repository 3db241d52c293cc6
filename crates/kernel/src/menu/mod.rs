//! Navigation menu hierarchy.
//!
//! Menus own a flat, self-referential table of items. This module provides:
//! - Validation and orchestration of menu/item writes ([`MenuService`])
//! - Assembly of flat rows into nested trees ([`tree`])
//! - The domain error taxonomy ([`MenuError`])

mod error;
mod service;
pub mod tree;

pub use error::{MenuError, MenuResult};
pub use service::{MenuService, Navigation};
pub use tree::{MenuItemNode, build_tree, prune_inactive};

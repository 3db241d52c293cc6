//! Database models.

pub mod menu_item;
pub mod navigation_menu;

pub use menu_item::{
    CreateMenuItem, DEFAULT_TARGET, DeletedItem, MenuItem, NewMenuItem, UpdateMenuItem,
};
pub use navigation_menu::{
    CreateMenu, MenuChanges, MenuLocation, NavigationMenu, NewMenu, UnknownLocation, UpdateMenu,
};

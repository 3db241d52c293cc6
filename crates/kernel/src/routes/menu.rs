//! Menu API routes.
//!
//! REST endpoints for navigation menus and their items. Reads are public;
//! writes require an [`AdminSession`]. Every response uses the
//! `{success, data?, error?}` envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiResponse, AppError, AppResult};
use crate::menu::{MenuItemNode, Navigation};
use crate::models::{
    CreateMenu, CreateMenuItem, MenuItem, MenuLocation, NavigationMenu, UpdateMenu, UpdateMenuItem,
};
use crate::session::AdminSession;
use crate::state::AppState;

/// Create the menu router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Menu routes
        .route("/menus", get(list_menus).post(create_menu))
        .route(
            "/menus/{id}",
            get(get_menu).put(update_menu).delete(delete_menu),
        )
        .route("/menus/{id}/items", get(list_items))
        .route("/menus/{id}/items/hierarchical", get(list_items_hierarchical))
        .route("/menus/{id}/reorder", put(reorder_items))
        .route("/menus/location/{location}", get(navigation_for_location))
        // Item routes
        .route("/menus/items", post(create_item))
        .route(
            "/menus/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
}

// -------------------------------------------------------------------------
// Request/response types
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    #[serde(rename = "itemIds")]
    item_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    deleted: Vec<i32>,
}

type Envelope<T> = Json<ApiResponse<T>>;

/// Parse a numeric path id, reporting bad input in the envelope.
fn parse_id(raw: &str, what: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid {what} id '{raw}'")))
}

/// Unwrap a JSON body, reporting malformed input in the envelope.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// -------------------------------------------------------------------------
// Menu handlers
// -------------------------------------------------------------------------

async fn list_menus(State(state): State<AppState>) -> AppResult<Envelope<Vec<NavigationMenu>>> {
    let menus = state.menus().list_menus().await?;
    Ok(ApiResponse::ok(menus))
}

async fn get_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Envelope<NavigationMenu>> {
    let id = parse_id(&id, "menu")?;
    let menu = state.menus().get_menu(id).await?;
    Ok(ApiResponse::ok(menu))
}

async fn create_menu(
    State(state): State<AppState>,
    admin: AdminSession,
    payload: Result<Json<CreateMenu>, JsonRejection>,
) -> AppResult<(StatusCode, Envelope<NavigationMenu>)> {
    let menu = state.menus().create_menu(body(payload)?).await?;
    info!(user = %admin.username, menu_id = menu.id, "admin created menu");
    Ok((StatusCode::CREATED, ApiResponse::ok(menu)))
}

async fn update_menu(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMenu>, JsonRejection>,
) -> AppResult<Envelope<NavigationMenu>> {
    let id = parse_id(&id, "menu")?;
    let menu = state
        .menus()
        .update_menu(id, body(payload)?)
        .await?
        .ok_or_else(|| AppError::NotFound("menu not found".to_string()))?;
    Ok(ApiResponse::ok(menu))
}

async fn delete_menu(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<String>,
) -> AppResult<Envelope<()>> {
    let id = parse_id(&id, "menu")?;
    state.menus().delete_menu(id).await?;
    info!(user = %admin.username, menu_id = id, "admin deleted menu");
    Ok(ApiResponse::done())
}

async fn list_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Envelope<Vec<MenuItem>>> {
    let id = parse_id(&id, "menu")?;
    let items = state.menus().items_flat(id).await?;
    Ok(ApiResponse::ok(items))
}

async fn list_items_hierarchical(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Envelope<Vec<MenuItemNode>>> {
    let id = parse_id(&id, "menu")?;
    let tree = state.menus().items_hierarchical(id).await?;
    Ok(ApiResponse::ok(tree))
}

async fn reorder_items(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Envelope<()>)> {
    let id = parse_id(&id, "menu")?;
    let request = body(payload)?;

    if state.menus().reorder_items(id, &request.item_ids).await? {
        Ok((StatusCode::OK, ApiResponse::done()))
    } else {
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiResponse::failure("failed to reorder menu items"),
        ))
    }
}

async fn navigation_for_location(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> AppResult<Envelope<Navigation>> {
    let location: MenuLocation = location
        .parse()
        .map_err(|e: crate::models::UnknownLocation| AppError::BadRequest(e.to_string()))?;
    let navigation = state
        .menus()
        .navigation_for(location)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no active menu at {location}")))?;
    Ok(ApiResponse::ok(navigation))
}

// -------------------------------------------------------------------------
// Item handlers
// -------------------------------------------------------------------------

async fn create_item(
    State(state): State<AppState>,
    admin: AdminSession,
    payload: Result<Json<CreateMenuItem>, JsonRejection>,
) -> AppResult<(StatusCode, Envelope<MenuItem>)> {
    let item = state.menus().create_item(body(payload)?).await?;
    info!(user = %admin.username, item_id = item.id, "admin created menu item");
    Ok((StatusCode::CREATED, ApiResponse::ok(item)))
}

async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Envelope<MenuItem>> {
    let id = parse_id(&id, "menu item")?;
    let item = state.menus().get_item(id).await?;
    Ok(ApiResponse::ok(item))
}

async fn update_item(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMenuItem>, JsonRejection>,
) -> AppResult<Envelope<MenuItem>> {
    let id = parse_id(&id, "menu item")?;
    let item = state
        .menus()
        .update_item(id, body(payload)?)
        .await?
        .ok_or_else(|| AppError::NotFound("menu item not found".to_string()))?;
    Ok(ApiResponse::ok(item))
}

async fn delete_item(
    State(state): State<AppState>,
    admin: AdminSession,
    Path(id): Path<String>,
) -> AppResult<Envelope<DeletedResponse>> {
    let id = parse_id(&id, "menu item")?;
    let deleted = state.menus().delete_item(id).await?;
    info!(
        user = %admin.username,
        item_id = id,
        removed = deleted.removed.len(),
        "admin deleted menu item"
    );
    Ok(ApiResponse::ok(DeletedResponse {
        deleted: deleted.removed,
    }))
}

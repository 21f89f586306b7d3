use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;

use nerostack_application::{AccessWindowListQuery, CreateAccessWindowInput};
use nerostack_core::UserIdentity;
use nerostack_domain::{AccessWindowChanges, AccessWindowId, DocumentId, UserId};

use crate::dto::{
    AccessDashboardResponse, AccessDecisionResponse, AccessWindowResponse,
    CreateAccessWindowRequest, UpdateAccessWindowRequest, page_limit,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod self_service;
mod windows;

pub use self_service::{
    access_dashboard_handler, check_access_handler, my_access_windows_handler,
};
pub use windows::{
    create_access_window_handler, delete_access_window_handler, get_access_window_handler,
    list_access_windows_handler, revoke_access_window_handler, update_access_window_handler,
};

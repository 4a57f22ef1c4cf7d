//! User management API handlers
//!
//! Thin wrappers over `UserService`; authorization happens in the service.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::dto::{UpdateUserRequest, UserDto};
use crate::application::identity::UserService;
use crate::domain::Actor;
use crate::interfaces::http::common::{ApiResponse, EmptyData, ValidatedJson};
use crate::interfaces::http::error::{domain_error, ApiResult};

#[derive(Clone)]
pub struct UserHandlerState {
    pub user_service: Arc<UserService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = ApiResponse<Vec<UserDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Vec<UserDto>> {
    let users = state
        .user_service
        .list_users(&actor)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success_with_message(
        users.into_iter().map(UserDto::from).collect(),
        "Users retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiResponse<UserDto>),
        (status = 403, description = "Not your profile"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> ApiResult<UserDto> {
    let user = state
        .user_service
        .get_user(&actor, id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(user.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not your profile, or role change by a non-admin"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserDto> {
    let patch = request.into_patch().map_err(domain_error)?;
    let user = state
        .user_service
        .update_user(&actor, id, patch)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success_with_message(
        user.into(),
        "User updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<EmptyData>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "User has active bookings")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> ApiResult<EmptyData> {
    state
        .user_service
        .delete_user(&actor, id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success_with_message(
        EmptyData {},
        "User deleted successfully",
    )))
}

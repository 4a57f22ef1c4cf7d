//! Vehicle Directory API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleDto};
use crate::application::VehicleService;
use crate::domain::Actor;
use crate::interfaces::http::common::{ApiResponse, EmptyData, ValidatedJson};
use crate::interfaces::http::error::{domain_error, ApiError, ApiResult};

#[derive(Clone)]
pub struct VehicleHandlerState {
    pub vehicle_service: Arc<VehicleService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles",
    tag = "Vehicles",
    responses(
        (status = 200, description = "All vehicles", body = ApiResponse<Vec<VehicleDto>>)
    )
)]
pub async fn list_vehicles(State(state): State<VehicleHandlerState>) -> ApiResult<Vec<VehicleDto>> {
    let vehicles = state
        .vehicle_service
        .list_vehicles()
        .await
        .map_err(domain_error)?;

    let message = if vehicles.is_empty() {
        "No vehicles found"
    } else {
        "Vehicles retrieved successfully"
    };
    Ok(Json(ApiResponse::success_with_message(
        vehicles.into_iter().map(VehicleDto::from).collect(),
        message,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/vehicles/{id}",
    tag = "Vehicles",
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle details", body = ApiResponse<VehicleDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_vehicle(
    State(state): State<VehicleHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<VehicleDto> {
    let vehicle = state
        .vehicle_service
        .get_vehicle(id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success_with_message(
        vehicle.into(),
        "Vehicle retrieved successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/vehicles",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "Vehicle created", body = ApiResponse<VehicleDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Duplicate registration number")
    )
)]
pub async fn create_vehicle(
    State(state): State<VehicleHandlerState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(request): ValidatedJson<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleDto>>), ApiError> {
    let new_vehicle = request.into_new_vehicle().map_err(domain_error)?;
    let vehicle = state
        .vehicle_service
        .create_vehicle(&actor, new_vehicle)
        .await
        .map_err(domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehicle created successfully",
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/vehicles/{id}",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Vehicle ID")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = ApiResponse<VehicleDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Duplicate registration number or availability change")
    )
)]
pub async fn update_vehicle(
    State(state): State<VehicleHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateVehicleRequest>,
) -> ApiResult<VehicleDto> {
    let patch = request.into_patch().map_err(domain_error)?;
    let vehicle = state
        .vehicle_service
        .update_vehicle(&actor, id, patch)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success_with_message(
        vehicle.into(),
        "Vehicle updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/vehicles/{id}",
    tag = "Vehicles",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle deleted", body = ApiResponse<EmptyData>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Vehicle has active bookings")
    )
)]
pub async fn delete_vehicle(
    State(state): State<VehicleHandlerState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i32>,
) -> ApiResult<EmptyData> {
    state
        .vehicle_service
        .delete_vehicle(&actor, id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success_with_message(
        EmptyData {},
        "Vehicle deleted successfully",
    )))
}

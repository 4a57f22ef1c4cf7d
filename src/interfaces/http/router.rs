//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, EmptyData};
use super::middleware::{auth_middleware, AuthState};
use super::modules::{auth, bookings, health, metrics, request_id, users, vehicles};
use crate::application::{BookingService, UserService, VehicleService};
use crate::infrastructure::crypto::JwtConfig;

/// Application services shared by the handlers.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub vehicles: Arc<VehicleService>,
    pub bookings: Arc<BookingService>,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT from /api/v1/auth/signin"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::signup,
        auth::signin,
        // Users
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        // Vehicles
        vehicles::list_vehicles,
        vehicles::get_vehicle,
        vehicles::create_vehicle,
        vehicles::update_vehicle,
        vehicles::delete_vehicle,
        // Bookings
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::update_booking,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            EmptyData,
            // Auth
            auth::SignupRequest,
            auth::SigninRequest,
            auth::SigninResponse,
            // Users
            users::UserDto,
            users::UpdateUserRequest,
            // Vehicles
            vehicles::VehicleDto,
            vehicles::CreateVehicleRequest,
            vehicles::UpdateVehicleRequest,
            // Bookings
            bookings::CreateBookingRequest,
            bookings::UpdateBookingRequest,
            bookings::BookingDto,
            bookings::CreatedBookingDto,
            bookings::BookingListItem,
            bookings::TransitionedBookingDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Authentication", description = "Sign-up and sign-in (JWT)"),
        (name = "Users", description = "User directory"),
        (name = "Vehicles", description = "Vehicle directory"),
        (name = "Bookings", description = "Booking ledger: reserve, cancel, return"),
    ),
    info(
        title = "Vehicle Rental API",
        version = "1.0.0",
        description = "REST API for vehicle rental bookings",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes.
///
/// `db` is pinged by `/health` when present; `prometheus` enables
/// `/metrics`.
pub fn create_api_router(
    services: AppServices,
    jwt_config: JwtConfig,
    db: Option<DatabaseConnection>,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    let middleware_state = AuthState { jwt_config };

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .with_state(auth::AuthHandlerState {
            user_service: services.users.clone(),
        });

    // User routes (protected)
    let user_routes = Router::new()
        .route("/", get(users::list_users))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(users::UserHandlerState {
            user_service: services.users.clone(),
        });

    // Vehicle routes: reads are public, mutations need a token
    let vehicle_state = vehicles::VehicleHandlerState {
        vehicle_service: services.vehicles.clone(),
    };
    let vehicle_public_routes = Router::new()
        .route("/", get(vehicles::list_vehicles))
        .route("/{id}", get(vehicles::get_vehicle))
        .with_state(vehicle_state.clone());
    let vehicle_protected_routes = Router::new()
        .route("/", post(vehicles::create_vehicle))
        .route(
            "/{id}",
            put(vehicles::update_vehicle).delete(vehicles::delete_vehicle),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(vehicle_state);

    // Booking routes (protected)
    let booking_routes = Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/{id}",
            get(bookings::get_booking).put(bookings::update_booking),
        )
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(bookings::BookingHandlerState {
            booking_service: services.bookings,
        });

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db,
            started_at: Arc::new(Instant::now()),
        });

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/users", user_routes)
        .nest(
            "/api/v1/vehicles",
            vehicle_public_routes.merge(vehicle_protected_routes),
        )
        .nest("/api/v1/bookings", booking_routes);

    if let Some(handle) = prometheus {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics::prometheus_metrics))
                .with_state(metrics::MetricsState { handle }),
        );
    }

    router
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/v1/auth/signup",
            "/api/v1/auth/signin",
            "/api/v1/users/{id}",
            "/api/v1/vehicles",
            "/api/v1/vehicles/{id}",
            "/api/v1/bookings",
            "/api/v1/bookings/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}

// HTTP handlers for order endpoints

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::discounts::DiscountResult;
use crate::error::ApiError;
use crate::orders::{CreateOrderRequest, OrderDetails, UpdateStatusRequest};
use crate::response::ApiResponse;
use crate::AppState;

/// Handler for POST /api/v1/orders
/// Places an order for the authenticated customer
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed with discounts applied", body = OrderDetails),
        (status = 400, description = "Insufficient stock"),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Field validation failed")
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<ApiResponse<OrderDetails>, ApiError> {
    let order = state.order_service.create_order(user.user_id, request).await?;
    Ok(ApiResponse::created(order, "Order created successfully"))
}

/// Handler for GET /api/v1/orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "The caller's orders, newest first", body = [OrderDetails]),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<ApiResponse<Vec<OrderDetails>>, ApiError> {
    let orders = state.order_service.list_orders(user.user_id).await?;
    Ok(ApiResponse::ok(orders))
}

/// Handler for GET /api/v1/orders/{id}
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items, products and categories", body = OrderDetails),
        (status = 403, description = "Order belongs to another customer"),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<ApiResponse<OrderDetails>, ApiError> {
    let order = state
        .order_service
        .get_order_details(user.user_id, order_id)
        .await?;
    Ok(ApiResponse::ok(order))
}

/// Handler for PATCH /api/v1/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderDetails),
        (status = 403, description = "Order belongs to another customer"),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Unknown status")
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<ApiResponse<OrderDetails>, ApiError> {
    let status = request.parse_status()?;

    let order = state
        .order_service
        .update_status(user.user_id, order_id, status)
        .await?;
    Ok(ApiResponse::ok(order).with_message("Order status updated successfully"))
}

/// Handler for GET /api/v1/orders/{id}/discounts
/// Recomputes the breakdown against the current rules without saving it
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/discounts",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Discount breakdown", body = DiscountResult),
        (status = 403, description = "Order belongs to another customer"),
        (status = 404, description = "Order not found")
    ),
    tag = "orders"
)]
pub async fn order_discounts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<ApiResponse<DiscountResult>, ApiError> {
    let result = state
        .order_service
        .calculate_discounts(user.user_id, order_id)
        .await?;
    Ok(ApiResponse::ok(result))
}

// HTTP handlers for discount rule management

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::ValidationErrors;

use crate::auth::AuthenticatedUser;
use crate::discounts::{DiscountRule, DiscountRuleRequest, DiscountType, MetricsSummary};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::validation::field_error;
use crate::AppState;

/// Optional filters for GET /api/v1/discounts
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DiscountListQuery {
    /// Only rules of this type
    #[serde(rename = "type")]
    pub discount_type: Option<DiscountType>,
    /// Only category-scoped rules for this category
    pub category_id: Option<i64>,
}

/// Handler for GET /api/v1/discounts
/// Lists active rules, optionally filtered by type and category
#[utoipa::path(
    get,
    path = "/api/v1/discounts",
    params(DiscountListQuery),
    responses(
        (status = 200, description = "Active discount rules in the response envelope", body = [DiscountRule]),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "discounts"
)]
pub async fn list_discounts(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<DiscountListQuery>,
) -> Result<ApiResponse<Vec<DiscountRule>>, ApiError> {
    let mut rules = match query.category_id {
        Some(category_id) => state.rule_store.list_active_rules_for_category(category_id).await?,
        None => match query.discount_type {
            Some(discount_type) => state.rule_store.list_rules_by_type(discount_type).await?,
            None => state.rule_store.list_active_rules().await?.as_ref().clone(),
        },
    };

    if let (Some(_), Some(discount_type)) = (query.category_id, query.discount_type) {
        rules.retain(|rule| rule.discount_type == discount_type);
    }

    tracing::debug!("Listing {} discount rules", rules.len());
    Ok(ApiResponse::ok(rules))
}

/// Handler for GET /api/v1/discounts/{id}
#[utoipa::path(
    get,
    path = "/api/v1/discounts/{id}",
    params(("id" = i64, Path, description = "Discount rule id")),
    responses(
        (status = 200, description = "Discount rule", body = DiscountRule),
        (status = 404, description = "Rule missing or deleted")
    ),
    tag = "discounts"
)]
pub async fn get_discount(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<DiscountRule>, ApiError> {
    let rule = state.rule_store.find_rule(id).await?;
    Ok(ApiResponse::ok(rule))
}

/// Handler for POST /api/v1/discounts
#[utoipa::path(
    post,
    path = "/api/v1/discounts",
    request_body = DiscountRuleRequest,
    responses(
        (status = 201, description = "Discount rule created", body = DiscountRule),
        (status = 422, description = "Field validation failed")
    ),
    tag = "discounts"
)]
pub async fn create_discount(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<DiscountRuleRequest>,
) -> Result<ApiResponse<DiscountRule>, ApiError> {
    validate_request(&state, &request).await?;

    let rule = state.rule_store.create_rule(&request).await?;
    Ok(ApiResponse::created(rule, "Discount created successfully"))
}

/// Handler for PUT /api/v1/discounts/{id}
/// Replaces every field of the rule
#[utoipa::path(
    put,
    path = "/api/v1/discounts/{id}",
    params(("id" = i64, Path, description = "Discount rule id")),
    request_body = DiscountRuleRequest,
    responses(
        (status = 200, description = "Discount rule updated", body = DiscountRule),
        (status = 404, description = "Rule missing or deleted"),
        (status = 422, description = "Field validation failed")
    ),
    tag = "discounts"
)]
pub async fn update_discount(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<DiscountRuleRequest>,
) -> Result<ApiResponse<DiscountRule>, ApiError> {
    validate_request(&state, &request).await?;

    let rule = state.rule_store.update_rule(id, &request).await?;
    Ok(ApiResponse::ok(rule).with_message("Discount updated successfully"))
}

/// Handler for DELETE /api/v1/discounts/{id}
/// Soft-deletes the rule; it stays in the table but is never applied again
#[utoipa::path(
    delete,
    path = "/api/v1/discounts/{id}",
    params(("id" = i64, Path, description = "Discount rule id")),
    responses(
        (status = 200, description = "Discount rule deleted"),
        (status = 404, description = "Rule missing or already deleted")
    ),
    tag = "discounts"
)]
pub async fn delete_discount(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, ApiError> {
    state.rule_store.delete_rule(id).await?;
    Ok(ApiResponse::message("Discount deleted successfully"))
}

/// Handler for GET /api/v1/discounts/metrics
#[utoipa::path(
    get,
    path = "/api/v1/discounts/metrics",
    responses(
        (status = 200, description = "Discount engine and order workflow metrics", body = MetricsSummary)
    ),
    tag = "discounts"
)]
pub async fn discount_metrics(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResponse<MetricsSummary> {
    ApiResponse::ok(state.metrics.summary())
}

/// Field validation plus the category existence check for category-scoped rules
async fn validate_request(state: &AppState, request: &DiscountRuleRequest) -> Result<(), ApiError> {
    request.validate_rule()?;

    if let Some(category_id) = request.category_id {
        if !state.catalog.category_exists(category_id).await? {
            let mut errors = ValidationErrors::new();
            errors.add(
                "category_id",
                field_error("exists", "The selected category does not exist"),
            );
            return Err(ApiError::ValidationError(errors));
        }
    }

    Ok(())
}

pub mod auth;
pub mod catalog;
pub mod config;
pub mod customers;
pub mod db;
pub mod discounts;
pub mod error;
pub mod orders;
pub mod response;
pub mod validation;

use axum::{
    extract::FromRef,
    routing::{get, patch},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::TokenService;
use catalog::CatalogRepository;
use config::AppConfig;
use discounts::{DiscountMetrics, DiscountRepository, RuleStore};
use orders::OrderService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        orders::handlers::create_order,
        orders::handlers::list_orders,
        orders::handlers::get_order,
        orders::handlers::update_order_status,
        orders::handlers::order_discounts,
        discounts::handlers::list_discounts,
        discounts::handlers::get_discount,
        discounts::handlers::create_discount,
        discounts::handlers::update_discount,
        discounts::handlers::delete_discount,
        discounts::handlers::discount_metrics,
    ),
    components(schemas(
        orders::OrderStatus,
        orders::OrderItemRequest,
        orders::CreateOrderRequest,
        orders::UpdateStatusRequest,
        orders::CategorySummary,
        orders::ProductSummary,
        orders::OrderItemResponse,
        orders::OrderDetails,
        discounts::DiscountType,
        discounts::DiscountRule,
        discounts::DiscountRuleRequest,
        discounts::AppliedDiscount,
        discounts::DiscountResult,
        discounts::MetricsSummary,
    )),
    tags(
        (name = "orders", description = "Order placement and history"),
        (name = "discounts", description = "Discount rule management")
    ),
    info(
        title = "Order & Discount API",
        version = "1.0.0",
        description = "Order placement with an automatic, stackable discount engine"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: TokenService,
    pub catalog: CatalogRepository,
    pub rule_store: RuleStore,
    pub metrics: DiscountMetrics,
    pub order_service: OrderService,
}

impl AppState {
    pub fn new(db: PgPool, config: &AppConfig) -> Self {
        let metrics = DiscountMetrics::new();
        let rule_store = RuleStore::new(
            DiscountRepository::new(db.clone()),
            config.rule_cache_ttl,
            metrics.clone(),
        );

        Self {
            tokens: TokenService::new(config.jwt_secret.clone()),
            catalog: CatalogRepository::new(db.clone()),
            order_service: OrderService::new(db.clone(), rule_store.clone(), metrics.clone()),
            rule_store,
            metrics,
            db,
        }
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Build the application router with every route, CORS, request tracing and Swagger UI
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/orders",
            get(orders::handlers::list_orders).post(orders::handlers::create_order),
        )
        .route("/orders/:id", get(orders::handlers::get_order))
        .route("/orders/:id/status", patch(orders::handlers::update_order_status))
        .route("/orders/:id/discounts", get(orders::handlers::order_discounts))
        .route(
            "/discounts",
            get(discounts::handlers::list_discounts).post(discounts::handlers::create_discount),
        )
        .route("/discounts/metrics", get(discounts::handlers::discount_metrics))
        .route(
            "/discounts/:id",
            get(discounts::handlers::get_discount)
                .put(discounts::handlers::update_discount)
                .delete(discounts::handlers::delete_discount),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

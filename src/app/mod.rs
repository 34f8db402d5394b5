//! 应用层：路由与共享状态

pub mod categories;
pub mod products;
pub mod summary;

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::core::{error::CoreError, middleware::request_logging_middleware};
use crate::infrastructure::storage::KeyValueStore;
use products::service::ProductStore;

/// 服务端使用的存储类型
pub type DynStore = Box<dyn KeyValueStore>;

/// 应用状态：唯一的状态容器，所有请求串行访问
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<ProductStore<DynStore>>>,
}

impl AppState {
    pub fn new(store: ProductStore<DynStore>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, ProductStore<DynStore>>, CoreError> {
        self.store
            .lock()
            .map_err(|_| CoreError::InternalServerError("状态锁已损坏".to_string()))
    }
}

/// 创建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health_check))
        .route(
            "/products",
            get(products::handler::list_products).post(products::handler::create_product),
        )
        .route(
            "/products/:id",
            patch(products::handler::update_product).delete(products::handler::delete_product),
        )
        .route(
            "/categories",
            get(categories::handler::list_categories).post(categories::handler::create_category),
        )
        .route("/reset", post(products::handler::reset_data))
        .route("/summary", get(summary::handler::get_summary))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(middleware::from_fn(request_logging_middleware)),
        )
        .with_state(state)
}

/// API 信息
async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "revenue-board",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "产品录入与分类营收占比统计",
        "endpoints": {
            "GET /products": "获取产品表格",
            "POST /products": "新增一行",
            "PATCH /products/:id": "更新字段 (name, qty, price, category)",
            "DELETE /products/:id": "删除一行",
            "GET /categories": "获取分类",
            "POST /categories": "添加分类 {label}",
            "POST /reset": "清空数据 {confirm: true}",
            "GET /summary": "获取分类汇总"
        },
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// 健康检查
async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, CoreError> {
    let store = state.lock()?;
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "products_count": store.products().len(),
        "categories_count": store.categories().len()
    })))
}

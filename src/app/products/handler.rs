//! 产品处理器：可编辑表格的增删改与重置

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::model::{Product, ProductId, ProductPatch};
use crate::app::AppState;
use crate::core::{confirm::Answer, error::CoreError, response::ApiResponse};
use crate::infrastructure::storage::Outcome;

/// 表格中的一行
#[derive(Debug, Serialize)]
pub struct ProductRow {
    /// 从 1 开始的序号
    pub index: usize,
    pub id: ProductId,
    pub name: String,
    pub qty: f64,
    pub price: f64,
    pub line_total: f64,
    pub category: Option<String>,
}

impl ProductRow {
    fn new(index: usize, product: &Product) -> Self {
        Self {
            index,
            id: product.id.clone(),
            name: product.name.clone(),
            qty: product.qty,
            price: product.price,
            line_total: product.line_total(),
            category: product.category.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct ResetResult {
    pub reset: bool,
}

/// 保存失败时在提示信息中注明，状态本身已经更新
pub(crate) fn message_for<T>(outcome: &Outcome<T>, done: &str) -> String {
    match &outcome.storage_error {
        None => done.to_string(),
        Some(e) => format!("{}，但保存失败: {}", done, e),
    }
}

fn row_for(products: &[Product], id: &ProductId) -> Option<ProductRow> {
    products
        .iter()
        .position(|p| &p.id == id)
        .map(|i| ProductRow::new(i + 1, &products[i]))
}

/// 获取产品表格
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductRow>>>, CoreError> {
    let store = state.lock()?;
    let rows: Vec<ProductRow> = store
        .products()
        .iter()
        .enumerate()
        .map(|(i, p)| ProductRow::new(i + 1, p))
        .collect();
    let message = format!("获取到 {} 个产品", rows.len());
    Ok(Json(ApiResponse::success(rows, message)))
}

/// 新增一行
pub async fn create_product(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ProductRow>>), CoreError> {
    let mut store = state.lock()?;
    let outcome = store.add();
    let message = message_for(&outcome, "产品创建成功");
    let index = store.products().len();
    let row = ProductRow::new(index, &outcome.value);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(row, message))))
}

/// 更新字段
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<ProductRow>>, CoreError> {
    let Json(patch) = payload?;
    let id = ProductId::from(id);
    let mut store = state.lock()?;
    let outcome = store.update(&id, patch);
    if outcome.value.is_none() {
        return Err(CoreError::NotFound(format!("产品 {} 不存在", id)));
    }
    let message = message_for(&outcome, "产品更新成功");
    let row = row_for(store.products(), &id)
        .ok_or_else(|| CoreError::InternalServerError(format!("产品 {} 更新后丢失", id)))?;
    Ok(Json(ApiResponse::success(row, message)))
}

/// 删除一行
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, CoreError> {
    let id = ProductId::from(id);
    let mut store = state.lock()?;
    let outcome = store.remove(&id);
    if !outcome.value {
        return Err(CoreError::NotFound(format!("产品 {} 不存在", id)));
    }
    Ok(Json(ApiResponse::success((), message_for(&outcome, "产品删除成功"))))
}

/// 清空所有数据，请求中必须带上确认标志
pub async fn reset_data(
    State(state): State<AppState>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ResetResult>>, CoreError> {
    let Json(payload) = payload?;
    let mut store = state.lock()?;
    let outcome = store.reset(&Answer(payload.confirm));
    let message = if outcome.value {
        message_for(&outcome, "数据已重置")
    } else {
        "未确认，已取消重置".to_string()
    };
    Ok(Json(ApiResponse::success(
        ResetResult {
            reset: outcome.value,
        },
        message,
    )))
}

//! 分类处理器

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::app::products::handler::message_for;
use crate::app::AppState;
use crate::core::{error::CoreError, response::ApiResponse};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryAdded {
    pub added: bool,
    pub categories: Vec<String>,
}

/// 获取所有分类
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<String>>>, CoreError> {
    let store = state.lock()?;
    let categories = store.categories().as_slice().to_vec();
    let message = format!("获取到 {} 个分类", categories.len());
    Ok(Json(ApiResponse::success(categories, message)))
}

/// 添加分类，空白或重复名称直接忽略
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CategoryAdded>>, CoreError> {
    let Json(payload) = payload?;
    let mut store = state.lock()?;
    let outcome = store.add_category(&payload.label);
    let message = if outcome.value {
        message_for(&outcome, "分类添加成功")
    } else {
        "分类未变化".to_string()
    };
    let data = CategoryAdded {
        added: outcome.value,
        categories: store.categories().as_slice().to_vec(),
    };
    Ok(Json(ApiResponse::success(data, message)))
}

//! 汇总处理器

use axum::{extract::State, response::Json};

use super::model::SummaryView;
use crate::app::AppState;
use crate::core::{error::CoreError, response::ApiResponse};

/// 获取汇总面板
pub async fn get_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SummaryView>>, CoreError> {
    let summary = state.lock()?.summary();
    let view = SummaryView::from(&summary);
    let message = format!("共 {} 个分类", view.rows.len());
    Ok(Json(ApiResponse::success(view, message)))
}

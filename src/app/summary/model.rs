//! 汇总数据模型

use serde::Serialize;

/// 汇总面板无数据时的占位文本
pub const EMPTY_PLACEHOLDER: &str = "暂无数据";

/// 单个分类的汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub subtotal: f64,
    pub share_percent: f64,
}

/// 汇总结果，完全由产品列表推导，不单独保存
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: f64,
    pub rows: Vec<CategoryShare>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 汇总面板中的一行
#[derive(Debug, Clone, Serialize)]
pub struct ShareRowView {
    pub category: String,
    pub subtotal: f64,
    pub share_percent: f64,
    /// 保留两位小数的百分比，例如 `90.91%`
    pub share_display: String,
    /// 比例条宽度（0..=100）
    pub bar_width: f64,
}

/// 汇总面板
#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub total: f64,
    pub total_display: String,
    pub rows: Vec<ShareRowView>,
    pub placeholder: Option<&'static str>,
}

impl From<&Summary> for SummaryView {
    fn from(summary: &Summary) -> Self {
        let rows = summary
            .rows
            .iter()
            .map(|row| ShareRowView {
                category: row.category.clone(),
                subtotal: row.subtotal,
                share_percent: row.share_percent,
                share_display: format!("{:.2}%", row.share_percent),
                bar_width: row.share_percent.clamp(0.0, 100.0),
            })
            .collect();

        Self {
            total: summary.total,
            total_display: format!("{:.2}", summary.total),
            rows,
            placeholder: summary.is_empty().then_some(EMPTY_PLACEHOLDER),
        }
    }
}

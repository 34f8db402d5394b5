//! 分类营收汇总

use std::collections::HashMap;

use super::model::{CategoryShare, Summary};
use crate::app::products::model::{finite_or_zero, Product};

/// 计算总营收与各分类的小计、占比
///
/// 纯函数，每次都对完整列表重新计算。结果按小计降序排列，
/// 小计相同时按分类名升序。累加溢出为无穷大的总额或小计按 0 计。
pub fn aggregate(products: &[Product]) -> Summary {
    let mut total = 0.0;
    let mut subtotals: HashMap<&str, f64> = HashMap::new();

    for product in products {
        let line_total = product.line_total();
        total = finite_or_zero(total + line_total);

        if let Some(category) = product.category.as_deref() {
            let subtotal = subtotals.entry(category).or_insert(0.0);
            *subtotal = finite_or_zero(*subtotal + line_total);
        }
    }

    let mut rows: Vec<CategoryShare> = subtotals
        .into_iter()
        .map(|(category, subtotal)| CategoryShare {
            category: category.to_string(),
            subtotal,
            share_percent: share_of(subtotal, total),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.subtotal
            .total_cmp(&a.subtotal)
            .then_with(|| a.category.cmp(&b.category))
    });

    Summary { total, rows }
}

fn share_of(subtotal: f64, total: f64) -> f64 {
    if total > 0.0 && total.is_finite() && subtotal.is_finite() {
        subtotal / total * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::products::model::ProductId;

    fn product(qty: f64, price: f64, category: Option<&str>) -> Product {
        Product {
            id: ProductId::generate(),
            name: String::new(),
            qty,
            price,
            category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_list() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total, 0.0);
        assert!(summary.rows.is_empty());
    }

    #[test]
    fn test_two_categories() {
        let summary = aggregate(&[
            product(10.0, 200.0, Some("A")),
            product(20.0, 10.0, Some("B")),
        ]);
        assert_eq!(summary.total, 2200.0);
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].category, "A");
        assert_eq!(summary.rows[0].subtotal, 2000.0);
        assert!((summary.rows[0].share_percent - 90.909_090).abs() < 1e-3);
        assert_eq!(summary.rows[1].category, "B");
        assert_eq!(summary.rows[1].subtotal, 200.0);
        assert!((summary.rows[1].share_percent - 9.090_909).abs() < 1e-3);
    }

    #[test]
    fn test_uncategorized_counts_towards_total_only() {
        let summary = aggregate(&[product(1.0, 50.0, Some("A")), product(1.0, 50.0, None)]);
        assert_eq!(summary.total, 100.0);
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].share_percent, 50.0);
    }

    #[test]
    fn test_zero_total_keeps_rows() {
        let summary = aggregate(&[product(0.0, 5.0, Some("A")), product(3.0, 0.0, Some("B"))]);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.rows.len(), 2);
        for row in &summary.rows {
            assert_eq!(row.subtotal, 0.0);
            assert_eq!(row.share_percent, 0.0);
        }
    }

    #[test]
    fn test_ties_ordered_by_label() {
        let summary = aggregate(&[
            product(1.0, 10.0, Some("Zeta")),
            product(1.0, 10.0, Some("Alpha")),
            product(1.0, 30.0, Some("Mid")),
        ]);
        let labels: Vec<&str> = summary.rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(labels, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_huge_values_stay_finite() {
        let summary = aggregate(&[
            product(1e200, 1e200, Some("A")),
            product(2.0, 50.0, Some("B")),
        ]);
        assert_eq!(summary.total, 100.0);
        assert_eq!(summary.rows[0].category, "B");
        assert_eq!(summary.rows[0].share_percent, 100.0);
        assert_eq!(summary.rows[1].subtotal, 0.0);
        assert_eq!(summary.rows[1].share_percent, 0.0);

        // 多个有限值相加溢出
        let summary = aggregate(&[
            product(1e154, 1e154, Some("A")),
            product(1e154, 1e154, Some("A")),
        ]);
        assert!(summary.total.is_finite());
        for row in &summary.rows {
            assert!(row.subtotal.is_finite());
            assert!(row.share_percent.is_finite());
        }
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["total"].is_number());
    }

    #[test]
    fn test_same_category_accumulates() {
        let summary = aggregate(&[
            product(2.0, 5.0, Some("A")),
            product(3.0, 5.0, Some("A")),
            product(1.0, 1.0, Some("B")),
        ]);
        assert_eq!(summary.rows[0].subtotal, 25.0);
        let shares: f64 = summary.rows.iter().map(|r| r.share_percent).sum();
        assert!((shares - 100.0).abs() < 1e-9);
    }
}

//! 产品数据模型

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// 产品标识，生成后在记录的生命周期内保持不变
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 产品记录
///
/// 持久化格式为 `{id, name, qty, price, category}`，未设置分类时写入空字符串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_number")]
    pub qty: f64,
    #[serde(default, deserialize_with = "de_number")]
    pub price: f64,
    #[serde(
        default,
        serialize_with = "ser_category",
        deserialize_with = "de_category"
    )]
    pub category: Option<String>,
}

impl Product {
    /// 新建空白记录：空名称、数量和单价为零
    pub fn blank(category: Option<String>) -> Self {
        Self {
            id: ProductId::generate(),
            name: String::new(),
            qty: 0.0,
            price: 0.0,
            category,
        }
    }

    /// 数量 × 单价，溢出为无穷大时按 0 计
    pub fn line_total(&self) -> f64 {
        finite_or_zero(self.qty * self.price)
    }

    /// 合并补丁中的字段
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(qty) = patch.qty {
            self.qty = qty;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }
}

/// 产品字段补丁
///
/// `category` 为 `Some(None)` 表示清除分类。数值字段接受任意 JSON 值并强制转换。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub qty: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_category")]
    pub category: Option<Option<String>>,
}

impl ProductPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn qty(mut self, qty: f64) -> Self {
        self.qty = Some(sanitize(qty));
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(sanitize(price));
        self
    }

    pub fn category(mut self, category: Option<&str>) -> Self {
        self.category = Some(normalize_category(category.map(str::to_string)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.qty.is_none() && self.price.is_none() && self.category.is_none()
    }
}

/// 把输入值转换为非负数，无法识别的输入视为 0
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    sanitize(n)
}

fn sanitize(n: f64) -> f64 {
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}

pub(crate) fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

fn normalize_category(category: Option<String>) -> Option<String> {
    category.filter(|c| !c.is_empty())
}

fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(coerce_number(&value)))
}

fn de_category<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let category = Option::<String>::deserialize(deserializer)?;
    Ok(normalize_category(category))
}

fn de_opt_category<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let category = Option::<String>::deserialize(deserializer)?;
    Ok(Some(normalize_category(category)))
}

fn ser_category<S>(category: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(category.as_deref().unwrap_or(""))
}

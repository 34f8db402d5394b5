//! 分类数据模型

use serde::{Deserialize, Serialize};

/// 重置后的默认分类
pub const DEFAULT_CATEGORIES: [&str; 2] = ["Category A", "Category B"];

/// 有序、不重复、只增不减的分类集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CategorySet {
    labels: Vec<String>,
}

impl CategorySet {
    pub fn empty() -> Self {
        Self { labels: Vec::new() }
    }

    pub fn defaults() -> Self {
        DEFAULT_CATEGORIES.iter().copied().collect()
    }

    /// 添加分类，返回是否真正添加
    ///
    /// 去掉首尾空白后为空或已存在（区分大小写）时不做任何修改。
    pub fn add(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || self.contains(label) {
            return false;
        }
        self.labels.push(label.to_string());
        true
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn first(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl<S: AsRef<str>> FromIterator<S> for CategorySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::empty();
        for label in iter {
            set.add(label.as_ref());
        }
        set
    }
}

// 持久化数据可能被手工改过，读入时同样去重、去空
impl From<Vec<String>> for CategorySet {
    fn from(labels: Vec<String>) -> Self {
        labels.into_iter().collect()
    }
}

impl From<CategorySet> for Vec<String> {
    fn from(set: CategorySet) -> Self {
        set.labels
    }
}

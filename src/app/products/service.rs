//! 产品业务服务：产品列表与分类集合的状态容器

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::model::{Product, ProductId, ProductPatch};
use crate::app::categories::model::CategorySet;
use crate::app::summary::{model::Summary, service::aggregate};
use crate::config::StorageConfig;
use crate::core::confirm::Confirm;
use crate::infrastructure::storage::{self, KeyValueStore, Outcome, StorageError};

/// 重置前的确认提示
pub const RESET_PROMPT: &str = "确定要清空所有产品并恢复默认分类吗？";

/// 产品与分类各自使用的存储键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub products: String,
    pub categories: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            products: "products".to_string(),
            categories: "categories".to_string(),
        }
    }
}

impl From<&StorageConfig> for StorageKeys {
    fn from(config: &StorageConfig) -> Self {
        Self {
            products: config.products_key.clone(),
            categories: config.categories_key.clone(),
        }
    }
}

/// 完整状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub products: Vec<Product>,
    pub categories: CategorySet,
}

impl Snapshot {
    /// 重置后的状态：没有产品，两个默认分类
    pub fn initial() -> Self {
        Self {
            products: Vec::new(),
            categories: CategorySet::defaults(),
        }
    }

    /// 首次启动时的示例数据
    pub fn sample() -> Self {
        let categories = CategorySet::defaults();
        let products = categories
            .iter()
            .zip([(10.0, 200.0), (20.0, 10.0)])
            .enumerate()
            .map(|(i, (category, (qty, price)))| Product {
                id: ProductId::generate(),
                name: format!("Sample product {}", i + 1),
                qty,
                price,
                category: Some(category.to_string()),
            })
            .collect();

        Self {
            products,
            categories,
        }
    }
}

/// 产品状态容器
///
/// 持有产品列表与分类集合，每次实际发生的修改都会把完整快照写回存储。
/// 写入失败不会回滚内存状态，错误通过 [`Outcome`] 返回。
pub struct ProductStore<S> {
    products: Vec<Product>,
    categories: CategorySet,
    storage: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> ProductStore<S> {
    /// 从存储中恢复状态
    ///
    /// 产品和分类分别回退：缺失或损坏的一份使用 `first_run` 中对应的部分。
    /// 回退的产品若引用了已加载分类集合中不存在的分类，则清除其分类。
    pub fn open(storage: S, keys: StorageKeys, first_run: Snapshot) -> Outcome<Self> {
        let Snapshot {
            products: default_products,
            categories: default_categories,
        } = first_run;

        let products = storage::load(&storage, &keys.products, None::<Vec<Product>>);
        let categories = storage::load(&storage, &keys.categories, default_categories);

        for (key, error) in [
            (&keys.products, &products.storage_error),
            (&keys.categories, &categories.storage_error),
        ] {
            if let Some(e) = error {
                warn!(key = %key, error = %e, "持久化数据不可用，使用默认数据");
            }
        }
        let storage_error = products.storage_error.or(categories.storage_error);

        let categories = categories.value;
        let products = match products.value {
            Some(loaded) => dedup_ids(loaded),
            None => detach_unknown_categories(default_products, &categories),
        };

        let mut store = Self {
            products,
            categories,
            storage,
            keys,
        };
        info!(
            products = store.products.len(),
            categories = store.categories.len(),
            "状态已加载"
        );

        if storage_error.is_some() {
            // 把回退后的状态写回，下次启动不再重复解析失败
            if let Err(e) = store.persist() {
                warn!(error = %e, "回写默认数据失败");
            }
        }

        Outcome {
            value: store,
            storage_error,
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            products: self.products.clone(),
            categories: self.categories.clone(),
        }
    }

    pub fn summary(&self) -> Summary {
        aggregate(&self.products)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 追加一条空白记录，分类默认取第一个分类
    pub fn add(&mut self) -> Outcome<Product> {
        let product = Product::blank(self.categories.first().map(str::to_string));
        debug!(id = %product.id, "新增产品");
        self.products.push(product.clone());
        self.commit(product)
    }

    /// 删除记录，不存在时不做任何修改
    pub fn remove(&mut self, id: &ProductId) -> Outcome<bool> {
        let before = self.products.len();
        self.products.retain(|p| &p.id != id);
        if self.products.len() == before {
            return Outcome::clean(false);
        }
        debug!(%id, "删除产品");
        self.commit(true)
    }

    /// 合并字段补丁，不存在时不做任何修改
    pub fn update(&mut self, id: &ProductId, patch: ProductPatch) -> Outcome<Option<Product>> {
        let Some(product) = self.products.iter_mut().find(|p| &p.id == id) else {
            return Outcome::clean(None);
        };
        product.apply(patch);
        let updated = product.clone();
        self.commit(Some(updated))
    }

    /// 添加分类，空白或重复的名称会被忽略
    pub fn add_category(&mut self, label: &str) -> Outcome<bool> {
        if !self.categories.add(label) {
            return Outcome::clean(false);
        }
        debug!(label = label.trim(), "新增分类");
        self.commit(true)
    }

    /// 清空产品并恢复默认分类，需要先得到确认
    pub fn reset<C: Confirm + ?Sized>(&mut self, confirm: &C) -> Outcome<bool> {
        if !confirm.confirm(RESET_PROMPT) {
            debug!("重置已取消");
            return Outcome::clean(false);
        }
        let Snapshot {
            products,
            categories,
        } = Snapshot::initial();
        self.products = products;
        self.categories = categories;
        info!("数据已重置");
        self.commit(true)
    }

    fn commit<T>(&mut self, value: T) -> Outcome<T> {
        let result = self.persist();
        if let Err(e) = &result {
            warn!(error = %e, "保存数据失败");
        }
        Outcome::new(value, result)
    }

    /// 两个键都会尝试写入，返回第一个错误
    fn persist(&mut self) -> Result<(), StorageError> {
        let products = storage::save(&mut self.storage, &self.keys.products, &self.products);
        let categories = storage::save(&mut self.storage, &self.keys.categories, &self.categories);
        products.and(categories)
    }
}

fn detach_unknown_categories(mut products: Vec<Product>, categories: &CategorySet) -> Vec<Product> {
    for product in &mut products {
        if product
            .category
            .as_deref()
            .is_some_and(|c| !categories.contains(c))
        {
            product.category = None;
        }
    }
    products
}

fn dedup_ids(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|p| {
            let fresh = seen.insert(p.id.clone());
            if !fresh {
                warn!(id = %p.id, "忽略重复的产品标识");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::confirm::Answer;
    use crate::infrastructure::storage::MemoryStore;

    fn empty_store() -> ProductStore<MemoryStore> {
        ProductStore::open(MemoryStore::new(), StorageKeys::default(), Snapshot::initial())
            .into_value()
    }

    #[test]
    fn test_add_uses_first_category() {
        let mut store = empty_store();
        let product = store.add().into_value();
        assert_eq!(product.name, "");
        assert_eq!(product.qty, 0.0);
        assert_eq!(product.price, 0.0);
        assert_eq!(product.category.as_deref(), Some("Category A"));
        assert_eq!(store.products().len(), 1);
    }

    #[test]
    fn test_add_without_categories() {
        let mut store = ProductStore::open(
            MemoryStore::new(),
            StorageKeys::default(),
            Snapshot {
                products: Vec::new(),
                categories: CategorySet::empty(),
            },
        )
        .into_value();
        let product = store.add().into_value();
        assert!(product.category.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = empty_store();
        let ids: HashSet<_> = (0..50).map(|_| store.add().into_value().id).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = empty_store();
        store.add().into_value();
        let before = store.snapshot();

        let removed = store.remove(&ProductId::from("missing"));
        assert!(removed.is_clean());
        assert!(!removed.value);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = empty_store();
        let id = store.add().into_value().id;

        let updated = store
            .update(&id, ProductPatch::default().name("Pen").qty(4.0))
            .into_value()
            .unwrap();
        assert_eq!(updated.name, "Pen");
        assert_eq!(updated.qty, 4.0);
        assert_eq!(updated.price, 0.0);
        assert_eq!(store.get(&id), Some(&updated));

        assert!(store
            .update(&ProductId::from("missing"), ProductPatch::default().qty(1.0))
            .into_value()
            .is_none());
    }

    #[test]
    fn test_mutations_persist_snapshot() {
        let mut store = empty_store();
        let id = store.add().into_value().id;
        store
            .update(&id, ProductPatch::default().qty(2.0).price(3.0))
            .into_value();
        store.add_category("Tools").into_value();

        let products: Vec<Product> =
            storage::load(store.storage(), "products", Vec::new()).into_value();
        assert_eq!(products, store.products());

        let categories: Vec<String> =
            storage::load(store.storage(), "categories", Vec::new()).into_value();
        assert_eq!(categories, vec!["Category A", "Category B", "Tools"]);
    }

    #[test]
    fn test_noop_mutations_do_not_write() {
        let mut store = empty_store();
        assert!(!store.add_category("  ").into_value());
        assert!(!store.remove(&ProductId::from("x")).into_value());
        assert!(!store.reset(&Answer(false)).into_value());
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let mut store = empty_store();
        store.add().into_value();
        store.add_category("Extra").into_value();
        let before = store.snapshot();

        let refused = store.reset(&|prompt: &str| {
            assert_eq!(prompt, RESET_PROMPT);
            false
        });
        assert!(!refused.value);
        assert_eq!(store.snapshot(), before);

        assert!(store.reset(&Answer(true)).into_value());
        assert_eq!(store.snapshot(), Snapshot::initial());
    }

    #[test]
    fn test_write_failure_keeps_state() {
        let mut store = ProductStore::open(
            MemoryStore::new().with_quota(40),
            StorageKeys::default(),
            Snapshot::initial(),
        )
        .into_value();

        let outcome = store.add();
        assert!(matches!(
            outcome.storage_error,
            Some(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(store.products().len(), 1);
    }

    #[test]
    fn test_open_falls_back_per_key() {
        let mut backing = MemoryStore::new();
        backing.set("products", "[oops".to_string()).unwrap();
        backing.set("categories", r#"["Kept"]"#.to_string()).unwrap();

        let opened = ProductStore::open(backing, StorageKeys::default(), Snapshot::sample());
        assert!(matches!(opened.storage_error, Some(StorageError::Json(_))));

        let store = opened.value;
        assert_eq!(store.products().len(), 2);
        assert_eq!(store.categories().as_slice(), &["Kept".to_string()]);
        // 示例产品的分类不在已加载的集合里
        assert!(store.products().iter().all(|p| p.category.is_none()));
        assert_eq!(store.summary().total, 2200.0);
        assert!(store.summary().rows.is_empty());
    }

    #[test]
    fn test_open_keeps_sample_categories_when_known() {
        let mut backing = MemoryStore::new();
        backing
            .set("categories", r#"["Category B","Other"]"#.to_string())
            .unwrap();

        let store =
            ProductStore::open(backing, StorageKeys::default(), Snapshot::sample()).into_value();
        let categories: Vec<Option<&str>> = store
            .products()
            .iter()
            .map(|p| p.category.as_deref())
            .collect();
        assert_eq!(categories, vec![None, Some("Category B")]);
    }

    #[test]
    fn test_open_drops_duplicate_ids() {
        let mut backing = MemoryStore::new();
        backing
            .set(
                "products",
                r#"[{"id":"a","name":"x","qty":1,"price":1,"category":""},
                    {"id":"a","name":"y","qty":2,"price":2,"category":""}]"#
                    .to_string(),
            )
            .unwrap();

        let store =
            ProductStore::open(backing, StorageKeys::default(), Snapshot::initial()).into_value();
        assert_eq!(store.products().len(), 1);
        assert_eq!(store.products()[0].name, "x");
    }

    #[test]
    fn test_sample_snapshot() {
        let sample = Snapshot::sample();
        let summary = aggregate(&sample.products);
        assert_eq!(summary.total, 2200.0);
        assert_eq!(summary.rows[0].category, "Category A");
    }
}

use serde_json::{Map, Value};
use std::ops::Range;

use super::loose::is_truthy;

/// Legacy manifests carry their entries under `data.components`
pub const LEGACY_LIST_KEY: &str = "components";
pub const LIST_KEY: &str = "list";

/// Requested page window. Non-positive or absent values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    pub const DEFAULT_PAGE: u64 = 1;
    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: positive_or(page, Self::DEFAULT_PAGE),
            page_size: positive_or(page_size, Self::DEFAULT_PAGE_SIZE),
        }
    }

    /// Index range of this page within a list of `len` items, clamped to the list
    pub fn window(&self, len: usize) -> Range<usize> {
        let offset = (self.page - 1).saturating_mul(self.page_size);
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
        let size = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        start..start.saturating_add(size).min(len)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

fn positive_or(value: Option<i64>, default: u64) -> u64 {
    value
        .and_then(|v| u64::try_from(v).ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn data_mut(doc: &mut Value) -> Option<&mut Map<String, Value>> {
    doc.get_mut("data").and_then(Value::as_object_mut)
}

/// Rename a truthy `data.components` to `data.list`. Returns whether a rename happened.
///
/// A second call finds no `components` key and leaves the document untouched.
/// Falsy values (`null`, `false`, `0`, `""`) stay where they are.
pub fn normalize_shape(doc: &mut Value) -> bool {
    let Some(data) = data_mut(doc) else {
        return false;
    };
    if !data.get(LEGACY_LIST_KEY).is_some_and(is_truthy) {
        return false;
    }

    match data.remove(LEGACY_LIST_KEY) {
        Some(components) => {
            data.insert(LIST_KEY.to_string(), components);
            true
        }
        None => false,
    }
}

/// Slice `data.list` to the requested page and record `page`, `pageSize`, `total`.
///
/// `total` keeps a truthy upstream value, otherwise it is the unsliced length.
/// Documents without a list array are left as they are. Returns whether the
/// document was paginated.
pub fn paginate(doc: &mut Value, pagination: Pagination) -> bool {
    let Some(data) = data_mut(doc) else {
        return false;
    };
    let Some(Value::Array(items)) = data.get_mut(LIST_KEY) else {
        return false;
    };

    let full_len = items.len();
    let window = pagination.window(full_len);
    let page_items: Vec<Value> = items.drain(window).collect();
    *items = page_items;

    let total = match data.get("total") {
        Some(total) if is_truthy(total) => total.clone(),
        _ => Value::from(full_len),
    };

    data.insert("page".to_string(), Value::from(pagination.page));
    data.insert("pageSize".to_string(), Value::from(pagination.page_size));
    data.insert("total".to_string(), total);
    true
}

/// Shape fix followed by pagination, the full list-endpoint transform
pub fn normalize_and_paginate(doc: &mut Value, pagination: Pagination) -> bool {
    normalize_shape(doc);
    paginate(doc, pagination)
}

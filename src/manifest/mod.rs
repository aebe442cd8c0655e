//! Manifest handling: component registry, shape normalization, pagination and
//! component lookup
//!
//! Upstream manifests look like `{code, msg, time, data}` where `data` holds the
//! entries either as `components` (legacy) or `list`, optionally with `total`.
//! Everything here is a pure transform over [`serde_json::Value`].

mod lookup;
mod loose;
mod normalize;
mod registry;

pub use lookup::{find_component, first_match};
pub use loose::{is_truthy, loose_int};
pub use normalize::{Pagination, normalize_and_paginate, normalize_shape, paginate};
pub use registry::{ComponentRegistry, RegistryError, TypeCode};

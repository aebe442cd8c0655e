use std::collections::BTreeMap;
use thiserror::Error;

/// Client-facing component type code (1..N)
pub type TypeCode = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("component registry is empty")]
    Empty,

    #[error("component type code '{0}' is not a positive integer")]
    InvalidCode(String),

    #[error("manifest path for type {code} must start with '/': {path}")]
    InvalidPath { code: TypeCode, path: String },
}

/// Immutable mapping from component type code to upstream manifest path
///
/// Iteration is in ascending code order, which is also the search order for
/// component-detail lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRegistry {
    manifests: BTreeMap<TypeCode, String>,
}

impl ComponentRegistry {
    pub fn from_entries<I, P>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (TypeCode, P)>,
        P: Into<String>,
    {
        let mut manifests = BTreeMap::new();
        for (code, path) in entries {
            let path = path.into();
            if code == 0 {
                return Err(RegistryError::InvalidCode(code.to_string()));
            }
            if !path.starts_with('/') {
                return Err(RegistryError::InvalidPath { code, path });
            }
            manifests.insert(code, path);
        }

        if manifests.is_empty() {
            return Err(RegistryError::Empty);
        }

        Ok(Self { manifests })
    }

    /// Build from the `[components]` config table, whose keys arrive as strings
    pub fn from_config(table: &BTreeMap<String, String>) -> Result<Self, RegistryError> {
        let entries = table
            .iter()
            .map(|(key, path)| {
                key.trim()
                    .parse::<TypeCode>()
                    .map(|code| (code, path.clone()))
                    .map_err(|_| RegistryError::InvalidCode(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_entries(entries)
    }

    pub fn manifest_path(&self, code: TypeCode) -> Option<&str> {
        self.manifests.get(&code).map(String::as_str)
    }

    /// Look up a code supplied by a client, which may be any integer
    pub fn resolve(&self, code: i64) -> Option<(TypeCode, &str)> {
        let code = TypeCode::try_from(code).ok()?;
        self.manifest_path(code).map(|path| (code, path))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeCode, &str)> {
        self.manifests.iter().map(|(code, path)| (*code, path.as_str()))
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ComponentRegistry {
        ComponentRegistry::from_entries([
            (3, "/components/dxvk_manifest"),
            (1, "/components/box64_manifest"),
            (2, "/components/drivers_manifest"),
        ])
        .unwrap()
    }

    #[test]
    fn test_iterates_in_code_order() {
        let codes: Vec<TypeCode> = sample().iter().map(|(code, _)| code).collect();
        assert_eq!(codes, vec![1, 2, 3]);
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let registry = sample();
        assert_eq!(registry.resolve(2), Some((2, "/components/drivers_manifest")));
        assert_eq!(registry.resolve(99), None);
        assert_eq!(registry.resolve(0), None);
        assert_eq!(registry.resolve(-1), None);
        assert_eq!(registry.resolve(i64::MAX), None);
    }

    #[test]
    fn test_rejects_bad_entries() {
        assert_eq!(
            ComponentRegistry::from_entries(Vec::<(TypeCode, String)>::new()),
            Err(RegistryError::Empty)
        );
        assert!(matches!(
            ComponentRegistry::from_entries([(0, "/x")]),
            Err(RegistryError::InvalidCode(_))
        ));
        assert!(matches!(
            ComponentRegistry::from_entries([(1, "components/x")]),
            Err(RegistryError::InvalidPath { code: 1, .. })
        ));
    }

    #[test]
    fn test_from_config_table() {
        let mut table = BTreeMap::new();
        table.insert("10".to_string(), "/components/ten".to_string());
        table.insert("2".to_string(), "/components/two".to_string());

        let registry = ComponentRegistry::from_config(&table).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.iter().next(), Some((2, "/components/two")));

        table.insert("box64".to_string(), "/components/box64".to_string());
        assert_eq!(
            ComponentRegistry::from_config(&table),
            Err(RegistryError::InvalidCode("box64".to_string()))
        );
    }
}

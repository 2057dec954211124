//! Cache key encoding.

use std::collections::HashMap;
use std::fmt;

/// A key that can address a cache entry.
///
/// Keys are compared by their encoded string only: two keys of different
/// types that render the same string address the same entry. Every
/// `Display` type is a key through its rendered text.
pub trait CashKey {
    /// Canonical string form.
    fn cash_key(&self) -> String;
}

impl<T> CashKey for T
where
    T: fmt::Display + ?Sized,
{
    fn cash_key(&self) -> String {
        self.to_string()
    }
}

/// Key built from named parameters.
///
/// Renders as `name1=value1;name2=value2` with names sorted, so keys built
/// in a different insertion order encode identically.
///
/// ```
/// use cash::{CashKey, MapCashKey};
///
/// let key = MapCashKey::new()
///     .with("spaceId", "sid")
///     .with("networkId", "nid");
/// assert_eq!(key.cash_key(), "networkId=nid;spaceId=sid");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapCashKey(HashMap<String, String>);

impl MapCashKey {
    /// Create an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any previous value for `name`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a parameter in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl CashKey for MapCashKey {
    fn cash_key(&self) -> String {
        let mut params: Vec<(&String, &String)> = self.0.iter().collect();
        params.sort_unstable_by(|a, b| a.0.cmp(b.0));
        params
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl From<HashMap<String, String>> for MapCashKey {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

impl<K, V> FromIterator<(K, V)> for MapCashKey
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

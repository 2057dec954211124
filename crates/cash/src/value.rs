//! Value encoding and output slots.
//!
//! A cached value is anything implementing [`CashValue`]. Types that know
//! their own byte form implement it by hand; every serde type gets it for
//! free through a JSON encoding. Which path a type takes is fixed at compile
//! time by which impl applies.
//!
//! The generic path covers primitives, strings, records, collections and any
//! nesting of those reachable through ownership. Cyclic graphs and resources
//! such as sockets or file handles are not supported.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::CashError;

/// Error produced while converting a value to or from bytes.
pub type ValueError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A value that can live in the cache.
///
/// `cash_decode(&v.cash_encode()?)` must produce a value equal to `v`.
///
/// # Example
///
/// ```
/// use cash::{CashValue, ValueError};
///
/// struct Counter(u64);
///
/// impl CashValue for Counter {
///     fn cash_encode(&self) -> Result<Vec<u8>, ValueError> {
///         Ok(self.0.to_be_bytes().to_vec())
///     }
///
///     fn cash_decode(bytes: &[u8]) -> Result<Self, ValueError> {
///         let raw: [u8; 8] = bytes.try_into()?;
///         Ok(Counter(u64::from_be_bytes(raw)))
///     }
/// }
/// ```
pub trait CashValue: Sized {
    /// Serialize to bytes.
    fn cash_encode(&self) -> Result<Vec<u8>, ValueError>;

    /// Build a fresh value from bytes.
    fn cash_decode(bytes: &[u8]) -> Result<Self, ValueError>;
}

impl<T> CashValue for T
where
    T: Serialize + DeserializeOwned,
{
    fn cash_encode(&self) -> Result<Vec<u8>, ValueError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn cash_decode(bytes: &[u8]) -> Result<Self, ValueError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Where an operation writes the value it produced.
///
/// `&mut V` is always writable. `Option<&mut V>` lets callers that may not
/// have a destination pass `None`, which is rejected with
/// [`CashError::Shape`] before any tier is touched.
pub trait OutputSlot<'a, V> {
    /// Resolve to a writable location.
    fn into_slot(self) -> Result<&'a mut V, CashError>;
}

impl<'a, V> OutputSlot<'a, V> for &'a mut V {
    fn into_slot(self) -> Result<&'a mut V, CashError> {
        Ok(self)
    }
}

impl<'a, V> OutputSlot<'a, V> for Option<&'a mut V> {
    fn into_slot(self) -> Result<&'a mut V, CashError> {
        self.ok_or(CashError::Shape("no output location was provided"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: String,
        tags: Vec<String>,
        nested: Option<Box<Record>>,
        scores: BTreeMap<String, i64>,
    }

    struct Raw(Vec<u8>);

    impl CashValue for Raw {
        fn cash_encode(&self) -> Result<Vec<u8>, ValueError> {
            Ok(self.0.clone())
        }

        fn cash_decode(bytes: &[u8]) -> Result<Self, ValueError> {
            Ok(Raw(bytes.to_vec()))
        }
    }

    fn roundtrip<V: CashValue>(value: &V) -> V {
        V::cash_decode(&value.cash_encode().unwrap()).unwrap()
    }

    #[test]
    fn test_primitives_roundtrip() {
        assert_eq!(roundtrip(&"hi".to_string()), "hi");
        assert_eq!(roundtrip(&1_i64), 1);
        assert!(roundtrip(&true));
        assert_eq!(roundtrip(&1.0_f64), 1.0);
    }

    #[test]
    fn test_nested_record_roundtrip() {
        let record = Record {
            id: "outer".into(),
            tags: vec!["a".into(), "b".into()],
            nested: Some(Box::new(Record {
                id: "inner".into(),
                tags: vec![],
                nested: None,
                scores: BTreeMap::new(),
            })),
            scores: [("x".to_string(), 3)].into_iter().collect(),
        };
        assert_eq!(roundtrip(&record), record);
    }

    #[test]
    fn test_pointers_encode_as_pointee() {
        let value = "shared".to_string();
        let boxed = Box::new(value.clone()).cash_encode().unwrap();
        let arced = Arc::new(value.clone()).cash_encode().unwrap();
        assert_eq!(boxed, value.cash_encode().unwrap());
        assert_eq!(arced, boxed);
        assert_eq!(String::cash_decode(&boxed).unwrap(), value);
        assert_eq!(*Box::<String>::cash_decode(&boxed).unwrap(), value);
    }

    #[test]
    fn test_self_describing_bypasses_json() {
        let raw = Raw(vec![0xff, 0x00]);
        assert_eq!(raw.cash_encode().unwrap(), vec![0xff, 0x00]);
        assert_eq!(roundtrip(&raw).0, vec![0xff, 0x00]);
    }

    #[test]
    fn test_decode_shape_mismatch_is_error() {
        let bytes = "text".to_string().cash_encode().unwrap();
        assert!(i64::cash_decode(&bytes).is_err());
        assert!(Record::cash_decode(b"{\"id\":1}").is_err());
    }

    #[test]
    fn test_output_slots() {
        let mut target = 0_u32;
        *(&mut target).into_slot().unwrap() = 7;
        assert_eq!(target, 7);

        *Some(&mut target).into_slot().unwrap() = 9;
        assert_eq!(target, 9);

        let missing: Option<&mut u32> = None;
        assert!(matches!(missing.into_slot(), Err(CashError::Shape(_))));
    }

    proptest! {
        #[test]
        fn prop_strings_and_maps_roundtrip(
            s in "\\PC*",
            map in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..16),
        ) {
            prop_assert_eq!(roundtrip(&s), s);
            prop_assert_eq!(roundtrip(&map), map);
        }
    }
}

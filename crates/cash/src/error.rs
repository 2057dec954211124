//! Error types for cash operations.

use std::fmt;

use cash_backends_core::BackendError;

use crate::codec::CodecError;
use crate::value::ValueError;

/// Result type alias using [`CashError`].
pub type CashResult<T> = Result<T, CashError>;

/// Everything a cash operation can report.
#[derive(Debug, thiserror::Error)]
pub enum CashError {
    /// No tier holds the key. A control-flow signal, not a failure.
    #[error("cash: no cache found")]
    NotFound,

    /// A tier's own operation failed.
    #[error("cash: tier {tier}: {source}")]
    Backend {
        tier: String,
        #[source]
        source: BackendError,
    },

    /// A codec stage could not transform its input.
    #[error("cash: {0}")]
    Codec(#[from] CodecError),

    /// The value could not be serialized.
    #[error("cash: encode value: {0}")]
    Encode(#[source] ValueError),

    /// Stored bytes do not match the requested value type.
    #[error("cash: decode value: {0}")]
    Decode(#[source] ValueError),

    /// The caller's output slot cannot be written.
    #[error("cash: output slot is not writable: {0}")]
    Shape(&'static str),

    /// The cache could not be built from its configuration.
    #[error("cash: config: {0}")]
    Config(String),

    /// Several tiers failed independently during a fan-out write.
    #[error("{0}")]
    Multi(#[from] MultiError),
}

impl CashError {
    pub(crate) fn backend(tier: &str, source: BackendError) -> Self {
        Self::Backend {
            tier: tier.to_string(),
            source,
        }
    }

    /// Whether this is the miss signal rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Name of the failing tier, for tier errors.
    pub fn tier(&self) -> Option<&str> {
        match self {
            Self::Backend { tier, .. } => Some(tier),
            _ => None,
        }
    }
}

/// Ordered collection of independent failures from a fan-out operation.
///
/// An empty `MultiError` means every attempt succeeded; use
/// [`MultiError::into_result`] to turn it into `Ok(())` in that case.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<CashError>,
}

impl MultiError {
    /// Create an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure, keeping arrival order.
    pub fn push(&mut self, err: CashError) {
        self.errors.push(err);
    }

    /// Number of collected failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no failure was collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate failures in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, CashError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), MultiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Unwrap into the collected failures.
    pub fn into_inner(self) -> Vec<CashError> {
        self.errors
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl From<CashError> for MultiError {
    fn from(err: CashError) -> Self {
        Self { errors: vec![err] }
    }
}

impl FromIterator<CashError> for MultiError {
    fn from_iter<I: IntoIterator<Item = CashError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<CashError> for MultiError {
    fn extend<I: IntoIterator<Item = CashError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for MultiError {
    type Item = CashError;
    type IntoIter = std::vec::IntoIter<CashError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a CashError;
    type IntoIter = std::slice::Iter<'a, CashError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(tier: &str, msg: &str) -> CashError {
        CashError::backend(tier, BackendError::custom(msg))
    }

    #[test]
    fn test_empty_multi_error_is_success() {
        let err = MultiError::new();
        assert!(err.is_empty());
        assert!(err.into_result().is_ok());
    }

    #[test]
    fn test_multi_error_joins_messages_in_order() {
        let mut err = MultiError::new();
        err.push(custom("a", "first"));
        assert_eq!(err.len(), 1);
        err.push(custom("b", "second"));

        let err = err.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "cash: tier a: first\ncash: tier b: second"
        );
        let tiers: Vec<_> = err.iter().filter_map(CashError::tier).collect();
        assert_eq!(tiers, vec!["a", "b"]);
    }

    #[test]
    fn test_multi_error_collects_and_converts() {
        let err: MultiError = vec![custom("x", "1"), custom("y", "2")].into_iter().collect();
        assert_eq!(err.len(), 2);

        let wrapped = CashError::from(err);
        assert!(matches!(wrapped, CashError::Multi(ref m) if m.len() == 2));
        assert_eq!(wrapped.to_string(), "cash: tier x: 1\ncash: tier y: 2");
    }

    #[test]
    fn test_not_found_message_and_predicate() {
        assert_eq!(CashError::NotFound.to_string(), "cash: no cache found");
        assert!(CashError::NotFound.is_not_found());
        assert!(!custom("t", "m").is_not_found());
        assert_eq!(CashError::NotFound.tier(), None);
    }
}

use std::collections::HashSet;

use crate::error::{InvalidKeyReason, WeatherError, WeatherResult};

/// Checks caller-supplied keys against a static allow-list.
#[derive(Debug, Clone, Default)]
pub struct KeyValidator {
    allowed: HashSet<String>,
}

impl KeyValidator {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: keys.into_iter().map(Into::into).filter(|k| !k.is_empty()).collect(),
        }
    }

    pub fn validate(&self, api_key: Option<&str>) -> WeatherResult<()> {
        let key = match api_key {
            Some(key) if !key.is_empty() => key,
            _ => return Err(WeatherError::InvalidKey(InvalidKeyReason::Missing)),
        };

        if !self.allowed.contains(key) {
            return Err(WeatherError::InvalidKey(InvalidKeyReason::NotRecognized));
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> KeyValidator {
        KeyValidator::new(["valid-key-1", "valid-key-2"])
    }

    fn reason(result: WeatherResult<()>) -> InvalidKeyReason {
        match result {
            Err(WeatherError::InvalidKey(reason)) => reason,
            other => panic!("expected InvalidKey, got {other:?}"),
        }
    }

    #[test]
    fn absent_or_empty_key_is_missing() {
        assert_eq!(reason(validator().validate(None)), InvalidKeyReason::Missing);
        assert_eq!(reason(validator().validate(Some(""))), InvalidKeyReason::Missing);
    }

    #[test]
    fn unknown_key_is_not_recognized() {
        assert_eq!(
            reason(validator().validate(Some("unknown-key"))),
            InvalidKeyReason::NotRecognized
        );
    }

    #[test]
    fn allow_listed_key_passes() {
        assert!(validator().validate(Some("valid-key-1")).is_ok());
        assert!(validator().validate(Some("valid-key-2")).is_ok());
    }

    #[test]
    fn empty_entries_are_not_allow_listed() {
        let v = KeyValidator::new(["", "k"]);
        assert_eq!(v.len(), 1);
        assert_eq!(reason(v.validate(Some(""))), InvalidKeyReason::Missing);
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let v = KeyValidator::default();
        assert!(v.is_empty());
        assert_eq!(reason(v.validate(Some("valid-key-1"))), InvalidKeyReason::NotRecognized);
    }
}

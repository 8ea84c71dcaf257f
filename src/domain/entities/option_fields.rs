use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidateLength;

/// Represents optional field semantics in update requests.
///
/// - `Unchanged` → field not touched
/// - `SetToNull` → explicitly cleared
/// - `SetToValue` → set to provided value
///
/// Deserialising a missing key yields `Unchanged` (via `#[serde(default)]`),
/// `null` yields `SetToNull` and any other value `SetToValue`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum OptionField<T> {
    #[default]
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<'de, T> Deserialize<'de> for OptionField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => OptionField::SetToValue(value),
            None => OptionField::SetToNull,
        })
    }
}

impl<T> ValidateLength<u64> for OptionField<T>
where
    T: ValidateLength<u64>
{
    fn length(&self) -> Option<u64> {
        match self {
            OptionField::SetToValue(value) => value.length(),
            _ => None,
        }
    }
    fn validate_length(&self, min: Option<u64>, max: Option<u64>, equal: Option<u64>) -> bool {
        match self {
            OptionField::SetToValue(value) => value.validate_length(min, max, equal),
            _ => true,
        }
    }
}

impl<T> OptionField<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Resolves the patch against the current value of a required field.
    /// `SetToNull` cannot clear a required field and keeps `current`.
    pub fn or_keep(self, current: T) -> T {
        match self {
            Self::SetToValue(v) => v,
            _ => current,
        }
    }

    /// Resolves the patch against the current value of a nullable field.
    pub fn or_keep_nullable(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unchanged => current,
            Self::SetToNull => None,
            Self::SetToValue(v) => Some(v),
        }
    }
}

impl<T> From<Option<Option<T>>> for OptionField<T> {
    fn from(opt: Option<Option<T>>) -> Self {
        match opt {
            None => OptionField::Unchanged,
            Some(None) => OptionField::SetToNull,
            Some(Some(v)) => OptionField::SetToValue(v),
        }
    }
}

pub type PatchString = OptionField<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Patch {
        url: OptionField<String>,
        name: OptionField<String>,
    }

    #[test]
    fn missing_null_and_value_are_distinguished() {
        let patch: Patch = serde_json::from_str(r#"{"url": null, "name": "x"}"#).unwrap();
        assert_eq!(patch.url, OptionField::SetToNull);
        assert_eq!(patch.name, OptionField::SetToValue("x".to_string()));

        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert!(patch.url.is_unchanged());
    }

    #[test]
    fn resolution_against_current_values() {
        let keep: PatchString = OptionField::Unchanged;
        assert_eq!(keep.or_keep_nullable(Some("a".into())), Some("a".into()));

        let clear: PatchString = OptionField::SetToNull;
        assert_eq!(clear.clone().or_keep_nullable(Some("a".into())), None);
        assert_eq!(clear.or_keep("required".into()), "required");
    }
}

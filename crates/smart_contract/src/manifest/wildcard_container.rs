//! A list of values, or `"*"` standing for every value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Either a wildcard that matches everything or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardContainer<T> {
    Wildcard,
    List(Vec<T>),
}

impl<T> WildcardContainer<T> {
    pub fn create(values: Vec<T>) -> Self {
        Self::List(values)
    }

    pub fn create_wildcard() -> Self {
        Self::Wildcard
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Number of explicit values; a wildcard counts as zero.
    pub fn count(&self) -> usize {
        self.values().len()
    }

    /// The explicit values. Empty for a wildcard.
    pub fn values(&self) -> &[T] {
        match self {
            Self::Wildcard => &[],
            Self::List(values) => values,
        }
    }

    /// Whether `value` is listed or matched by the wildcard.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self {
            Self::Wildcard => true,
            Self::List(values) => values.contains(value),
        }
    }

    /// Whether no value is listed twice.
    pub(crate) fn is_distinct(&self) -> bool
    where
        T: PartialEq,
    {
        let values = self.values();
        values
            .iter()
            .enumerate()
            .all(|(i, value)| !values[..i].contains(value))
    }
}

impl<T> Default for WildcardContainer<T> {
    fn default() -> Self {
        Self::create_wildcard()
    }
}

impl<T: Serialize> Serialize for WildcardContainer<T> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Wildcard => serializer.serialize_str("*"),
            Self::List(values) => values.serialize(serializer),
        }
    }
}

impl<'de, T> Deserialize<'de> for WildcardContainer<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) if s == "*" => Ok(Self::Wildcard),
            Value::Array(_) => {
                let values: Vec<T> =
                    serde_json::from_value(value).map_err(serde::de::Error::custom)?;
                Ok(Self::List(values))
            }
            other => Err(serde::de::Error::custom(format!(
                "expected '*' or an array, found {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_json() {
        let wildcard: WildcardContainer<String> = serde_json::from_str("\"*\"").unwrap();
        assert!(wildcard.is_wildcard());
        assert!(wildcard.contains(&"anything".to_string()));
        assert_eq!(serde_json::to_string(&wildcard).unwrap(), "\"*\"");
        assert!(serde_json::from_str::<WildcardContainer<String>>("\"x\"").is_err());
    }

    #[test]
    fn test_list_json() {
        let list: WildcardContainer<String> = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(list.count(), 2);
        assert!(list.contains(&"a".to_string()));
        assert!(!list.contains(&"c".to_string()));
        assert!(list.is_distinct());
        assert!(!WildcardContainer::create(vec![1, 2, 1]).is_distinct());
    }
}

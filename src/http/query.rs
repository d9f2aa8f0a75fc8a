//! Query string construction that drops empty values.

use serde_json::Value;

/// Ordered list of query pairs. `None`, JSON `null` and empty strings are
/// never added, so optional filters can be pushed unconditionally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key=value` unless the value renders empty.
    #[must_use]
    pub fn push(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.pairs.push((key.to_owned(), value));
        }
        self
    }

    #[must_use]
    pub fn push_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Add a JSON value. Arrays repeat the key once per non-empty element;
    /// nested objects are serialized as JSON text.
    #[must_use]
    pub fn push_value(mut self, key: &str, value: &Value) -> Self {
        match value {
            Value::Null => {}
            Value::String(s) => self = self.push(key, s),
            Value::Bool(_) | Value::Number(_) => self = self.push(key, value),
            Value::Array(items) => {
                for item in items {
                    if !item.is_array() {
                        self = self.push_value(key, item);
                    }
                }
            }
            Value::Object(_) => self = self.push(key, value),
        }
        self
    }

    /// Flatten a JSON object of filters into pairs, in key order.
    #[must_use]
    pub fn from_object(value: &Value) -> Self {
        let mut query = Self::new();
        if let Value::Object(map) = value {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                query = query.push_value(key, &map[key.as_str()]);
            }
        }
        query
    }

    /// Append all pairs of `other`.
    #[must_use]
    pub fn extend(mut self, other: Self) -> Self {
        self.pairs.extend(other.pairs);
        self
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;

//! Shared session state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The key under which the run loop records the name of the currently
/// active agent before every tool batch.
///
/// Tools can read this entry to identify the speaker without receiving
/// the agent object itself.
pub const ACTIVE_AGENT_KEY: &str = "active_agent";

/// An open-ended key/value map of accumulated session state.
///
/// The context is owned jointly by the run loop and the tools: tools
/// return patches, and the run loop shallow-merges each patch into the
/// running context before anything else observes it. The context is
/// never dropped between rounds, and it survives agent handoffs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: Map<String, Value>,
}

impl Context {
    /// Creates an empty context.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the previous value for the key if
    /// there was one.
    #[inline]
    pub fn insert<K: Into<String>, V: Into<Value>>(
        &mut self,
        key: K,
        value: V,
    ) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value for the given key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Shallow-merges `patch` into this context.
    ///
    /// Keys from the patch override existing keys; nested values are
    /// replaced wholesale, not merged. Merging the same patch twice
    /// yields the same context.
    pub fn merge(&mut self, patch: &Context) {
        for (key, value) in &patch.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the context has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl From<Map<String, Value>> for Context {
    #[inline]
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_merge_overrides_in_order() {
        let mut ctx = Context::new();
        ctx.insert("x", 1);
        ctx.insert("kept", "yes");

        let patch: Context =
            [("x".to_owned(), json!(2))].into_iter().collect();
        ctx.merge(&patch);

        assert_eq!(ctx.get("x"), Some(&json!(2)));
        assert_eq!(ctx.get("kept"), Some(&json!("yes")));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let patch: Context = [
            ("a".to_owned(), json!({ "nested": true })),
            ("b".to_owned(), json!([1, 2, 3])),
        ]
        .into_iter()
        .collect();

        let mut once = Context::new();
        once.insert("a", "old");
        once.merge(&patch);
        let mut twice = once.clone();
        twice.merge(&patch);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_serialize_transparent() {
        let mut ctx = Context::new();
        ctx.insert("user_id", 42);
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value, json!({ "user_id": 42 }));
    }
}

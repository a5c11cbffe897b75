use serde::Deserialize;
use serde_json::Value;

/// One line of a mutation-log record. The `kind` tag is a closed set; lines
/// carrying a tag we do not know are kept as `Unknown` so replay can ignore
/// them instead of failing.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum MutationOp {
    /// Establishes the initial state wholesale.
    Init { v: Value },

    /// Replaces the named top-level field.
    Set { k: String, v: Value },

    /// Inserts/removes elements in the named array field at an offset.
    #[serde(rename_all = "camelCase")]
    Splice {
        k: String,
        #[serde(default)]
        start: usize,
        #[serde(default)]
        delete_count: usize,
        #[serde(default)]
        items: Vec<Value>,
    },

    #[serde(other)]
    Unknown,
}

/// The session state a full-snapshot record holds, and the shape a
/// mutation-log replay converges on. Turns stay opaque JSON; only `text`
/// and `timestamp` are probed out of them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct SessionState {
    pub title: Option<String>,
    pub last_activity: Option<i64>,
    pub location: Option<String>,
    pub turns: Vec<Value>,
}

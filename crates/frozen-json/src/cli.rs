//! Core logic of the `frozen-apply` binary.

use serde::Deserialize;
use serde_json::Value;

use crate::config::FreezerOptions;
use crate::error::FrozenError;
use crate::node::Key;
use crate::store::Freezer;
use crate::update::Update;

/// One operation as read from the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct OpRecord {
    pub op: String,
    #[serde(default)]
    pub path: Vec<Value>,
    #[serde(default)]
    pub options: Value,
}

/// Apply a JSON array of [`OpRecord`]s to `doc` and return the result as
/// compact JSON.
pub fn apply_ops(doc: &str, ops: &str) -> Result<String, FrozenError> {
    apply_ops_with(doc, ops, FreezerOptions::default())
}

pub fn apply_ops_with(doc: &str, ops: &str, options: FreezerOptions) -> Result<String, FrozenError> {
    let doc: Value = serde_json::from_str(doc)?;
    let records: Vec<OpRecord> = serde_json::from_str(ops)?;
    let store = Freezer::new(doc, options)?;
    for record in records {
        let path = record
            .path
            .iter()
            .map(|token| {
                Key::from_json(token).ok_or_else(|| {
                    FrozenError::InvalidOptions(format!("invalid path token {token}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let op = Update::from_json(&record.op, record.options)?;
        store.update_at(&path, op)?;
    }
    let delivered = store.scheduler().run_until_idle();
    tracing::debug!(delivered, "flushed pending events");
    Ok(serde_json::to_string(&store.to_json()?)?)
}

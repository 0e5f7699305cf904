//! Meta store: typed key/value fields embedded in the document

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc, Value, ROOT};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{EngineError, EngineResult};
use crate::json::{ensure_map, find_list, find_map, map_to_json, number_scalar, position_of};
use crate::schema::META;

/// Value kinds accepted by the meta store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    /// Plain string
    Str(String),
    /// 64-bit signed integer
    Int(i64),
    /// Boolean flag
    Bool(bool),
    /// Ordered list of strings, replaced as a whole
    StringArray(Vec<String>),
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringArray(value)
    }
}

/// Write one typed field
pub(crate) fn set(doc: &mut AutoCommit, key: &str, value: &MetaValue) -> EngineResult<()> {
    let meta = ensure_map(doc, &ROOT, META)?;
    match value {
        MetaValue::Str(s) => doc.put(&meta, key, s.as_str())?,
        MetaValue::Int(n) => doc.put(&meta, key, *n)?,
        MetaValue::Bool(b) => doc.put(&meta, key, *b)?,
        MetaValue::StringArray(items) => {
            write_strings(doc, &meta, key, items.iter().map(String::as_str))?;
        }
    }
    Ok(())
}

/// Append `value` to the array under `key` unless it is already there
pub(crate) fn push_item(doc: &mut AutoCommit, key: &str, value: &str) -> EngineResult<()> {
    let meta = ensure_map(doc, &ROOT, META)?;
    let list = match doc.get(&meta, key)? {
        None => None,
        Some((Value::Object(ObjType::List), id)) => Some(id),
        Some(_) => return Err(EngineError::invalid_meta(key, "value is not an array")),
    };
    let list = match list {
        Some(list) => list,
        None => doc.put_object(&meta, key, ObjType::List)?,
    };

    if position_of(doc, &list, value)?.is_none() {
        let end = doc.length(&list);
        doc.insert(&list, end, value)?;
    }
    Ok(())
}

/// Remove the first occurrence of `value` from the array under `key`
pub(crate) fn remove_item(doc: &mut AutoCommit, key: &str, value: &str) -> EngineResult<()> {
    let Some(meta) = find_map(doc, &ROOT, META)? else {
        return Ok(());
    };
    if let Some(list) = find_list(doc, &meta, key)? {
        if let Some(index) = position_of(doc, &list, value)? {
            doc.delete(&list, index)?;
        }
    }
    Ok(())
}

/// Drop `key` entirely
pub(crate) fn remove_key(doc: &mut AutoCommit, key: &str) -> EngineResult<()> {
    let Some(meta) = find_map(doc, &ROOT, META)? else {
        return Ok(());
    };
    if doc.get(&meta, key)?.is_some() {
        doc.delete(&meta, key)?;
    }
    Ok(())
}

/// Write every field of a JSON object, typed by its JSON kind.
///
/// Any unsupported field fails the whole call; the caller discards the
/// partial transaction.
pub(crate) fn set_from_json(doc: &mut AutoCommit, json: &str) -> EngineResult<()> {
    let parsed: JsonValue = serde_json::from_str(json)?;
    let JsonValue::Object(fields) = parsed else {
        return Err(EngineError::invalid_meta("<root>", "expected a JSON object"));
    };

    let meta = ensure_map(doc, &ROOT, META)?;
    for (key, value) in &fields {
        match value {
            JsonValue::Null => {
                if doc.get(&meta, key.as_str())?.is_some() {
                    doc.delete(&meta, key.as_str())?;
                }
            }
            JsonValue::Bool(b) => doc.put(&meta, key.as_str(), *b)?,
            JsonValue::Number(n) => doc.put(&meta, key.as_str(), number_scalar(n))?,
            JsonValue::String(s) => doc.put(&meta, key.as_str(), s.as_str())?,
            JsonValue::Array(items) => {
                let strings = items
                    .iter()
                    .map(JsonValue::as_str)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| EngineError::invalid_meta(key, "array items must be strings"))?;
                write_strings(doc, &meta, key, strings)?;
            }
            JsonValue::Object(_) => {
                let nested = serde_json::to_string(value)?;
                doc.put(&meta, key.as_str(), nested)?;
            }
        }
    }
    Ok(())
}

/// Serialize the whole meta map as a compact JSON object
pub(crate) fn to_json(doc: &AutoCommit) -> EngineResult<String> {
    let fields = match find_map(doc, &ROOT, META)? {
        Some(meta) => map_to_json(doc, &meta)?,
        None => JsonMap::new(),
    };
    Ok(serde_json::to_string(&JsonValue::Object(fields))?)
}

fn write_strings<'a>(
    doc: &mut AutoCommit,
    meta: &ObjId,
    key: &str,
    items: impl IntoIterator<Item = &'a str>,
) -> EngineResult<()> {
    let list = doc.put_object(meta, key, ObjType::List)?;
    for (index, item) in items.into_iter().enumerate() {
        doc.insert(&list, index, item)?;
    }
    Ok(())
}

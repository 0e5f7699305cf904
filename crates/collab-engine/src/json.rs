//! Conversion between automerge objects and JSON values

use automerge::{transaction::Transactable, AutoCommit, ObjId, ObjType, ReadDoc, ScalarValue, Value};
use serde_json::{json, Map as JsonMap, Number, Value as JsonValue};

use crate::error::EngineResult;

/// Look up a child map without creating it
pub(crate) fn find_map(doc: &AutoCommit, parent: &ObjId, key: &str) -> EngineResult<Option<ObjId>> {
    Ok(match doc.get(parent, key)? {
        Some((Value::Object(ObjType::Map), id)) => Some(id),
        _ => None,
    })
}

/// Look up a child list without creating it
pub(crate) fn find_list(doc: &AutoCommit, parent: &ObjId, key: &str) -> EngineResult<Option<ObjId>> {
    Ok(match doc.get(parent, key)? {
        Some((Value::Object(ObjType::List), id)) => Some(id),
        _ => None,
    })
}

/// Return the child map under `key`, creating it when absent
pub(crate) fn ensure_map(doc: &mut AutoCommit, parent: &ObjId, key: &str) -> EngineResult<ObjId> {
    match find_map(doc, parent, key)? {
        Some(id) => Ok(id),
        None => Ok(doc.put_object(parent, key, ObjType::Map)?),
    }
}

/// Read a string scalar, ignoring values of any other kind
pub(crate) fn read_str(doc: &AutoCommit, obj: &ObjId, key: &str) -> EngineResult<Option<String>> {
    Ok(match doc.get(obj, key)? {
        Some((Value::Scalar(scalar), _)) => match &*scalar {
            ScalarValue::Str(s) => Some(s.to_string()),
            _ => None,
        },
        _ => None,
    })
}

/// Collect the string items of a list in order
pub(crate) fn read_strings(doc: &AutoCommit, list: &ObjId) -> EngineResult<Vec<String>> {
    let mut items = Vec::with_capacity(doc.length(list));
    for index in 0..doc.length(list) {
        if let Some((Value::Scalar(scalar), _)) = doc.get(list, index)? {
            if let ScalarValue::Str(s) = &*scalar {
                items.push(s.to_string());
            }
        }
    }
    Ok(items)
}

/// Position of the first string item equal to `needle`
pub(crate) fn position_of(doc: &AutoCommit, list: &ObjId, needle: &str) -> EngineResult<Option<usize>> {
    for index in 0..doc.length(list) {
        if let Some((Value::Scalar(scalar), _)) = doc.get(list, index)? {
            if matches!(&*scalar, ScalarValue::Str(s) if s.as_str() == needle) {
                return Ok(Some(index));
            }
        }
    }
    Ok(None)
}

/// Serialize a map object into a JSON object
pub(crate) fn map_to_json(doc: &AutoCommit, obj: &ObjId) -> EngineResult<JsonMap<String, JsonValue>> {
    let mut out = JsonMap::new();
    for key in doc.keys(obj) {
        if let Some((value, id)) = doc.get(obj, key.as_str())? {
            let converted = value_to_json(doc, value, &id)?;
            out.insert(key, converted);
        }
    }
    Ok(out)
}

fn value_to_json(doc: &AutoCommit, value: Value<'_>, id: &ObjId) -> EngineResult<JsonValue> {
    match value {
        Value::Scalar(scalar) => Ok(scalar_to_json(&scalar)),
        Value::Object(ObjType::List) => {
            let mut items = Vec::with_capacity(doc.length(id));
            for index in 0..doc.length(id) {
                if let Some((item, item_id)) = doc.get(id, index)? {
                    items.push(value_to_json(doc, item, &item_id)?);
                }
            }
            Ok(JsonValue::Array(items))
        }
        Value::Object(ObjType::Text) => Ok(JsonValue::String(doc.text(id)?)),
        Value::Object(_) => Ok(JsonValue::Object(map_to_json(doc, id)?)),
    }
}

fn scalar_to_json(scalar: &ScalarValue) -> JsonValue {
    match scalar {
        ScalarValue::Str(s) => JsonValue::String(s.to_string()),
        ScalarValue::Int(n) => json!(n),
        ScalarValue::Uint(n) => json!(n),
        ScalarValue::F64(n) => Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
        ScalarValue::Boolean(b) => JsonValue::Bool(*b),
        ScalarValue::Timestamp(t) => json!(t),
        ScalarValue::Bytes(bytes) => JsonValue::Array(bytes.iter().map(|b| json!(b)).collect()),
        _ => JsonValue::Null,
    }
}

/// Scalar for a JSON number: integers stay integral, everything else is a float
pub(crate) fn number_scalar(number: &Number) -> ScalarValue {
    if let Some(n) = number.as_i64() {
        ScalarValue::Int(n)
    } else if let Some(n) = number.as_u64() {
        ScalarValue::Uint(n)
    } else {
        ScalarValue::F64(number.as_f64().unwrap_or_default())
    }
}

/// Write a JSON value under a map key, recursing into arrays and objects
pub(crate) fn put_json(
    doc: &mut AutoCommit,
    obj: &ObjId,
    key: &str,
    value: &JsonValue,
) -> EngineResult<()> {
    match value {
        JsonValue::Null => doc.put(obj, key, ScalarValue::Null)?,
        JsonValue::Bool(b) => doc.put(obj, key, *b)?,
        JsonValue::Number(n) => doc.put(obj, key, number_scalar(n))?,
        JsonValue::String(s) => doc.put(obj, key, s.as_str())?,
        JsonValue::Array(items) => {
            let list = doc.put_object(obj, key, ObjType::List)?;
            for (index, item) in items.iter().enumerate() {
                insert_json(doc, &list, index, item)?;
            }
        }
        JsonValue::Object(fields) => {
            let child = doc.put_object(obj, key, ObjType::Map)?;
            for (field, item) in fields {
                put_json(doc, &child, field, item)?;
            }
        }
    }
    Ok(())
}

fn insert_json(
    doc: &mut AutoCommit,
    list: &ObjId,
    index: usize,
    value: &JsonValue,
) -> EngineResult<()> {
    match value {
        JsonValue::Null => doc.insert(list, index, ScalarValue::Null)?,
        JsonValue::Bool(b) => doc.insert(list, index, *b)?,
        JsonValue::Number(n) => doc.insert(list, index, number_scalar(n))?,
        JsonValue::String(s) => doc.insert(list, index, s.as_str())?,
        JsonValue::Array(items) => {
            let nested = doc.insert_object(list, index, ObjType::List)?;
            for (i, item) in items.iter().enumerate() {
                insert_json(doc, &nested, i, item)?;
            }
        }
        JsonValue::Object(fields) => {
            let child = doc.insert_object(list, index, ObjType::Map)?;
            for (field, item) in fields {
                put_json(doc, &child, field, item)?;
            }
        }
    }
    Ok(())
}

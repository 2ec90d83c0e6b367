//! JSON to Arrow conversion
//!
//! Schema inference and column building for the tabular export paths. Input
//! records are flattened objects, so the supported column types are scalars
//! plus one level of lists.

use crate::error::{Error, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, NullArray, StringArray};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Infer an Arrow schema from a set of JSON records.
///
/// Every record contributes its fields; conflicting types across records are
/// widened (Int64 with Float64 becomes Float64, anything else becomes Utf8).
/// Columns come out in sorted name order so repeated exports of the same data
/// produce identical files.
pub fn infer_schema(records: &[Value]) -> Result<Schema> {
    let mut field_types: BTreeMap<String, DataType> = BTreeMap::new();

    for record in records {
        if let Value::Object(obj) = record {
            for (key, value) in obj {
                let inferred = infer_type(value);
                field_types
                    .entry(key.clone())
                    .and_modify(|existing| *existing = merge_types(existing, &inferred))
                    .or_insert(inferred);
            }
        }
    }

    let fields: Vec<Field> = field_types
        .into_iter()
        .map(|(name, dtype)| Field::new(name, dtype, true))
        .collect();

    Ok(Schema::new(fields))
}

/// Merge two schemas, widening conflicting field types
pub fn merge_schemas(first: &Schema, second: &Schema) -> Schema {
    let mut fields: BTreeMap<String, Field> = BTreeMap::new();

    for field in first.fields().iter().chain(second.fields()) {
        fields
            .entry(field.name().clone())
            .and_modify(|existing| {
                let merged = merge_types(existing.data_type(), field.data_type());
                *existing = Field::new(existing.name(), merged, true);
            })
            .or_insert_with(|| field.as_ref().clone());
    }

    Schema::new(fields.into_values().collect::<Vec<_>>())
}

/// Convert JSON records to an Arrow record batch, inferring the schema when
/// none is supplied
pub fn json_to_arrow(records: &[Value], schema: Option<&Schema>) -> Result<RecordBatch> {
    let inferred = infer_schema(records)?;
    let schema = schema.unwrap_or(&inferred);

    if records.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(schema.clone())));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| match record {
                Value::Object(obj) => obj.get(field.name()),
                _ => None,
            })
            .collect();
        columns.push(build_array(&values, field.data_type())?);
    }

    RecordBatch::try_new(Arc::new(schema.clone()), columns)
        .map_err(|e| Error::export(format!("failed to build record batch: {e}")))
}

fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) => DataType::Utf8,
        Value::Array(items) => {
            let element = items
                .iter()
                .find(|v| !v.is_null())
                .map_or(DataType::Null, infer_type);
            DataType::List(Arc::new(Field::new("item", element, true)))
        }
        // Objects only appear when the caller skipped flattening
        Value::Object(_) => DataType::Utf8,
    }
}

fn merge_types(first: &DataType, second: &DataType) -> DataType {
    match (first, second) {
        (a, b) if a == b => a.clone(),
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }
        (DataType::List(a), DataType::List(b)) => {
            let element = merge_types(a.data_type(), b.data_type());
            DataType::List(Arc::new(Field::new("item", element, true)))
        }
        _ => DataType::Utf8,
    }
}

fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            #[allow(clippy::cast_precision_loss)]
            let arr: Float64Array = values
                .iter()
                .map(|v| v.and_then(|v| v.as_f64().or_else(|| v.as_i64().map(|i| i as f64))))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(values, field),

        _ => {
            let arr: StringArray = values.iter().map(|v| v.map(ToString::to_string)).collect();
            Ok(Arc::new(arr))
        }
    }
}

fn build_list_array(values: &[Option<&Value>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];

    for value in values {
        if let Some(Value::Array(elements)) = value {
            items.extend(elements.iter().map(Some));
        }
        // Non-array rows contribute an empty slot; every row needs an offset
        let offset = i32::try_from(items.len())
            .map_err(|_| Error::export("list column too large for i32 offsets"))?;
        offsets.push(offset);
    }

    let element_array = build_array(&items, field.data_type())?;
    let list = ListArray::new(
        Arc::clone(field),
        OffsetBuffer::new(offsets.into()),
        element_array,
        None,
    );
    Ok(Arc::new(list))
}

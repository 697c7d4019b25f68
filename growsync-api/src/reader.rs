use std::cmp::Ordering;

use serde_json::Value;

use crate::models::{Datapoint, RawDatapoint, ViewResponse};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Malformed view response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode a view body into timestamp ordered datapoints.
///
/// A body that is not shaped `{ rows: [{ value: .. }] }` is an error, never an
/// empty batch.
pub fn read_datapoints(body: &[u8]) -> Result<Vec<Datapoint>, ReadError> {
    let response: ViewResponse = serde_json::from_slice(body)?;

    Ok(read_response(response))
}

pub fn read_response(response: ViewResponse) -> Vec<Datapoint> {
    let mut data: Vec<Datapoint> = response
        .rows
        .into_iter()
        .map(|row| read_datapoint(row.value))
        .collect();

    sort_by_timestamp(&mut data);

    data
}

pub fn read_datapoint(raw: RawDatapoint) -> Datapoint {
    Datapoint {
        value: coerce_value(&raw.value),
        variable: raw.variable,
        timestamp: raw.timestamp,
        is_desired: raw.is_desired,
        id: raw.id,
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is `NaN`.
pub fn coerce_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => text.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Only `a.timestamp > b.timestamp` counts as greater; ties and unordered
/// timestamps compare equal.
pub fn compare_timestamp(a: &Datapoint, b: &Datapoint) -> Ordering {
    if a.timestamp > b.timestamp {
        Ordering::Greater
    } else if a.timestamp < b.timestamp {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

pub fn sort_by_timestamp(data: &mut [Datapoint]) {
    data.sort_by(compare_timestamp);
}

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use growsync_api::models::RECIPE_START;

/// One environmental data point document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    pub environment: String,
    pub variable: String,
    pub is_desired: bool,
    pub timestamp: f64,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub key: Value,
    pub value: Document,
}

#[derive(Debug, Clone, Default)]
pub struct KeyRange {
    pub startkey: Option<Value>,
    pub endkey: Option<Value>,
    /// `startkey` is the high end when walking backwards
    pub descending: bool,
}

impl KeyRange {
    pub fn contains(&self, key: &Value) -> bool {
        let (low, high) = if self.descending {
            (&self.endkey, &self.startkey)
        } else {
            (&self.startkey, &self.endkey)
        };

        low.as_ref().is_none_or(|low| collate(low, key) != Ordering::Greater)
            && high.as_ref().is_none_or(|high| collate(key, high) != Ordering::Greater)
    }
}

/// View collation: null < false < true < numbers < strings < arrays < objects.
pub fn collate(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| collate(l, r))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}

#[derive(Debug, Default)]
pub struct DataStore {
    documents: Vec<Document>,
    next_id: u64,
    /// Measured readings kept per environment, unbounded when `None`
    retention: Option<usize>,
    readings: BTreeMap<String, usize>,
}

impl DataStore {
    /// Store that drops the oldest measured readings of an environment beyond `limit`.
    /// Desired values and recipe-start markers are always kept.
    pub fn with_retention(limit: usize) -> Self {
        Self {
            retention: Some(limit.max(1)),
            ..Default::default()
        }
    }

    pub fn insert<E, V>(&mut self, environment: E, variable: V, is_desired: bool, timestamp: f64, value: Value) -> &Document
    where
        E: Into<String>,
        V: Into<String>,
    {
        self.next_id += 1;
        let document = Document {
            id: format!("{:016x}", self.next_id),
            environment: environment.into(),
            variable: variable.into(),
            is_desired,
            timestamp,
            value,
        };

        if is_reading(&document) {
            let count = self.readings.entry(document.environment.clone()).or_default();
            *count += 1;

            if self.retention.is_some_and(|limit| *count > limit) {
                *count -= 1;
                self.evict_oldest_reading(&document.environment);
            }
        }

        self.documents.push(document);

        &self.documents[self.documents.len() - 1]
    }

    fn evict_oldest_reading(&mut self, environment: &str) {
        if let Some(index) = self
            .documents
            .iter()
            .position(|document| document.environment == environment && is_reading(document))
        {
            self.documents.remove(index);
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// `latest` view at group level 3: newest document per `[environment, variable, is_desired]`.
    pub fn latest(&self, range: &KeyRange) -> Vec<Row> {
        let mut groups: BTreeMap<(&str, &str, bool), &Document> = BTreeMap::new();

        for document in &self.documents {
            let group = (document.environment.as_str(), document.variable.as_str(), document.is_desired);

            groups
                .entry(group)
                .and_modify(|newest| {
                    if document.timestamp >= newest.timestamp {
                        *newest = document;
                    }
                })
                .or_insert(document);
        }

        let mut rows: Vec<Row> = groups
            .into_iter()
            .map(|((environment, variable, is_desired), document)| Row {
                id: None,
                key: json!([environment, variable, is_desired]),
                value: document.clone(),
            })
            .filter(|row| range.contains(&row.key))
            .collect();

        if range.descending {
            rows.reverse();
        }

        rows
    }

    /// `by_timestamp` view keyed by `[environment, timestamp]`.
    pub fn by_timestamp(&self, range: &KeyRange, limit: Option<usize>) -> Vec<Row> {
        let mut matching: Vec<(Value, &Document)> = self
            .documents
            .iter()
            .map(|document| (json!([document.environment, document.timestamp]), document))
            .filter(|(key, _)| range.contains(key))
            .collect();

        matching.sort_by(|a, b| collate(&a.0, &b.0));
        if range.descending {
            matching.reverse();
        }

        matching
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(key, document)| Row {
                id: Some(document.id.clone()),
                key,
                value: document.clone(),
            })
            .collect()
    }
}

/// Measured values, as opposed to desired values and recipe-start markers.
fn is_reading(document: &Document) -> bool {
    !document.is_desired && document.variable != RECIPE_START
}

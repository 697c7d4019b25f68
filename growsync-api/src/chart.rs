use std::collections::BTreeSet;

use crate::MAX_DATAPOINTS;
use crate::models::Datapoint;

/// Bounded, timestamp ordered accumulation of datapoints for one environment.
#[derive(Debug, Clone)]
pub struct ChartBuffer {
    capacity: usize,
    data: Vec<Datapoint>,
    loading: bool,
}

impl ChartBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: Vec::with_capacity(capacity.min(MAX_DATAPOINTS)),
            loading: false,
        }
    }

    /// Merge a timestamp sorted batch, returning how many points were inserted.
    pub fn add_data(&mut self, batch: &[Datapoint]) -> usize {
        let mut inserted = 0;

        for datapoint in batch {
            // Upper bound keeps arrival order among equal timestamps
            let index = self
                .data
                .partition_point(|held| !(held.timestamp > datapoint.timestamp));

            let duplicate = self.data[..index]
                .iter()
                .rev()
                .take_while(|held| held.timestamp == datapoint.timestamp)
                .any(|held| held.same_reading(datapoint));

            if duplicate {
                continue;
            }

            self.data.insert(index, datapoint.clone());
            inserted += 1;
        }

        if self.data.len() > self.capacity {
            let excess = self.data.len() - self.capacity;
            self.data.drain(..excess);
        }

        inserted
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Datapoint> {
        self.data.iter()
    }

    pub fn series<'a>(&'a self, variable: &'a str, is_desired: bool) -> impl Iterator<Item = &'a Datapoint> + 'a {
        self.data
            .iter()
            .filter(move |d| d.variable == variable && d.is_desired == is_desired)
    }

    /// Most recent measured value of a variable.
    pub fn latest(&self, variable: &str) -> Option<&Datapoint> {
        self.data
            .iter()
            .rev()
            .find(|d| d.variable == variable && !d.is_desired)
    }

    pub fn variables(&self) -> BTreeSet<&str> {
        self.data.iter().map(|d| d.variable.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for ChartBuffer {
    fn default() -> Self {
        Self::new(MAX_DATAPOINTS)
    }
}

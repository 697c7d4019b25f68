use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::MAX_DATAPOINTS;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TemplateError {
    #[error("Template `{name}` is missing the {placeholder} placeholder")]
    MissingPlaceholder {
        name: &'static str,
        placeholder: &'static str,
    },
}

/// URL templates for the two view queries.
///
/// Placeholders: `{origin}`, `{startkey}`, `{endkey}` and, for `range`, `{limit}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Grouped view returning the newest value per variable
    pub latest: String,
    /// Timestamp indexed view, queried in descending order
    pub range: String,
    /// Row limit of the range query
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    MAX_DATAPOINTS
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            latest: "{origin}/_design/openag/_view/latest?group_level=3&startkey={startkey}&endkey={endkey}"
                .to_string(),
            range: "{origin}/_design/openag/_view/by_timestamp?startkey={startkey}&endkey={endkey}&limit={limit}&descending=true"
                .to_string(),
            limit: MAX_DATAPOINTS,
        }
    }
}

impl Endpoints {
    pub fn validate(&self) -> Result<(), TemplateError> {
        for (name, template) in [("latest", &self.latest), ("range", &self.range)] {
            for placeholder in ["{origin}", "{startkey}", "{endkey}"] {
                if !template.contains(placeholder) {
                    return Err(TemplateError::MissingPlaceholder { name, placeholder });
                }
            }
        }

        Ok(())
    }

    /// `[id]` .. `[id, {}]`: every key of this environment, ascending.
    pub fn latest_url(&self, origin: &str, id: &str) -> String {
        render(&self.latest, origin, &low_key(id), &high_key(id), self.limit)
    }

    /// `[id, {}]` .. `[id]`: the same window walked in descending order.
    pub fn range_url(&self, origin: &str, id: &str) -> String {
        render(&self.range, origin, &high_key(id), &low_key(id), self.limit)
    }
}

fn low_key(id: &str) -> String {
    json!([id]).to_string()
}

/// `{}` sorts after every other JSON value in view collation.
fn high_key(id: &str) -> String {
    json!([id, {}]).to_string()
}

fn render(template: &str, origin: &str, startkey: &str, endkey: &str, limit: usize) -> String {
    template
        .replace("{origin}", origin.trim_end_matches('/'))
        .replace("{startkey}", &encode(startkey))
        .replace("{endkey}", &encode(endkey))
        .replace("{limit}", &limit.to_string())
}

/// Percent-encode everything outside the unreserved set.
pub fn encode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => c.to_string(),
            _ => {
                let mut buf = [0; 4];
                let bytes = c.encode_utf8(&mut buf).as_bytes();
                bytes.iter().map(|b| format!("%{:02X}", b)).collect()
            }
        })
        .collect()
}

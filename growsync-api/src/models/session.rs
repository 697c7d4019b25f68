use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTab {
    #[default]
    Dashboard,
    Chart,
}

/// One monitored environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSession {
    /// Environment identifier used as the first element of every view key
    pub id: String,
    /// Base URL of the data source, absent until configured
    pub origin: Option<String>,
    /// Human readable label
    pub name: Option<String>,
    /// Active view tab
    #[serde(skip)]
    pub view: ViewTab,
}

impl EnvironmentSession {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Origin and id are both known, so fetches may be issued.
    pub fn is_configured(&self) -> bool {
        !self.id.is_empty() && self.origin.as_deref().is_some_and(|origin| !origin.is_empty())
    }

    pub fn persisted(&self) -> PersistedSession {
        PersistedSession {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// The part of a session that survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<PersistedSession> for EnvironmentSession {
    fn from(persisted: PersistedSession) -> Self {
        Self {
            id: persisted.id,
            origin: None,
            name: persisted.name,
            view: ViewTab::default(),
        }
    }
}

//! Records kept by the resource store.

use serde::{Deserialize, Serialize};

/// One API version of an app. `contracts` order is match priority.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub v: String,
    /// Path template; `{{app.basePath}}` and `{{version.v}}` are substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub contracts: Vec<String>,
}

impl Version {
    pub fn new(v: impl Into<String>) -> Self {
        Self {
            v: v.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_contracts<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contracts = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Base path this version serves under.
    pub fn base_path(&self, app_base_path: &str) -> String {
        match &self.path {
            Some(template) if !template.is_empty() => template
                .replace("{{app.basePath}}", app_base_path)
                .replace("{{version.v}}", &self.v),
            _ => app_base_path.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_path: String,
    /// Base URLs of real deployments, first one is the wire-test default.
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default)]
    pub versions: Vec<Version>,
}

impl App {
    pub fn new(id: impl Into<String>, base_path: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    pub fn with_server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(url.into());
        self
    }

    pub fn with_version(mut self, mut version: Version) -> Self {
        version.parent = Some(self.id.clone());
        self.versions.push(version);
        self
    }

    pub fn version(&self, v: &str) -> Option<&Version> {
        self.versions.iter().find(|version| version.v == v)
    }

    pub fn version_numbers(&self) -> Vec<&str> {
        self.versions.iter().map(|version| version.v.as_str()).collect()
    }
}

/// Requested listener for an app.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WirestubRecord {
    #[serde(default)]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

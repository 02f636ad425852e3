// config.rs - per-environment provisioning settings loaded from config.toml

use http::Uri;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Environment {
    pub database_name: String,
    pub app_user: String,
    pub admin_ui_url: String,
}

impl Environment {
    pub fn admin_ui(&self) -> Result<Uri, String> {
        self.admin_ui_url
            .parse::<Uri>()
            .map_err(|e| format!("Invalid admin_ui_url '{}': {}", self.admin_ui_url, e))
    }
}

// Nests settings under an environment name
// local -> ai_agent_db / ai_agent_user
#[derive(Debug, Deserialize)]
pub struct Config {
    environments: HashMap<String, Environment>,
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| format!("Failed to parse config: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&contents)
    }

    pub fn environment(&self, name: &str) -> Result<&Environment, String> {
        self.environments
            .get(name)
            .ok_or_else(|| format!("No settings found for the {} environment.", name))
    }
}

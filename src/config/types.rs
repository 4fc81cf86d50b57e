use serde::{Deserialize, Serialize};

/// Configuration for the Inkdex client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the backend; the `/api/py/...` paths are joined onto it.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Skip spawning the background readiness probe at startup.
    #[serde(default)]
    pub disable_startup_probe: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            disable_startup_probe: false,
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Fallback link target when the template carries no placeholders.
pub const DEFAULT_TASK_LINK_TEMPLATE: &str = "https://to-do.office.com/tasks/";

/// Configuration for the To Do card.
///
/// The three identity fields are required for the browser auth path.
/// While any of them is missing the auth session machine stays parked in
/// its initialize phase; that is a wait state, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardConfig {
    #[serde(default)]
    pub aad_client_id: String,
    #[serde(default)]
    pub aad_tenant_id: String,
    #[serde(default)]
    pub aad_redirect_url: String,
    #[serde(default = "default_task_link_template")]
    pub task_link_template: String,
    /// Extension display name, sent to the native host on token requests.
    #[serde(default = "default_extension_name")]
    pub extension_name: String,
    #[serde(default = "default_extension_publisher")]
    pub extension_publisher: String,
    /// Seconds to wait for a native-host token push before falling back
    /// to the browser path.
    #[serde(default = "default_bridge_wait_secs")]
    pub bridge_wait_secs: u64,
}

fn default_task_link_template() -> String {
    DEFAULT_TASK_LINK_TEMPLATE.to_string()
}

fn default_extension_name() -> String {
    "Microsoft Productivity Tools".to_string()
}

fn default_extension_publisher() -> String {
    "Trevecca Nazarene University".to_string()
}

fn default_bridge_wait_secs() -> u64 {
    10
}

const CONFIG_FILE_PATH: &str = "card-config.json";

fn config_json_path() -> PathBuf {
    std::env::var_os("TODO_CARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_PATH))
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            aad_client_id: String::new(),
            aad_tenant_id: String::new(),
            aad_redirect_url: String::new(),
            task_link_template: default_task_link_template(),
            extension_name: default_extension_name(),
            extension_publisher: default_extension_publisher(),
            bridge_wait_secs: default_bridge_wait_secs(),
        }
    }
}

impl CardConfig {
    /// Load configuration from the JSON config file (if present), then
    /// apply environment overrides.
    pub fn load() -> Self {
        let mut config = CardConfig::default();

        let json_path = config_json_path();
        if json_path.exists() {
            if let Ok(content) = std::fs::read_to_string(&json_path) {
                if let Ok(file_config) = serde_json::from_str::<CardConfig>(&content) {
                    config = file_config;
                }
            }
        }

        if let Ok(client_id) = std::env::var("AAD_CLIENT_ID") {
            config.aad_client_id = client_id;
        }
        if let Ok(tenant_id) = std::env::var("AAD_TENANT_ID") {
            config.aad_tenant_id = tenant_id;
        }
        if let Ok(redirect_url) = std::env::var("AAD_REDIRECT_URL") {
            config.aad_redirect_url = redirect_url;
        }
        if let Ok(template) = std::env::var("TODO_TASK_TEMPLATE_URL") {
            config.task_link_template = template;
        }
        config
    }

    /// True when every required identity field is present.
    pub fn is_complete(&self) -> bool {
        !self.aad_client_id.is_empty()
            && !self.aad_tenant_id.is_empty()
            && !self.aad_redirect_url.is_empty()
    }

    /// Identity string sent to the native host: `name+publisher`, spaces
    /// stripped.
    pub fn extension_identity(&self) -> String {
        format!(
            "{}+{}",
            self.extension_name.replace(' ', ""),
            self.extension_publisher.replace(' ', "")
        )
    }
}

use anyhow::{Context, Result};
use directories::UserDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::util::mask_secret;

pub const DEFAULT_V8_URL: &str = "https://api.track.toggl.com/api/v8";
pub const DEFAULT_V9_URL: &str = "https://api.track.toggl.com/api/v9";
pub const DEFAULT_REPORTS_V2_URL: &str = "https://api.track.toggl.com/reports/api/v2";
pub const DEFAULT_REPORTS_V3_URL: &str = "https://api.track.toggl.com/reports/api/v3";
pub const DEFAULT_WEBHOOKS_URL: &str = "https://track.toggl.com/webhooks/api/v1";
pub const DEFAULT_INSIGHTS_URL: &str = "https://api.track.toggl.com/insights/api/v1";

pub const DEFAULT_USER_AGENT: &str = "TogglMCP";

const CONFIG_DIR_NAME: &str = ".toggl-mcp";
const CONFIG_FILE_NAME: &str = "config.toml";

// ── Top-level config ──────────────────────────────────────────────

/// Top-level configuration, loaded from `config.toml`.
///
/// Resolution order: `--config` flag → `TOGGL_MCP_CONFIG` env → `~/.toggl-mcp/config.toml`.
/// A missing file yields defaults; environment variables are applied on top.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Toggl credentials, endpoints and request defaults (`[toggl]`).
    #[serde(default)]
    pub toggl: TogglConfig,

    /// HTTP transport configuration (`[gateway]`).
    #[serde(default)]
    pub gateway: GatewayConfig,
}

// ── Toggl ─────────────────────────────────────────────────────────

/// Which generation of the Toggl resource API backs the `resources/*` surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceApi {
    /// Legacy `/api/v8` routes.
    V8,
    /// Current `/api/v9` routes.
    #[default]
    V9,
}

impl ResourceApi {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V8 => "v8",
            Self::V9 => "v9",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "v8" | "8" => Some(Self::V8),
            "v9" | "9" => Some(Self::V9),
            _ => None,
        }
    }
}

/// Toggl account configuration (`[toggl]` section).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TogglConfig {
    /// API token. Overridden by `TOGGL_API_TOKEN`. Takes precedence over email/password.
    pub api_token: Option<String>,
    /// Account email for email/password auth. Overridden by `TOGGL_EMAIL`.
    pub email: Option<String>,
    /// Account password for email/password auth. Overridden by `TOGGL_PASSWORD`.
    pub password: Option<String>,
    /// `User-Agent` sent upstream and default `user_agent` report parameter. Default: `"TogglMCP"`.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Resource API generation (`"v8"` or `"v9"`). Default: `"v9"`.
    #[serde(default)]
    pub resource_api: ResourceApi,
    /// Base URL overrides (`[toggl.endpoints]`).
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

impl Default for TogglConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            email: None,
            password: None,
            user_agent: default_user_agent(),
            resource_api: ResourceApi::default(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// Base URLs for each Toggl API surface (`[toggl.endpoints]` section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointsConfig {
    #[serde(default = "default_v8_url")]
    pub v8: String,
    #[serde(default = "default_v9_url")]
    pub v9: String,
    #[serde(default = "default_reports_v2_url")]
    pub reports_v2: String,
    #[serde(default = "default_reports_v3_url")]
    pub reports_v3: String,
    #[serde(default = "default_webhooks_url")]
    pub webhooks: String,
    #[serde(default = "default_insights_url")]
    pub insights: String,
}

fn default_v8_url() -> String {
    DEFAULT_V8_URL.into()
}

fn default_v9_url() -> String {
    DEFAULT_V9_URL.into()
}

fn default_reports_v2_url() -> String {
    DEFAULT_REPORTS_V2_URL.into()
}

fn default_reports_v3_url() -> String {
    DEFAULT_REPORTS_V3_URL.into()
}

fn default_webhooks_url() -> String {
    DEFAULT_WEBHOOKS_URL.into()
}

fn default_insights_url() -> String {
    DEFAULT_INSIGHTS_URL.into()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            v8: default_v8_url(),
            v9: default_v9_url(),
            reports_v2: default_reports_v2_url(),
            reports_v3: default_reports_v3_url(),
            webhooks: default_webhooks_url(),
            insights: default_insights_url(),
        }
    }
}

impl EndpointsConfig {
    /// Point every surface at one host, keeping the default path layout.
    ///
    /// Used to aim the whole gateway at a local mock or proxy.
    pub fn with_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            v8: format!("{host}/api/v8"),
            v9: format!("{host}/api/v9"),
            reports_v2: format!("{host}/reports/api/v2"),
            reports_v3: format!("{host}/reports/api/v3"),
            webhooks: format!("{host}/webhooks/api/v1"),
            insights: format!("{host}/insights/api/v1"),
        }
    }

    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("v8", &self.v8),
            ("v9", &self.v9),
            ("reports_v2", &self.reports_v2),
            ("reports_v3", &self.reports_v3),
            ("webhooks", &self.webhooks),
            ("insights", &self.insights),
        ]
    }
}

// ── Gateway ───────────────────────────────────────────────────────

/// HTTP transport configuration (`[gateway]` section).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GatewayConfig {
    /// Gateway port (default: 3917)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// When set, `POST /mcp` requires `Authorization: Bearer <token>`.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

fn default_gateway_port() -> u16 {
    3917
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
            bearer_token: None,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────

fn default_config_path() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn resolve_config_path<F>(path_override: Option<&Path>, lookup: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path_override {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = lookup("TOGGL_MCP_CONFIG").and_then(non_empty) {
        return Ok(PathBuf::from(path));
    }
    default_config_path()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Config {
    /// Load config from disk (if present), apply env overrides, and validate.
    pub async fn load(path_override: Option<&Path>) -> Result<Self> {
        Self::load_with(path_override, |key| std::env::var(key).ok()).await
    }

    /// [`Config::load`] with overrides read from `lookup` instead of the process environment.
    pub async fn load_with<F>(path_override: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = resolve_config_path(path_override, &lookup)?;

        let mut config = if config_path.exists() {
            // Warn if config file is world-readable (may contain credentials)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(meta) = fs::metadata(&config_path).await {
                    if meta.permissions().mode() & 0o004 != 0 {
                        tracing::warn!(
                            "Config file {:?} is world-readable (mode {:o}). \
                             Consider restricting with: chmod 600 {:?}",
                            config_path,
                            meta.permissions().mode() & 0o777,
                            config_path,
                        );
                    }
                }
            }

            let contents = fs::read_to_string(&config_path)
                .await
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            Self::from_toml(&contents)?
        } else {
            Config::default()
        };

        config.config_path = config_path;
        config.apply_overrides_from(lookup);
        config.validate()?;

        tracing::info!(
            path = %config.config_path.display(),
            resource_api = config.toggl.resource_api.as_str(),
            credentials = config.credential_scheme().unwrap_or("none"),
            "Config loaded"
        );
        Ok(config)
    }

    /// Parse a TOML document without touching the environment.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config file")
    }

    /// Validate configuration values that would cause runtime failures.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.host.trim().is_empty() {
            anyhow::bail!("gateway.host must not be empty");
        }
        if self.toggl.user_agent.trim().is_empty() {
            anyhow::bail!("toggl.user_agent must not be empty");
        }
        for (name, url) in self.toggl.endpoints.entries() {
            validate_endpoint_url(name, url)?;
        }
        Ok(())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TOGGL_API_TOKEN").and_then(non_empty) {
            self.toggl.api_token = Some(token);
        }
        if let Some(email) = lookup("TOGGL_EMAIL").and_then(non_empty) {
            self.toggl.email = Some(email);
        }
        if let Some(password) = lookup("TOGGL_PASSWORD").and_then(non_empty) {
            self.toggl.password = Some(password);
        }
        if let Some(agent) = lookup("TOGGL_USER_AGENT").and_then(non_empty) {
            self.toggl.user_agent = agent;
        }

        if let Some(raw) = lookup("TOGGL_RESOURCE_API") {
            match ResourceApi::parse(&raw) {
                Some(api) => self.toggl.resource_api = api,
                None => tracing::warn!(
                    value = %raw,
                    "Ignoring invalid TOGGL_RESOURCE_API (valid: v8|v9)"
                ),
            }
        }

        // One host for every surface first, then per-surface overrides.
        if let Some(host) = lookup("TOGGL_API_HOST").and_then(non_empty) {
            self.toggl.endpoints = EndpointsConfig::with_host(&host);
        }
        let endpoints = &mut self.toggl.endpoints;
        for (key, slot) in [
            ("TOGGL_API_V8_URL", &mut endpoints.v8),
            ("TOGGL_API_V9_URL", &mut endpoints.v9),
            ("TOGGL_REPORTS_V2_URL", &mut endpoints.reports_v2),
            ("TOGGL_REPORTS_V3_URL", &mut endpoints.reports_v3),
            ("TOGGL_WEBHOOKS_URL", &mut endpoints.webhooks),
            ("TOGGL_INSIGHTS_URL", &mut endpoints.insights),
        ] {
            if let Some(url) = lookup(key).and_then(non_empty) {
                *slot = url;
            }
        }

        if let Some(host) = lookup("TOGGL_MCP_HOST").and_then(non_empty) {
            self.gateway.host = host;
        }
        if let Some(port_str) = lookup("TOGGL_MCP_PORT") {
            if let Ok(port) = port_str.trim().parse::<u16>() {
                self.gateway.port = port;
            }
        }
        if let Some(token) = lookup("TOGGL_MCP_BEARER_TOKEN").and_then(non_empty) {
            self.gateway.bearer_token = Some(token);
        }
    }

    /// Auth scheme that will be used, if any credentials are configured.
    pub fn credential_scheme(&self) -> Option<&'static str> {
        crate::toggl::Credentials::resolve(
            self.toggl.api_token.as_deref(),
            self.toggl.email.as_deref(),
            self.toggl.password.as_deref(),
        )
        .map(|c| c.scheme())
    }

    /// Copy with every secret masked, for display.
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.toggl.api_token = masked.toggl.api_token.as_deref().map(mask_secret);
        masked.toggl.password = masked.toggl.password.as_deref().map(mask_secret);
        masked.gateway.bearer_token = masked.gateway.bearer_token.as_deref().map(mask_secret);
        masked
    }
}

fn validate_endpoint_url(field: &str, url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .with_context(|| format!("Invalid toggl.endpoints.{field} URL: {url}"))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => anyhow::bail!(
            "Invalid toggl.endpoints.{field} URL scheme '{scheme}'. Allowed: http, https"
        ),
    }

    if parsed.host_str().is_none() {
        anyhow::bail!("Invalid toggl.endpoints.{field} URL: host is required");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ── Defaults ─────────────────────────────────────────────

    #[test]
    fn config_default_has_sane_values() {
        let c = Config::default();
        assert!(c.toggl.api_token.is_none());
        assert_eq!(c.toggl.user_agent, "TogglMCP");
        assert_eq!(c.toggl.resource_api, ResourceApi::V9);
        assert_eq!(c.toggl.endpoints.v8, DEFAULT_V8_URL);
        assert_eq!(c.toggl.endpoints.webhooks, DEFAULT_WEBHOOKS_URL);
        assert_eq!(c.gateway.host, "127.0.0.1");
        assert_eq!(c.gateway.port, 3917);
        c.validate().unwrap();
    }

    #[test]
    fn config_minimal_toml_uses_defaults() {
        let c = Config::from_toml("[toggl]\napi_token = \"tok\"\n").unwrap();
        assert_eq!(c.toggl.api_token.as_deref(), Some("tok"));
        assert_eq!(c.toggl.user_agent, "TogglMCP");
        assert_eq!(c.toggl.endpoints, EndpointsConfig::default());
        assert_eq!(c.gateway.port, 3917);
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut c = Config::default();
        c.toggl.email = Some("me@example.com".into());
        c.toggl.resource_api = ResourceApi::V8;
        c.gateway.port = 9000;

        let toml_str = toml::to_string_pretty(&c).unwrap();
        let parsed = Config::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.toggl.email.as_deref(), Some("me@example.com"));
        assert_eq!(parsed.toggl.resource_api, ResourceApi::V8);
        assert_eq!(parsed.gateway.port, 9000);
    }

    #[test]
    fn config_rejects_unknown_resource_api() {
        let err = Config::from_toml("[toggl]\nresource_api = \"v7\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    // ── Env overrides ────────────────────────────────────────

    #[test]
    fn env_overrides_credentials_and_gateway() {
        let mut c = Config::default();
        c.apply_overrides_from(lookup_from(&[
            ("TOGGL_API_TOKEN", " tok-123 "),
            ("TOGGL_EMAIL", "me@example.com"),
            ("TOGGL_MCP_PORT", "8080"),
            ("TOGGL_MCP_HOST", "0.0.0.0"),
        ]));
        assert_eq!(c.toggl.api_token.as_deref(), Some("tok-123"));
        assert_eq!(c.toggl.email.as_deref(), Some("me@example.com"));
        assert_eq!(c.gateway.port, 8080);
        assert_eq!(c.gateway.host, "0.0.0.0");
    }

    #[test]
    fn env_empty_values_are_ignored() {
        let mut c = Config::default();
        c.toggl.api_token = Some("from-file".into());
        c.apply_overrides_from(lookup_from(&[("TOGGL_API_TOKEN", "   ")]));
        assert_eq!(c.toggl.api_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn env_invalid_port_is_ignored() {
        let mut c = Config::default();
        c.apply_overrides_from(lookup_from(&[("TOGGL_MCP_PORT", "not-a-port")]));
        assert_eq!(c.gateway.port, 3917);
    }

    #[test]
    fn env_resource_api_override() {
        let mut c = Config::default();
        c.apply_overrides_from(lookup_from(&[("TOGGL_RESOURCE_API", "V8")]));
        assert_eq!(c.toggl.resource_api, ResourceApi::V8);

        c.apply_overrides_from(lookup_from(&[("TOGGL_RESOURCE_API", "bogus")]));
        assert_eq!(c.toggl.resource_api, ResourceApi::V8);
    }

    #[test]
    fn env_api_host_rewrites_all_endpoints_then_specific_wins() {
        let mut c = Config::default();
        c.apply_overrides_from(lookup_from(&[
            ("TOGGL_API_HOST", "http://localhost:9999/"),
            ("TOGGL_INSIGHTS_URL", "http://insights.local/v1"),
        ]));
        assert_eq!(c.toggl.endpoints.v9, "http://localhost:9999/api/v9");
        assert_eq!(
            c.toggl.endpoints.reports_v3,
            "http://localhost:9999/reports/api/v3"
        );
        assert_eq!(c.toggl.endpoints.insights, "http://insights.local/v1");
    }

    // ── Validation ───────────────────────────────────────────

    #[test]
    fn validate_rejects_non_http_endpoint() {
        let mut c = Config::default();
        c.toggl.endpoints.reports_v2 = "ftp://example.com".into();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("reports_v2"));
    }

    #[test]
    fn validate_rejects_empty_host_and_user_agent() {
        let mut c = Config::default();
        c.gateway.host = "  ".into();
        assert!(c.validate().is_err());

        let mut c = Config::default();
        c.toggl.user_agent = String::new();
        assert!(c.validate().is_err());
    }

    // ── Display helpers ──────────────────────────────────────

    #[test]
    fn credential_scheme_reflects_configuration() {
        let mut c = Config::default();
        assert!(c.credential_scheme().is_none());
        c.toggl.email = Some("me@x.io".into());
        c.toggl.password = Some("pw".into());
        assert_eq!(c.credential_scheme(), Some("email_password"));
        c.toggl.api_token = Some("tok".into());
        assert_eq!(c.credential_scheme(), Some("api_token"));
    }

    #[test]
    fn masked_hides_secrets() {
        let mut c = Config::default();
        c.toggl.api_token = Some("abcdef123456".into());
        c.toggl.password = Some("hunter2hunter2".into());
        c.gateway.bearer_token = Some("bearer-secret".into());
        let masked = c.masked();
        assert_eq!(masked.toggl.api_token.as_deref(), Some("****3456"));
        assert!(!masked.toggl.password.unwrap().contains("hunter2"));
        assert!(!masked.gateway.bearer_token.unwrap().contains("bearer"));
    }

    #[test]
    fn config_schema_export_contains_sections() {
        let schema = schemars::schema_for!(Config);
        let json = serde_json::to_value(&schema).unwrap();
        let props = &json["properties"];
        assert!(props["toggl"].is_object());
        assert!(props["gateway"].is_object());
    }

    // ── Loading ──────────────────────────────────────────────

    #[tokio::test]
    async fn load_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");
        let c = Config::load_with(Some(&path), lookup_from(&[])).await.unwrap();
        assert_eq!(c.config_path, path);
        assert!(!path.exists(), "loading must not create the file");
    }

    #[tokio::test]
    async fn load_reads_file_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[toggl]\nuser_agent = \"from-disk\"\nresource_api = \"v8\"\n\n[gateway]\nport = 4000\n",
        )
        .unwrap();

        let c = Config::load_with(Some(&path), lookup_from(&[])).await.unwrap();
        assert_eq!(c.toggl.resource_api, ResourceApi::V8);
        assert_eq!(c.gateway.port, 4000);
    }

    #[tokio::test]
    async fn load_applies_overrides_over_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[toggl]\nresource_api = \"v8\"\n").unwrap();

        let c = Config::load_with(Some(&path), lookup_from(&[("TOGGL_RESOURCE_API", "v9")]))
            .await
            .unwrap();
        assert_eq!(c.toggl.resource_api, ResourceApi::V9);
    }

    #[tokio::test]
    async fn load_uses_config_path_from_lookup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("elsewhere.toml");
        std::fs::write(&path, "[gateway]\nport = 4100\n").unwrap();

        let c = Config::load_with(None, lookup_from(&[("TOGGL_MCP_CONFIG", path.to_str().unwrap())]))
            .await
            .unwrap();
        assert_eq!(c.config_path, path);
        assert_eq!(c.gateway.port, 4100);
    }

    #[tokio::test]
    async fn load_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "this is not = = toml").unwrap();
        let err = Config::load_with(Some(&path), lookup_from(&[])).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub member: MemberConfig,
    pub llm: LlmConfig,
    pub session: SessionConfig,
    pub flow: FlowConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub aibee: AibeeConfig,
    pub gateway: GatewayConfig,
}

/// Aibee park-API credentials (venue 702). Signed with SHA-1 over the
/// JSON body, timestamp, and secret.
#[derive(Clone, Debug)]
pub struct AibeeConfig {
    pub base_url: String,
    pub group_id: String,
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Form-gateway credentials (venue 801). Signed with HMAC-SHA256 over the
/// sorted parameter concatenation.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base_url: String,
    pub app_key: String,
    pub secret: SecretString,
    pub store_id: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct MemberConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct FlowConfig {
    pub plate_concurrency: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub aibee_group_id: Option<String>,
    pub aibee_api_key: Option<String>,
    pub aibee_api_secret: Option<String>,
    pub gateway_app_key: Option<String>,
    pub gateway_secret: Option<String>,
    pub gateway_store_id: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig {
                aibee: AibeeConfig {
                    base_url: "https://park-api.aibee.cn".to_string(),
                    group_id: String::new(),
                    api_key: String::new().into(),
                    api_secret: String::new().into(),
                    timeout_secs: 5,
                    max_retries: 2,
                },
                gateway: GatewayConfig {
                    base_url: "http://test.jwsaas.cn:58081".to_string(),
                    app_key: String::new(),
                    secret: String::new().into(),
                    store_id: String::new(),
                    timeout_secs: 5,
                    max_retries: 2,
                },
            },
            member: MemberConfig {
                base_url: "https://shop-api.aibee.cn".to_string(),
                timeout_secs: 5,
            },
            llm: LlmConfig {
                base_url: "http://localhost:11434/v1".to_string(),
                model: "qwen3:8b".to_string(),
                api_key: None,
                timeout_secs: 30,
            },
            session: SessionConfig { ttl_secs: 600 },
            flow: FlowConfig { plate_concurrency: 4 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("valet.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(upstream) = patch.upstream {
            if let Some(aibee) = upstream.aibee {
                if let Some(base_url) = aibee.base_url {
                    self.upstream.aibee.base_url = base_url;
                }
                if let Some(group_id) = aibee.group_id {
                    self.upstream.aibee.group_id = group_id;
                }
                if let Some(api_key_value) = aibee.api_key {
                    self.upstream.aibee.api_key = secret_value(api_key_value);
                }
                if let Some(api_secret_value) = aibee.api_secret {
                    self.upstream.aibee.api_secret = secret_value(api_secret_value);
                }
                if let Some(timeout_secs) = aibee.timeout_secs {
                    self.upstream.aibee.timeout_secs = timeout_secs;
                }
                if let Some(max_retries) = aibee.max_retries {
                    self.upstream.aibee.max_retries = max_retries;
                }
            }
            if let Some(gateway) = upstream.gateway {
                if let Some(base_url) = gateway.base_url {
                    self.upstream.gateway.base_url = base_url;
                }
                if let Some(app_key) = gateway.app_key {
                    self.upstream.gateway.app_key = app_key;
                }
                if let Some(secret) = gateway.secret {
                    self.upstream.gateway.secret = secret_value(secret);
                }
                if let Some(store_id) = gateway.store_id {
                    self.upstream.gateway.store_id = store_id;
                }
                if let Some(timeout_secs) = gateway.timeout_secs {
                    self.upstream.gateway.timeout_secs = timeout_secs;
                }
                if let Some(max_retries) = gateway.max_retries {
                    self.upstream.gateway.max_retries = max_retries;
                }
            }
        }

        if let Some(member) = patch.member {
            if let Some(base_url) = member.base_url {
                self.member.base_url = base_url;
            }
            if let Some(timeout_secs) = member.timeout_secs {
                self.member.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key_value));
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(session) = patch.session {
            if let Some(ttl_secs) = session.ttl_secs {
                self.session.ttl_secs = ttl_secs;
            }
        }

        if let Some(flow) = patch.flow {
            if let Some(plate_concurrency) = flow.plate_concurrency {
                self.flow.plate_concurrency = plate_concurrency;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("VALET_AIBEE_BASE_URL") {
            self.upstream.aibee.base_url = value;
        }
        if let Some(value) = read_env("VALET_AIBEE_GROUP_ID") {
            self.upstream.aibee.group_id = value;
        }
        if let Some(value) = read_env("VALET_AIBEE_API_KEY") {
            self.upstream.aibee.api_key = secret_value(value);
        }
        if let Some(value) = read_env("VALET_AIBEE_API_SECRET") {
            self.upstream.aibee.api_secret = secret_value(value);
        }
        if let Some(value) = read_env("VALET_AIBEE_TIMEOUT_SECS") {
            self.upstream.aibee.timeout_secs = parse_u64("VALET_AIBEE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("VALET_AIBEE_MAX_RETRIES") {
            self.upstream.aibee.max_retries = parse_u32("VALET_AIBEE_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("VALET_GATEWAY_BASE_URL") {
            self.upstream.gateway.base_url = value;
        }
        if let Some(value) = read_env("VALET_GATEWAY_APP_KEY") {
            self.upstream.gateway.app_key = value;
        }
        if let Some(value) = read_env("VALET_GATEWAY_SECRET") {
            self.upstream.gateway.secret = secret_value(value);
        }
        if let Some(value) = read_env("VALET_GATEWAY_STORE_ID") {
            self.upstream.gateway.store_id = value;
        }
        if let Some(value) = read_env("VALET_GATEWAY_TIMEOUT_SECS") {
            self.upstream.gateway.timeout_secs = parse_u64("VALET_GATEWAY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("VALET_GATEWAY_MAX_RETRIES") {
            self.upstream.gateway.max_retries = parse_u32("VALET_GATEWAY_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("VALET_MEMBER_BASE_URL") {
            self.member.base_url = value;
        }
        if let Some(value) = read_env("VALET_MEMBER_TIMEOUT_SECS") {
            self.member.timeout_secs = parse_u64("VALET_MEMBER_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("VALET_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("VALET_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("VALET_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("VALET_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("VALET_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("VALET_SESSION_TTL_SECS") {
            self.session.ttl_secs = parse_u64("VALET_SESSION_TTL_SECS", &value)?;
        }

        if let Some(value) = read_env("VALET_FLOW_PLATE_CONCURRENCY") {
            self.flow.plate_concurrency =
                parse_u64("VALET_FLOW_PLATE_CONCURRENCY", &value)? as usize;
        }

        let log_level = read_env("VALET_LOGGING_LEVEL").or_else(|| read_env("VALET_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("VALET_LOGGING_FORMAT").or_else(|| read_env("VALET_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(group_id) = overrides.aibee_group_id {
            self.upstream.aibee.group_id = group_id;
        }
        if let Some(api_key) = overrides.aibee_api_key {
            self.upstream.aibee.api_key = secret_value(api_key);
        }
        if let Some(api_secret) = overrides.aibee_api_secret {
            self.upstream.aibee.api_secret = secret_value(api_secret);
        }
        if let Some(app_key) = overrides.gateway_app_key {
            self.upstream.gateway.app_key = app_key;
        }
        if let Some(secret) = overrides.gateway_secret {
            self.upstream.gateway.secret = secret_value(secret);
        }
        if let Some(store_id) = overrides.gateway_store_id {
            self.upstream.gateway.store_id = store_id;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_aibee(&self.upstream.aibee)?;
        validate_gateway(&self.upstream.gateway)?;
        validate_member(&self.member)?;
        validate_llm(&self.llm)?;
        validate_session(&self.session)?;
        validate_flow(&self.flow)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("valet.toml"), PathBuf::from("config/valet.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_base_url(section: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{section}.base_url must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_timeout(section: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "{section}.timeout_secs must be in range 1..=300"
        )));
    }
    Ok(())
}

fn validate_aibee(aibee: &AibeeConfig) -> Result<(), ConfigError> {
    validate_base_url("upstream.aibee", &aibee.base_url)?;
    validate_timeout("upstream.aibee", aibee.timeout_secs)?;
    if aibee.group_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "upstream.aibee.group_id is required (the park operator assigns it per site)"
                .to_string(),
        ));
    }
    if aibee.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("upstream.aibee.api_key is required".to_string()));
    }
    if aibee.api_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("upstream.aibee.api_secret is required".to_string()));
    }
    if aibee.max_retries > 10 {
        return Err(ConfigError::Validation(
            "upstream.aibee.max_retries must be at most 10".to_string(),
        ));
    }
    Ok(())
}

fn validate_gateway(gateway: &GatewayConfig) -> Result<(), ConfigError> {
    validate_base_url("upstream.gateway", &gateway.base_url)?;
    validate_timeout("upstream.gateway", gateway.timeout_secs)?;
    if gateway.app_key.trim().is_empty() {
        return Err(ConfigError::Validation("upstream.gateway.app_key is required".to_string()));
    }
    if gateway.secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("upstream.gateway.secret is required".to_string()));
    }
    if gateway.store_id.trim().is_empty() {
        return Err(ConfigError::Validation("upstream.gateway.store_id is required".to_string()));
    }
    if gateway.max_retries > 10 {
        return Err(ConfigError::Validation(
            "upstream.gateway.max_retries must be at most 10".to_string(),
        ));
    }
    Ok(())
}

fn validate_member(member: &MemberConfig) -> Result<(), ConfigError> {
    validate_base_url("member", &member.base_url)?;
    validate_timeout("member", member.timeout_secs)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    validate_base_url("llm", &llm.base_url)?;
    validate_timeout("llm", llm.timeout_secs)?;
    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model is required".to_string()));
    }
    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "session.ttl_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_flow(flow: &FlowConfig) -> Result<(), ConfigError> {
    if flow.plate_concurrency == 0 || flow.plate_concurrency > 16 {
        return Err(ConfigError::Validation(
            "flow.plate_concurrency must be in range 1..=16".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    upstream: Option<UpstreamPatch>,
    member: Option<MemberPatch>,
    llm: Option<LlmPatch>,
    session: Option<SessionPatch>,
    flow: Option<FlowPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamPatch {
    aibee: Option<AibeePatch>,
    gateway: Option<GatewayPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AibeePatch {
    base_url: Option<String>,
    group_id: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayPatch {
    base_url: Option<String>,
    app_key: Option<String>,
    secret: Option<String>,
    store_id: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct MemberPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FlowPatch {
    plate_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

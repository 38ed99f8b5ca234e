use secrecy::ExposeSecret;
use valet_core::config::{AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines =
        vec!["effective config (source precedence: overrides > env > file > default):".to_string()];

    lines.push(entry("upstream.aibee.base_url", &config.upstream.aibee.base_url, "VALET_AIBEE_BASE_URL"));
    lines.push(entry("upstream.aibee.group_id", &config.upstream.aibee.group_id, "VALET_AIBEE_GROUP_ID"));
    lines.push(entry(
        "upstream.aibee.api_key",
        &redact(config.upstream.aibee.api_key.expose_secret()),
        "VALET_AIBEE_API_KEY",
    ));
    lines.push(entry(
        "upstream.aibee.api_secret",
        &redact(config.upstream.aibee.api_secret.expose_secret()),
        "VALET_AIBEE_API_SECRET",
    ));
    lines.push(entry(
        "upstream.aibee.timeout_secs",
        &config.upstream.aibee.timeout_secs.to_string(),
        "VALET_AIBEE_TIMEOUT_SECS",
    ));

    lines.push(entry("upstream.gateway.base_url", &config.upstream.gateway.base_url, "VALET_GATEWAY_BASE_URL"));
    lines.push(entry("upstream.gateway.app_key", &config.upstream.gateway.app_key, "VALET_GATEWAY_APP_KEY"));
    lines.push(entry(
        "upstream.gateway.secret",
        &redact(config.upstream.gateway.secret.expose_secret()),
        "VALET_GATEWAY_SECRET",
    ));
    lines.push(entry("upstream.gateway.store_id", &config.upstream.gateway.store_id, "VALET_GATEWAY_STORE_ID"));

    lines.push(entry("member.base_url", &config.member.base_url, "VALET_MEMBER_BASE_URL"));

    lines.push(entry("llm.base_url", &config.llm.base_url, "VALET_LLM_BASE_URL"));
    lines.push(entry("llm.model", &config.llm.model, "VALET_LLM_MODEL"));
    let llm_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact(key.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    lines.push(entry("llm.api_key", &llm_key, "VALET_LLM_API_KEY"));

    lines.push(entry("session.ttl_secs", &config.session.ttl_secs.to_string(), "VALET_SESSION_TTL_SECS"));
    lines.push(entry(
        "flow.plate_concurrency",
        &config.flow.plate_concurrency.to_string(),
        "VALET_FLOW_PLATE_CONCURRENCY",
    ));
    lines.push(entry("logging.level", &config.logging.level, "VALET_LOGGING_LEVEL"));
    lines.push(entry(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        "VALET_LOGGING_FORMAT",
    ));

    lines.join("\n")
}

fn entry(key: &str, value: &str, env_var: &str) -> String {
    format!("  {key} = {value} (env: {env_var})")
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "(unset)".to_string();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}****")
}

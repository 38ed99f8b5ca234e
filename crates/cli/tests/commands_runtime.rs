use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use valet_cli::commands::{config, doctor};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const VALID_ENV: [(&str, &str); 6] = [
    ("VALET_AIBEE_GROUP_ID", "HUALIAN_chengdu_skptfpk"),
    ("VALET_AIBEE_API_KEY", "test-api-key"),
    ("VALET_AIBEE_API_SECRET", "test-api-secret"),
    ("VALET_GATEWAY_APP_KEY", "test-app-key"),
    ("VALET_GATEWAY_SECRET", "test-gateway-secret"),
    ("VALET_GATEWAY_STORE_ID", "880165027498299392"),
];

fn with_env(vars: &[(&str, &str)], run: impl FnOnce()) {
    let lock = ENV_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = lock.lock().expect("env lock is not poisoned");
    for (key, value) in vars {
        env::set_var(key, value);
    }
    run();
    for (key, _) in vars {
        env::remove_var(key);
    }
}

fn parse_report(output: &str) -> Value {
    serde_json::from_str(output).expect("doctor --json output should be valid JSON")
}

#[test]
fn doctor_passes_with_valid_credentials() {
    with_env(&VALID_ENV, || {
        let report = parse_report(&doctor::run(true));

        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().expect("checks array");
        let registry = checks
            .iter()
            .find(|check| check["name"] == "strategy_registry")
            .expect("strategy_registry check present");
        assert_eq!(registry["status"], "pass");
        assert!(registry["details"].as_str().unwrap_or_default().contains("702"));
        assert!(registry["details"].as_str().unwrap_or_default().contains("801"));
    });
}

#[test]
fn doctor_reports_config_failure_without_credentials() {
    with_env(&[], || {
        let report = parse_report(&doctor::run(true));

        assert_eq!(report["overall_status"], "fail");
        let checks = report["checks"].as_array().expect("checks array");
        let config_check = checks
            .iter()
            .find(|check| check["name"] == "config_validation")
            .expect("config_validation check present");
        assert_eq!(config_check["status"], "fail");
        let registry = checks
            .iter()
            .find(|check| check["name"] == "strategy_registry")
            .expect("strategy_registry check present");
        assert_eq!(registry["status"], "skipped");
    });
}

#[test]
fn doctor_human_output_lists_every_check() {
    with_env(&VALID_ENV, || {
        let output = doctor::run(false);

        assert!(output.contains("prompt_catalog"));
        assert!(output.contains("session_store"));
        assert!(output.contains("config_validation"));
        assert!(output.contains("strategy_registry"));
    });
}

#[test]
fn config_output_redacts_secrets() {
    with_env(&VALID_ENV, || {
        let output = config::run();

        assert!(output.contains("upstream.aibee.api_secret"));
        assert!(output.contains("test****"));
        assert!(!output.contains("test-api-secret"));
        assert!(!output.contains("test-gateway-secret"));
    });
}

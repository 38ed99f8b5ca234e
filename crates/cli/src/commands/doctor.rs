use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use valet_core::config::{AppConfig, LoadOptions};
use valet_core::{InMemorySessionStore, SessionKey, SessionStore, VenueId};
use valet_upstream::{default_registry, CHENGDU_SKP};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    checks.push(check_prompt_catalog());
    checks.push(check_session_store());

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_strategy_registry(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "strategy_registry",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_prompt_catalog() -> DoctorCheck {
    let catalog = match valet_agent::PromptCatalog::with_defaults() {
        Ok(catalog) => catalog,
        Err(error) => {
            return DoctorCheck {
                name: "prompt_catalog",
                status: CheckStatus::Fail,
                details: format!("built-in templates failed to compile: {error}"),
            };
        }
    };

    let sample = json!({
        "utterance": "辽A66D6J在哪",
        "car_list": [{
            "venue": 702,
            "plate": "辽A66D6J",
            "parking_time": "2 hours 5 minutes",
            "parking_fee": "5.00",
            "end_floor": "B2",
            "end_position": "A001",
            "end_name": "B2-A001"
        }]
    });

    for template in [
        valet_agent::prompts::FIND_CAR_RESULT,
        valet_agent::prompts::FIND_CAR_MULTI_RESULT,
        valet_agent::prompts::FIND_CAR_NOT_FOUND,
        valet_agent::prompts::FIND_CAR_UNSUPPORTED_VENUE,
    ] {
        if let Err(error) = catalog.render(template, VenueId(702), &sample) {
            return DoctorCheck {
                name: "prompt_catalog",
                status: CheckStatus::Fail,
                details: format!("template `{template}` did not render: {error}"),
            };
        }
    }

    DoctorCheck {
        name: "prompt_catalog",
        status: CheckStatus::Pass,
        details: "all built-in templates render".to_string(),
    }
}

fn check_strategy_registry(config: &AppConfig) -> DoctorCheck {
    match default_registry(config) {
        Ok(registry) => {
            if registry.create(CHENGDU_SKP).is_err() {
                return DoctorCheck {
                    name: "strategy_registry",
                    status: CheckStatus::Fail,
                    details: "built-in venue is missing from the default registry".to_string(),
                };
            }
            let venues = registry
                .venues()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            DoctorCheck {
                name: "strategy_registry",
                status: CheckStatus::Pass,
                details: format!("registered venues: {venues}"),
            }
        }
        Err(error) => DoctorCheck {
            name: "strategy_registry",
            status: CheckStatus::Fail,
            details: format!("failed to build upstream clients: {error}"),
        },
    }
}

fn check_session_store() -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "session_store",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let store = InMemorySessionStore::new();
        let key = SessionKey::new(VenueId(0), "doctor");
        store
            .set(&key, "probe", json!("ok"), Duration::from_secs(5))
            .await
            .map_err(|error| error.to_string())?;
        let value = store.get(&key, "probe").await.map_err(|error| error.to_string())?;
        if value != Some(json!("ok")) {
            return Err("probe value did not round-trip".to_string());
        }
        store.clear(&key).await.map_err(|error| error.to_string())?;
        Ok::<(), String>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "session_store",
            status: CheckStatus::Pass,
            details: "set/get/clear round-trip succeeded".to_string(),
        },
        Err(details) => DoctorCheck { name: "session_store", status: CheckStatus::Fail, details },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

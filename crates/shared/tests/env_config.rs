use std::env;

use serial_test::serial;
use shared::config::{ApiConfig, ConfigError, LogFormat};
use shared::llm::{OpenAiConfigError, OpenAiGatewayConfig};

const MANAGED_VARS: [&str; 7] = [
    "API_BIND_ADDR",
    "API_MAX_BODY_BYTES",
    "LOG_FORMAT",
    "OPENAI_API_KEY",
    "OPENAI_CHAT_COMPLETIONS_URL",
    "OPENAI_MODEL",
    "OPENAI_TIMEOUT_MS",
];

fn clear_env() {
    for key in MANAGED_VARS {
        unsafe { env::remove_var(key) };
    }
}

fn set_env(key: &str, value: &str) {
    unsafe { env::set_var(key, value) };
}

#[test]
#[serial]
fn api_config_uses_defaults_when_unset() {
    clear_env();

    let config = ApiConfig::from_env().expect("defaults should load");
    assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
    assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    assert_eq!(LogFormat::from_env().expect("default format"), LogFormat::Text);
}

#[test]
#[serial]
fn api_config_rejects_bad_values() {
    clear_env();
    set_env("API_MAX_BODY_BYTES", "lots");
    assert!(matches!(
        ApiConfig::from_env(),
        Err(ConfigError::ParseInt(ref key)) if key == "API_MAX_BODY_BYTES"
    ));

    clear_env();
    set_env("API_BIND_ADDR", "localhost");
    assert!(matches!(
        ApiConfig::from_env(),
        Err(ConfigError::InvalidConfiguration(_))
    ));

    clear_env();
    set_env("LOG_FORMAT", "yaml");
    assert!(LogFormat::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn openai_config_requires_api_key() {
    clear_env();
    set_env("OPENAI_API_KEY", "   ");

    assert!(matches!(
        OpenAiGatewayConfig::from_env(),
        Err(OpenAiConfigError::MissingApiKey)
    ));
    clear_env();
}

#[test]
#[serial]
fn openai_config_reads_overrides() {
    clear_env();
    set_env("OPENAI_API_KEY", "sk-test");
    set_env("OPENAI_MODEL", "gpt-4o-mini");
    set_env("OPENAI_CHAT_COMPLETIONS_URL", "http://127.0.0.1:9999/v1/chat/completions");
    set_env("OPENAI_TIMEOUT_MS", "1500");

    let config = OpenAiGatewayConfig::from_env().expect("config should load");
    assert_eq!(config.api_key, "sk-test");
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(
        config.chat_completions_url,
        "http://127.0.0.1:9999/v1/chat/completions"
    );
    assert_eq!(config.timeout_ms, Some(1500));
    clear_env();
}

#[test]
#[serial]
fn openai_config_defaults_to_public_endpoint_without_timeout() {
    clear_env();
    set_env("OPENAI_API_KEY", "sk-test");

    let config = OpenAiGatewayConfig::from_env().expect("config should load");
    assert_eq!(
        config.chat_completions_url,
        "https://api.openai.com/v1/chat/completions"
    );
    assert_eq!(config.model, "gpt-4o");
    assert_eq!(config.timeout_ms, None);
    clear_env();
}

#[test]
#[serial]
fn openai_config_rejects_non_http_endpoint() {
    clear_env();
    set_env("OPENAI_API_KEY", "sk-test");
    set_env("OPENAI_CHAT_COMPLETIONS_URL", "file:///etc/passwd");

    assert!(matches!(
        OpenAiGatewayConfig::from_env(),
        Err(OpenAiConfigError::InvalidConfiguration(_))
    ));
    clear_env();
}

use super::*;
use crate::test_support::{env_lock, temp_path};
use platform_windows::BatteryPolicy;
use std::time::Duration;

const ENV_VARS: [&str; 11] = [
    "POSTURE_AUDIT_CONFIG",
    "SUPABASE_URL",
    "SUPABASE_ANON_KEY",
    "POSTURE_USER_ID",
    "POSTURE_DEVICE_ID",
    "POSTURE_IDENTITY_PATH",
    "POSTURE_COMMAND_TIMEOUT_SECS",
    "POSTURE_OSQUERY_PATH",
    "POSTURE_BATTERY_POLICY",
    "POSTURE_DRY_RUN",
    "POSTURE_WAIT_FOR_ENTER",
];

fn clear_env() {
    for v in ENV_VARS {
        std::env::remove_var(v);
    }
}

fn write_config(contents: &str) -> std::path::PathBuf {
    let path = temp_path("config", "toml");
    std::fs::write(&path, contents).expect("write config");
    path
}

const FULL_CONFIG: &str = r#"
[backend]
url = "https://project.example.org"
api_key = "file-key"
report_table = "device_posture"
timeout_secs = 5
max_attempts = 2

[identity]
user_id = "file-user"
path = "/tmp/posture-identity.json"

[detection]
command_timeout_secs = 12
osquery_path = "/opt/osquery/bin/osqueryi"
battery_policy = "min"

[run]
wait_for_enter = true
"#;

#[test]
fn file_config_is_loaded() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();
    let path = write_config(FULL_CONFIG);

    let cfg = AuditConfig::load(&CliOverrides {
        config_path: Some(path.clone()),
        ..CliOverrides::default()
    })
    .expect("load config");

    assert_eq!(cfg.backend_url.as_deref(), Some("https://project.example.org"));
    assert_eq!(cfg.backend_api_key.as_deref(), Some("file-key"));
    assert_eq!(cfg.report_table, "device_posture");
    assert_eq!(cfg.user_table, "user_logs");
    assert_eq!(cfg.user_id.as_deref(), Some("file-user"));
    assert_eq!(
        cfg.identity_path.as_deref(),
        Some(std::path::Path::new("/tmp/posture-identity.json"))
    );
    assert_eq!(cfg.battery_policy, BatteryPolicy::Min);
    assert!(cfg.wait_for_enter);
    assert!(!cfg.dry_run);
    assert_eq!(cfg.config_file.as_deref(), Some(path.as_path()));

    let options = cfg.query_options();
    assert_eq!(options.command_timeout, Duration::from_secs(12));
    assert_eq!(options.osquery_path, "/opt/osquery/bin/osqueryi");

    let settings = cfg
        .backend_settings()
        .expect("credentials present")
        .expect("settings built");
    assert_eq!(settings.timeout, Duration::from_secs(5));
    assert_eq!(settings.max_attempts, 2);

    let _ = std::fs::remove_file(path);
}

#[test]
fn env_overrides_file_config() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();
    let path = write_config(FULL_CONFIG);

    std::env::set_var("POSTURE_AUDIT_CONFIG", &path);
    std::env::set_var("SUPABASE_URL", "https://env.example.org");
    std::env::set_var("POSTURE_USER_ID", "env-user");
    std::env::set_var("POSTURE_BATTERY_POLICY", "max");
    std::env::set_var("POSTURE_COMMAND_TIMEOUT_SECS", "0");
    std::env::set_var("POSTURE_DRY_RUN", "yes");

    let cfg = AuditConfig::load(&CliOverrides::default()).expect("load config");

    assert_eq!(cfg.backend_url.as_deref(), Some("https://env.example.org"));
    assert_eq!(cfg.backend_api_key.as_deref(), Some("file-key"));
    assert_eq!(cfg.user_id.as_deref(), Some("env-user"));
    assert_eq!(cfg.battery_policy, BatteryPolicy::Max);
    assert_eq!(cfg.command_timeout_secs, 12);
    assert!(cfg.dry_run);

    clear_env();
    let _ = std::fs::remove_file(path);
}

#[test]
fn invalid_env_battery_policy_is_ignored() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();
    std::env::set_var("POSTURE_BATTERY_POLICY", "average");

    let cfg = AuditConfig::load(&CliOverrides::default()).expect("load config");
    assert_eq!(cfg.battery_policy, BatteryPolicy::Max);

    clear_env();
}

#[test]
fn cli_flags_switch_modes_on() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();
    std::env::set_var("POSTURE_DRY_RUN", "false");

    let cfg = AuditConfig::load(&CliOverrides {
        dry_run: true,
        wait_for_enter: true,
        config_path: None,
    })
    .expect("load config");

    assert!(cfg.dry_run);
    assert!(cfg.wait_for_enter);

    clear_env();
}

#[test]
fn missing_credentials_are_fatal_outside_dry_run() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let cfg = AuditConfig::load(&CliOverrides::default()).expect("load config");
    let err = cfg.backend_settings().expect_err("no URL configured");
    assert!(err.to_string().contains("SUPABASE_URL"));

    std::env::set_var("SUPABASE_URL", "https://env.example.org");
    let cfg = AuditConfig::load(&CliOverrides::default()).expect("load config");
    let err = cfg.backend_settings().expect_err("no key configured");
    assert!(err.to_string().contains("SUPABASE_ANON_KEY"));

    let cfg = AuditConfig::load(&CliOverrides {
        dry_run: true,
        ..CliOverrides::default()
    })
    .expect("load config");
    assert!(cfg.backend_settings().expect("dry run").is_none());

    clear_env();
}

#[test]
fn explicit_config_path_must_exist() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();

    let missing = temp_path("missing", "toml");
    let err = resolve_config_path(Some(&missing)).expect_err("missing explicit config");
    assert!(err.to_string().contains("does not exist"));

    std::env::set_var("POSTURE_AUDIT_CONFIG", &missing);
    let err = AuditConfig::load(&CliOverrides::default()).expect_err("missing env config");
    assert!(err.to_string().contains("POSTURE_AUDIT_CONFIG"));

    clear_env();
}

#[test]
fn unknown_battery_policy_in_file_is_rejected() {
    let _guard = env_lock().lock().expect("env lock");
    clear_env();
    let path = write_config("[detection]\nbattery_policy = \"average\"\n");

    let err = AuditConfig::load(&CliOverrides {
        config_path: Some(path.clone()),
        ..CliOverrides::default()
    })
    .expect_err("invalid policy");
    assert!(format!("{:#}", err).contains("failed parsing TOML config"));

    let _ = std::fs::remove_file(path);
}

#[test]
fn parse_bool_accepts_common_spellings() {
    for raw in ["1", "true", "YES", " on ", "enabled"] {
        assert!(parse_bool(raw), "{raw}");
    }
    for raw in ["0", "false", "no", "off", ""] {
        assert!(!parse_bool(raw), "{raw}");
    }
}

pub(super) fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub(super) fn env_non_empty(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

pub(super) fn env_u64(name: &str) -> Option<u64> {
    env_non_empty(name).and_then(|v| v.parse::<u64>().ok())
}

pub(super) fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "enabled" | "on"
    )
}

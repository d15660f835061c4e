//! Registry reads through `reg.exe`.

use posture::HostQuery;

use crate::windows_cmd::{invoke, REG_EXE};

/// Read a DWORD value from the registry.
pub fn read_reg_dword(
    host: &impl HostQuery,
    hive: &str,
    subkey: &str,
    value_name: &str,
) -> Option<u32> {
    let output = run_reg_query(host, hive, subkey, value_name)?;
    parse_reg_dword(&output, value_name)
}

fn run_reg_query(host: &impl HostQuery, hive: &str, subkey: &str, value_name: &str) -> Option<String> {
    let full_key = format!(r"{}\{}", hive, subkey);
    let output = host.shell(&reg_query_command(&full_key, value_name));
    if output.is_empty() {
        None
    } else {
        Some(output)
    }
}

pub(crate) fn reg_query_command(full_key: &str, value_name: &str) -> String {
    invoke(REG_EXE, &format!("query '{}' /v {}", full_key, value_name))
}

pub(crate) fn parse_reg_dword(output: &str, value_name: &str) -> Option<u32> {
    let (reg_type, value) = parse_reg_line(output, value_name)?;
    if reg_type != "REG_DWORD" {
        return None;
    }

    let value = value.trim();
    if let Some(hex) = value.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<u32>().ok()
    }
}

fn parse_reg_line(output: &str, value_name: &str) -> Option<(String, String)> {
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };
        if !name.eq_ignore_ascii_case(value_name) {
            continue;
        }

        let Some(reg_type) = parts.next() else {
            continue;
        };
        let value = parts.collect::<Vec<_>>().join(" ");
        if value.is_empty() {
            continue;
        }
        return Some((reg_type.to_string(), value));
    }
    None
}

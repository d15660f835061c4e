//! Antivirus products registered with Windows Security Center.

use posture::{DetectionOutcome, HostQuery};
use tracing::debug;

use crate::windows_cmd::{invoke, WMIC_EXE};

pub(crate) const CIM_ANTIVIRUS_PRODUCTS: &str = "Get-CimInstance -Namespace root/SecurityCenter2 -ClassName AntiVirusProduct -ErrorAction SilentlyContinue | Select-Object -ExpandProperty displayName";
pub(crate) const SECURITY_PRODUCTS_QUERY: &str =
    "SELECT name FROM windows_security_products WHERE type = 'Antivirus';";

pub(crate) fn wmic_antivirus_command() -> String {
    invoke(
        WMIC_EXE,
        r"/node:localhost /namespace:\\root\SecurityCenter2 path AntiVirusProduct Get DisplayName",
    )
}

/// Display names from SecurityCenter2, falling back to `wmic` (removed from
/// recent Windows builds) and then to the osquery security products table.
pub fn check_security_center(host: &impl HostQuery) -> DetectionOutcome<String> {
    let mut names = parse_display_names(&host.shell(CIM_ANTIVIRUS_PRODUCTS));
    if names.is_empty() {
        names = parse_display_names(&host.shell(&wmic_antivirus_command()));
    }
    if names.is_empty() {
        let rows = host.inventory(SECURITY_PRODUCTS_QUERY);
        names = dedupe(rows.column("name").map(str::trim).filter(|n| !n.is_empty()));
    }

    debug!(?names, "security center antivirus products");
    DetectionOutcome::from_label(names.join(", "))
}

/// One product per line; the `DisplayName` header and blank lines are dropped.
pub fn parse_display_names(output: &str) -> Vec<String> {
    dedupe(
        output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.eq_ignore_ascii_case("displayname")),
    )
}

fn dedupe<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

//! Canonical Windows system command paths.
//!
//! Using absolute system paths avoids PATH-search hijacking when the audit
//! runs from an elevated console.

pub(crate) const NET_EXE: &str = r"C:\Windows\System32\net.exe";
pub(crate) const MANAGE_BDE_EXE: &str = r"C:\Windows\System32\manage-bde.exe";
pub(crate) const POWERCFG_EXE: &str = r"C:\Windows\System32\powercfg.exe";
pub(crate) const REG_EXE: &str = r"C:\Windows\System32\reg.exe";
pub(crate) const WMIC_EXE: &str = r"C:\Windows\System32\wbem\wmic.exe";

/// PowerShell call-operator invocation of an absolute executable path.
pub(crate) fn invoke(exe: &str, args: &str) -> String {
    format!("& '{}' {}", exe, args)
}

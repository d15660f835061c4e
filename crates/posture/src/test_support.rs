//! Scripted [`HostQuery`] for detector tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::query::{HostQuery, QueryResult, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Inventory(String),
    Shell(String),
    Env(String),
}

/// Answers queries from canned responses keyed by exact text.
///
/// Unscripted inventory queries return no rows, unscripted shell commands
/// return an empty string and unscripted variables are unset, mirroring how
/// [`crate::SystemQuery`] fails open.
#[derive(Debug, Default)]
pub struct FakeHost {
    inventory: HashMap<String, QueryResult>,
    shell: HashMap<String, String>,
    env: HashMap<String, String>,
    calls: Mutex<Vec<HostCall>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventory(mut self, query: &str, rows: Vec<Row>) -> Self {
        self.inventory
            .insert(query.to_string(), QueryResult::new(rows));
        self
    }

    pub fn with_shell(mut self, command: &str, output: &str) -> Self {
        self.shell.insert(command.to_string(), output.to_string());
        self
    }

    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn inventory_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Inventory(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    pub fn shell_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Shell(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl HostQuery for FakeHost {
    fn inventory(&self, query: &str) -> QueryResult {
        self.record(HostCall::Inventory(query.to_string()));
        self.inventory.get(query).cloned().unwrap_or_default()
    }

    fn shell(&self, command: &str) -> String {
        self.record(HostCall::Shell(command.to_string()));
        self.shell
            .get(command)
            .map(|out| out.trim().to_string())
            .unwrap_or_default()
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.record(HostCall::Env(name.to_string()));
        self.env
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }
}

/// Build an inventory row from column/value pairs.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

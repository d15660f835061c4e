//! User identity bootstrap.
//!
//! The user id comes from configuration, then from the identity file in the
//! home directory, and finally from an interactive prompt whose answer is
//! checked against the backend before it is persisted.

use std::future::Future;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use report_client::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AuditConfig;

pub const IDENTITY_FILE_NAME: &str = ".security-check-config.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityFile {
    user_id: Option<String>,
}

/// Lookup of registered users.
pub trait UserDirectory {
    fn user_exists(&self, user_id: &str) -> impl Future<Output = Result<bool>>;
}

impl UserDirectory for Client {
    async fn user_exists(&self, user_id: &str) -> Result<bool> {
        Client::user_exists(self, user_id).await
    }
}

/// Directory used for dry runs: every id is accepted and nothing is persisted.
pub struct Unverified;

impl UserDirectory for Unverified {
    async fn user_exists(&self, _user_id: &str) -> Result<bool> {
        Ok(true)
    }
}

pub fn identity_path(config: &AuditConfig) -> Option<PathBuf> {
    config
        .identity_path
        .clone()
        .or_else(|| dirs::home_dir().map(|home| home.join(IDENTITY_FILE_NAME)))
}

/// Resolve the user id for this run.
///
/// `persist` controls whether a prompted id is written back to the identity
/// file. Reaching end of input without an id is an error.
pub async fn resolve_user_id<D, R, W>(
    config: &AuditConfig,
    directory: &D,
    persist: bool,
    input: &mut R,
    output: &mut W,
) -> Result<String>
where
    D: UserDirectory,
    R: BufRead,
    W: Write,
{
    if let Some(user_id) = &config.user_id {
        debug!("user id taken from configuration");
        return Ok(user_id.clone());
    }

    let path = identity_path(config);
    if let Some(path) = &path {
        if let Some(user_id) = load_persisted_user_id(path) {
            debug!(path = %path.display(), "user id loaded from identity file");
            return Ok(user_id);
        }
    }

    let user_id = prompt_user_id(directory, input, output).await?;
    if persist {
        if let Some(path) = &path {
            match persist_user_id(path, &user_id) {
                Ok(()) => info!(path = %path.display(), "user id saved"),
                Err(err) => warn!(error = %err, "failed saving user id"),
            }
        }
    }
    Ok(user_id)
}

async fn prompt_user_id<D, R, W>(directory: &D, input: &mut R, output: &mut W) -> Result<String>
where
    D: UserDirectory,
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "Please enter your user ID: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("failed reading user ID")? == 0 {
            anyhow::bail!("could not obtain a valid user ID");
        }

        let user_id = line.trim();
        if user_id.is_empty() {
            writeln!(output, "Error: User ID cannot be empty.")?;
            continue;
        }

        match directory.user_exists(user_id).await {
            Ok(true) => return Ok(user_id.to_string()),
            Ok(false) => writeln!(output, "Error: User ID does not exist.")?,
            Err(err) => {
                warn!(error = %format!("{:#}", err), "user verification failed");
                writeln!(output, "Error verifying user ID: {}", err)?;
            }
        }
    }
}

/// Missing or unreadable identity files yield `None`.
pub fn load_persisted_user_id(path: &Path) -> Option<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed reading identity file");
            return None;
        }
    };

    match serde_json::from_str::<IdentityFile>(&raw) {
        Ok(file) => file.user_id.filter(|id| !id.trim().is_empty()),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring malformed identity file");
            None
        }
    }
}

pub fn persist_user_id(path: &Path, user_id: &str) -> Result<()> {
    let body = serde_json::to_string(&IdentityFile {
        user_id: Some(user_id.to_string()),
    })
    .context("failed serializing identity file")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("failed writing {}", path.display()))
}

//! Vault entry identifiers and enumeration
//!
//! The vault CLI is an external collaborator: it prints one entry id per
//! line and we treat the result as an opaque, possibly duplicated sequence.

use crate::error::{VaultIconError, VaultIconResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::process::Command;
use tracing::{debug, warn};

/// Opaque identifier of a vault entry
///
/// Used verbatim as the cache file stem and as the icon URL path segment,
/// so anything that could escape the cache directory is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    pub fn new(raw: impl Into<String>) -> VaultIconResult<Self> {
        let raw = raw.into();
        let reason = if raw.is_empty() {
            Some("empty")
        } else if raw == "." || raw == ".." {
            Some("relative path component")
        } else if raw.contains(['/', '\\']) {
            Some("contains a path separator")
        } else if raw.contains('\0') {
            Some("contains a NUL byte")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(VaultIconError::InvalidEntryId { id: raw, reason }),
            None => Ok(Self(raw)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntryId {
    type Err = VaultIconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntryId {
    type Error = VaultIconError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of the entry ids to sync
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// List entry ids in vault order
    async fn entries(&self) -> VaultIconResult<Vec<EntryId>>;
}

/// A fixed list is its own source.
#[async_trait]
impl EntrySource for Vec<EntryId> {
    async fn entries(&self) -> VaultIconResult<Vec<EntryId>> {
        Ok(self.clone())
    }
}

/// Enumerates entries by running the vault CLI (`rbw list` by default)
#[derive(Debug, Clone)]
pub struct CommandEntrySource {
    program: String,
    args: Vec<String>,
}

impl CommandEntrySource {
    /// Build from a `[program, args...]` vector
    pub fn from_command(command: &[String]) -> VaultIconResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| VaultIconError::Internal("empty entry command".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl EntrySource for CommandEntrySource {
    async fn entries(&self) -> VaultIconResult<Vec<EntryId>> {
        let command = self.display();
        debug!("Listing entries: {}", command);

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| VaultIconError::command_failed(&command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(VaultIconError::command_exec(command, stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_entry_lines(&stdout))
    }
}

/// Parse one id per line, skipping blanks and ids unsafe as file names
pub fn parse_entry_lines(stdout: &str) -> Vec<EntryId> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match EntryId::new(line) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Skipping entry: {}", e);
                None
            }
        })
        .collect()
}

//! Security gate for tool server launch configurations.
//!
//! Pure validation: decides whether a server configuration is allowed to
//! start. No filesystem or network access happens here; the gate runs
//! before any adapter is created, so a rejected server never spawns a
//! process or opens a stream.

use thiserror::Error;

use toolhub_core::{ServerConfig, TransportKind};

/// Executable names that are safe to launch by bare name.
///
/// These are the common runtime launchers used to start tool servers:
/// package runners, language interpreters, and container runners. Any
/// other command must be given as an absolute path.
pub const SAFE_COMMANDS: &[&str] = &[
    "npx", "node", "bun", "deno", "uv", "uvx", "python", "python3", "ruby", "java", "docker",
    "podman", "cargo",
];

/// Characters that would let a launch string be interpreted as a
/// compound shell command.
const SHELL_METACHARACTERS: &[char] =
    &[';', '|', '&', '`', '$', '(', ')', '<', '>', '\n', '\r'];

/// Reasons a server configuration is refused permission to start.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// The server is not marked trusted.
    #[error("Server '{0}' is not trusted; refusing to start it")]
    Untrusted(String),

    /// A stdio server has no launch command.
    #[error("Server '{0}' has no launch command configured")]
    MissingCommand(String),

    /// An SSE server has no stream URL.
    #[error("Server '{0}' has no SSE url configured")]
    MissingUrl(String),

    /// The command or an argument contains a shell metacharacter.
    #[error("Unsafe shell metacharacter in {what}: {value:?}")]
    UnsafeToken {
        /// Which part of the launch config was rejected.
        what: &'static str,
        /// The offending token.
        value: String,
    },

    /// The command is neither allow-listed nor an absolute path.
    #[error(
        "Command {0:?} is not an allow-listed executable name or an absolute path"
    )]
    CommandNotAllowed(String),
}

/// Whether the server's launch command is permitted to execute at all.
///
/// This exposes the trust rule alone, without the rest of the gate, for
/// advisory use (status displays, pre-flight checks).
#[must_use]
pub const fn is_trusted(config: &ServerConfig) -> bool {
    config.trusted
}

/// Validate a server configuration before starting it.
///
/// Rules are evaluated in order; the first failure wins:
///
/// 1. The server must be trusted.
/// 2. Stdio servers need a non-blank command; SSE servers need a
///    non-blank url (no process is spawned for SSE, so the remaining
///    rules apply to stdio only).
/// 3. Neither the command nor any argument may contain shell
///    metacharacters.
/// 4. The command must be an allow-listed executable name or an
///    absolute path; bare relative names are rejected.
pub fn validate_before_start(config: &ServerConfig) -> Result<(), SecurityError> {
    if !config.trusted {
        return Err(SecurityError::Untrusted(config.name.clone()));
    }

    match config.transport {
        TransportKind::Sse => {
            let has_url = config
                .url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
            if !has_url {
                return Err(SecurityError::MissingUrl(config.name.clone()));
            }
            Ok(())
        }
        TransportKind::Stdio => {
            let command = config.command.trim();
            if command.is_empty() {
                return Err(SecurityError::MissingCommand(config.name.clone()));
            }

            reject_metacharacters("command", command)?;
            for arg in &config.args {
                reject_metacharacters("argument", arg)?;
            }

            if SAFE_COMMANDS.contains(&command) || std::path::Path::new(command).is_absolute() {
                Ok(())
            } else {
                Err(SecurityError::CommandNotAllowed(command.to_string()))
            }
        }
    }
}

fn reject_metacharacters(what: &'static str, value: &str) -> Result<(), SecurityError> {
    if value.contains(SHELL_METACHARACTERS) {
        return Err(SecurityError::UnsafeToken {
            what,
            value: value.to_string(),
        });
    }
    Ok(())
}

//! Credential resolution.
//!
//! Turns the credential flags into [`S3Credentials`] plus a label naming the
//! active identity. Sources are tried in a fixed order, first match wins:
//!
//! 1. `-c` with two or three positional arguments
//! 2. `-E`, reading the standard AWS environment variables
//! 3. `-p`, a profile from the shared credentials file

use std::path::{Path, PathBuf};

use clap::Args;
use s3nav_storage::S3Credentials;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Identity label for credentials given on the command line.
pub const CLI_IDENTITY: &str = "cli";

/// Identity label for credentials read from the environment.
pub const ENV_IDENTITY: &str = "Environment Variables";

/// Profile requested when `-p` is not given.
pub const DEFAULT_PROFILE: &str = "default";

const ACCESS_KEY_VAR: &str = "AWS_ACCESS_KEY_ID";
const SECRET_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";
const CREDENTIALS_FILE_VAR: &str = "AWS_SHARED_CREDENTIALS_FILE";

/// Errors raised while resolving credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Flags and positional arguments do not fit together.
    #[error("{0}")]
    Usage(String),

    /// A required environment variable is unset or empty.
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),

    /// Neither `AWS_SHARED_CREDENTIALS_FILE` nor `HOME` is set.
    #[error("cannot locate the credentials file: neither AWS_SHARED_CREDENTIALS_FILE nor HOME is set")]
    NoCredentialsFile,

    /// The credentials file could not be read.
    #[error("cannot read credentials file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested profile does not exist.
    #[error("profile '{requested}' not found, available profiles: [{}]", available.join(", "))]
    UnknownProfile {
        requested: String,
        available: Vec<String>,
    },

    /// The credentials file has no profiles at all.
    #[error("no profiles found in {}", path.display())]
    NoProfiles { path: PathBuf },

    /// A profile lacks a required key.
    #[error("profile '{profile}' is missing {field}")]
    IncompleteProfile {
        profile: String,
        field: &'static str,
    },
}

/// Credential source selection.
#[derive(Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct CredentialsConfig {
    /// Read credentials from the positional arguments:
    /// access key, secret key and an optional session token.
    #[arg(short = 'c', long = "cli-credentials", conflicts_with = "env")]
    #[serde(default)]
    pub cli_credentials: bool,

    /// Read credentials from AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and
    /// AWS_SESSION_TOKEN.
    #[arg(short = 'E', long = "env")]
    #[serde(default)]
    pub env: bool,

    /// Profile to select from the shared credentials file.
    ///
    /// When `default` is requested but absent, the first profile found is used.
    #[arg(short = 'p', long, env = "AWS_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Access key, secret key and optional session token (requires -c).
    #[arg(value_name = "KEY", num_args = 0..=3)]
    #[serde(skip)]
    pub keys: Vec<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("cli_credentials", &self.cli_credentials)
            .field("env", &self.env)
            .field("profile", &self.profile)
            .field("keys", &format_args!("[{} hidden]", self.keys.len()))
            .finish()
    }
}

/// Credentials ready for the client, with a display label.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    /// Credentials handed to the storage client.
    pub credentials: S3Credentials,
    /// Human-readable name of the identity, for display only.
    pub identity: String,
}

/// One section of the shared credentials file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
}

impl Profile {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn into_resolved(self) -> Result<ResolvedCredentials, CredentialError> {
        let access_key = self.access_key.ok_or_else(|| CredentialError::IncompleteProfile {
            profile: self.name.clone(),
            field: "aws_access_key_id",
        })?;
        let secret_key = self.secret_key.ok_or_else(|| CredentialError::IncompleteProfile {
            profile: self.name.clone(),
            field: "aws_secret_access_key",
        })?;

        Ok(ResolvedCredentials {
            credentials: build_credentials(access_key, secret_key, self.session_token),
            identity: self.name,
        })
    }
}

impl CredentialsConfig {
    /// Validates the flag combination without touching the environment.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.cli_credentials {
            if !(2..=3).contains(&self.keys.len()) {
                return Err(CredentialError::Usage(format!(
                    "-c expects an access key, a secret key and an optional session token, got {} argument(s)",
                    self.keys.len()
                )));
            }
        } else if !self.keys.is_empty() {
            return Err(CredentialError::Usage(
                "positional arguments are only accepted together with -c".into(),
            ));
        }

        Ok(())
    }

    /// Resolves credentials from the process environment.
    pub fn resolve(&self) -> Result<ResolvedCredentials, CredentialError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolves credentials, reading variables through `var`.
    pub fn resolve_with<F>(&self, var: F) -> Result<ResolvedCredentials, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.validate()?;

        let var = |name: &str| var(name).filter(|value| !value.is_empty());

        if self.cli_credentials {
            let mut keys = self.keys.iter().cloned();
            let (Some(access_key), Some(secret_key)) = (keys.next(), keys.next()) else {
                return Err(CredentialError::Usage("missing access key or secret key".into()));
            };

            return Ok(ResolvedCredentials {
                credentials: build_credentials(access_key, secret_key, keys.next()),
                identity: CLI_IDENTITY.to_string(),
            });
        }

        if self.env {
            let access_key =
                var(ACCESS_KEY_VAR).ok_or(CredentialError::MissingVariable(ACCESS_KEY_VAR))?;
            let secret_key =
                var(SECRET_KEY_VAR).ok_or(CredentialError::MissingVariable(SECRET_KEY_VAR))?;

            return Ok(ResolvedCredentials {
                credentials: build_credentials(access_key, secret_key, var(SESSION_TOKEN_VAR)),
                identity: ENV_IDENTITY.to_string(),
            });
        }

        let path = var(CREDENTIALS_FILE_VAR)
            .map(PathBuf::from)
            .or_else(|| var("HOME").map(|home| Path::new(&home).join(".aws").join("credentials")))
            .ok_or(CredentialError::NoCredentialsFile)?;

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            path = %path.display(),
            profile = %self.profile,
            "Reading shared credentials file"
        );

        let contents = std::fs::read_to_string(&path).map_err(|source| CredentialError::Io {
            path: path.clone(),
            source,
        })?;

        let profiles = parse_profiles(&contents);
        if profiles.is_empty() {
            return Err(CredentialError::NoProfiles { path });
        }

        select_profile(profiles, &self.profile)?.into_resolved()
    }

    /// Logs the chosen source without any secret material.
    pub fn log(&self) {
        let source = if self.cli_credentials {
            "arguments"
        } else if self.env {
            "environment"
        } else {
            "profile"
        };

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            source,
            profile = %self.profile,
            "Credential source"
        );
    }
}

fn build_credentials(
    access_key: String,
    secret_key: String,
    session_token: Option<String>,
) -> S3Credentials {
    match session_token {
        Some(token) => S3Credentials::with_session_token(access_key, secret_key, token),
        None => S3Credentials::new(access_key, secret_key),
    }
}

/// Picks `requested` from `profiles`, falling back to the first profile when
/// the default profile is requested but absent.
fn select_profile(mut profiles: Vec<Profile>, requested: &str) -> Result<Profile, CredentialError> {
    if let Some(index) = profiles.iter().position(|p| p.name == requested) {
        return Ok(profiles.swap_remove(index));
    }

    let available: Vec<String> = profiles.iter().map(|p| p.name.clone()).collect();

    if requested == DEFAULT_PROFILE
        && let Some(first) = profiles.into_iter().next()
    {
        return Ok(first);
    }

    Err(CredentialError::UnknownProfile {
        requested: requested.to_string(),
        available,
    })
}

/// Parses an INI-style shared credentials file.
///
/// Keys outside a section and unknown keys are ignored. `#` and `;` start
/// comment lines.
pub fn parse_profiles(contents: &str) -> Vec<Profile> {
    let mut profiles: Vec<Profile> = Vec::new();

    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            profiles.push(Profile::new(name.trim()));
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(profile) = profiles.last_mut() else {
            continue;
        };

        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match key.trim().to_ascii_lowercase().as_str() {
            "aws_access_key_id" => profile.access_key = value,
            "aws_secret_access_key" => profile.secret_key = value,
            "aws_session_token" => profile.session_token = value,
            _ => {}
        }
    }

    profiles
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    const FILE: &str = "\
# work accounts
[staging]
aws_access_key_id = AKIASTAGING
aws_secret_access_key = staging-secret

[prod]
aws_access_key_id=AKIAPROD
aws_secret_access_key=prod-secret
; temporary
aws_session_token = prod-token
region = ap-southeast-2
";

    fn config() -> CredentialsConfig {
        CredentialsConfig {
            cli_credentials: false,
            env: false,
            profile: DEFAULT_PROFILE.to_string(),
            keys: Vec::new(),
        }
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn credentials_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FILE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_profiles() {
        let profiles = parse_profiles(FILE);

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "staging");
        assert_eq!(profiles[0].access_key.as_deref(), Some("AKIASTAGING"));
        assert_eq!(profiles[0].session_token, None);
        assert_eq!(profiles[1].secret_key.as_deref(), Some("prod-secret"));
        assert_eq!(profiles[1].session_token.as_deref(), Some("prod-token"));
    }

    #[test]
    fn cli_arguments_win() {
        let config = CredentialsConfig {
            cli_credentials: true,
            keys: vec!["AKIACLI".into(), "cli-secret".into(), "cli-token".into()],
            ..config()
        };

        let resolved = config
            .resolve_with(env(&[(ACCESS_KEY_VAR, "ignored")]))
            .unwrap();
        assert_eq!(resolved.identity, CLI_IDENTITY);
        assert_eq!(resolved.credentials.access_key(), "AKIACLI");
        assert_eq!(resolved.credentials.session_token(), Some("cli-token"));
    }

    #[test]
    fn cli_flag_needs_two_or_three_arguments() {
        let config = CredentialsConfig {
            cli_credentials: true,
            keys: vec!["AKIACLI".into()],
            ..config()
        };
        assert!(matches!(config.validate(), Err(CredentialError::Usage(_))));
    }

    #[test]
    fn positional_arguments_require_cli_flag() {
        let config = CredentialsConfig {
            keys: vec!["AKIACLI".into(), "cli-secret".into()],
            ..config()
        };
        assert!(matches!(config.validate(), Err(CredentialError::Usage(_))));
    }

    #[test]
    fn environment_credentials() {
        let config = CredentialsConfig {
            env: true,
            ..config()
        };

        let resolved = config
            .resolve_with(env(&[
                (ACCESS_KEY_VAR, "AKIAENV"),
                (SECRET_KEY_VAR, "env-secret"),
            ]))
            .unwrap();
        assert_eq!(resolved.identity, ENV_IDENTITY);
        assert_eq!(resolved.credentials.session_token(), None);

        let missing = config.resolve_with(env(&[(ACCESS_KEY_VAR, "AKIAENV")]));
        assert!(matches!(
            missing,
            Err(CredentialError::MissingVariable(SECRET_KEY_VAR))
        ));
    }

    #[test]
    fn named_profile_from_file() {
        let file = credentials_file();
        let path = file.path().to_str().unwrap();
        let config = CredentialsConfig {
            profile: "prod".into(),
            ..config()
        };

        let resolved = config
            .resolve_with(env(&[(CREDENTIALS_FILE_VAR, path)]))
            .unwrap();
        assert_eq!(resolved.identity, "prod");
        assert_eq!(resolved.credentials.access_key(), "AKIAPROD");
        assert_eq!(resolved.credentials.session_token(), Some("prod-token"));
    }

    #[test]
    fn missing_default_profile_falls_back_to_first() {
        let file = credentials_file();
        let path = file.path().to_str().unwrap();

        let resolved = config()
            .resolve_with(env(&[(CREDENTIALS_FILE_VAR, path)]))
            .unwrap();
        assert_eq!(resolved.identity, "staging");
    }

    #[test]
    fn unknown_profile_lists_available_ones() {
        let file = credentials_file();
        let path = file.path().to_str().unwrap();
        let config = CredentialsConfig {
            profile: "dev".into(),
            ..config()
        };

        let error = config
            .resolve_with(env(&[(CREDENTIALS_FILE_VAR, path)]))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "profile 'dev' not found, available profiles: [staging, prod]"
        );
    }

    #[test]
    fn home_directory_is_used_without_override() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join(".aws")).unwrap();
        std::fs::write(home.path().join(".aws").join("credentials"), FILE).unwrap();

        let resolved = config()
            .resolve_with(env(&[("HOME", home.path().to_str().unwrap())]))
            .unwrap();
        assert_eq!(resolved.identity, "staging");
    }

    #[test]
    fn incomplete_profile_is_an_error() {
        let profiles = parse_profiles("[broken]\naws_access_key_id = AKIA\n");
        let error = select_profile(profiles, "broken")
            .unwrap()
            .into_resolved()
            .unwrap_err();
        assert!(matches!(
            error,
            CredentialError::IncompleteProfile {
                field: "aws_secret_access_key",
                ..
            }
        ));
    }

    #[test]
    fn debug_hides_positional_keys() {
        let config = CredentialsConfig {
            cli_credentials: true,
            keys: vec!["AKIACLI".into(), "cli-secret".into()],
            ..config()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("cli-secret"));
        assert!(debug.contains("2 hidden"));
    }
}

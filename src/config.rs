use anyhow::{Context, Result, bail};
use declarative::{AuthMethod, ConnectionContext};
use graphkit::{ApiVersion, Cloud};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("m365dsc"))
}

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Resolve `--config`, expanding `~`
pub fn resolve_path(explicit: Option<&str>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).as_ref())),
        None => default_config_path(),
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    pub tenant_id: Option<String>,
    pub auth: AuthKind,
    pub application_id: Option<String>,
    pub certificate_thumbprint: Option<String>,
    pub user: Option<String>,
}

/// How the token passed to m365dsc was obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthKind {
    Certificate,
    Secret,
    ManagedIdentity,
    Credentials,
    #[default]
    Token,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    pub cloud: Cloud,
    pub api_version: ApiVersion,
}

impl Config {
    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Load the config named by `--config`, or the default one
    pub fn load(explicit: Option<&str>) -> Result<(Self, PathBuf)> {
        let path = resolve_path(explicit)?;
        let config = Self::load_from(&path)?;
        Ok((config, path))
    }

    /// Check that the chosen auth method has what it needs
    pub fn validate(&self) -> Result<()> {
        let conn = &self.connection;
        let missing = |field: &str| {
            format!(
                "connection.auth = \"{}\" requires connection.{field}",
                conn.auth.name()
            )
        };

        match conn.auth {
            AuthKind::Certificate => {
                if conn.application_id.is_none() {
                    bail!(missing("application_id"));
                }
                if conn.certificate_thumbprint.is_none() {
                    bail!(missing("certificate_thumbprint"));
                }
            }
            AuthKind::Secret => {
                if conn.application_id.is_none() {
                    bail!(missing("application_id"));
                }
            }
            AuthKind::Credentials => {
                if conn.user.is_none() {
                    bail!(missing("user"));
                }
            }
            AuthKind::ManagedIdentity | AuthKind::Token => {}
        }

        if conn.tenant_id.as_deref().is_some_and(|t| t.trim().is_empty()) {
            bail!("connection.tenant_id is empty");
        }
        Ok(())
    }

    pub fn auth_method(&self) -> AuthMethod {
        let conn = &self.connection;
        let application_id = conn.application_id.clone().unwrap_or_default();
        match conn.auth {
            AuthKind::Certificate => AuthMethod::CertificateThumbprint {
                application_id,
                thumbprint: conn.certificate_thumbprint.clone().unwrap_or_default(),
            },
            AuthKind::Secret => AuthMethod::ApplicationSecret { application_id },
            AuthKind::ManagedIdentity => AuthMethod::ManagedIdentity,
            AuthKind::Credentials => AuthMethod::Credentials {
                user: conn.user.clone().unwrap_or_default(),
            },
            AuthKind::Token => AuthMethod::AccessToken,
        }
    }

    /// Build the connection context for one run
    pub fn connection_context(
        &self,
        tenant_override: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<ConnectionContext> {
        let tenant = tenant_override
            .or(self.connection.tenant_id.as_deref())
            .context("No tenant configured (set connection.tenant_id or pass --tenant)")?;

        let ctx = ConnectionContext::new(tenant, self.auth_method());
        Ok(match access_token {
            Some(token) => ctx.with_access_token(token),
            None => ctx,
        })
    }
}

impl AuthKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::Secret => "secret",
            Self::ManagedIdentity => "managed-identity",
            Self::Credentials => "credentials",
            Self::Token => "token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.graph.api_version, ApiVersion::Beta);
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[connection]
tenant_id = "contoso.onmicrosoft.com"
auth = "certificate"
application_id = "00000000-0000-0000-0000-000000000001"
certificate_thumbprint = "ABCDEF"

[graph]
cloud = "usgov"
api_version = "v1.0"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.graph.cloud, Cloud::UsGov);
        assert_eq!(config.graph.api_version, ApiVersion::V1);
        assert!(matches!(
            config.auth_method(),
            AuthMethod::CertificateThumbprint { ref thumbprint, .. } if thumbprint == "ABCDEF"
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[connection]\nclient_secret = \"nope\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_validate_requires_auth_fields() {
        let mut config = Config::default();
        config.connection.auth = AuthKind::Certificate;
        config.connection.application_id = Some("app".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("certificate_thumbprint"));

        config.connection.auth = AuthKind::Credentials;
        assert!(config.validate().unwrap_err().to_string().contains("user"));

        config.connection.auth = AuthKind::ManagedIdentity;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connection_context() {
        let mut config = Config::default();
        assert!(config.connection_context(None, None).is_err());

        config.connection.tenant_id = Some("contoso.onmicrosoft.com".into());
        let ctx = config.connection_context(None, Some("tok")).unwrap();
        assert_eq!(ctx.tenant_id, "contoso.onmicrosoft.com");
        assert_eq!(ctx.access_token(), Some("tok"));

        let ctx = config
            .connection_context(Some("fabrikam.onmicrosoft.com"), None)
            .unwrap();
        assert_eq!(ctx.tenant_id, "fabrikam.onmicrosoft.com");
        assert_eq!(ctx.access_token(), None);
    }

    #[test]
    fn test_resolve_path_expands_tilde() {
        let path = resolve_path(Some("~/m365.toml")).unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("m365.toml"));
    }
}

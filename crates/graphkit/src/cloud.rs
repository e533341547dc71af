//! National clouds and API versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Microsoft cloud hosting the tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    /// Commercial cloud.
    #[default]
    Global,
    /// US Government (GCC High).
    UsGov,
    /// US Department of Defense.
    DoD,
    /// Azure China, operated by 21Vianet.
    China,
}

impl Cloud {
    /// Root URL of the Graph endpoint for this cloud.
    #[must_use]
    pub fn graph_host(&self) -> &'static str {
        match self {
            Self::Global => "https://graph.microsoft.com",
            Self::UsGov => "https://graph.microsoft.us",
            Self::DoD => "https://dod-graph.microsoft.us",
            Self::China => "https://microsoftgraph.chinacloudapi.cn",
        }
    }

    /// Config spelling of this cloud.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::UsGov => "usgov",
            Self::DoD => "dod",
            Self::China => "china",
        }
    }

    /// All supported clouds.
    #[must_use]
    pub fn all() -> &'static [Cloud] {
        &[Self::Global, Self::UsGov, Self::DoD, Self::China]
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cloud {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown cloud '{s}' (expected global, usgov, dod or china)"))
    }
}

/// Graph API version segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiVersion {
    /// Stable `v1.0` endpoint.
    #[serde(rename = "v1.0")]
    V1,
    /// `beta` endpoint, required by several Intune collections.
    #[default]
    #[serde(rename = "beta")]
    Beta,
}

impl ApiVersion {
    /// URL path segment.
    #[must_use]
    pub fn segment(&self) -> &'static str {
        match self {
            Self::V1 => "v1.0",
            Self::Beta => "beta",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1.0" | "v1" => Ok(Self::V1),
            "beta" => Ok(Self::Beta),
            _ => Err(format!("unknown Graph API version '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_parse() {
        assert_eq!("global".parse::<Cloud>().unwrap(), Cloud::Global);
        assert_eq!("USGov".parse::<Cloud>().unwrap(), Cloud::UsGov);
        assert!("mars".parse::<Cloud>().is_err());
    }

    #[test]
    fn test_cloud_hosts() {
        assert_eq!(Cloud::default().graph_host(), "https://graph.microsoft.com");
        for cloud in Cloud::all() {
            assert!(cloud.graph_host().starts_with("https://"));
        }
    }

    #[test]
    fn test_api_version() {
        assert_eq!("v1.0".parse::<ApiVersion>().unwrap(), ApiVersion::V1);
        assert_eq!(ApiVersion::default().to_string(), "beta");
        assert!("v2".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_serde_spelling() {
        let version: ApiVersion = serde_json::from_str("\"v1.0\"").unwrap();
        assert_eq!(version, ApiVersion::V1);
        let cloud: Cloud = serde_json::from_str("\"china\"").unwrap();
        assert_eq!(cloud, Cloud::China);
    }
}

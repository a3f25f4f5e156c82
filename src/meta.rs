// src/meta.rs

//! Vertex identity as a (kind, version, group) triple.
//!
//! Encoded as `kind[.version][.group]`, e.g. `Deployment.v1.apps`.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Best-effort inverse of the `Display` encoding.
    ///
    /// Only strings with at least two `.` separators are understood; the
    /// first segment is the kind, the second the version and the rest
    /// (which may itself contain dots) the group. Anything else yields an
    /// empty `Gvk`.
    pub fn from_dotted(s: &str) -> Self {
        if s.matches('.').count() < 2 {
            return Self::default();
        }
        let mut parts = s.splitn(3, '.');
        let kind = parts.next().unwrap_or_default();
        let version = parts.next().unwrap_or_default();
        let group = parts.next().unwrap_or_default();
        Self::new(group, version, kind)
    }

    /// Build from a Kubernetes-style `apiVersion` (`group/version` or just
    /// `version` for the core group) and a kind.
    pub fn from_api_version_kind(api_version: &str, kind: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };
        Self::new(group, version, kind)
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty() && self.version.is_empty() && self.kind.is_empty()
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_empty() {
            return f.write_str("empty kind in gvk");
        }
        f.write_str(&self.kind)?;
        if !self.version.is_empty() {
            write!(f, ".{}", self.version)?;
        }
        if !self.group.is_empty() {
            write!(f, ".{}", self.group)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_optional_segments() {
        assert_eq!(Gvk::new("apps", "v1", "Deployment").to_string(), "Deployment.v1.apps");
        assert_eq!(Gvk::new("", "v1", "ConfigMap").to_string(), "ConfigMap.v1");
        assert_eq!(Gvk::new("example.com", "", "Widget").to_string(), "Widget.example.com");
        assert_eq!(Gvk::new("apps", "v1", "").to_string(), "empty kind in gvk");
    }

    #[test]
    fn parses_only_with_two_separators() {
        assert_eq!(
            Gvk::from_dotted("Deployment.v1.apps"),
            Gvk::new("apps", "v1", "Deployment")
        );
        assert_eq!(
            Gvk::from_dotted("Ingress.v1.networking.k8s.io"),
            Gvk::new("networking.k8s.io", "v1", "Ingress")
        );
        assert!(Gvk::from_dotted("ConfigMap.v1").is_empty());
        assert!(Gvk::from_dotted("fetch").is_empty());
    }

    #[test]
    fn splits_api_version() {
        assert_eq!(
            Gvk::from_api_version_kind("apps/v1", "Deployment"),
            Gvk::new("apps", "v1", "Deployment")
        );
        assert_eq!(
            Gvk::from_api_version_kind("v1", "Service"),
            Gvk::new("", "v1", "Service")
        );
    }
}

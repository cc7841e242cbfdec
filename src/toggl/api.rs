//! Base URLs for each Toggl API surface.

use crate::config::EndpointsConfig;

/// One of the Toggl REST surfaces this gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSurface {
    V8,
    V9,
    ReportsV2,
    ReportsV3,
    Webhooks,
    Insights,
}

impl ApiSurface {
    pub fn name(self) -> &'static str {
        match self {
            Self::V8 => "v8",
            Self::V9 => "v9",
            Self::ReportsV2 => "reports_v2",
            Self::ReportsV3 => "reports_v3",
            Self::Webhooks => "webhooks",
            Self::Insights => "insights",
        }
    }
}

/// Resolved base URLs with trailing slashes stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase {
    v8: String,
    v9: String,
    reports_v2: String,
    reports_v3: String,
    webhooks: String,
    insights: String,
}

fn trim(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl ApiBase {
    pub fn from_config(endpoints: &EndpointsConfig) -> Self {
        Self {
            v8: trim(&endpoints.v8),
            v9: trim(&endpoints.v9),
            reports_v2: trim(&endpoints.reports_v2),
            reports_v3: trim(&endpoints.reports_v3),
            webhooks: trim(&endpoints.webhooks),
            insights: trim(&endpoints.insights),
        }
    }

    pub fn base(&self, surface: ApiSurface) -> &str {
        match surface {
            ApiSurface::V8 => &self.v8,
            ApiSurface::V9 => &self.v9,
            ApiSurface::ReportsV2 => &self.reports_v2,
            ApiSurface::ReportsV3 => &self.reports_v3,
            ApiSurface::Webhooks => &self.webhooks,
            ApiSurface::Insights => &self.insights,
        }
    }

    /// Join a path onto a surface base with exactly one `/` between them.
    pub fn url(&self, surface: ApiSurface, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return self.base(surface).to_string();
        }
        format!("{}/{path}", self.base(surface))
    }
}

impl Default for ApiBase {
    fn default() -> Self {
        Self::from_config(&EndpointsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bases_match_public_endpoints() {
        let api = ApiBase::default();
        assert_eq!(
            api.url(ApiSurface::V8, "/me"),
            "https://api.track.toggl.com/api/v8/me"
        );
        assert_eq!(
            api.url(ApiSurface::ReportsV2, "weekly"),
            "https://api.track.toggl.com/reports/api/v2/weekly"
        );
        assert_eq!(
            api.url(ApiSurface::Webhooks, "subscriptions/7"),
            "https://track.toggl.com/webhooks/api/v1/subscriptions/7"
        );
        assert_eq!(
            api.base(ApiSurface::Insights),
            "https://api.track.toggl.com/insights/api/v1"
        );
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        let endpoints = EndpointsConfig {
            v9: "http://localhost:8080/api/v9///".into(),
            ..EndpointsConfig::default()
        };
        let api = ApiBase::from_config(&endpoints);
        assert_eq!(api.base(ApiSurface::V9), "http://localhost:8080/api/v9");
        assert_eq!(
            api.url(ApiSurface::V9, "//me"),
            "http://localhost:8080/api/v9/me"
        );
    }

    #[test]
    fn empty_path_returns_base() {
        let api = ApiBase::default();
        assert_eq!(api.url(ApiSurface::V9, ""), api.base(ApiSurface::V9));
    }
}

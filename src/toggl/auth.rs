//! Basic-Auth credentials for the Toggl API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

/// Password Toggl expects alongside an API token.
const API_TOKEN_PASSWORD: &str = "api_token";

/// Credentials sent as HTTP Basic Auth on every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `<token>:api_token`
    ApiToken(String),
    /// `<email>:<password>`
    EmailPassword { email: String, password: String },
}

impl Credentials {
    pub fn api_token(token: impl Into<String>) -> Self {
        Self::ApiToken(token.into())
    }

    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::EmailPassword {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Pick credentials from optional configured values.
    ///
    /// A non-empty API token wins; otherwise both email and password must be
    /// non-empty. Whitespace-only values count as unset.
    pub fn resolve(
        api_token: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Option<Self> {
        let non_empty = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
        };

        if let Some(token) = non_empty(api_token) {
            return Some(Self::ApiToken(token));
        }

        match (non_empty(email), non_empty(password)) {
            (Some(email), Some(password)) => Some(Self::EmailPassword { email, password }),
            _ => None,
        }
    }

    /// Short label for logs and status output.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::ApiToken(_) => "api_token",
            Self::EmailPassword { .. } => "email_password",
        }
    }

    fn user_pass(&self) -> String {
        match self {
            Self::ApiToken(token) => format!("{token}:{API_TOKEN_PASSWORD}"),
            Self::EmailPassword { email, password } => format!("{email}:{password}"),
        }
    }

    /// Base64 of the `user:password` pair.
    pub fn encoded(&self) -> String {
        STANDARD.encode(self.user_pass())
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Basic {}", self.encoded())
    }

    /// Raw secret material, used to scrub upstream error bodies.
    pub(crate) fn secrets(&self) -> Vec<String> {
        let mut secrets = vec![self.encoded()];
        match self {
            Self::ApiToken(token) => secrets.push(token.clone()),
            Self::EmailPassword { password, .. } => secrets.push(password.clone()),
        }
        secrets
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiToken(_) => f.debug_tuple("ApiToken").field(&"<redacted>").finish(),
            Self::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_token_header_uses_api_token_password() {
        let creds = Credentials::api_token("abc123");
        // base64("abc123:api_token")
        assert_eq!(creds.encoded(), "YWJjMTIzOmFwaV90b2tlbg==");
        assert_eq!(
            creds.authorization_header(),
            "Basic YWJjMTIzOmFwaV90b2tlbg=="
        );
    }

    #[test]
    fn email_password_header() {
        let creds = Credentials::email_password("me@example.com", "hunter2");
        let decoded = STANDARD.decode(creds.encoded()).unwrap();
        assert_eq!(decoded, b"me@example.com:hunter2");
    }

    #[test]
    fn resolve_prefers_token() {
        let creds = Credentials::resolve(Some("tok"), Some("a@b.c"), Some("pw")).unwrap();
        assert_eq!(creds, Credentials::api_token("tok"));
    }

    #[test]
    fn resolve_falls_back_to_email_password() {
        let creds = Credentials::resolve(Some("  "), Some("a@b.c"), Some("pw")).unwrap();
        assert_eq!(creds.scheme(), "email_password");
    }

    #[test]
    fn resolve_requires_both_email_and_password() {
        assert!(Credentials::resolve(None, Some("a@b.c"), None).is_none());
        assert!(Credentials::resolve(None, None, Some("pw")).is_none());
        assert!(Credentials::resolve(None, None, None).is_none());
    }

    #[test]
    fn debug_never_prints_secrets() {
        let token = format!("{:?}", Credentials::api_token("supersecret"));
        assert!(!token.contains("supersecret"));

        let pair = format!("{:?}", Credentials::email_password("me@x.io", "hunter2"));
        assert!(pair.contains("me@x.io"));
        assert!(!pair.contains("hunter2"));
    }
}

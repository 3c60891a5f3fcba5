use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A session previously established with the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedSession {
    #[serde(rename = "userId", alias = "username")]
    pub username: String,

    #[serde(rename = "sessionId", alias = "session_id")]
    pub session_id: String,

    #[serde(rename = "expiresAt", alias = "expires_at")]
    pub expires_at: DateTime<Utc>,
}

impl CachedSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// One MFA factor offered during an authentication attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaFactor {
    pub factor: String,
    pub url: String,
}

/// An application linked to the authenticated identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDetail {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub link_url: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub app_instance_id: String,
}

/// A role that can be assumed with a SAML assertion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub arn: String,
    pub principal_arn: String,
}

/// AWS temporary credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl RoleCredentials {
    pub fn expires_in_seconds_at(&self, now: DateTime<Utc>) -> i64 {
        (self.expiration - now).num_seconds().max(0)
    }

    /// Format expiration time as human-readable string
    pub fn expiration_display(&self) -> String {
        self.expiration_display_at(Utc::now())
    }

    pub fn expiration_display_at(&self, now: DateTime<Utc>) -> String {
        let remaining = self.expires_in_seconds_at(now);
        let mins = remaining / 60;
        let secs = remaining % 60;

        if mins >= 60 {
            let hours = mins / 60;
            let remaining_mins = mins % 60;
            format!("{}h {}m", hours, remaining_mins)
        } else if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else if secs > 0 {
            format!("{}s", secs)
        } else {
            "EXPIRED".to_string()
        }
    }
}

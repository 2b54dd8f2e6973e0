//! Best-effort login notifications. Nothing here may block or fail a login.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginKind {
    Login,
    Signup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginNotification {
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: LoginKind,
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

impl LoginNotification {
    pub fn subject(&self) -> String {
        format!("New Login Alert: {} via {}", self.name, self.provider)
    }

    /// Plain-text alert body, stamped with the current time.
    pub fn body(&self) -> String {
        format!(
            "New user activity detected:\nType: {:?} (Login/Signup)\nName: {}\nProvider: {}\nEmail: {}\nPhone: {}\nTime: {}",
            self.kind,
            self.name,
            self.provider,
            or_na(&self.email),
            or_na(&self.phone),
            Utc::now().to_rfc2822(),
        )
    }
}

/// Posts login notifications to a notify endpoint without waiting on them.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    endpoint: String,
}

impl Notifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Send and wait; non-2xx responses are errors.
    pub async fn send(&self, notification: &LoginNotification) -> Result<(), reqwest::Error> {
        self.http
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fire and forget. Failures are logged and swallowed.
    pub fn notify(&self, notification: LoginNotification) -> tokio::task::JoinHandle<()> {
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.send(&notification).await {
                Ok(()) => info!(name = %notification.name, "Login notification sent"),
                Err(e) => error!("Failed to send notification: {}", e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> LoginNotification {
        LoginNotification {
            name: "Asha".into(),
            provider: "Google".into(),
            email: String::new(),
            phone: "9876543210".into(),
            kind: LoginKind::Signup,
        }
    }

    #[test]
    fn wire_format_uses_type_field() {
        let value = serde_json::to_value(notification()).unwrap();
        assert_eq!(value["type"], "Signup");
        assert_eq!(value["provider"], "Google");

        let parsed: LoginNotification =
            serde_json::from_str(r#"{"name":"User","provider":"Credentials","type":"Login"}"#)
                .unwrap();
        assert_eq!(parsed.kind, LoginKind::Login);
        assert_eq!(parsed.email, "");
    }

    #[test]
    fn alert_text_marks_missing_contact_fields() {
        let n = notification();
        assert_eq!(n.subject(), "New Login Alert: Asha via Google");
        let body = n.body();
        assert!(body.contains("Type: Signup"));
        assert!(body.contains("Email: N/A"));
        assert!(body.contains("Phone: 9876543210"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_swallowed() {
        let notifier = Notifier::new("http://127.0.0.1:9/api/auth/notify");
        let handle = notifier.notify(notification());
        assert!(handle.await.is_ok());
    }
}

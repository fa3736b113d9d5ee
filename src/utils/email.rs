use reqwest::Client;
use serde_json::{json, Value};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::config::Config;

/// Errors returned by the mail relay boundary. Callers on the approval and
/// rejection paths log these and carry on; mail never fails an operation.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail relay returned status {0}")]
    Rejected(u16),
}

static HTTP: OnceLock<Client> = OnceLock::new();

fn http() -> &'static Client {
    HTTP.get_or_init(Client::new)
}

/// Message payload for the relay, one recipient set per call.
pub fn approval_message(to: &str, first_name: &str, login_url: &str) -> Value {
    json!({
        "to": [to],
        "subject": "Your author request has been approved",
        "template": "author_request_approved",
        "variables": {
            "first_name": first_name,
            "login_url": login_url,
        }
    })
}

pub fn rejection_message(to: &str, first_name: &str, reason: &str) -> Value {
    json!({
        "to": [to],
        "subject": "Your author request has been reviewed",
        "template": "author_request_rejected",
        "variables": {
            "first_name": first_name,
            "reason": reason,
        }
    })
}

pub fn admin_alert_message(to: &[String], requester_name: &str, request_id: i32) -> Value {
    json!({
        "to": to,
        "subject": format!("New author request from {requester_name}"),
        "template": "author_request_submitted",
        "variables": {
            "requester_name": requester_name,
            "request_id": request_id,
        }
    })
}

async fn post_message(mut message: Value) -> Result<(), MailError> {
    let config = Config::get();
    let Some(url) = config.mail_api_url.clone() else {
        debug!("MAIL_API_URL not set, skipping outbound email");
        return Ok(());
    };

    if let Some(obj) = message.as_object_mut() {
        obj.insert("from".to_string(), json!(config.mail_from));
    }

    let mut req = http().post(&url).json(&message);
    if let Some(key) = &config.mail_api_key {
        req = req.bearer_auth(key);
    }

    let resp = req.send().await?;
    if !resp.status().is_success() {
        return Err(MailError::Rejected(resp.status().as_u16()));
    }
    Ok(())
}

/// Approval email to the promoted user, with the login URL.
pub async fn send_author_approval(to: &str, first_name: &str) -> Result<(), MailError> {
    let login_url = Config::get().login_url.clone();
    post_message(approval_message(to, first_name, &login_url)).await
}

/// Rejection email carrying the admin's reason.
pub async fn send_author_rejection(
    to: &str,
    first_name: &str,
    reason: &str,
) -> Result<(), MailError> {
    post_message(rejection_message(to, first_name, reason)).await
}

/// Broadcast to all admin addresses when a new request lands.
pub async fn send_admin_request_alert(
    to: &[String],
    requester_name: &str,
    request_id: i32,
) -> Result<(), MailError> {
    if to.is_empty() {
        warn!("No admin email addresses on file, skipping request alert");
        return Ok(());
    }
    post_message(admin_alert_message(to, requester_name, request_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_message_carries_login_url() {
        let msg = approval_message("ada@example.org", "Ada", "https://example.org/login");
        assert_eq!(msg["to"][0], "ada@example.org");
        assert_eq!(msg["template"], "author_request_approved");
        assert_eq!(msg["variables"]["login_url"], "https://example.org/login");
    }

    #[test]
    fn rejection_message_carries_reason() {
        let msg = rejection_message("ada@example.org", "Ada", "insufficient evidence");
        assert_eq!(msg["variables"]["reason"], "insufficient evidence");
        assert_eq!(msg["template"], "author_request_rejected");
    }

    #[test]
    fn admin_alert_targets_all_admins() {
        let admins = vec!["a@x.org".to_string(), "b@x.org".to_string()];
        let msg = admin_alert_message(&admins, "Ada Lovelace", 42);
        assert_eq!(msg["to"].as_array().unwrap().len(), 2);
        assert_eq!(msg["variables"]["request_id"], 42);
    }
}

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// A fully constructed outbound message. All text in it comes from the
/// validated submission plus configured addresses.
pub struct OutboundEmail<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: String,
    pub html: String,
    pub reply_to: &'a str,
}

pub struct ResendMailer {
    client: Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Submits the email, returning the provider's message id. A non-success
    /// response is returned with its status and body so the caller can log
    /// it; the body must never reach the end client.
    pub async fn send(&self, email: &OutboundEmail<'_>) -> Result<String, MailSendError> {
        let payload = SendEmailPayload {
            from: email.from,
            to: [email.to],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to,
        };
        let response = self
            .client
            .post(Self::endpoint().as_ref())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(MailSendError::Request)?;
        let status = response.status();
        if status.is_success() {
            let body: SendEmailResponse =
                response.json().await.map_err(MailSendError::Request)?;
            Ok(body.id)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(MailSendError::Rejected { status, body })
        }
    }

    fn endpoint() -> Cow<'static, str> {
        std::env::var("RESEND_API_URL")
            .map(Cow::Owned)
            .unwrap_or(RESEND_API_URL.into())
    }
}

#[derive(Serialize)]
struct SendEmailPayload<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    reply_to: &'a str,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Debug)]
pub enum MailSendError {
    Request(reqwest::Error),
    Rejected { status: StatusCode, body: String },
}

impl std::fmt::Display for MailSendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailSendError::Request(error) => write!(f, "Request error: {error}"),
            MailSendError::Rejected { status, body } => {
                write!(f, "Provider rejected the message with status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for MailSendError {}

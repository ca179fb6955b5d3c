mod config;
mod cors;
mod email_template;
mod resend;
mod validation;

use chrono::Utc;
use config::AppConfig;
use cors::CorsPolicy;
use lambda_http::{
    http::{header, response::Builder, Method, StatusCode},
    run, service_fn, Body, Error, Request, RequestPayloadExt, Response,
};
use resend::{MailSendError, OutboundEmail, ResendMailer};
use serde_json::json;
use tracing::{error, info};
use validation::{InquiryForm, ValidationError};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let handler = InquiryHandler::new(AppConfig::from_env());
    run(service_fn(|event| handler.handle(event))).await
}

struct InquiryHandler {
    config: AppConfig,
    cors: CorsPolicy,
    mailer: Option<ResendMailer>,
}

impl InquiryHandler {
    fn new(config: AppConfig) -> Self {
        let cors = CorsPolicy::new(config.allowed_origins.clone());
        let mailer = config.resend_api_key.as_deref().map(ResendMailer::new);
        Self {
            config,
            cors,
            mailer,
        }
    }

    async fn handle(&self, event: Request) -> Result<Response<Body>, Error> {
        let origin = event
            .headers()
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let allow_origin = self.cors.allow_origin(origin.as_deref());
        if event.method() == Method::OPTIONS {
            // Preflight: no validation, no send.
            return Ok(cors_response(StatusCode::OK, allow_origin.as_deref())
                .body("".into())
                .unwrap());
        }
        if event.method() != Method::POST {
            let error = InquiryError::MethodNotAllowed;
            error.log();
            return Ok(error.into_response(allow_origin.as_deref()));
        }
        match self.process(event).await {
            Ok(()) => Ok(cors_response(StatusCode::OK, allow_origin.as_deref())
                .header(header::CONTENT_TYPE, "application/json")
                .body(json!({ "success": true }).to_string().into())
                .unwrap()),
            Err(error) => {
                error.log();
                Ok(error.into_response(allow_origin.as_deref()))
            }
        }
    }

    async fn process(&self, event: Request) -> Result<(), InquiryError> {
        let (mailer, recipient) = self.outbound_config()?;
        let form: InquiryForm = event
            .payload()
            .map_err(|_| InquiryError::BadRequest("Request body must be valid JSON".into()))?
            .ok_or_else(|| InquiryError::BadRequest("Request body must be valid JSON".into()))?;
        info!("Received inquiry submission");
        let inquiry = form.validate().map_err(InquiryError::Validation)?;
        info!("Inquiry validated, constructing email");
        let submitted_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let html = email_template::render_inquiry_email(&inquiry, &submitted_at)
            .map_err(|e| InquiryError::Unexpected(format!("Error rendering email body: {e}")))?;
        let email = OutboundEmail {
            from: &self.config.sender,
            to: recipient,
            subject: email_template::subject_line(&inquiry),
            html,
            reply_to: inquiry.email.as_str(),
        };
        info!("Dispatching inquiry email");
        let message_id = mailer.send(&email).await.map_err(InquiryError::Delivery)?;
        info!("Inquiry relayed as message {message_id}");
        Ok(())
    }

    fn outbound_config(&self) -> Result<(&ResendMailer, &str), InquiryError> {
        let Some(mailer) = self.mailer.as_ref() else {
            return Err(InquiryError::Configuration("RESEND_API_KEY is not set".into()));
        };
        let Some(recipient) = self.config.recipient.as_deref() else {
            return Err(InquiryError::Configuration("CONTACT_EMAIL is not set".into()));
        };
        Ok((mailer, recipient))
    }
}

fn cors_response(status: StatusCode, allow_origin: Option<&str>) -> Builder {
    let mut builder = Response::builder()
        .status(status)
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .header("Access-Control-Allow-Credentials", "true");
    if let Some(origin) = allow_origin {
        builder = builder.header("Access-Control-Allow-Origin", origin);
    }
    builder
}

#[derive(Debug)]
enum InquiryError {
    MethodNotAllowed,
    Configuration(String),
    BadRequest(String),
    Validation(ValidationError),
    Delivery(MailSendError),
    Unexpected(String),
}

impl InquiryError {
    fn log(&self) {
        match self {
            InquiryError::MethodNotAllowed => {
                error!("Rejected request with unsupported method");
            }
            InquiryError::Configuration(detail) => {
                // The variable name stays server-side; the client sees a
                // generic message.
                error!("Server configuration error: {detail}");
            }
            InquiryError::BadRequest(detail) => {
                error!("Bad inquiry request: {detail}");
            }
            InquiryError::Validation(e) => {
                error!("Inquiry validation failed: {e}");
            }
            InquiryError::Delivery(e) => {
                error!("Failed to relay inquiry email: {e}");
            }
            InquiryError::Unexpected(detail) => {
                error!("Unexpected error processing inquiry: {detail}");
            }
        }
    }

    fn into_response(self, allow_origin: Option<&str>) -> Response<Body> {
        let (status, message) = match &self {
            InquiryError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
            InquiryError::Configuration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error".to_string(),
            ),
            InquiryError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            InquiryError::Validation(e) => (StatusCode::BAD_REQUEST, e.message().to_string()),
            InquiryError::Delivery(_) | InquiryError::Unexpected(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send message. Please try again later.".to_string(),
            ),
        };
        cors_response(status, allow_origin)
            .header(header::CONTENT_TYPE, "application/json")
            .body(
                json!({ "success": false, "error": message })
                    .to_string()
                    .into(),
            )
            .unwrap()
    }
}

impl std::fmt::Display for InquiryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InquiryError::MethodNotAllowed => write!(f, "Method not allowed"),
            InquiryError::Configuration(detail) => write!(f, "Configuration error: {detail}"),
            InquiryError::BadRequest(detail) => write!(f, "Bad request: {detail}"),
            InquiryError::Validation(e) => write!(f, "Validation error: {e}"),
            InquiryError::Delivery(e) => write!(f, "Delivery error: {e}"),
            InquiryError::Unexpected(detail) => write!(f, "Unexpected error: {detail}"),
        }
    }
}

impl std::error::Error for InquiryError {}

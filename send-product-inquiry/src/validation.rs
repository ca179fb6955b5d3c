use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, sync::OnceLock};

/// Product codes the landing page offers. Anything else in the `products`
/// array is dropped before the non-empty check.
pub const RECOGNIZED_PRODUCTS: [&str; 2] = ["CBB60", "CBB61"];

// Deliberately simple: exactly one @, no whitespace on either side, at least
// one dot in the domain. Exotic but valid addresses are rejected; that is an
// accepted limitation.
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).unwrap())
}

/// Text that has been trimmed and HTML-escaped. Only the sanitizers in this
/// module can construct it, so anything downstream which accepts `Sanitized`
/// cannot receive raw user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Sanitized(String);

impl Sanitized {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Sanitized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Replaces the characters meaningful in HTML (`& < > " '` and `/`) with
/// their entity equivalents. Not idempotent: escaping already-escaped text
/// visibly double-escapes, so this is applied exactly once, at the
/// validation boundary.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn sanitize_bounded(raw: Option<&str>, min: usize, max: usize) -> Option<Sanitized> {
    let trimmed = raw?.trim();
    let length = trimmed.chars().count();
    if length < min || length > max {
        return None;
    }
    Some(Sanitized(escape_html(trimmed)))
}

fn sanitize_email(raw: Option<&str>) -> Option<Sanitized> {
    let trimmed = raw?.trim();
    let length = trimmed.chars().count();
    if !(5..=255).contains(&length) {
        return None;
    }
    if !email_regex().is_match(trimmed) {
        return None;
    }
    Some(Sanitized(escape_html(trimmed)))
}

fn sanitize_products(raw: &[String]) -> Option<Vec<Sanitized>> {
    let recognized: Vec<Sanitized> = raw
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| RECOGNIZED_PRODUCTS.contains(entry))
        .map(|entry| Sanitized(escape_html(entry)))
        .collect();
    if recognized.is_empty() {
        None
    } else {
        Some(recognized)
    }
}

/// The raw request body. Every field is optional here; the strongly-typed
/// [`ValidatedInquiry`] only exists once all of them pass validation.
#[derive(Deserialize, Debug)]
pub struct InquiryForm {
    name: Option<String>,
    company: Option<String>,
    email: Option<String>,
    country: Option<String>,
    #[serde(default)]
    products: Vec<String>,
    message: Option<String>,
}

impl InquiryForm {
    /// Validates field by field in a fixed order, returning the first
    /// failure. Every text field of the result is trimmed and HTML-escaped.
    pub fn validate(&self) -> Result<ValidatedInquiry, ValidationError> {
        let name = sanitize_bounded(self.name.as_deref(), 1, 100).ok_or(ValidationError::Name)?;
        let company =
            sanitize_bounded(self.company.as_deref(), 1, 200).ok_or(ValidationError::Company)?;
        let email = sanitize_email(self.email.as_deref()).ok_or(ValidationError::Email)?;
        let country =
            sanitize_bounded(self.country.as_deref(), 1, 100).ok_or(ValidationError::Country)?;
        let products = sanitize_products(&self.products).ok_or(ValidationError::Products)?;
        let message =
            sanitize_bounded(self.message.as_deref(), 10, 5000).ok_or(ValidationError::Message)?;
        Ok(ValidatedInquiry {
            name,
            company,
            email,
            country,
            products,
            message,
        })
    }
}

#[derive(Debug)]
pub struct ValidatedInquiry {
    pub name: Sanitized,
    pub company: Sanitized,
    pub email: Sanitized,
    pub country: Sanitized,
    pub products: Vec<Sanitized>,
    pub message: Sanitized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    Name,
    Company,
    Email,
    Country,
    Products,
    Message,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::Name => "Name must be between 1 and 100 characters",
            ValidationError::Company => "Company must be between 1 and 200 characters",
            ValidationError::Email => "Please provide a valid email address",
            ValidationError::Country => "Country must be between 1 and 100 characters",
            ValidationError::Products => "Please select at least one recognized product",
            ValidationError::Message => "Message must be between 10 and 5000 characters",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

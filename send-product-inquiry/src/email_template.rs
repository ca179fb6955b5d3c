use crate::validation::{Sanitized, ValidatedInquiry};
use serde::Serialize;
use serde_json::Value;
use tinytemplate::{error::Error, format_unescaped, TinyTemplate};

const INQUIRY_TEMPLATE_NAME: &str = "inquiry-email";
const INQUIRY_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/inquiry-email.html"
));

#[derive(Serialize)]
struct Context<'a> {
    name: &'a Sanitized,
    company: &'a Sanitized,
    email: &'a Sanitized,
    country: &'a Sanitized,
    products: String,
    message: &'a Sanitized,
    submitted_at: &'a str,
}

pub fn subject_line(inquiry: &ValidatedInquiry) -> String {
    format!(
        "New product inquiry from {} ({})",
        inquiry.name, inquiry.company
    )
}

/// Renders the notification email body. Everything interpolated here is
/// already escaped — the context only accepts [`Sanitized`] values — so the
/// default formatter must not escape a second time.
pub fn render_inquiry_email(
    inquiry: &ValidatedInquiry,
    submitted_at: &str,
) -> Result<String, Error> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_formatter("render_line_breaks", render_line_breaks);
    tt.add_template(INQUIRY_TEMPLATE_NAME, INQUIRY_TEMPLATE)?;
    let context = Context {
        name: &inquiry.name,
        company: &inquiry.company,
        email: &inquiry.email,
        country: &inquiry.country,
        products: inquiry
            .products
            .iter()
            .map(Sanitized::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        message: &inquiry.message,
        submitted_at,
    };
    tt.render(INQUIRY_TEMPLATE_NAME, &context)
}

fn render_line_breaks(value: &Value, output: &mut String) -> Result<(), Error> {
    let mut formatted = String::new();
    format_unescaped(value, &mut formatted)?;
    output.push_str(&formatted.replace('\n', "<br>"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{render_inquiry_email, subject_line};
    use crate::validation::{InquiryForm, ValidatedInquiry};
    use googletest::prelude::*;

    const SUBMITTED_AT: &str = "2024-06-01 12:00:00 UTC";

    fn inquiry_with(key: &str, value: serde_json::Value) -> ValidatedInquiry {
        let mut payload = serde_json::json!({
            "name": "Jane Doe",
            "company": "Acme Corp",
            "email": "jane@acme.com",
            "country": "USA",
            "products": ["CBB60", "CBB61"],
            "message": "Please send a quote for 50 units."
        });
        payload[key] = value;
        let form: InquiryForm = serde_json::from_value(payload).unwrap();
        form.validate().unwrap()
    }

    fn arbitrary_inquiry() -> ValidatedInquiry {
        inquiry_with("name", "Jane Doe".into())
    }

    #[test]
    fn subject_names_sender_and_company() -> Result<()> {
        verify_that!(
            subject_line(&arbitrary_inquiry()),
            eq("New product inquiry from Jane Doe (Acme Corp)")
        )
    }

    #[test]
    fn renders_all_fields_and_timestamp() -> Result<()> {
        let body = render_inquiry_email(&arbitrary_inquiry(), SUBMITTED_AT).unwrap();

        verify_that!(
            body,
            all!(
                contains_substring("Jane Doe"),
                contains_substring("Acme Corp"),
                contains_substring("jane@acme.com"),
                contains_substring("USA"),
                contains_substring("CBB60, CBB61"),
                contains_substring("Please send a quote for 50 units."),
                contains_substring(SUBMITTED_AT)
            )
        )
    }

    #[test]
    fn renders_line_breaks_in_message() -> Result<()> {
        let inquiry = inquiry_with("message", "First line\nSecond line".into());

        let body = render_inquiry_email(&inquiry, SUBMITTED_AT).unwrap();

        verify_that!(body, contains_substring("First line<br>Second line"))
    }

    #[test]
    fn does_not_escape_sanitized_values_a_second_time() -> Result<()> {
        let inquiry = inquiry_with("company", "Tools & Dies".into());

        let body = render_inquiry_email(&inquiry, SUBMITTED_AT).unwrap();

        verify_that!(
            body,
            all!(
                contains_substring("Tools &amp; Dies"),
                not(contains_substring("&amp;amp;"))
            )
        )
    }

    #[test]
    fn markup_in_the_message_arrives_escaped() -> Result<()> {
        let inquiry = inquiry_with("message", "<script>doEvil();</script>".into());

        let body = render_inquiry_email(&inquiry, SUBMITTED_AT).unwrap();

        verify_that!(body, not(contains_substring("<script>")))
    }

    #[test]
    fn links_the_submitter_email() -> Result<()> {
        let body = render_inquiry_email(&arbitrary_inquiry(), SUBMITTED_AT).unwrap();

        verify_that!(body, contains_substring("mailto:jane@acme.com"))
    }
}

use teloxide::utils::html;

use crate::lookup::{LookupError, LookupResult};

pub const SERVICE_DOWN: &str = "The API service seems to be down. Please try again later.";
pub const CONNECTION_TROUBLE: &str = "I'm having trouble connecting to the API.";
pub const UNEXPECTED_ERROR: &str = "An unexpected error happened. I've logged it.";

const ATTRIBUTION: &str = "— This bot was created by Rahul Sharma";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Plain,
    Html,
}

/// Text to send back to a chat, and how Telegram should render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: Markup,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::Plain,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: Markup::Html,
        }
    }

    /// Greeting for `/start`.
    pub fn welcome(user_name: &str) -> Self {
        Self::plain(format!(
            "Hi {}!\n\n\
             Welcome to the Phone Number Bot. Just send me any phone number \
             and I'll try to find information about it.\n\n\
             {}",
            user_name, ATTRIBUTION
        ))
    }

    /// Render a successful lookup for `subject`.
    pub fn from_result(subject: &str, result: &LookupResult) -> Self {
        // An API-reported error short-circuits everything else
        if let Some(error) = result.error() {
            return Self::plain(format!("Error: {}", error));
        }

        let mut text = format!("<b>Info for {}:</b>\n", html::escape(subject));
        let mut info_found = false;

        for (key, value) in result.usable_fields() {
            text.push_str(&format!(
                "\n<b>{}:</b> {}",
                html::escape(&format_field_name(key)),
                html::escape(&value.to_string())
            ));
            info_found = true;
        }

        if !info_found {
            return Self::plain(format!("No details found for {}.", subject));
        }

        Self::html(text)
    }

    pub fn from_error(error: &LookupError) -> Self {
        match error {
            LookupError::ServiceUnavailable(_) => Self::plain(SERVICE_DOWN),
            LookupError::Connectivity(_) => Self::plain(CONNECTION_TROUBLE),
            LookupError::Unknown(_) => Self::plain(UNEXPECTED_ERROR),
        }
    }
}

/// `mobile_country_code` -> `Mobile Country Code`.
///
/// Underscores become spaces; a letter is upper-cased when it starts a word
/// (follows a non-letter) and lower-cased otherwise.
pub fn format_field_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut word_start = true;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(subject: &str, body: &str) -> Reply {
        Reply::from_result(subject, &LookupResult::parse(body).unwrap())
    }

    #[test]
    fn test_format_field_name() {
        assert_eq!(format_field_name("mobile_country_code"), "Mobile Country Code");
        assert_eq!(format_field_name("name"), "Name");
        assert_eq!(format_field_name("SIM_TYPE"), "Sim Type");
        assert_eq!(format_field_name("line2_address"), "Line2 Address");
    }

    #[test]
    fn test_format_field_name_is_idempotent() {
        let once = format_field_name("mobile_country_code");
        assert_eq!(format_field_name(&once), once);
    }

    #[test]
    fn test_api_error_short_circuits() {
        let reply = render("12345", r#"{"error": "Invalid number", "name": "Alice"}"#);
        assert_eq!(reply, Reply::plain("Error: Invalid number"));
    }

    #[test]
    fn test_sentinels_are_filtered() {
        let reply = render(
            "+15551234",
            r#"{"name": "Alice", "carrier": "NA", "location": ""}"#,
        );
        assert_eq!(reply.markup, Markup::Html);
        assert_eq!(
            reply.text,
            "<b>Info for +15551234:</b>\n\n<b>Name:</b> Alice"
        );
        assert!(!reply.text.contains("Carrier"));
        assert!(!reply.text.contains("Location"));
    }

    #[test]
    fn test_fields_render_in_response_order() {
        let reply = render(
            "999",
            r#"{"sim_type": "Prepaid", "mobile_country_code": 404}"#,
        );
        assert_eq!(
            reply.text,
            "<b>Info for 999:</b>\n\n<b>Sim Type:</b> Prepaid\n<b>Mobile Country Code:</b> 404"
        );
    }

    #[test]
    fn test_no_usable_fields() {
        let reply = render("hello there", r#"{"carrier": "N/A", "location": "  "}"#);
        assert_eq!(reply, Reply::plain("No details found for hello there."));

        let reply = render("<b>x</b>", "{}");
        assert_eq!(reply, Reply::plain("No details found for <b>x</b>."));
    }

    #[test]
    fn test_html_is_escaped() {
        let reply = render("<1&2>", r#"{"owner_name": "Tom & <Jerry>"}"#);
        assert_eq!(
            reply.text,
            "<b>Info for &lt;1&amp;2&gt;:</b>\n\n<b>Owner Name:</b> Tom &amp; &lt;Jerry&gt;"
        );
    }

    #[test]
    fn test_error_replies() {
        let status = LookupError::ServiceUnavailable(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Reply::from_error(&status), Reply::plain(SERVICE_DOWN));

        let unknown = LookupError::Unknown("bad body".to_string());
        assert_eq!(Reply::from_error(&unknown), Reply::plain(UNEXPECTED_ERROR));
    }

    #[test]
    fn test_welcome_mentions_name_and_attribution() {
        let reply = Reply::welcome("Alice");
        assert!(reply.text.starts_with("Hi Alice!"));
        assert!(reply.text.ends_with(ATTRIBUTION));
        assert_eq!(reply.markup, Markup::Plain);
    }
}

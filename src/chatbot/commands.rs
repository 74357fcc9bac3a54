//! Decides what an incoming message is asking for.
//!
//! Routing is a pure function of the text, whether the sender is an admin and
//! whether the message is a reply. Order matters: the first rule that matches
//! wins.

use crate::locale::Locale;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Promote the author of the replied-to message.
    Promote,
    /// Demote the author of the replied-to message.
    Demote,
    Delete { keyword: String },
    Teach { keyword: String, responses: Vec<String> },
    /// A teach command without a keyword or without any response.
    MalformedTeach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Query for the AI proxy, prefix stripped and trimmed (may be empty).
    AiQuery(String),
    Admin(AdminCommand),
    Date,
    /// Image search query, prefix stripped and trimmed (may be empty).
    Image(String),
    /// Fall back to taught keyword responses.
    Keyword,
    /// Admin text that is not a command. Admins get no other replies.
    Ignore,
}

pub fn route(text: &str, sender_is_admin: bool, is_reply: bool, locale: &Locale) -> Route {
    if let Some(query) = text.strip_prefix(locale.ai_prefix.as_str()) {
        return Route::AiQuery(query.trim().to_string());
    }

    if sender_is_admin {
        return match parse_admin_command(text, is_reply, locale) {
            Some(command) => Route::Admin(command),
            None => Route::Ignore,
        };
    }

    if text.contains(locale.date_trigger.as_str()) {
        return Route::Date;
    }

    if let Some(query) = strip_image_prefix(text, &locale.image_prefix) {
        return Route::Image(query);
    }

    Route::Keyword
}

pub fn parse_admin_command(text: &str, is_reply: bool, locale: &Locale) -> Option<AdminCommand> {
    if is_reply && text == locale.promote_command {
        return Some(AdminCommand::Promote);
    }

    if is_reply && text == locale.demote_command {
        return Some(AdminCommand::Demote);
    }

    if let Some(rest) = text.strip_prefix(locale.delete_prefix.as_str()) {
        return Some(AdminCommand::Delete {
            keyword: rest.trim().to_string(),
        });
    }

    if let Some(rest) = text.strip_prefix(locale.teach_prefix.as_str()) {
        return Some(parse_teach(rest, &locale.teach_separator));
    }

    None
}

/// `keyword! response1! response2`
fn parse_teach(payload: &str, separator: &str) -> AdminCommand {
    let mut parts = payload.trim().split(separator);
    let keyword = parts.next().unwrap_or("").trim().to_string();
    let responses: Vec<String> = parts
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if keyword.is_empty() || responses.is_empty() {
        return AdminCommand::MalformedTeach;
    }
    AdminCommand::Teach { keyword, responses }
}

/// Case-insensitive prefix match, one character at a time.
fn strip_image_prefix(text: &str, prefix: &str) -> Option<String> {
    let mut rest = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = rest.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(rest.as_str().trim().to_string())
}

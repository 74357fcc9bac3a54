//! User-facing strings and trigger words.
//!
//! Everything the bot says or listens for lives here so a deployment can
//! override it from the config file. Defaults are Persian.
//!
//! Templates use `{name}` placeholders filled by [`fill`].

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Locale {
    /// Prefix that turns a message into an AI query.
    pub ai_prefix: String,
    /// Reply-command that promotes the replied-to user.
    pub promote_command: String,
    /// Reply-command that demotes the replied-to user.
    pub demote_command: String,
    pub delete_prefix: String,
    pub teach_prefix: String,
    /// Separates the keyword and the responses in a teach command.
    pub teach_separator: String,
    /// Substring that asks for today's date.
    pub date_trigger: String,
    /// Prefix of an image search, compared case-insensitively.
    pub image_prefix: String,

    pub admin_bootstrapped: String,
    pub invalid_query: String,
    pub ai_no_answer: String,
    pub ai_failed: String,
    pub admin_added: String,
    pub admin_exists: String,
    pub admin_removed: String,
    pub not_admin: String,
    pub responses_deleted: String,
    pub responses_not_found: String,
    pub responses_learned: String,
    pub teach_format_error: String,
    pub date_reply: String,
    pub image_not_found: String,
    pub image_failed: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            ai_prefix: "+".into(),
            promote_command: "ادمین".into(),
            demote_command: "عزل".into(),
            delete_prefix: "حذف:".into(),
            teach_prefix: "یاد بگیر:".into(),
            teach_separator: "!".into(),
            date_trigger: "تاریخ".into(),
            image_prefix: "عکس ".into(),

            admin_bootstrapped: "شما به عنوان مدیر انتخاب شدید.".into(),
            invalid_query: "لطفاً یک پرسش معتبر وارد کنید.".into(),
            ai_no_answer: "پاسخی دریافت نشد.".into(),
            ai_failed: "مشکلی در ارتباط با هوش مصنوعی وجود دارد.".into(),
            admin_added: "{name} به عنوان ادمین انتخاب شد.".into(),
            admin_exists: "{name} قبلاً به عنوان ادمین انتخاب شده است.".into(),
            admin_removed: "{name} از ادمینی حذف شد.".into(),
            not_admin: "{name} ادمین نیست.".into(),
            responses_deleted: "پاسخ‌های مربوط به \"{keyword}\" با موفقیت حذف شد.".into(),
            responses_not_found: "هیچ پاسخی برای \"{keyword}\" یافت نشد.".into(),
            responses_learned: "پاسخ‌های جدید به \"{keyword}\" اضافه شد.".into(),
            teach_format_error: "فرمت صحیح نیست. فرمت صحیح: یاد بگیر: ورودی! پاسخ1! پاسخ2".into(),
            date_reply: "تاریخ شمسی: {jalali}\nتاریخ میلادی: {gregorian}".into(),
            image_not_found: "هیچ تصویری برای \"{query}\" یافت نشد.".into(),
            image_failed: "مشکلی در دریافت تصویر وجود دارد.".into(),
        }
    }
}

impl Locale {
    /// Trigger words that must not be empty, by field name.
    pub(crate) fn triggers(&self) -> [(&'static str, &str); 8] {
        [
            ("ai_prefix", self.ai_prefix.as_str()),
            ("promote_command", self.promote_command.as_str()),
            ("demote_command", self.demote_command.as_str()),
            ("delete_prefix", self.delete_prefix.as_str()),
            ("teach_prefix", self.teach_prefix.as_str()),
            ("teach_separator", self.teach_separator.as_str()),
            ("date_trigger", self.date_trigger.as_str()),
            ("image_prefix", self.image_prefix.as_str()),
        ]
    }
}

/// Substitute `{key}` placeholders in a template.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_every_placeholder() {
        let out = fill("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and y and x");
    }

    #[test]
    fn test_fill_leaves_unknown_placeholders() {
        assert_eq!(fill("hi {who}", &[("name", "x")]), "hi {who}");
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let locale: Locale = serde_json::from_str(r#"{"ai_prefix": "?"}"#).unwrap();
        assert_eq!(locale.ai_prefix, "?");
        assert_eq!(locale.date_trigger, Locale::default().date_trigger);
    }
}

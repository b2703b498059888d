//! Message templates for human-readable outcomes
//!
//! Templates use `%count%` and `%limit%` placeholders and `&` colour codes,
//! which are translated to section-sign codes on render.

use ahash::AHashMap;

use crate::notify::outcome::Outcome;

pub const PRE_CLEANUP: &str = "pre-cleanup";
pub const POST_CLEANUP: &str = "post-cleanup";
pub const COMMAND_SUCCESS: &str = "command-success";
pub const COMMAND_FAILED: &str = "command-failed";
pub const CLEANUP_FAILED: &str = "cleanup-failed";
pub const COMMAND_NO_PERMISSION: &str = "command-no-permission";
pub const COMMAND_USAGE: &str = "command-usage";
pub const THRESHOLD_EXCEEDED: &str = "threshold-exceeded";
pub const RELOAD_SUCCESS: &str = "reload-success";

const DEFAULTS: [(&str, &str); 9] = [
    (PRE_CLEANUP, "&eEntities will be cleared shortly."),
    (POST_CLEANUP, "&aCleared %count% entities."),
    (COMMAND_SUCCESS, "&aManual cleanup removed %count% entities."),
    (COMMAND_FAILED, "&cCleanup failed. Removed %count% entities before the failure."),
    (CLEANUP_FAILED, "&cScheduled entity cleanup failed."),
    (COMMAND_NO_PERMISSION, "&cYou do not have permission to use this command."),
    (COMMAND_USAGE, "&cUsage: /clearlag [reload|status]"),
    (THRESHOLD_EXCEEDED, "&cEntity count (&e%count%&c) exceeded the limit (&e%limit%&c)! Clearing now."),
    (RELOAD_SUCCESS, "&aConfiguration reloaded."),
];

/// Template lookup keyed by message name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    templates: AHashMap<String, String>,
}

impl MessageCatalog {
    /// Defaults with the given keys replaced
    pub fn with_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut catalog = Self::default();
        for (key, template) in overrides {
            catalog.templates.insert(key.into(), template.into());
        }
        catalog
    }

    /// Raw template, or a fallback naming the missing key
    pub fn template(&self, key: &str) -> String {
        self.templates
            .get(key)
            .cloned()
            .unwrap_or_else(|| format!("&cMessage key '{}' not found.", key))
    }

    pub fn render(&self, key: &str, count: Option<usize>, limit: Option<usize>) -> String {
        let mut text = self.template(key);
        if let Some(count) = count {
            text = text.replace("%count%", &count.to_string());
        }
        if let Some(limit) = limit {
            text = text.replace("%limit%", &limit.to_string());
        }
        translate_colour_codes(&text)
    }

    pub fn render_outcome(&self, outcome: &Outcome) -> String {
        match *outcome {
            Outcome::CleanupImminent => self.render(PRE_CLEANUP, None, None),
            Outcome::ThresholdExceeded { count, limit } => {
                self.render(THRESHOLD_EXCEEDED, Some(count), Some(limit))
            }
            Outcome::CleanupDone { removed, manual: false } => {
                self.render(POST_CLEANUP, Some(removed), None)
            }
            Outcome::CleanupDone { removed, manual: true } => {
                self.render(COMMAND_SUCCESS, Some(removed), None)
            }
            Outcome::CleanupFailed { removed, manual: false } => {
                self.render(CLEANUP_FAILED, Some(removed), None)
            }
            Outcome::CleanupFailed { removed, manual: true } => {
                self.render(COMMAND_FAILED, Some(removed), None)
            }
        }
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            templates: DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// `&c` -> `\u{a7}c` for every valid colour/format code
pub fn translate_colour_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            if let Some(&code) = chars.peek() {
                if is_colour_code(code) {
                    out.push('\u{a7}');
                    out.push(code.to_ascii_lowercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Drop section-sign codes, for plain console output
pub fn strip_colour_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{a7}' {
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

fn is_colour_code(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_and_colours() {
        let catalog = MessageCatalog::default();
        let text = catalog.render_outcome(&Outcome::ThresholdExceeded { count: 1200, limit: 1000 });
        assert!(text.starts_with("\u{a7}c"));
        assert!(text.contains("1200"));
        assert!(text.contains("1000"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn test_overrides_replace_defaults() {
        let catalog = MessageCatalog::with_overrides([(POST_CLEANUP, "removed %count%")]);
        assert_eq!(
            catalog.render_outcome(&Outcome::CleanupDone { removed: 7, manual: false }),
            "removed 7"
        );
        // untouched keys keep their defaults
        assert!(catalog.render(COMMAND_USAGE, None, None).contains("Usage"));
    }

    #[test]
    fn test_scheduled_failure_has_its_own_template() {
        let catalog = MessageCatalog::default();
        let scheduled = strip_colour_codes(
            &catalog.render_outcome(&Outcome::CleanupFailed { removed: 0, manual: false }),
        );
        let manual = strip_colour_codes(
            &catalog.render_outcome(&Outcome::CleanupFailed { removed: 3, manual: true }),
        );
        assert_eq!(scheduled, "Scheduled entity cleanup failed.");
        assert_eq!(manual, "Cleanup failed. Removed 3 entities before the failure.");
    }

    #[test]
    fn test_missing_key_fallback() {
        let catalog = MessageCatalog::default();
        assert_eq!(
            strip_colour_codes(&catalog.render("nope", None, None)),
            "Message key 'nope' not found."
        );
    }

    #[test]
    fn test_non_codes_left_alone() {
        assert_eq!(translate_colour_codes("R&Z &z &&a"), "R&Z &z &\u{a7}a");
        assert_eq!(strip_colour_codes("\u{a7}aok\u{a7}r"), "ok");
    }
}

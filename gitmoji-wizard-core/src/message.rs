use serde::{Deserialize, Serialize};

/// the details of one commit as collected by the wizard
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitDetails {
    pub emoji: String,
    #[serde(default)]
    pub scope: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
}

impl CommitDetails {
    pub fn new(
        emoji: impl Into<String>,
        scope: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            emoji: emoji.into(),
            scope: scope.into(),
            title: title.into(),
            message: message.into(),
        }
    }
}

/// format commit details as `{emoji} ({scope}): {title}` followed by the
/// optional body, trimmed
pub fn format_message(details: &CommitDetails) -> String {
    let mut message = format!("{} ", details.emoji);
    if !details.scope.is_empty() {
        message.push_str(&format!("({}): ", details.scope));
    }
    message.push_str(&format!("{}\n\n{}", details.title, details.message));
    message.trim().to_string()
}

/// uppercase the first character only, so acronyms like `HTTP` survive
pub fn safe_capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn scope_is_wrapped_in_parentheses() {
        let details = CommitDetails::new("🐛", "parser", "Fix crash", "details here");
        assert_eq!(format_message(&details), "🐛 (parser): Fix crash\n\ndetails here");
    }

    #[test]
    fn empty_scope_drops_the_segment() {
        let details = CommitDetails::new("✨", "", "Add feature", "body");
        assert_eq!(format_message(&details), "✨ Add feature\n\nbody");
    }

    #[test]
    fn empty_message_is_trimmed_away() {
        let details = CommitDetails::new("✨", "", "Add feature", "");
        assert_eq!(format_message(&details), "✨ Add feature");

        let details = CommitDetails::new("📝", "docs", "Update readme", "");
        assert_eq!(format_message(&details), "📝 (docs): Update readme");
    }

    #[test]
    fn simple_mode_prefix_keeps_its_colon() {
        let details = CommitDetails::new("✨ feat:", "", "Add feature", "");
        assert_eq!(format_message(&details), "✨ feat: Add feature");
    }

    #[rstest]
    #[case("", "")]
    #[case("a", "A")]
    #[case("hello", "Hello")]
    #[case("HELLO", "HELLO")]
    #[case("hTTP client", "HTTP client")]
    #[case("éclair", "Éclair")]
    fn capitalizes_only_the_first_character(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(safe_capitalize(input), expected);
    }
}

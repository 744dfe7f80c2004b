//! Text fix-ups applied to the serialized Markdown.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::service::{LineBreaking, Options};
use crate::spoiler::add_spoiler_tags;

/// Backslashes escaping characters that need no escape in the output.
static OVER_ESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\+([<\[.])").expect("valid regex"));

/// Remove backslash escapes in front of `<`, `[` and `.`.
pub fn strip_over_escapes(markdown: &str) -> String {
    OVER_ESCAPED.replace_all(markdown, "$1").into_owned()
}

/// Rewrite blank-line paragraph separators.
pub fn normalize_line_breaks(markdown: &str, linebreaking: LineBreaking) -> String {
    match linebreaking {
        LineBreaking::One => markdown.replace("\n\n", "\n"),
        LineBreaking::Backslash => markdown.replace("\n\n", "\\\n"),
        LineBreaking::Keep => markdown.to_string(),
    }
}

/// Run every post-processing step the options ask for, in order.
pub fn post_process(markdown: &str, options: &Options) -> String {
    let markdown = strip_over_escapes(markdown);
    let markdown = normalize_line_breaks(&markdown, options.linebreaking);
    if options.spoiler {
        add_spoiler_tags(&markdown)
    } else {
        markdown
    }
}

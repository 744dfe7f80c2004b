//! Spoiler markup for quiz questions.
//!
//! Quiz bowl questions pasted into chat are wrapped in `||…||` spoiler
//! markers so readers can reveal them one clue at a time. A **tossup** is a
//! paragraph of clues followed by an `ANSWER:` line; each sentence becomes
//! its own spoiler. A **bonus** has a leadin and three `[10]` parts, each
//! with its own answer line and an `e`/`m`/`h` difficulty tag.
//!
//! Tagged output always ends with a `!t` line.

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Padding placed after every answer inside its spoiler.
pub const PAD: &str = "\t\t\t\t\t";

const QUOTES: &[char] = &['”', '’', '"', '\''];

static DIFFICULTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\\?\[10)([emh])").expect("valid regex"));
static PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\\?\[10\] )(.*)$").expect("valid regex"));
static ANSWER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(ANSWER: )(.*)$").expect("valid regex"));
static ANSWER_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^ANSWER: ").expect("valid regex"));
static LINE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\\?\.\s").expect("valid regex"));

/// Add spoiler markup to a tossup or bonus.
pub fn add_spoiler_tags(text: &str) -> String {
    if is_bonus(text) {
        debug!("Adding spoiler tags to a bonus");
        tag_bonus(text)
    } else {
        debug!("Adding spoiler tags to a tossup");
        tag_tossup(text)
    }
}

/// Bonuses are told apart by their `[10` part markers.
pub fn is_bonus(text: &str) -> bool {
    text.contains("[10")
}

/// Strip the difficulty letters from `[10e]`-style part markers, returning
/// the cleaned text and the letters in order.
pub fn extract_difficulties(text: &str) -> (String, Vec<String>) {
    let mut difficulties = Vec::new();
    let stripped = DIFFICULTY.replace_all(text, |caps: &Captures| {
        difficulties.push(caps[2].to_string());
        caps[1].to_string()
    });
    (stripped.into_owned(), difficulties)
}

fn tag_bonus(text: &str) -> String {
    let (text, difficulties) = extract_difficulties(text);

    // The first part is left readable
    let mut first = true;
    let parts = PART.replace_all(&text, |caps: &Captures| {
        if std::mem::take(&mut first) {
            caps[0].to_string()
        } else {
            format!("{}||{}||", &caps[1], &caps[2])
        }
    });
    let answers = ANSWER.replace_all(&parts, |caps: &Captures| {
        format!("{}||{}{}||", &caps[1], &caps[2], PAD)
    });

    format!(
        "{}\n||{}||\n!t",
        answers.trim_end_matches('\n'),
        difficulties.join("/")
    )
}

fn tag_tossup(text: &str) -> String {
    let answer = match ANSWER_LINE.find(text) {
        Some(answer) => answer,
        None => {
            debug!("Tossup has no ANSWER: line, leaving it unchanged");
            return text.to_string();
        }
    };

    let body = text[..answer.start()].trim_end_matches('\n');
    if body.trim().is_empty() {
        debug!("Tossup has no question text, leaving it unchanged");
        return text.to_string();
    }

    let rest = &text[answer.end()..];
    let (answerline, trailing) = match rest.find('\n') {
        Some(end) => rest.split_at(end),
        None => (rest, ""),
    };
    let trailing = trailing.trim_end_matches('\n');

    let (prefix, body) = match LINE_NUMBER.find(body) {
        Some(number) => body.split_at(number.end()),
        None => ("", body),
    };

    let sentences = split_sentences(body)
        .into_iter()
        .map(|sentence| format!("||{}||", sentence))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{}{}\nANSWER: ||{}{}||{}\n!t",
        prefix, sentences, answerline, PAD, trailing
    )
}

/// Split text at every whitespace character that follows sentence-ending
/// punctuation, optionally followed by a closing quote.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut before: Option<char> = None;
    let mut last: Option<char> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && ends_sentence(before, last) {
            sentences.push(&text[start..i]);
            start = i + c.len_utf8();
        }
        before = last;
        last = Some(c);
    }

    sentences.push(&text[start..]);
    sentences
}

fn ends_sentence(before: Option<char>, last: Option<char>) -> bool {
    let is_terminal = |c: Option<char>| matches!(c, Some('.' | '!' | '?'));
    match last {
        Some(quote) if QUOTES.contains(&quote) => is_terminal(before),
        other => is_terminal(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tossup() {
        let tossup = "This is the first sentence of the tossup. “This is the second sentence of the tossup.” The third line of this tossup, like any of the others, could be split up into multiple spoiler-tagged sections. The fourth line of the tossup is almost the end. For 10 points, what is the answer to this tossup?\nANSWER: answer\n<XY, Category>";
        let expected = format!(
            "||This is the first sentence of the tossup.|| ||“This is the second sentence of the tossup.”|| ||The third line of this tossup, like any of the others, could be split up into multiple spoiler-tagged sections.|| ||The fourth line of the tossup is almost the end.|| ||For 10 points, what is the answer to this tossup?||\nANSWER: ||answer{}||\n<XY, Category>\n!t",
            PAD
        );
        assert_eq!(add_spoiler_tags(tossup), expected);
    }

    #[test]
    fn test_bonus() {
        let bonus = "This is an example of a bonus leadin. For 10 points each:\n[10e] This is an example of an easy part.\nANSWER: easy answerline\n[10m] This is an example of a medium part.\nANSWER: medium answerline\n[10h] This is an example of a hard part.\nANSWER: hard answerline\n<XY, Category>";
        let expected = format!(
            "This is an example of a bonus leadin. For 10 points each:\n[10] This is an example of an easy part.\nANSWER: ||easy answerline{pad}||\n[10] ||This is an example of a medium part.||\nANSWER: ||medium answerline{pad}||\n[10] ||This is an example of a hard part.||\nANSWER: ||hard answerline{pad}||\n<XY, Category>\n||e/m/h||\n!t",
            pad = PAD
        );
        assert_eq!(add_spoiler_tags(bonus), expected);
    }

    #[test]
    fn test_numbered_tossup() {
        assert_eq!(
            add_spoiler_tags("12. One! Two?\nANSWER: x"),
            format!("12. ||One!|| ||Two?||\nANSWER: ||x{}||\n!t", PAD)
        );
        assert_eq!(
            add_spoiler_tags("3\\. Only.\n\nANSWER: y"),
            format!("3\\. ||Only.||\nANSWER: ||y{}||\n!t", PAD)
        );
    }

    #[test]
    fn test_trailing_newlines_dropped() {
        assert_eq!(
            add_spoiler_tags("Q.\nANSWER: a\n<Cat>\n"),
            format!("||Q.||\nANSWER: ||a{}||\n<Cat>\n!t", PAD)
        );
        let bonus = add_spoiler_tags("[10e] a\nANSWER: b\n");
        assert!(bonus.ends_with("ANSWER: ||b\t\t\t\t\t||\n||e||\n!t"));
    }

    #[test]
    fn test_tossup_without_answer_unchanged() {
        assert_eq!(add_spoiler_tags("Just text. More."), "Just text. More.");
        assert_eq!(add_spoiler_tags("ANSWER: alone"), "ANSWER: alone");
    }

    #[test]
    fn test_extract_difficulties() {
        let (text, difficulties) = extract_difficulties("[10e] a\n\\[10m] b\n[10h] c\n[10] d");
        assert_eq!(text, "[10] a\n\\[10] b\n[10] c\n[10] d");
        assert_eq!(difficulties, vec!["e", "m", "h"]);
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(split_sentences("A. B! C? D"), vec!["A.", "B!", "C?", "D"]);
        assert_eq!(split_sentences("He said 'hi.' Then"), vec!["He said 'hi.'", "Then"]);
        assert_eq!(split_sentences("Dr. Who"), vec!["Dr.", "Who"]);
        assert_eq!(split_sentences("a.  b"), vec!["a.", " b"]);
        assert_eq!(split_sentences("no split"), vec!["no split"]);
    }
}

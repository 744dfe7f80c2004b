//! Markdown AST serialization
//!
//! Converts Markdown AST nodes into Markdown text. Blocks are rendered
//! independently and then joined; the number of blank lines between two
//! siblings comes from the configured join rules, falling back to one blank
//! line (or none inside tight list items).

use crate::ast::{Block, Inline, ListItem};
use crate::options::{CodeBlockStyle, ListItemIndent, Options};

/// Where inline content is being written; decides how hard breaks render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Flow,
    Heading,
    Cell,
}

/// Default spacing between sibling blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Spacing {
    Loose,
    Tight,
}

/// Serialize a block to Markdown string
pub fn serialize(block: &Block, options: &Options) -> String {
    let mut output = match block {
        Block::Document(blocks) => serialize_blocks(blocks, options, Spacing::Loose),
        other => serialize_block(other, options),
    };

    let end = output.trim_end_matches('\n').len();
    output.truncate(end);
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

fn serialize_blocks(blocks: &[Block], options: &Options, spacing: Spacing) -> String {
    let mut flat = Vec::with_capacity(blocks.len());
    flatten_blocks(blocks, &mut flat);

    let mut out = String::new();
    let mut previous: Option<&Block> = None;

    for block in flat {
        let text = serialize_block(block, options);
        if text.is_empty() {
            continue;
        }

        if let Some(previous) = previous {
            let blank_lines = join_blank_lines(previous, block, options).unwrap_or(match spacing {
                Spacing::Loose => 1,
                Spacing::Tight => 0,
            });
            for _ in 0..=blank_lines {
                out.push('\n');
            }
        }

        out.push_str(&text);
        previous = Some(block);
    }

    out
}

/// Nested documents contribute their children directly; blank blocks vanish.
fn flatten_blocks<'a>(blocks: &'a [Block], flat: &mut Vec<&'a Block>) {
    for block in blocks {
        match block {
            Block::Document(inner) => flatten_blocks(inner, flat),
            other if other.is_blank() => {}
            other => flat.push(other),
        }
    }
}

fn join_blank_lines(previous: &Block, next: &Block, options: &Options) -> Option<usize> {
    options.join.iter().find_map(|join| join(previous, next))
}

fn serialize_block(block: &Block, options: &Options) -> String {
    match block {
        Block::Document(blocks) => serialize_blocks(blocks, options, Spacing::Loose),

        Block::Heading { level, content } => {
            let text = serialize_inlines(content, options, Context::Heading);
            let text = text.trim();
            if text.is_empty() {
                return String::new();
            }
            let level = (*level).clamp(1, 6) as usize;
            format!("{} {}", "#".repeat(level), text)
        }

        Block::Paragraph(inlines) => {
            let text = serialize_inlines(inlines, options, Context::Flow);
            if text.trim().is_empty() {
                String::new()
            } else {
                escape_block_starts(&text)
            }
        }

        Block::BlockQuote(blocks) => {
            let content = serialize_blocks(blocks, options, Spacing::Loose);
            content
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {}", line)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        }

        Block::List {
            ordered,
            start,
            items,
        } => serialize_list(*ordered, *start, items, options),

        Block::CodeBlock { language, code } => {
            serialize_code_block(language.as_deref(), code, options)
        }

        Block::ThematicBreak => options.rule.clone(),

        Block::Table { headers, rows } => serialize_table(headers, rows, options),

        Block::HtmlBlock(html) => html.trim_end_matches('\n').to_string(),
    }
}

fn serialize_list(ordered: bool, start: u32, items: &[ListItem], options: &Options) -> String {
    let mut lines = Vec::new();

    for (i, item) in items.iter().enumerate() {
        let mut marker = if ordered {
            format!("{}.", start.saturating_add(i as u32))
        } else {
            options.bullet.to_string()
        };
        match options.list_item_indent {
            ListItemIndent::One => marker.push(' '),
            ListItemIndent::Tab => {
                while marker.len() < 4 {
                    marker.push(' ');
                }
            }
        }
        let continuation = " ".repeat(marker.len());

        let content = serialize_blocks(&item.content, options, Spacing::Tight);
        if content.is_empty() {
            lines.push(marker.trim_end().to_string());
            continue;
        }

        for (n, line) in content.lines().enumerate() {
            if n == 0 {
                lines.push(format!("{}{}", marker, line));
            } else if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{}{}", continuation, line));
            }
        }
    }

    lines.join("\n")
}

fn serialize_code_block(language: Option<&str>, code: &str, options: &Options) -> String {
    let code = code.trim_end_matches('\n');

    match options.code_block_style {
        CodeBlockStyle::Fenced => {
            let mut fence = options.fence.clone();
            let fence_char = fence.chars().next().unwrap_or('`');
            while code.contains(fence.as_str()) {
                fence.push(fence_char);
            }
            format!("{}{}\n{}\n{}", fence, language.unwrap_or(""), code, fence)
        }
        CodeBlockStyle::Indented => code
            .lines()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("    {}", line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn serialize_table(headers: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>], options: &Options) -> String {
    let columns = rows
        .iter()
        .map(|row| row.len())
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let render_row = |cells: &[Vec<Inline>]| -> Vec<String> {
        (0..columns)
            .map(|i| cells.get(i).map(|c| cell_text(c, options)).unwrap_or_default())
            .collect()
    };

    let header = render_row(headers);
    let body: Vec<Vec<String>> = rows.iter().map(|row| render_row(row)).collect();

    // Minimum width of 3 for the delimiter row
    let mut widths = vec![3; columns];
    for row in std::iter::once(&header).chain(body.iter()) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| {
                let padding = width.saturating_sub(cell.chars().count());
                format!("{}{}", cell, " ".repeat(padding))
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(format_row(&header));
    let delimiter: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    lines.push(format!("| {} |", delimiter.join(" | ")));
    for row in &body {
        lines.push(format_row(row));
    }

    lines.join("\n")
}

fn cell_text(cell: &[Inline], options: &Options) -> String {
    serialize_inlines(cell, options, Context::Cell)
        .trim()
        .replace('|', "\\|")
}

fn serialize_inlines(inlines: &[Inline], options: &Options, ctx: Context) -> String {
    let mut out = String::new();
    for inline in inlines {
        serialize_inline(inline, options, ctx, &mut out);
    }
    out
}

fn serialize_inline(inline: &Inline, options: &Options, ctx: Context, out: &mut String) {
    match inline {
        Inline::Text(text) => out.push_str(text),

        Inline::Strong(content) => {
            let delimiter: String = [options.strong, options.strong].iter().collect();
            let inner = serialize_inlines(content, options, ctx);
            push_delimited(out, &inner, &delimiter);
        }

        Inline::Emphasis(content) => {
            let inner = serialize_inlines(content, options, ctx);
            // `_` next to `_` would read as strong
            let delimiter = if touches(&inner, options.emphasis) {
                alternate_emphasis(options.emphasis)
            } else {
                options.emphasis
            };
            push_delimited(out, &inner, &delimiter.to_string());
        }

        Inline::Underline(content) => {
            let inner = serialize_inlines(content, options, ctx);
            match options.underline.chars().next() {
                Some(c) if touches(&inner, c) => push_wrapped(out, &inner, "<u>", "</u>"),
                _ => push_delimited(out, &inner, &options.underline),
            }
        }

        Inline::Strikethrough(content) => {
            let inner = serialize_inlines(content, options, ctx);
            push_delimited(out, &inner, "~~");
        }

        Inline::Code(code) => {
            if !code.is_empty() {
                out.push_str(&code_span(code));
            }
        }

        Inline::Link {
            content,
            url,
            title,
        } => {
            out.push('[');
            out.push_str(&serialize_inlines(content, options, ctx));
            out.push_str("](");
            push_destination(out, url, title.as_deref());
            out.push(')');
        }

        Inline::Image { alt, url, title } => {
            out.push_str("![");
            out.push_str(alt);
            out.push_str("](");
            push_destination(out, url, title.as_deref());
            out.push(')');
        }

        Inline::LineBreak => match ctx {
            Context::Flow => out.push_str("\\\n"),
            Context::Heading => out.push(' '),
            Context::Cell => out.push_str("<br>"),
        },

        Inline::HtmlInline(html) => out.push_str(html),
    }
}

/// Wrap `inner` in `delimiter`, keeping surrounding whitespace outside of
/// the markers so the emphasis still parses.
fn push_delimited(out: &mut String, inner: &str, delimiter: &str) {
    push_wrapped(out, inner, delimiter, delimiter);
}

/// Wrap `inner` in `open`/`close`, keeping its edge whitespace outside.
fn push_wrapped(out: &mut String, inner: &str, open: &str, close: &str) {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        out.push_str(inner);
        return;
    }

    let leading = &inner[..inner.len() - inner.trim_start().len()];
    let trailing = &inner[inner.trim_end().len()..];

    out.push_str(leading);
    out.push_str(open);
    out.push_str(trimmed);
    out.push_str(close);
    out.push_str(trailing);
}

/// Whether serialized content starts or ends with `delimiter`, so a
/// surrounding run of the same character would merge with it.
fn touches(inner: &str, delimiter: char) -> bool {
    let trimmed = inner.trim();
    trimmed.starts_with(delimiter) || trimmed.ends_with(delimiter)
}

fn alternate_emphasis(emphasis: char) -> char {
    if emphasis == '_' {
        '*'
    } else {
        '_'
    }
}

fn code_span(code: &str) -> String {
    let longest_run = code
        .chars()
        .fold((0, 0), |(max, current), c| {
            if c == '`' {
                (max.max(current + 1), current + 1)
            } else {
                (max, 0)
            }
        })
        .0;

    let backticks = "`".repeat(longest_run + 1);
    let space = if code.starts_with('`') || code.ends_with('`') {
        " "
    } else {
        ""
    };

    format!("{}{}{}{}{}", backticks, space, code, space, backticks)
}

fn push_destination(out: &mut String, url: &str, title: Option<&str>) {
    if url.contains(char::is_whitespace) || url.contains('(') || url.contains(')') {
        out.push('<');
        out.push_str(url);
        out.push('>');
    } else {
        out.push_str(url);
    }

    if let Some(title) = title {
        out.push_str(" \"");
        out.push_str(&title.replace('"', "\\\""));
        out.push('"');
    }
}

/// Escape characters at the start of a paragraph line that would otherwise
/// open a heading, block quote, list item or ordered list item.
fn escape_block_starts(text: &str) -> String {
    text.split('\n')
        .map(escape_block_start)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_block_start(line: &str) -> String {
    let bytes = line.as_bytes();
    let followed_by_space = |i: usize| bytes.get(i).map_or(true, |b| *b == b' ');

    match bytes.first() {
        Some(b'#') | Some(b'>') => format!("\\{}", line),
        Some(b'-') | Some(b'+') | Some(b'*') if followed_by_space(1) => format!("\\{}", line),
        Some(b'0'..=b'9') => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            let is_marker = digits <= 9
                && matches!(bytes.get(digits), Some(b'.') | Some(b')'))
                && followed_by_space(digits + 1);
            if is_marker {
                format!("{}\\{}", &line[..digits], &line[digits..])
            } else {
                line.to_string()
            }
        }
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_options() -> Options {
        Options::default()
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn paragraph(s: &str) -> Block {
        Block::Paragraph(vec![text(s)])
    }

    fn heading(level: u8, s: &str) -> Block {
        Block::Heading {
            level,
            content: vec![text(s)],
        }
    }

    #[test]
    fn test_paragraph() {
        let result = serialize(&paragraph("Hello World"), &default_options());
        assert_eq!(result, "Hello World\n");
    }

    #[test]
    fn test_heading_atx() {
        let result = serialize(&heading(3, "Section"), &default_options());
        assert_eq!(result, "### Section\n");
    }

    #[test]
    fn test_heading_hard_break_becomes_space() {
        let block = Block::Heading {
            level: 1,
            content: vec![text("One"), Inline::LineBreak, text("Two")],
        };
        assert_eq!(serialize(&block, &default_options()), "# One Two\n");
    }

    #[test]
    fn test_strong_and_emphasis() {
        let mut options = default_options();
        options.emphasis = '_';
        let block = Block::Paragraph(vec![
            Inline::Strong(vec![text("bold")]),
            text(" and "),
            Inline::Emphasis(vec![text("italic")]),
        ]);
        assert_eq!(serialize(&block, &options), "**bold** and _italic_\n");
    }

    #[test]
    fn test_whitespace_moves_outside_delimiters() {
        let block = Block::Paragraph(vec![
            text("a"),
            Inline::Strong(vec![text(" b ")]),
            text("c"),
        ]);
        assert_eq!(serialize(&block, &default_options()), "a **b** c\n");
    }

    #[test]
    fn test_underline_and_strikethrough() {
        let block = Block::Paragraph(vec![
            Inline::Underline(vec![text("under")]),
            text(" "),
            Inline::Strikethrough(vec![text("gone")]),
        ]);
        assert_eq!(serialize(&block, &default_options()), "_under_ ~~gone~~\n");
    }

    #[test]
    fn test_underline_inside_emphasis_stays_apart() {
        let mut options = default_options();
        options.emphasis = '_';

        let underline_in_emphasis = Block::Paragraph(vec![Inline::Emphasis(vec![
            Inline::Underline(vec![text("word")]),
        ])]);
        assert_eq!(serialize(&underline_in_emphasis, &options), "*_word_*\n");

        let emphasis_in_underline = Block::Paragraph(vec![Inline::Underline(vec![
            Inline::Emphasis(vec![text("word")]),
        ])]);
        assert_eq!(serialize(&emphasis_in_underline, &options), "<u>_word_</u>\n");

        let partial = Block::Paragraph(vec![Inline::Emphasis(vec![
            Inline::Underline(vec![text("a")]),
            text(" b"),
        ])]);
        assert_eq!(serialize(&partial, &options), "*_a_ b*\n");
    }

    #[test]
    fn test_inline_code_with_backticks() {
        let block = Block::Paragraph(vec![Inline::Code("a`b".to_string())]);
        assert_eq!(serialize(&block, &default_options()), "``a`b``\n");
    }

    #[test]
    fn test_link() {
        let block = Block::Paragraph(vec![Inline::Link {
            content: vec![text("Example")],
            url: "https://example.com".to_string(),
            title: Some("Say \"hi\"".to_string()),
        }]);
        let result = serialize(&block, &default_options());
        assert_eq!(result, "[Example](https://example.com \"Say \\\"hi\\\"\")\n");
    }

    #[test]
    fn test_image() {
        let block = Block::Paragraph(vec![Inline::Image {
            alt: "Alt text".to_string(),
            url: "image.png".to_string(),
            title: None,
        }]);
        assert_eq!(serialize(&block, &default_options()), "![Alt text](image.png)\n");
    }

    #[test]
    fn test_code_block_indented() {
        let mut options = default_options();
        options.code_block_style = CodeBlockStyle::Indented;
        let block = Block::CodeBlock {
            language: None,
            code: "let x = 1;\n\nlet y = 2;".to_string(),
        };
        assert_eq!(serialize(&block, &options), "    let x = 1;\n\n    let y = 2;\n");
    }

    #[test]
    fn test_code_block_fenced() {
        let block = Block::CodeBlock {
            language: Some("rust".to_string()),
            code: "let x = 1;".to_string(),
        };
        assert_eq!(
            serialize(&block, &default_options()),
            "```rust\nlet x = 1;\n```\n"
        );
    }

    #[test]
    fn test_blockquote() {
        let block = Block::BlockQuote(vec![paragraph("One"), paragraph("Two")]);
        assert_eq!(serialize(&block, &default_options()), "> One\n>\n> Two\n");
    }

    #[test]
    fn test_unordered_list_one_space() {
        let mut options = default_options();
        options.bullet = '-';
        let block = Block::List {
            ordered: false,
            start: 1,
            items: vec![
                ListItem::from_inlines(vec![text("One")]),
                ListItem::from_inlines(vec![text("Two")]),
            ],
        };
        assert_eq!(serialize(&block, &options), "- One\n- Two\n");
    }

    #[test]
    fn test_ordered_list_with_start() {
        let block = Block::List {
            ordered: true,
            start: 3,
            items: vec![
                ListItem::from_inlines(vec![text("Third")]),
                ListItem::from_inlines(vec![text("Fourth")]),
            ],
        };
        assert_eq!(serialize(&block, &default_options()), "3. Third\n4. Fourth\n");
    }

    #[test]
    fn test_nested_list_indent() {
        let mut options = default_options();
        options.bullet = '-';
        let nested = Block::List {
            ordered: false,
            start: 1,
            items: vec![ListItem::from_inlines(vec![text("Inner")])],
        };
        let block = Block::List {
            ordered: true,
            start: 1,
            items: vec![ListItem::new(vec![paragraph("Outer"), nested])],
        };
        assert_eq!(serialize(&block, &options), "1. Outer\n   - Inner\n");
    }

    #[test]
    fn test_tab_list_indent() {
        let mut options = default_options();
        options.list_item_indent = ListItemIndent::Tab;
        let block = Block::List {
            ordered: false,
            start: 1,
            items: vec![ListItem::from_inlines(vec![text("One")])],
        };
        assert_eq!(serialize(&block, &options), "*   One\n");
    }

    #[test]
    fn test_thematic_break() {
        assert_eq!(serialize(&Block::ThematicBreak, &default_options()), "***\n");
    }

    #[test]
    fn test_table() {
        let block = Block::Table {
            headers: vec![vec![text("Name")], vec![text("A|B")]],
            rows: vec![vec![vec![text("x")], vec![text("1")]]],
        };
        let result = serialize(&block, &default_options());
        assert_eq!(
            result,
            "| Name | A\\|B |\n| ---- | ---- |\n| x    | 1    |\n"
        );
    }

    #[test]
    fn test_table_line_break_in_cell() {
        let block = Block::Table {
            headers: vec![vec![text("a"), Inline::LineBreak, text("b")]],
            rows: vec![],
        };
        let result = serialize(&block, &default_options());
        assert!(result.starts_with("| a<br>b |"));
    }

    #[test]
    fn test_document_default_spacing() {
        let doc = Block::Document(vec![paragraph("One"), paragraph("Two")]);
        assert_eq!(serialize(&doc, &default_options()), "One\n\nTwo\n");
    }

    #[test]
    fn test_join_rule_adds_blank_lines() {
        fn two_before_headings(previous: &Block, next: &Block) -> Option<usize> {
            (!previous.is_heading() && next.is_heading()).then_some(2)
        }

        let mut options = default_options();
        options.join.push(two_before_headings);

        let doc = Block::Document(vec![
            heading(1, "Title"),
            paragraph("Intro"),
            heading(2, "Next"),
            heading(3, "Sub"),
        ]);
        assert_eq!(
            serialize(&doc, &options),
            "# Title\n\nIntro\n\n\n## Next\n\n### Sub\n"
        );
    }

    #[test]
    fn test_nested_documents_are_flattened() {
        let doc = Block::Document(vec![
            Block::Document(vec![paragraph("One")]),
            Block::Paragraph(vec![text("   ")]),
            paragraph("Two"),
        ]);
        assert_eq!(serialize(&doc, &default_options()), "One\n\nTwo\n");
    }

    #[test]
    fn test_block_start_escapes() {
        assert_eq!(escape_block_start("# not a heading"), "\\# not a heading");
        assert_eq!(escape_block_start("- not a list"), "\\- not a list");
        assert_eq!(escape_block_start("1. not a list"), "1\\. not a list");
        assert_eq!(escape_block_start("1.5 litres"), "1.5 litres");
        assert_eq!(escape_block_start("-dash"), "-dash");
    }

    #[test]
    fn test_html_passthrough() {
        let block = Block::Paragraph(vec![
            Inline::HtmlInline("<sup>".to_string()),
            text("2"),
            Inline::HtmlInline("</sup>".to_string()),
        ]);
        assert_eq!(serialize(&block, &default_options()), "<sup>2</sup>\n");
    }
}

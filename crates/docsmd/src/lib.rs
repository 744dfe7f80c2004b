//! # docsmd
//!
//! Convert HTML copied out of Google Docs into Markdown.
//!
//! Google Docs puts two representations of a copied selection on the
//! clipboard: an HTML rendering and a private JSON format (the "Slice Clip")
//! that knows things the HTML has lost, such as suggested edits and exact
//! underline runs. This crate merges the two, cleans up the HTML Google
//! produces, converts it into the Markdown AST from `docsmd-core` and
//! serializes it, optionally tagging quiz questions with spoiler markup.
//!
//! ## Pipeline
//!
//! ```text
//! HTML ──parse──▶ Node tree ──UpdateWithSliceClip──▶ ──CleanGoogleHtml──▶
//!      ──handlers──▶ Markdown AST ──serialize──▶ Markdown ──post_process──▶ output
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docsmd::{convert, HeadingIds, Options};
//!
//! let html = r##"<h1 id="h.intro">Intro</h1><p><a href="#h.intro">back to top</a></p>"##;
//! let options = Options {
//!     heading_ids: HeadingIds::Hidden,
//!     ..Default::default()
//! };
//!
//! let markdown = convert(html, None, &options).unwrap();
//! assert_eq!(markdown, "# Intro\n[back to top](#intro)\n");
//! ```

pub mod clean;
pub mod convert;
pub mod enrich;
pub mod handlers;
pub mod html;
pub mod node;
pub mod postprocess;
mod service;
pub mod slice_clip;
pub mod slug;
pub mod spoiler;
mod transform;

pub use clean::CleanGoogleHtml;
pub use convert::{to_markdown_ast, State};
pub use enrich::UpdateWithSliceClip;
pub use handlers::{Handler, Handlers};
pub use html::{parse_html, to_html};
pub use node::{Node, NodeType};
pub use postprocess::post_process;
pub use service::{
    combine_formats, convert, markdown_options, CodeBlocks, HeadingIds, LineBreaking, Options,
    Suggestions, Underline,
};
pub use slice_clip::SliceClip;
pub use slug::Slugger;
pub use spoiler::add_spoiler_tags;
pub use transform::TreeTransform;

/// Error type for docsmd operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input was expected to be a certain kind of document but was not.
    #[error("Document does not appear to be a {expected}: {raw}")]
    Format {
        /// Kind of document that was expected
        expected: &'static str,
        /// The offending input, as JSON
        raw: String,
        /// JSON decoding failure, when there was one
        #[source]
        source: Option<serde_json::Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

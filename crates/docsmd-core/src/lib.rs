//! docsmd-core - Markdown AST and serialization
//!
//! This crate provides the intermediate tree that `docsmd` handlers produce
//! and the serializer that turns it into Markdown text (CommonMark plus the
//! GFM table and strikethrough extensions, and an underline extension).
//!
//! # Architecture
//!
//! ```text
//! Google Docs HTML ──handlers──▶ ┌──────────────┐
//!                                │ Markdown AST │ ──serialize──▶ Markdown String
//!                                └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use docsmd_core::{serialize, Block, Inline, Options};
//!
//! let ast = Block::Document(vec![
//!     Block::Paragraph(vec![Inline::Text("Intro".to_string())]),
//!     Block::Heading {
//!         level: 2,
//!         content: vec![Inline::Text("Section".to_string())],
//!     },
//! ]);
//!
//! let markdown = serialize(&ast, &Options::default());
//! assert_eq!(markdown, "Intro\n\n## Section\n");
//! ```

mod ast;
mod options;
mod serialize;

pub use ast::{Block, Fragment, Inline, ListItem};
pub use options::{CodeBlockStyle, Join, ListItemIndent, Options};
pub use serialize::serialize;

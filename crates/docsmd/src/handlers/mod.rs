//! Handler system for HTML to Markdown conversion.

pub mod defaults;
pub mod semantic;

pub use semantic::semantic_handlers;

use indexmap::IndexMap;

use crate::convert::State;
use crate::node::Node;
use docsmd_core::Fragment;

/// Converts one element into Markdown fragments.
///
/// A handler gets the conversion [`State`] (to recurse into children, look
/// up elements by id and read options) and the element itself. It never
/// mutates the source tree.
pub type Handler = for<'a> fn(&mut State<'a>, &'a Node) -> Vec<Fragment>;

/// Collection of handlers, keyed by tag name
#[derive(Clone, Default)]
pub struct Handlers {
    /// Custom handlers (checked before the defaults)
    custom: IndexMap<String, Handler>,
}

impl Handlers {
    /// Create a handler table with only the default handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom handler, replacing any earlier one for the same tag
    pub fn add(&mut self, tag: &str, handler: Handler) {
        self.custom.insert(tag.to_ascii_lowercase(), handler);
    }

    /// Find the handler for a tag
    pub fn get(&self, tag: &str) -> Option<Handler> {
        self.custom
            .get(tag)
            .copied()
            .or_else(|| defaults::default_handler(tag))
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;
    use crate::Options;
    use docsmd_core::Inline;

    fn shout<'a>(_state: &mut State<'a>, node: &'a Node) -> Vec<Fragment> {
        vec![Inline::Text(node.text_content().to_uppercase()).into()]
    }

    #[test]
    fn test_custom_handler_overrides_default() {
        let mut handlers = Handlers::new();
        assert!(handlers.get("em").is_some());
        assert!(handlers.get("blink").is_none());

        handlers.add("EM", shout);
        handlers.add("blink", shout);
        assert!(handlers.get("blink").is_some());

        let root = parse_html("<em>quiet</em> <blink>on</blink>");
        let options = Options::default();
        let mut state = State::new(&root, &options, handlers);
        assert_eq!(state.inlines(&root), vec![Inline::Text("QUIET ON".to_string())]);
    }
}

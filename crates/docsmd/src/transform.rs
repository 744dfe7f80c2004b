use crate::node::Node;

/// A rewrite applied to a parsed HTML tree before conversion.
///
/// The pipeline runs Slice Clip enrichment and Google cleanup as transforms;
/// callers can chain their own the same way.
pub trait TreeTransform {
    fn transform(&self, tree: &mut Node);
}

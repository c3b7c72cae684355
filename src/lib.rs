//! # Template Flattening Pass
//!
//! Converts a parsed template syntax tree into the two artifacts the bytecode
//! backend consumes: a strictly ordered linear action sequence and a lexical
//! scope table mapping every named reference to a numeric slot.
//!
//! ## Ordering Invariants
//!
//! 1. **Deepest-first publication**: every nested template body's complete
//!    start/end action pair appears in the global sequence strictly before its
//!    containing body's pair. Bodies publish to the global list the moment
//!    they finish, never into a parent buffer.
//! 2. **Single reversal per body**: a template body buffers actions in
//!    reverse-visit order and reverses exactly once when it finishes. Element
//!    buffers are spliced into their enclosing frame unreversed and are
//!    re-ordered by that frame's reversal.
//! 3. **One flat slot space**: all slots come from the root scope's counter,
//!    starting at 1, reached only through parent-chain delegation. Named
//!    arguments and yielded blocks memoize per name.
//! 4. **Presence, not magnitude**: an element containing any dynamic content
//!    bumps its enclosing frame's presence count by exactly one.
//! 5. **Closed dispatch**: node and action kinds are closed sum types matched
//!    exhaustively; an unknown kind cannot reach the walk.
//!
//! One walker instance performs exactly one compile. Results are owned,
//! immutable values returned after the full walk; there is no partial output.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod action;
mod ast;
mod flatten;
mod scope;


pub use action::Action;
pub use ast::{
    AttributeNode, AttributeValue, BareCommentNode, BlockNode, CommentNode, ElementNode,
    MustacheNode, Node, PartialNode, ProgramNode, SourceLocation, TextNode,
};
pub use flatten::{flatten, renderable_index, FlattenOutput, TemplateFlattener};
pub use scope::{ScopeId, ScopeTable, SlotName, INV_UNRESOLVED_BINDING};

#[cfg(feature = "napi")]
pub use flatten::flatten_template_native;

#[cfg(feature = "napi")]
#[napi]
pub fn flatten_bridge() -> String {
    "Flatten Native Bridge Connected".to_string()
}

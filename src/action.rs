//! Compiler actions emitted by the flattening walk.
//!
//! The backend pattern-matches on the `type` tag and replays the sequence in
//! order to emit bytecode. The union is closed at exactly ten kinds; partial
//! references surface as `Mustache` leaves. Container-start kinds carry the
//! aggregates collected while their subtree was walked.

use serde::Serialize;

use crate::ast::AttributeNode;
use crate::scope::ScopeId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    /// Opens the outermost template body (depth 0).
    #[serde(rename_all = "camelCase")]
    StartProgram {
        depth: u32,
        block_params: Vec<String>,
        scope: ScopeId,
        child_template_count: u32,
        /// Renderable positions of blank text children, ascending.
        blank_child_text_nodes: Vec<u32>,
    },
    /// Closes the outermost template body.
    #[serde(rename_all = "camelCase")]
    EndProgram { depth: u32, scope: ScopeId },
    /// Opens a nested block body (depth > 0).
    #[serde(rename_all = "camelCase")]
    StartBlock {
        depth: u32,
        block_params: Vec<String>,
        scope: ScopeId,
        child_template_count: u32,
        blank_child_text_nodes: Vec<u32>,
    },
    /// Closes a nested block body.
    #[serde(rename_all = "camelCase")]
    EndBlock { depth: u32, scope: ScopeId },
    /// A block statement at its position in the enclosing container. The
    /// bodies it owns appear earlier in the global sequence as their own
    /// start/end pairs.
    #[serde(rename_all = "camelCase")]
    Block {
        path: String,
        index: u32,
        sibling_count: u32,
    },
    /// A mustache or partial-reference leaf.
    #[serde(rename_all = "camelCase")]
    Mustache {
        code: String,
        index: u32,
        sibling_count: u32,
    },
    #[serde(rename_all = "camelCase")]
    OpenElement {
        tag: String,
        attributes: Vec<AttributeNode>,
        index: u32,
        sibling_count: u32,
        /// Dynamic-content presence accumulated inside the element.
        mustache_count: u32,
        blank_child_text_nodes: Vec<u32>,
        scope: ScopeId,
    },
    #[serde(rename_all = "camelCase")]
    CloseElement {
        tag: String,
        index: u32,
        sibling_count: u32,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        value: String,
        index: u32,
        sibling_count: u32,
    },
    /// A rendered comment. Source-only comments never reach the sequence.
    #[serde(rename_all = "camelCase")]
    Comment {
        value: String,
        index: u32,
        sibling_count: u32,
    },
}

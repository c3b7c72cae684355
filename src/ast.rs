//! Input syntax tree for the flattening pass.
//!
//! These types are the contract with the upstream parser. The node enum is
//! deliberately closed: dispatch in the walker is an exhaustive `match`, so an
//! unhandled node kind is a compile error rather than a traversal-time defect.

use serde::{Deserialize, Serialize};

use crate::scope::ScopeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Mustache(MustacheNode),
    Block(BlockNode),
    Partial(PartialNode),
    Comment(CommentNode),
    BareComment(BareCommentNode),
}

/// A template body: the top level of a compile, or the body of a block
/// statement. The `scope` annotation is `None` as produced by the parser and
/// filled in by the walker; the backend reads it to resolve references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramNode {
    #[serde(default)]
    pub block_params: Vec<String>,
    pub body: Vec<Node>,
    #[serde(default)]
    pub location: SourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: Vec<AttributeNode>,
    #[serde(default)]
    pub block_params: Vec<String>,
    pub children: Vec<Node>,
    #[serde(default)]
    pub location: SourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Dynamic interpolation. The expression code is opaque at this stage; the
/// backend resolves identifiers inside it against the scope table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MustacheNode {
    pub code: String,
    #[serde(default)]
    pub location: SourceLocation,
}

/// A block statement: `path` names the block helper, `program` is the primary
/// body and `inverse` the optional alternate (else) body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    pub path: String,
    pub program: ProgramNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<ProgramNode>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialNode {
    pub name: String,
    #[serde(default)]
    pub location: SourceLocation,
}

/// A comment that renders into the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

/// A source-only comment, stripped at compile time. The walker treats it as a
/// complete no-op: no action, no counters, no renderable position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BareCommentNode {
    pub value: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeNode {
    pub name: String,
    pub value: AttributeValue,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Static(String),
    Dynamic(MustacheNode),
}

impl AttributeValue {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, AttributeValue::Dynamic(_))
    }
}

//! The flattening walk: syntax tree in, ordered action sequence plus scope
//! table out.
//!
//! The walk visits children back-to-front and buffers actions per
//! scope-introducing node. A template body reverses its finished buffer once
//! and publishes it straight to the global sequence, so nested bodies (visited
//! and finished first) always land strictly before their containers; an
//! element's buffer is spliced unreversed into its enclosing frame and gets
//! re-ordered by that single reversal. This publish order is the contract the
//! backend depends on.

#[cfg(feature = "napi")]
use napi_derive::napi;

use crate::action::Action;
use crate::ast::{
    BlockNode, CommentNode, ElementNode, MustacheNode, Node, PartialNode, ProgramNode, TextNode,
};
use crate::scope::{ScopeId, ScopeTable};

/// Raised when a handler that requires an enclosing template-body frame runs
/// without one. The parser only produces elements and leaves inside a body,
/// so this is a compiler defect.
pub const INV_NO_ENCLOSING_FRAME: &str = "F-ERR-FRAME-001";

/// Everything one compile produces, handed to the backend as owned values
/// after the full walk completes.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenOutput {
    pub actions: Vec<Action>,
    pub scopes: ScopeTable,
}

/// Per-scope-introducing-node traversal state. Lives only for the duration of
/// its node's visit.
struct Frame {
    scope: ScopeId,
    child_index: u32,
    child_count: u32,
    actions: Vec<Action>,
    child_template_count: u32,
    mustache_count: u32,
    blank_child_text_nodes: Vec<u32>,
}

impl Frame {
    fn new(scope: ScopeId, child_count: u32) -> Self {
        Frame {
            scope,
            child_index: 0,
            child_count,
            actions: Vec::new(),
            child_template_count: 0,
            mustache_count: 0,
            blank_child_text_nodes: Vec::new(),
        }
    }
}

/// Single-use tree walker. One instance performs exactly one compile; the
/// frame stack and depth counter are not reset between runs, so `flatten`
/// consumes the walker.
pub struct TemplateFlattener {
    frames: Vec<Frame>,
    actions: Vec<Action>,
    scopes: ScopeTable,
    program_depth: u32,
}

impl TemplateFlattener {
    pub fn new() -> Self {
        TemplateFlattener {
            frames: Vec::new(),
            actions: Vec::new(),
            scopes: ScopeTable::new(),
            program_depth: 0,
        }
    }

    /// Walks `template`, annotating scope-introducing nodes with their scope
    /// ids, and returns the global action sequence plus the scope table.
    pub fn flatten(mut self, template: &mut ProgramNode) -> FlattenOutput {
        self.visit_program(template);
        FlattenOutput {
            actions: self.actions,
            scopes: self.scopes,
        }
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frames
            .last_mut()
            .unwrap_or_else(|| panic!("{}: no enclosing frame", INV_NO_ENCLOSING_FRAME))
    }

    fn visit_program(&mut self, program: &mut ProgramNode) {
        let depth = self.program_depth;
        self.program_depth += 1;

        // The outermost body owns the root scope; nested bodies bind their
        // block params in a child of the enclosing frame's scope.
        let scope = match self.frames.last() {
            None => ScopeTable::ROOT,
            Some(parent) => self.scopes.child(parent.scope, &program.block_params),
        };
        program.scope = Some(scope);

        self.frames.push(Frame::new(scope, program.body.len() as u32));
        let end = if depth == 0 {
            Action::EndProgram { depth, scope }
        } else {
            Action::EndBlock { depth, scope }
        };
        self.frame_mut().actions.push(end);

        for index in (0..program.body.len()).rev() {
            self.visit_child(&mut program.body, index);
        }

        let mut frame = self.frames.pop().unwrap_or_else(|| {
            panic!("{}: frame stack underflow", INV_NO_ENCLOSING_FRAME)
        });
        frame.blank_child_text_nodes.reverse();
        let start = if depth == 0 {
            Action::StartProgram {
                depth,
                block_params: program.block_params.clone(),
                scope,
                child_template_count: frame.child_template_count,
                blank_child_text_nodes: frame.blank_child_text_nodes,
            }
        } else {
            Action::StartBlock {
                depth,
                block_params: program.block_params.clone(),
                scope,
                child_template_count: frame.child_template_count,
                blank_child_text_nodes: frame.blank_child_text_nodes,
            }
        };
        frame.actions.push(start);
        // One reversal re-linearizes the whole body into document order.
        frame.actions.reverse();

        self.program_depth -= 1;
        if let Some(parent) = self.frames.last_mut() {
            parent.child_template_count += 1;
        }
        // Straight to the global sequence, never into a parent buffer: a body
        // that finishes publishes before any body still on the stack.
        self.actions.extend(frame.actions);
    }

    fn visit_child(&mut self, siblings: &mut [Node], index: usize) {
        self.frame_mut().child_index = index as u32;
        // Blank text nodes record their position among renderable siblings
        // only; the slice is needed before the node is borrowed mutably.
        let renderable_pos = match &siblings[index] {
            Node::Text(text) if text.value.is_empty() => {
                Some(renderable_index(siblings, index) as u32)
            }
            _ => None,
        };
        match &mut siblings[index] {
            Node::Element(element) => self.visit_element(element),
            Node::Text(text) => self.visit_text(text, renderable_pos),
            Node::Mustache(mustache) => self.visit_mustache(mustache),
            Node::Block(block) => self.visit_block(block),
            Node::Partial(partial) => self.visit_partial(partial),
            Node::Comment(comment) => self.visit_comment(comment),
            // Stripped at compile time: no action, no counters.
            Node::BareComment(_) => {}
        }
    }

    fn visit_element(&mut self, element: &mut ElementNode) {
        let (index, sibling_count, parent_scope) = {
            let parent = self.frame_mut();
            (parent.child_index, parent.child_count, parent.scope)
        };
        let scope = self.scopes.child(parent_scope, &element.block_params);
        element.scope = Some(scope);

        self.frames
            .push(Frame::new(scope, element.children.len() as u32));
        self.frame_mut().actions.push(Action::CloseElement {
            tag: element.tag.clone(),
            index,
            sibling_count,
        });

        for attribute in element.attributes.iter().rev() {
            if attribute.value.is_dynamic() {
                self.frame_mut().mustache_count += 1;
            }
        }
        for child in (0..element.children.len()).rev() {
            self.visit_child(&mut element.children, child);
        }

        let mut frame = self.frames.pop().unwrap_or_else(|| {
            panic!("{}: frame stack underflow", INV_NO_ENCLOSING_FRAME)
        });
        frame.blank_child_text_nodes.reverse();
        let open = Action::OpenElement {
            tag: element.tag.clone(),
            attributes: element.attributes.clone(),
            index,
            sibling_count,
            mustache_count: frame.mustache_count,
            blank_child_text_nodes: std::mem::take(&mut frame.blank_child_text_nodes),
            scope,
        };
        frame.actions.push(open);

        // Presence propagates as one, not by magnitude; nested template
        // counts transfer in full. The buffer is spliced unreversed into the
        // enclosing frame, whose own reversal restores document order.
        let parent = self.frame_mut();
        if frame.mustache_count > 0 {
            parent.mustache_count += 1;
        }
        parent.child_template_count += frame.child_template_count;
        parent.actions.extend(frame.actions);
    }

    fn visit_text(&mut self, text: &TextNode, renderable_pos: Option<u32>) {
        let frame = self.frame_mut();
        frame.actions.push(Action::Text {
            value: text.value.clone(),
            index: frame.child_index,
            sibling_count: frame.child_count,
        });
        if let Some(pos) = renderable_pos {
            frame.blank_child_text_nodes.push(pos);
        }
    }

    fn visit_mustache(&mut self, mustache: &MustacheNode) {
        let frame = self.frame_mut();
        frame.mustache_count += 1;
        frame.actions.push(Action::Mustache {
            code: mustache.code.clone(),
            index: frame.child_index,
            sibling_count: frame.child_count,
        });
    }

    /// Partial references are dynamic leaves to the backend; they share the
    /// mustache action kind.
    fn visit_partial(&mut self, partial: &PartialNode) {
        let frame = self.frame_mut();
        frame.mustache_count += 1;
        frame.actions.push(Action::Mustache {
            code: partial.name.clone(),
            index: frame.child_index,
            sibling_count: frame.child_count,
        });
    }

    fn visit_block(&mut self, block: &mut BlockNode) {
        {
            let frame = self.frame_mut();
            frame.mustache_count += 1;
            frame.actions.push(Action::Block {
                path: block.path.clone(),
                index: frame.child_index,
                sibling_count: frame.child_count,
            });
        }
        // Each body runs the full template-body algorithm and publishes to
        // the global sequence before control returns here.
        if let Some(inverse) = &mut block.inverse {
            self.visit_program(inverse);
        }
        self.visit_program(&mut block.program);
    }

    fn visit_comment(&mut self, comment: &CommentNode) {
        let frame = self.frame_mut();
        frame.actions.push(Action::Comment {
            value: comment.value.clone(),
            index: frame.child_index,
            sibling_count: frame.child_count,
        });
    }
}

impl Default for TemplateFlattener {
    fn default() -> Self {
        Self::new()
    }
}

/// Flattens one template with a fresh walker.
pub fn flatten(template: &mut ProgramNode) -> FlattenOutput {
    TemplateFlattener::new().flatten(template)
}

/// Position of `siblings[index]` counting only renderable kinds (text and
/// element); comments and other statements do not occupy a position.
pub fn renderable_index(siblings: &[Node], index: usize) -> usize {
    siblings[..index]
        .iter()
        .filter(|node| matches!(node, Node::Text(_) | Node::Element(_)))
        .count()
}

#[cfg(feature = "napi")]
#[napi]
pub fn flatten_template_native(template_json: String) -> napi::Result<String> {
    let mut template: ProgramNode = serde_json::from_str(&template_json)
        .map_err(|e| napi::Error::from_reason(format!("Template parse error: {}", e)))?;
    let output = flatten(&mut template);
    let res = serde_json::json!({
        "template": template,
        "actions": output.actions,
        "scopes": output.scopes,
    });
    serde_json::to_string(&res)
        .map_err(|e| napi::Error::from_reason(format!("Serialize error: {}", e)))
}

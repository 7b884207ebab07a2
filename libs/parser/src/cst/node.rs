//! # Red Cursors
//!
//! Positioned views over the green tree. A [`CstNode`] knows its absolute
//! offset and holds a back-reference to its parent cursor; the green tree
//! itself never points upward.

use std::fmt;

use text_size::{TextRange, TextSize};
use triomphe::Arc;

use crate::cst::green::{GreenElement, GreenNode, GreenToken};
use crate::cst::NodeKind;
use crate::lexer::TokenKind;

// =============================================================================
// CST NODE
// =============================================================================

/// A node of the syntax tree, positioned in its source.
///
/// ## Example
///
/// ```rust
/// let cst = openscad_parser::parse("cube(10);");
/// let chain = cst.root().find_child(NodeKind::TransformChain).unwrap();
/// assert_eq!(chain.text(), "cube(10);");
/// ```
#[derive(Clone)]
pub struct CstNode(Arc<NodeData>);

struct NodeData {
    green: GreenNode,
    offset: TextSize,
    parent: Option<CstNode>,
    index: usize,
}

impl Drop for NodeData {
    fn drop(&mut self) {
        // Release the ancestor chain one link at a time.
        let mut parent = self.parent.take();
        while let Some(mut node) = parent {
            parent = Arc::get_mut(&mut node.0).and_then(|data| data.parent.take());
        }
    }
}

impl CstNode {
    pub(crate) fn new_root(green: GreenNode) -> Self {
        Self(Arc::new(NodeData {
            green,
            offset: TextSize::from(0),
            parent: None,
            index: 0,
        }))
    }

    fn new_child(green: GreenNode, offset: TextSize, parent: CstNode, index: usize) -> Self {
        Self(Arc::new(NodeData {
            green,
            offset,
            parent: Some(parent),
            index,
        }))
    }

    pub fn kind(&self) -> NodeKind {
        self.0.green.kind()
    }

    /// Underlying green node.
    pub fn green(&self) -> &GreenNode {
        &self.0.green
    }

    /// Absolute byte range in the source.
    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.0.offset, self.0.green.text_len())
    }

    pub fn has_error(&self) -> bool {
        self.0.green.has_error()
    }

    /// Source text covered by this node.
    pub fn text(&self) -> String {
        self.0.green.text()
    }

    pub fn parent(&self) -> Option<CstNode> {
        self.0.parent.clone()
    }

    /// Position among the parent's children.
    pub fn index(&self) -> usize {
        self.0.index
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = CstNode> {
        std::iter::successors(self.parent(), CstNode::parent)
    }

    pub fn child_count(&self) -> usize {
        self.0.green.children().len()
    }

    /// All children, tokens included.
    pub fn children(&self) -> CstChildren {
        CstChildren {
            parent: self.clone(),
            index: 0,
            offset: self.0.offset,
        }
    }

    /// Child at `index`.
    ///
    /// The offset is summed over the green lengths of the nearer end of the
    /// child list, so no cursors are built for the siblings.
    pub fn child(&self, index: usize) -> Option<CstElement> {
        let children = self.0.green.children();
        let green = children.get(index)?;
        let offset = if index <= children.len() / 2 {
            self.0.offset + sum_len(&children[..index])
        } else {
            self.text_range().end() - sum_len(&children[index..])
        };
        Some(self.element(green.clone(), offset, index))
    }

    fn element(&self, green: GreenElement, offset: TextSize, index: usize) -> CstElement {
        match green {
            GreenElement::Node(node) => {
                CstElement::Node(CstNode::new_child(node, offset, self.clone(), index))
            }
            GreenElement::Token(token) => CstElement::Token(CstToken {
                green: token,
                offset,
                parent: self.clone(),
                index,
            }),
        }
    }

    /// Child nodes only.
    pub fn child_nodes(&self) -> impl Iterator<Item = CstNode> {
        self.children().filter_map(CstElement::into_node)
    }

    /// First child node of the given kind.
    pub fn find_child(&self, kind: NodeKind) -> Option<CstNode> {
        self.child_nodes().find(|node| node.kind() == kind)
    }

    /// All child nodes of the given kind.
    pub fn find_children(&self, kind: NodeKind) -> Vec<CstNode> {
        self.child_nodes().filter(|node| node.kind() == kind).collect()
    }

    /// First child token of the given kind.
    pub fn find_token(&self, kind: TokenKind) -> Option<CstToken> {
        self.children()
            .filter_map(CstElement::into_token)
            .find(|token| token.kind() == kind)
    }

    /// This node and every node below it, in preorder.
    pub fn descendants(&self) -> impl Iterator<Item = CstNode> {
        let mut stack = vec![self.clone()];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            let children: Vec<CstNode> = node.child_nodes().collect();
            stack.extend(children.into_iter().rev());
            Some(node)
        })
    }

    /// Every token below this node, in source order.
    pub fn tokens(&self) -> CstTokens {
        CstTokens {
            stack: vec![self.children()],
        }
    }

    /// First token that is neither trivia nor missing.
    pub fn first_significant_token(&self) -> Option<CstToken> {
        self.tokens().find(|token| !token.is_trivia() && !token.is_missing())
    }
}

impl PartialEq for CstNode {
    fn eq(&self, other: &Self) -> bool {
        self.0.offset == other.0.offset && self.0.green.ptr_eq(&other.0.green)
    }
}

impl Eq for CstNode {}

impl fmt::Debug for CstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.text_range())
    }
}

// =============================================================================
// CST TOKEN
// =============================================================================

/// A leaf token, positioned in its source.
#[derive(Clone)]
pub struct CstToken {
    green: GreenToken,
    offset: TextSize,
    parent: CstNode,
    index: usize,
}

impl CstToken {
    pub fn kind(&self) -> TokenKind {
        self.green.kind()
    }

    pub fn text(&self) -> &str {
        self.green.text()
    }

    pub fn green(&self) -> &GreenToken {
        &self.green
    }

    pub fn text_range(&self) -> TextRange {
        TextRange::at(self.offset, self.green.text_len())
    }

    pub fn parent(&self) -> CstNode {
        self.parent.clone()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Zero-width token inserted by error recovery.
    pub fn is_missing(&self) -> bool {
        self.green.is_missing()
    }

    pub fn is_trivia(&self) -> bool {
        self.kind().is_trivia()
    }

    /// Lexical error token.
    pub fn is_error(&self) -> bool {
        self.kind() == TokenKind::Error
    }
}

impl PartialEq for CstToken {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.green == other.green && self.parent == other.parent
    }
}

impl Eq for CstToken {}

impl fmt::Debug for CstToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.text_range(), self.text())
    }
}

// =============================================================================
// CST ELEMENT
// =============================================================================

/// Child of a [`CstNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CstElement {
    Node(CstNode),
    Token(CstToken),
}

impl CstElement {
    pub fn text_range(&self) -> TextRange {
        match self {
            Self::Node(node) => node.text_range(),
            Self::Token(token) => token.text_range(),
        }
    }

    pub fn into_node(self) -> Option<CstNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<CstToken> {
        match self {
            Self::Node(_) => None,
            Self::Token(token) => Some(token),
        }
    }

    pub fn as_node(&self) -> Option<&CstNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&CstToken> {
        match self {
            Self::Node(_) => None,
            Self::Token(token) => Some(token),
        }
    }
}

fn sum_len(children: &[GreenElement]) -> TextSize {
    children.iter().map(GreenElement::text_len).sum()
}

// =============================================================================
// ITERATORS
// =============================================================================

/// Children of a node, with their absolute offsets.
pub struct CstChildren {
    parent: CstNode,
    index: usize,
    offset: TextSize,
}

impl Iterator for CstChildren {
    type Item = CstElement;

    fn next(&mut self) -> Option<CstElement> {
        let green = self.parent.0.green.children().get(self.index)?.clone();
        let index = self.index;
        let offset = self.offset;
        self.index += 1;
        self.offset += green.text_len();

        Some(self.parent.element(green, offset, index))
    }
}

/// Preorder walk over the tokens below a node.
pub struct CstTokens {
    stack: Vec<CstChildren>,
}

impl Iterator for CstTokens {
    type Item = CstToken;

    fn next(&mut self) -> Option<CstToken> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(CstElement::Token(token)) => return Some(token),
                Some(CstElement::Node(node)) => self.stack.push(node.children()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

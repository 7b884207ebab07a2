//! # Green Tree
//!
//! Immutable, reference-counted syntax tree storage.
//!
//! Green nodes know their kind, their children and their total text length,
//! but not where they sit in the source: absolute offsets are computed by the
//! red cursors in [`super::node`]. That is what allows one green subtree to be
//! shared by several trees, and what makes offsets after an edit shift for
//! free.

use std::fmt;
use std::hash::{Hash, Hasher};

use text_size::TextSize;
use triomphe::Arc;

use crate::cst::NodeKind;
use crate::lexer::TokenKind;
use crate::span::text_size;

// =============================================================================
// GREEN NODE
// =============================================================================

/// Interior node of the green tree.
///
/// Cloning is a reference-count bump. Equality is structural.
///
/// Equality, hashing and drop walk the tree with an explicit work list, so
/// nesting depth is limited by memory and not by the call stack.
#[derive(Clone)]
pub struct GreenNode(Arc<GreenNodeData>);

struct GreenNodeData {
    kind: NodeKind,
    text_len: TextSize,
    has_error: bool,
    children: Box<[GreenElement]>,
}

impl GreenNode {
    /// Build a node, taking ownership of `children`.
    ///
    /// ## Example
    ///
    /// ```rust
    /// let semi = GreenToken::new(TokenKind::Semicolon, ";");
    /// let node = GreenNode::new(NodeKind::EmptyStatement, vec![semi.into()]);
    /// assert_eq!(u32::from(node.text_len()), 1);
    /// ```
    pub fn new(kind: NodeKind, children: Vec<GreenElement>) -> Self {
        let text_len = children.iter().map(GreenElement::text_len).sum();
        let has_error = kind == NodeKind::Error || children.iter().any(GreenElement::has_error);
        Self(Arc::new(GreenNodeData {
            kind,
            text_len,
            has_error,
            children: children.into_boxed_slice(),
        }))
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn text_len(&self) -> TextSize {
        self.0.text_len
    }

    /// True if this node is, or contains, an error node, a lexical error
    /// token or a missing token.
    pub fn has_error(&self) -> bool {
        self.0.has_error
    }

    pub fn children(&self) -> &[GreenElement] {
        &self.0.children
    }

    /// Check if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &GreenNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of this node with child `index` replaced.
    ///
    /// Every other child is shared with `self`.
    ///
    /// ## Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace_child(&self, index: usize, child: GreenElement) -> GreenNode {
        let mut children = self.0.children.to_vec();
        children[index] = child;
        GreenNode::new(self.kind(), children)
    }

    /// Leaf tokens in source order.
    pub fn tokens(&self) -> GreenTokens<'_> {
        GreenTokens {
            stack: vec![self.children().iter()],
        }
    }

    /// Source text covered by this node.
    pub fn text(&self) -> String {
        let mut text = String::with_capacity(usize::from(self.text_len()));
        for token in self.tokens() {
            text.push_str(token.text());
        }
        text
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((left, right)) = pending.pop() {
            if left.ptr_eq(right) {
                continue;
            }
            if left.kind() != right.kind()
                || left.text_len() != right.text_len()
                || left.children().len() != right.children().len()
            {
                return false;
            }
            for pair in left.children().iter().zip(right.children()) {
                match pair {
                    (GreenElement::Node(left), GreenElement::Node(right)) => {
                        pending.push((left, right));
                    }
                    (GreenElement::Token(left), GreenElement::Token(right)) if left == right => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for GreenNode {}

impl Hash for GreenNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            node.kind().hash(state);
            node.children().len().hash(state);
            for child in node.children() {
                match child {
                    GreenElement::Node(child) => {
                        state.write_u8(0);
                        pending.push(child);
                    }
                    GreenElement::Token(token) => {
                        state.write_u8(1);
                        token.hash(state);
                    }
                }
            }
        }
    }
}

impl Drop for GreenNodeData {
    fn drop(&mut self) {
        // Detach uniquely owned subtrees here instead of letting each level
        // drop the next one recursively.
        let mut pending = child_nodes(&mut self.children);
        while let Some(mut node) = pending.pop() {
            if let Some(data) = Arc::get_mut(&mut node.0) {
                pending.extend(child_nodes(&mut data.children));
            }
        }
    }
}

fn child_nodes(children: &mut Box<[GreenElement]>) -> Vec<GreenNode> {
    std::mem::take(children)
        .into_vec()
        .into_iter()
        .filter_map(|child| match child {
            GreenElement::Node(node) => Some(node),
            GreenElement::Token(_) => None,
        })
        .collect()
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.text_len())
    }
}

// =============================================================================
// GREEN TOKEN
// =============================================================================

/// Leaf of the green tree: a token kind and its exact text.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GreenToken(Arc<GreenTokenData>);

#[derive(PartialEq, Eq, Hash)]
struct GreenTokenData {
    kind: TokenKind,
    text: Box<str>,
}

impl GreenToken {
    pub fn new(kind: TokenKind, text: &str) -> Self {
        Self(Arc::new(GreenTokenData {
            kind,
            text: text.into(),
        }))
    }

    /// Zero-width token inserted by error recovery.
    pub fn missing(kind: TokenKind) -> Self {
        Self::new(kind, "")
    }

    pub fn kind(&self) -> TokenKind {
        self.0.kind
    }

    pub fn text(&self) -> &str {
        &self.0.text
    }

    pub fn text_len(&self) -> TextSize {
        text_size(self.0.text.len())
    }

    /// Zero-width tokens only come from error recovery.
    pub fn is_missing(&self) -> bool {
        self.0.text.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.kind() == TokenKind::Error || self.is_missing()
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.text_len(), self.text())
    }
}

// =============================================================================
// GREEN ELEMENT
// =============================================================================

/// Child of a green node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GreenElement {
    Node(GreenNode),
    Token(GreenToken),
}

impl GreenElement {
    pub fn text_len(&self) -> TextSize {
        match self {
            Self::Node(node) => node.text_len(),
            Self::Token(token) => token.text_len(),
        }
    }

    pub fn has_error(&self) -> bool {
        match self {
            Self::Node(node) => node.has_error(),
            Self::Token(token) => token.has_error(),
        }
    }

    pub fn as_node(&self) -> Option<&GreenNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&GreenToken> {
        match self {
            Self::Node(_) => None,
            Self::Token(token) => Some(token),
        }
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        Self::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        Self::Token(token)
    }
}

// =============================================================================
// TOKEN ITERATOR
// =============================================================================

/// Preorder walk over the tokens below a green node.
pub struct GreenTokens<'a> {
    stack: Vec<std::slice::Iter<'a, GreenElement>>,
}

impl<'a> Iterator for GreenTokens<'a> {
    type Item = &'a GreenToken;

    fn next(&mut self) -> Option<&'a GreenToken> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(GreenElement::Token(token)) => return Some(token),
                Some(GreenElement::Node(node)) => self.stack.push(node.children().iter()),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, text: &str) -> GreenElement {
        GreenToken::new(kind, text).into()
    }

    fn call() -> GreenNode {
        let args = GreenNode::new(
            NodeKind::Arguments,
            vec![
                token(TokenKind::LParen, "("),
                token(TokenKind::Number, "10"),
                token(TokenKind::RParen, ")"),
            ],
        );
        GreenNode::new(
            NodeKind::ModuleCall,
            vec![token(TokenKind::Identifier, "cube"), args.into()],
        )
    }

    #[test]
    fn test_text_len_is_sum_of_children() {
        let node = call();
        assert_eq!(node.text_len(), TextSize::from(8));
        assert_eq!(node.text(), "cube(10)");
        assert!(!node.has_error());
    }

    #[test]
    fn test_missing_token_flags_error() {
        let node = GreenNode::new(
            NodeKind::TransformChain,
            vec![call().into(), GreenToken::missing(TokenKind::Semicolon).into()],
        );
        assert!(node.has_error());
        assert_eq!(node.text(), "cube(10)");
    }

    #[test]
    fn test_equality_is_structural() {
        let a = call();
        let b = call();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn test_replace_child_shares_siblings() {
        let node = call();
        let renamed = node.replace_child(0, token(TokenKind::Identifier, "sphere"));
        assert_eq!(renamed.text(), "sphere(10)");
        let (GreenElement::Node(old_args), GreenElement::Node(new_args)) =
            (&node.children()[1], &renamed.children()[1])
        else {
            panic!("arguments should be a node");
        };
        assert!(old_args.ptr_eq(new_args));
    }

    fn nested(depth: usize, leaf: &str) -> GreenNode {
        let mut node = GreenNode::new(NodeKind::List, vec![token(TokenKind::Number, leaf)]);
        for _ in 0..depth {
            node = GreenNode::new(NodeKind::ParenthesizedExpression, vec![node.into()]);
        }
        node
    }

    fn hash_of(node: &GreenNode) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_deep_trees_compare_hash_and_drop() {
        let a = nested(200_000, "1");
        let b = nested(200_000, "1");
        let c = nested(200_000, "2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(hash_of(&a), hash_of(&b));
        drop((a, b, c));
    }

    #[test]
    fn test_drop_keeps_shared_subtrees() {
        let inner = call();
        let outer = GreenNode::new(NodeKind::TransformChain, vec![inner.clone().into()]);
        drop(outer);
        assert_eq!(inner.text(), "cube(10)");
        assert_eq!(inner.children().len(), 2);
    }

    #[test]
    fn test_error_node_flags_error() {
        let node = GreenNode::new(NodeKind::Error, vec![token(TokenKind::Comma, ",")]);
        assert!(node.has_error());
    }
}

use crate::config::LintConfig;
use crate::parser::ast::{Node, SpecTree};

/// Read-only view a rule gets of where a node sits in the tree
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub tree: &'a SpecTree,
    /// enclosing nodes, outermost first
    pub ancestors: &'a [&'a Node],
    pub config: &'a LintConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(tree: &'a SpecTree, ancestors: &'a [&'a Node], config: &'a LintConfig) -> Self {
        Self {
            tree,
            ancestors,
            config,
        }
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors.last().copied()
    }

    /// Whether the node being checked is a direct child of the tree root
    pub fn is_top_level(&self) -> bool {
        self.ancestors.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

use std::ops::{Deref, DerefMut};

use crate::block::Block;

/// An ordered statement list: a function body, loop body, branch or case arm.
/// Statements run in sequence order. The Comp owns every statement in it, so
/// dropping a Comp drops the whole subtree below it.
///
/// Editing goes through the underlying `Vec` (`push`, `insert`, `remove`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comp {
    blocks: Vec<Block>,
}

impl Comp {
    pub fn new() -> Self {
        Comp { blocks: Vec::new() }
    }

    /// Number of statements in this list and everything nested in it.
    pub fn node_count(&self) -> usize {
        self.blocks.iter().map(Block::node_count).sum()
    }

    pub fn into_inner(self) -> Vec<Block> {
        self.blocks
    }
}

impl Deref for Comp {
    type Target = Vec<Block>;

    fn deref(&self) -> &Vec<Block> {
        &self.blocks
    }
}

impl DerefMut for Comp {
    fn deref_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

impl From<Vec<Block>> for Comp {
    fn from(blocks: Vec<Block>) -> Self {
        Comp { blocks }
    }
}

impl FromIterator<Block> for Comp {
    fn from_iter<T: IntoIterator<Item = Block>>(iter: T) -> Self {
        Comp {
            blocks: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Comp {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl IntoIterator for Comp {
    type Item = Block;
    type IntoIter = std::vec::IntoIter<Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_keeps_program_order() {
        let mut comp = Comp::new();
        comp.push(Block::assign("a = 1"));
        comp.push(Block::assign("c = 3"));
        comp.insert(1, Block::assign("b = 2"));
        let exprs: Vec<&str> = comp
            .iter()
            .map(|b| match b {
                Block::Assign { expr } => expr.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(exprs, ["a = 1", "b = 2", "c = 3"]);

        comp.remove(0);
        assert_eq!(comp.len(), 2);
        assert_eq!(comp.node_count(), 2);
    }
}

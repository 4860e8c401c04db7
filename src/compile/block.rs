use crate::region::Region;
use std::fmt::{self, Display, Formatter};

/// The kind of an open block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    /// A conditional block, closed by `endif`.
    If,
    /// A loop block, closed by `endfor`.
    For,
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::If => write!(f, "if"),
            BlockKind::For => write!(f, "for"),
        }
    }
}

/// An open block awaiting its closing directive.
#[derive(Debug)]
pub struct Block {
    /// The kind of directive that opened the block.
    pub kind: BlockKind,
    /// Where the opening directive keyword sits in the source.
    pub region: Region,
    /// True once an `else` branch has been seen; only meaningful for
    /// [`BlockKind::If`].
    pub else_seen: bool,
}

/// Why a pop failed.
#[derive(Debug, PartialEq)]
pub enum PopError {
    /// The stack was empty; there is no open block to close.
    Empty,
    /// The top of the stack held a block of this kind, which the closing
    /// directive does not match.
    Mismatch(BlockKind),
}

/// Tracks the blocks opened and not yet closed during compilation.
///
/// The stack must be empty when the last source line has been consumed;
/// a leftover entry is an unclosed block.
#[derive(Debug, Default)]
pub struct BlockStack {
    blocks: Vec<Block>,
}

impl BlockStack {
    /// Create a new, empty BlockStack.
    pub fn new() -> Self {
        Self { blocks: vec![] }
    }

    /// Record a newly opened block.
    pub fn push(&mut self, kind: BlockKind, region: Region) {
        self.blocks.push(Block {
            kind,
            region,
            else_seen: false,
        });
    }

    /// Close the innermost open block.
    ///
    /// # Errors
    ///
    /// Returns a [`PopError`] when no block is open, or the innermost open
    /// block is not of the expected kind. On mismatch the stack is left
    /// untouched so the caller can report the still-open block.
    pub fn pop(&mut self, expected: BlockKind) -> Result<Block, PopError> {
        match self.blocks.last() {
            None => Err(PopError::Empty),
            Some(open) if open.kind != expected => Err(PopError::Mismatch(open.kind)),
            Some(_) => Ok(self.blocks.pop().unwrap()),
        }
    }

    /// Return the innermost open block, if any.
    pub fn top(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Return the innermost open block for mutation, if any.
    pub fn top_mut(&mut self) -> Option<&mut Block> {
        self.blocks.last_mut()
    }

    /// Return the innermost block still open, if any.
    ///
    /// Called once all source lines are consumed, when any leftover entry
    /// is an error.
    pub fn unclosed(&self) -> Option<&Block> {
        self.blocks.last()
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockKind, BlockStack, PopError};

    #[test]
    fn test_push_pop() {
        let mut stack = BlockStack::new();
        stack.push(BlockKind::If, (0..2).into());
        stack.push(BlockKind::For, (10..13).into());

        assert_eq!(stack.pop(BlockKind::For).map(|b| b.kind), Ok(BlockKind::For));
        assert_eq!(stack.pop(BlockKind::If).map(|b| b.kind), Ok(BlockKind::If));
        assert!(stack.unclosed().is_none());
    }

    #[test]
    fn test_pop_empty() {
        let mut stack = BlockStack::new();

        assert_eq!(stack.pop(BlockKind::If).unwrap_err(), PopError::Empty);
    }

    #[test]
    fn test_pop_mismatch() {
        let mut stack = BlockStack::new();
        stack.push(BlockKind::For, (0..3).into());

        assert_eq!(
            stack.pop(BlockKind::If).unwrap_err(),
            PopError::Mismatch(BlockKind::For)
        );
        // The mismatched block is still open.
        assert!(stack.unclosed().is_some());
    }
}

//! Evaluation stack module for the Neo Virtual Machine.

use crate::error::{VmError, VmResult};
use crate::stack_item::StackItem;

/// Represents the evaluation stack in the VM.
#[derive(Debug, Clone, Default)]
pub struct EvaluationStack {
    stack: Vec<StackItem>,
}

impl EvaluationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an item onto the stack.
    pub fn push(&mut self, item: StackItem) {
        self.stack.push(item);
    }

    /// Pops an item from the stack.
    pub fn pop(&mut self) -> VmResult<StackItem> {
        self.stack.pop().ok_or(VmError::StackUnderflow {
            requested: 1,
            available: 0,
        })
    }

    /// Returns the item `n` positions below the top without removing it.
    pub fn peek(&self, n: usize) -> VmResult<&StackItem> {
        if n >= self.stack.len() {
            return Err(VmError::StackUnderflow {
                requested: n + 1,
                available: self.stack.len(),
            });
        }
        Ok(&self.stack[self.stack.len() - 1 - n])
    }

    /// Removes the top `count` items.
    pub fn drop_items(&mut self, count: usize) -> VmResult<()> {
        if count > self.stack.len() {
            return Err(VmError::StackUnderflow {
                requested: count,
                available: self.stack.len(),
            });
        }
        self.stack.truncate(self.stack.len() - count);
        Ok(())
    }

    /// Swaps the top two items.
    pub fn swap_top(&mut self) -> VmResult<()> {
        let len = self.stack.len();
        if len < 2 {
            return Err(VmError::StackUnderflow {
                requested: 2,
                available: len,
            });
        }
        self.stack.swap(len - 1, len - 2);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Moves every item, bottom first, onto `target`.
    pub fn move_to(&mut self, target: &mut EvaluationStack) {
        target.stack.append(&mut self.stack);
    }

    /// Items from bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, StackItem> {
        self.stack.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_counts_from_top() {
        let mut stack = EvaluationStack::new();
        stack.push(StackItem::from(1));
        stack.push(StackItem::from(2));
        assert_eq!(stack.peek(0).unwrap(), &StackItem::from(2));
        assert_eq!(stack.peek(1).unwrap(), &StackItem::from(1));
        assert!(stack.peek(2).is_err());
    }

    #[test]
    fn test_drop_and_move() {
        let mut stack = EvaluationStack::new();
        for i in 0..4 {
            stack.push(StackItem::from(i));
        }
        stack.drop_items(2).unwrap();
        assert_eq!(stack.len(), 2);
        assert!(stack.drop_items(3).is_err());

        let mut target = EvaluationStack::new();
        target.push(StackItem::Null);
        stack.move_to(&mut target);
        assert!(stack.is_empty());
        assert_eq!(target.pop().unwrap(), StackItem::from(1));
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn test_swap_top() {
        let mut stack = EvaluationStack::new();
        stack.push(StackItem::from(1));
        assert!(stack.swap_top().is_err());
        stack.push(StackItem::from(2));
        stack.swap_top().unwrap();
        assert_eq!(stack.pop().unwrap(), StackItem::from(1));
    }
}

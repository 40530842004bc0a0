//! Restrictions on the VM.

/// Limits applied to a single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionEngineLimits {
    /// The maximum number of bits that `SHL` and `SHR` can shift.
    pub max_shift: u32,
    /// The maximum number of items on the stacks and in containers.
    pub max_stack_size: u32,
    /// The maximum size of an item in the VM.
    pub max_item_size: u32,
    /// The largest comparable size.
    pub max_comparable_size: u32,
    /// The maximum depth of the invocation stack.
    pub max_invocation_stack_size: u32,
}

impl Default for ExecutionEngineLimits {
    fn default() -> Self {
        Self {
            max_shift: 256,
            max_stack_size: 2 * 1024,
            max_item_size: 1024 * 1024,
            max_comparable_size: 65536,
            max_invocation_stack_size: 1024,
        }
    }
}

impl ExecutionEngineLimits {
    /// Fails if `size` exceeds [`Self::max_item_size`].
    pub fn assert_max_item_size(&self, size: usize) -> crate::VmResult<()> {
        if size > self.max_item_size as usize {
            return Err(crate::VmError::SizeExceeded {
                size,
                limit: self.max_item_size as usize,
            });
        }
        Ok(())
    }
}

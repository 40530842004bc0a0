//! Nested calls made from inside native methods.
//!
//! A native method that calls back into a contract cannot return its result
//! right away: the callee's context first has to run on the engine. Such a
//! method returns a pending [`ContractTask`] bound to the callee's context.
//! The dispatcher then drives the engine until that context returns and
//! runs the task's continuations on the callee's result.
//!
//! Everything happens on the engine's thread. A pending task never yields
//! to other work; it only lets a method body read as straight-line code.

use crate::application_engine::ApplicationEngine;
use crate::interop::InteropValue;
use crate::{Error, Result};
use neo_vm::StackItem;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Default)]
enum AwaiterState {
    #[default]
    Pending,
    Completed(Option<StackItem>),
    Faulted(Error),
}

/// Completion slot shared between a pending task and the context it waits on.
///
/// The engine completes the awaiter when the context returns. The result is
/// the top of the context's evaluation stack, if any.
#[derive(Debug, Clone, Default)]
pub struct ContractTaskAwaiter {
    state: Rc<RefCell<AwaiterState>>,
}

impl ContractTaskAwaiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self) -> bool {
        !matches!(*self.state.borrow(), AwaiterState::Pending)
    }

    pub(crate) fn set_result(&self, result: Option<StackItem>) {
        *self.state.borrow_mut() = AwaiterState::Completed(result);
    }

    pub(crate) fn set_exception(&self, error: Error) {
        *self.state.borrow_mut() = AwaiterState::Faulted(error);
    }

    /// Takes the outcome, leaving the awaiter pending again.
    fn take(&self) -> Result<Option<StackItem>> {
        match std::mem::take(&mut *self.state.borrow_mut()) {
            AwaiterState::Completed(result) => Ok(result),
            AwaiterState::Faulted(error) => Err(error),
            AwaiterState::Pending => Err(Error::state("contract task is still pending")),
        }
    }
}

type Continuation = Box<dyn FnOnce(&mut ApplicationEngine, InteropValue) -> Result<InteropValue>>;

enum TaskState {
    Completed(InteropValue),
    Pending(ContractTaskAwaiter),
}

/// The result of a native method: either a value or a nested call still to
/// run, followed by continuations.
pub struct ContractTask {
    state: TaskState,
    continuations: Vec<Continuation>,
}

impl fmt::Debug for ContractTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            TaskState::Completed(_) => "completed",
            TaskState::Pending(_) => "pending",
        };
        f.debug_struct("ContractTask")
            .field("state", &state)
            .field("continuations", &self.continuations.len())
            .finish()
    }
}

impl ContractTask {
    /// The already-completed task of a method with nothing to return.
    pub fn completed() -> Self {
        Self::from_result(InteropValue::Void)
    }

    pub fn from_result(value: impl Into<InteropValue>) -> Self {
        Self {
            state: TaskState::Completed(value.into()),
            continuations: Vec::new(),
        }
    }

    /// A task that completes when the context holding `awaiter` returns.
    pub fn pending(awaiter: ContractTaskAwaiter) -> Self {
        Self {
            state: TaskState::Pending(awaiter),
            continuations: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        match &self.state {
            TaskState::Completed(_) => self.continuations.is_empty(),
            TaskState::Pending(awaiter) => awaiter.is_completed() && self.continuations.is_empty(),
        }
    }

    /// Runs `continuation` on the task's value once it is available.
    pub fn then<F>(mut self, continuation: F) -> Self
    where
        F: FnOnce(&mut ApplicationEngine, InteropValue) -> Result<InteropValue> + 'static,
    {
        self.continuations.push(Box::new(continuation));
        self
    }

    /// Drives the engine until the awaited context has returned, then runs
    /// the continuations in order.
    ///
    /// A fault inside the nested call is recorded on the awaiter and
    /// returned, and the continuations are dropped.
    pub fn wait(self, engine: &mut ApplicationEngine) -> Result<InteropValue> {
        let mut value = match self.state {
            TaskState::Completed(value) => value,
            TaskState::Pending(awaiter) => {
                while !awaiter.is_completed() {
                    if engine.invocation_depth() == 0 {
                        awaiter.set_exception(Error::state(
                            "awaited context left the invocation stack without returning",
                        ));
                        break;
                    }
                    if let Err(error) = engine.execute_next() {
                        awaiter.set_exception(error);
                        break;
                    }
                }
                match awaiter.take()? {
                    Some(item) => InteropValue::Item(item),
                    None => InteropValue::Void,
                }
            }
        };
        for continuation in self.continuations {
            value = continuation(engine, value)?;
        }
        Ok(value)
    }
}

impl From<InteropValue> for ContractTask {
    fn from(value: InteropValue) -> Self {
        Self::from_result(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_awaiter_lifecycle() {
        let awaiter = ContractTaskAwaiter::new();
        let shared = awaiter.clone();
        assert!(!awaiter.is_completed());
        assert!(awaiter.take().is_err());

        shared.set_result(Some(StackItem::from(5)));
        assert!(awaiter.is_completed());
        assert_eq!(awaiter.take().unwrap(), Some(StackItem::from(5)));

        shared.set_exception(Error::argument("boom"));
        assert_eq!(awaiter.take(), Err(Error::argument("boom")));
    }

    #[test]
    fn test_completed_task_state() {
        assert!(ContractTask::completed().is_completed());
        assert!(ContractTask::from_result(7).is_completed());
        let chained = ContractTask::from_result(7).then(|_, v| Ok(v));
        assert!(!chained.is_completed());
        assert!(!ContractTask::pending(ContractTaskAwaiter::new()).is_completed());
    }
}

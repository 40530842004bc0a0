//! Witnesses, notifications and logs.

use super::ApplicationEngine;
use crate::binary_serializer::BinarySerializer;
use crate::manifest::ContractParameterType;
use crate::{Error, Result};
use neo_config::{Hardfork, MAX_EVENT_NAME, MAX_NOTIFICATION_SIZE};
use neo_core::UInt160;
use neo_vm::{StackItem, StackItemType};
use tracing::debug;

/// A notification sent by a contract.
#[derive(Debug, Clone)]
pub struct NotifyEventArgs {
    pub script_hash: UInt160,
    pub event_name: String,
    /// A deep copy of the array the contract sent.
    pub state: StackItem,
}

/// A log message written by a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEventArgs {
    pub script_hash: UInt160,
    pub message: String,
}

impl ApplicationEngine {
    /// Whether `hash` witnessed the current execution: it is the calling
    /// script, or it signed the container.
    pub fn check_witness(&self, hash: &UInt160) -> bool {
        if self.calling_script_hash().as_ref() == Some(hash) {
            return true;
        }
        self.container()
            .map(|tx| tx.signers.contains(hash))
            .unwrap_or(false)
    }

    /// Whether the committee address configured in the protocol settings
    /// witnessed the current execution.
    pub fn check_committee(&self) -> Result<bool> {
        let Some(committee) = self.settings().committee.as_deref() else {
            return Ok(false);
        };
        let committee = UInt160::parse(committee)
            .map_err(|e| Error::format(format!("invalid committee address: {e}")))?;
        Ok(self.check_witness(&committee))
    }

    /// Handles `System.Runtime.Notify` from the executing contract.
    pub fn runtime_notify(&mut self, event_name: &[u8], state: StackItem) -> Result<()> {
        if event_name.len() > MAX_EVENT_NAME {
            return Err(Error::argument(format!(
                "event name is {} bytes, the maximum is {MAX_EVENT_NAME}",
                event_name.len()
            )));
        }
        let name = std::str::from_utf8(event_name)
            .map_err(|_| Error::argument("event name is not valid UTF-8"))?
            .to_string();
        let StackItem::Array(fields) = &state else {
            return Err(Error::argument("notification state must be an array"));
        };
        let contract = self
            .current_context()
            .and_then(|context| context.state.contract.as_ref())
            .ok_or_else(|| Error::state("notifications are not allowed in dynamic scripts"))?;
        if self.is_hardfork_enabled(Hardfork::Basilisk) {
            let event = contract
                .manifest
                .abi
                .events
                .iter()
                .find(|event| event.name == name)
                .ok_or_else(|| Error::state(format!("event `{name}` does not exist")))?;
            if event.parameters.len() != fields.len() {
                return Err(Error::state(format!(
                    "event `{name}` expects {} parameters, got {}",
                    event.parameters.len(),
                    fields.len()
                )));
            }
            for (field, parameter) in fields.items().iter().zip(&event.parameters) {
                if !check_item_type(field, parameter.parameter_type) {
                    return Err(Error::state(format!(
                        "event `{name}` parameter {} must be {}",
                        parameter.name, parameter.parameter_type
                    )));
                }
            }
        }
        BinarySerializer::serialize_with_limits(
            &state,
            MAX_NOTIFICATION_SIZE,
            self.limits().max_stack_size as usize,
        )?;
        let hash = self.current_script_hash()?;
        self.send_notification(hash, name, state);
        Ok(())
    }

    /// Records a notification. `state` is deep-copied.
    pub fn send_notification(&mut self, script_hash: UInt160, event_name: impl Into<String>, state: StackItem) {
        let event_name = event_name.into();
        debug!(%script_hash, event = %event_name, "notification");
        self.notifications.push(NotifyEventArgs {
            script_hash,
            event_name,
            state: state.deep_copy(),
        });
    }

    /// Handles `System.Runtime.Log` from the executing contract.
    pub fn runtime_log(&mut self, message: &[u8]) -> Result<()> {
        if message.len() > MAX_NOTIFICATION_SIZE {
            return Err(Error::argument(format!(
                "log message is {} bytes, the maximum is {MAX_NOTIFICATION_SIZE}",
                message.len()
            )));
        }
        let message = String::from_utf8(message.to_vec())
            .map_err(|_| Error::argument("log message is not valid UTF-8"))?;
        let script_hash = self.current_script_hash()?;
        debug!(%script_hash, %message, "contract log");
        self.logs.push(LogEventArgs {
            script_hash,
            message,
        });
        Ok(())
    }

    pub fn notifications(&self) -> &[NotifyEventArgs] {
        &self.notifications
    }

    pub fn logs(&self) -> &[LogEventArgs] {
        &self.logs
    }
}

/// Whether `item` may be passed where the ABI declares `parameter_type`.
fn check_item_type(item: &StackItem, parameter_type: ContractParameterType) -> bool {
    let item_type = item.item_type();
    if item_type == StackItemType::Pointer {
        return false;
    }
    let is_bytes = matches!(item_type, StackItemType::ByteString | StackItemType::Buffer);
    let span_len = |len: usize| match item {
        StackItem::Null => true,
        _ => is_bytes && item.get_span().map_or(false, |span| span.len() == len),
    };
    match parameter_type {
        ContractParameterType::Any => true,
        ContractParameterType::Boolean => item_type == StackItemType::Boolean,
        ContractParameterType::Integer => item_type == StackItemType::Integer,
        ContractParameterType::ByteArray => item.is_null() || is_bytes,
        ContractParameterType::String => {
            item.is_null() || (is_bytes && item.get_string().is_ok())
        }
        ContractParameterType::Hash160 => span_len(20),
        ContractParameterType::Hash256 => span_len(32),
        ContractParameterType::PublicKey => span_len(33),
        ContractParameterType::Signature => span_len(64),
        ContractParameterType::Array => matches!(
            item_type,
            StackItemType::Any | StackItemType::Array | StackItemType::Struct
        ),
        ContractParameterType::Map => {
            matches!(item_type, StackItemType::Any | StackItemType::Map)
        }
        ContractParameterType::InteropInterface => matches!(
            item_type,
            StackItemType::Any | StackItemType::InteropInterface
        ),
        ContractParameterType::Void => false,
    }
}

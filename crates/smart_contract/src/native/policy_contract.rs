//! The Policy native contract.
//!
//! Holds the network fees and the list of blocked accounts. Every setter
//! requires the committee's witness.

use super::contract_method_metadata::{CallContext, ContractMethodMetadata};
use super::native_contract::{NativeCallContext, NativeContract, NativeContractBase};
use crate::application_engine::ApplicationEngine;
use crate::contract_task::ContractTask;
use crate::data_cache::DataCache;
use crate::interop::{Arguments, InteropParameterType as Type};
use crate::storage::{KeyBuilder, StorageItem, StorageKey};
use crate::{Error, Result};
use neo_config::policy::{MAX_EXEC_FEE_FACTOR, MAX_STORAGE_PRICE};
use neo_config::GAS_FACTOR;
use neo_core::UInt160;
use neo_vm::CallFlags;
use num_bigint::BigInt;
use tracing::debug;

const PREFIX_BLOCKED_ACCOUNT: u8 = 15;
const PREFIX_FEE_PER_BYTE: u8 = 10;
const PREFIX_EXEC_FEE_FACTOR: u8 = 18;
const PREFIX_STORAGE_PRICE: u8 = 19;

/// The Policy native contract.
#[derive(Debug)]
pub struct PolicyContract {
    base: NativeContractBase,
}

impl PolicyContract {
    pub const NAME: &'static str = "PolicyContract";

    pub(super) fn new(id: i32) -> Result<Self> {
        let getter = |name: &'static str, returns: Type| {
            ContractMethodMetadata::new(name, CallContext::Snapshot)
                .returns(returns)
                .cpu_fee(1 << 15)
                .flags(CallFlags::READ_STATES)
        };
        let setter = |name: &'static str, value: Type| {
            ContractMethodMetadata::new(name, CallContext::Engine)
                .param("value", value)
                .cpu_fee(1 << 15)
                .flags(CallFlags::STATES)
        };
        let methods = vec![
            getter("getFeePerByte", Type::I64),
            getter("getExecFeeFactor", Type::U32),
            getter("getStoragePrice", Type::U32),
            getter("isBlocked", Type::Boolean).param("account", Type::Hash160),
            setter("setFeePerByte", Type::I64),
            setter("setExecFeeFactor", Type::U32),
            setter("setStoragePrice", Type::U32),
            ContractMethodMetadata::new("blockAccount", CallContext::Engine)
                .param("account", Type::Hash160)
                .returns(Type::Boolean)
                .cpu_fee(1 << 15)
                .flags(CallFlags::STATES),
            ContractMethodMetadata::new("unblockAccount", CallContext::Engine)
                .param("account", Type::Hash160)
                .returns(Type::Boolean)
                .cpu_fee(1 << 15)
                .flags(CallFlags::STATES),
        ];
        Ok(Self {
            base: NativeContractBase::new(id, Self::NAME, methods, Vec::new())?,
        })
    }

    fn key(&self, prefix: u8) -> StorageKey {
        KeyBuilder::new(self.id(), prefix).build()
    }

    fn blocked_key(&self, account: &UInt160) -> StorageKey {
        KeyBuilder::new(self.id(), PREFIX_BLOCKED_ACCOUNT)
            .add_u160(account)
            .build()
    }

    fn read_integer(&self, snapshot: &DataCache, prefix: u8) -> Result<BigInt> {
        snapshot
            .try_get(&self.key(prefix))
            .ok_or_else(|| Error::state("policy is not initialized"))?
            .to_integer()
    }

    fn write_integer(&self, snapshot: &mut DataCache, prefix: u8, value: impl Into<BigInt>) {
        snapshot
            .get_or_add(&self.key(prefix), StorageItem::default)
            .set_integer(value.into());
    }

    pub fn get_fee_per_byte(&self, snapshot: &DataCache) -> Result<i64> {
        i64::try_from(self.read_integer(snapshot, PREFIX_FEE_PER_BYTE)?)
            .map_err(|_| Error::format("fee per byte out of range"))
    }

    /// Fails before genesis, when the policy has not been stored yet.
    pub fn get_exec_fee_factor(&self, snapshot: &DataCache) -> Result<u32> {
        u32::try_from(self.read_integer(snapshot, PREFIX_EXEC_FEE_FACTOR)?)
            .map_err(|_| Error::format("exec fee factor out of range"))
    }

    /// Fails before genesis, when the policy has not been stored yet.
    pub fn get_storage_price(&self, snapshot: &DataCache) -> Result<u32> {
        u32::try_from(self.read_integer(snapshot, PREFIX_STORAGE_PRICE)?)
            .map_err(|_| Error::format("storage price out of range"))
    }

    pub fn is_blocked(&self, snapshot: &DataCache, account: &UInt160) -> Result<bool> {
        Ok(snapshot.contains(&self.blocked_key(account)))
    }

    fn require_committee(engine: &ApplicationEngine, method: &str) -> Result<()> {
        if engine.check_committee()? {
            Ok(())
        } else {
            Err(Error::permission(format!("{method} requires the committee")))
        }
    }

    fn set_fee_per_byte(&self, engine: &mut ApplicationEngine, value: i64) -> Result<()> {
        if !(0..=GAS_FACTOR).contains(&value) {
            return Err(Error::argument(format!("fee per byte {value} is out of range")));
        }
        Self::require_committee(engine, "setFeePerByte")?;
        self.write_integer(engine.snapshot_mut(), PREFIX_FEE_PER_BYTE, value);
        Ok(())
    }

    fn set_exec_fee_factor(&self, engine: &mut ApplicationEngine, value: u32) -> Result<()> {
        if !(1..=MAX_EXEC_FEE_FACTOR).contains(&value) {
            return Err(Error::argument(format!("exec fee factor {value} is out of range")));
        }
        Self::require_committee(engine, "setExecFeeFactor")?;
        self.write_integer(engine.snapshot_mut(), PREFIX_EXEC_FEE_FACTOR, value);
        Ok(())
    }

    fn set_storage_price(&self, engine: &mut ApplicationEngine, value: u32) -> Result<()> {
        if !(1..=MAX_STORAGE_PRICE).contains(&value) {
            return Err(Error::argument(format!("storage price {value} is out of range")));
        }
        Self::require_committee(engine, "setStoragePrice")?;
        self.write_integer(engine.snapshot_mut(), PREFIX_STORAGE_PRICE, value);
        Ok(())
    }

    /// Blocks `account` without checking the committee. Returns `false` if
    /// it was already blocked.
    pub(crate) fn block_account_internal(&self, snapshot: &mut DataCache, account: &UInt160) -> Result<bool> {
        if super::registry().get(account).is_some() {
            return Err(Error::argument(format!(
                "cannot block the native contract {account}"
            )));
        }
        let key = self.blocked_key(account);
        if snapshot.contains(&key) {
            return Ok(false);
        }
        snapshot.add(key, StorageItem::default())?;
        debug!(%account, "account blocked");
        Ok(true)
    }

    fn block_account(&self, engine: &mut ApplicationEngine, account: &UInt160) -> Result<bool> {
        Self::require_committee(engine, "blockAccount")?;
        self.block_account_internal(engine.snapshot_mut(), account)
    }

    fn unblock_account(&self, engine: &mut ApplicationEngine, account: &UInt160) -> Result<bool> {
        Self::require_committee(engine, "unblockAccount")?;
        let key = self.blocked_key(account);
        let snapshot = engine.snapshot_mut();
        if !snapshot.contains(&key) {
            return Ok(false);
        }
        snapshot.delete(&key);
        debug!(%account, "account unblocked");
        Ok(true)
    }
}

fn account_arg(args: &mut Arguments) -> Result<UInt160> {
    args.next()?
        .into_hash160()?
        .ok_or_else(|| Error::argument("account can't be null"))
}

impl NativeContract for PolicyContract {
    fn base(&self) -> &NativeContractBase {
        &self.base
    }

    fn invoke(
        &self,
        context: NativeCallContext<'_>,
        method: &str,
        mut args: Arguments,
    ) -> Result<ContractTask> {
        match method {
            "getFeePerByte" => Ok(ContractTask::from_result(self.get_fee_per_byte(context.snapshot()?)?)),
            "getExecFeeFactor" => Ok(ContractTask::from_result(self.get_exec_fee_factor(context.snapshot()?)?)),
            "getStoragePrice" => Ok(ContractTask::from_result(self.get_storage_price(context.snapshot()?)?)),
            "isBlocked" => {
                let account = account_arg(&mut args)?;
                Ok(ContractTask::from_result(self.is_blocked(context.snapshot()?, &account)?))
            }
            "setFeePerByte" => {
                self.set_fee_per_byte(context.engine()?, args.next()?.into_int()?)?;
                Ok(ContractTask::completed())
            }
            "setExecFeeFactor" => {
                self.set_exec_fee_factor(context.engine()?, args.next()?.into_int()?)?;
                Ok(ContractTask::completed())
            }
            "setStoragePrice" => {
                self.set_storage_price(context.engine()?, args.next()?.into_int()?)?;
                Ok(ContractTask::completed())
            }
            "blockAccount" => {
                let account = account_arg(&mut args)?;
                Ok(ContractTask::from_result(self.block_account(context.engine()?, &account)?))
            }
            "unblockAccount" => {
                let account = account_arg(&mut args)?;
                Ok(ContractTask::from_result(self.unblock_account(context.engine()?, &account)?))
            }
            _ => Err(Error::not_supported(format!(
                "method {method} of {} is not implemented",
                Self::NAME
            ))),
        }
    }

    fn initialize(&self, engine: &mut ApplicationEngine) -> Result<()> {
        let settings = engine.settings().clone();
        let snapshot = engine.snapshot_mut();
        for (prefix, value) in [
            (PREFIX_FEE_PER_BYTE, settings.initial_fee_per_byte),
            (PREFIX_EXEC_FEE_FACTOR, settings.initial_exec_fee_factor),
            (PREFIX_STORAGE_PRICE, settings.initial_storage_price),
        ] {
            snapshot.add(self.key(prefix), StorageItem::from_integer(BigInt::from(value)))?;
        }
        Ok(())
    }
}

//! The ContractManagement native contract.
//!
//! Deploys, updates and destroys contracts and keeps their states in
//! storage. Native contract states are synthesized from the native registry
//! and never stored.

use super::contract_method_metadata::{CallContext, ContractMethodMetadata};
use super::native_contract::{NativeCallContext, NativeContract, NativeContractBase};
use crate::application_engine::ApplicationEngine;
use crate::contract_state::ContractState;
use crate::contract_task::ContractTask;
use crate::data_cache::DataCache;
use crate::helper::{check_script, get_contract_hash};
use crate::interop::{Arguments, InteropParameterType as Type, InteropValue};
use crate::manifest::{ContractEventDescriptor, ContractManifest, ContractParameterDefinition, ContractParameterType};
use crate::nef_file::NefFile;
use crate::storage::{FindOptions, KeyBuilder, StorageItem, StorageIterator, StorageKey};
use crate::{Error, Result};
use neo_core::UInt160;
use neo_persistence::SeekDirection;
use neo_vm::{CallFlags, ExecutionEngineLimits, StackItem};
use num_bigint::BigInt;
use tracing::debug;

const PREFIX_MINIMUM_DEPLOYMENT_FEE: u8 = 20;
const PREFIX_NEXT_AVAILABLE_ID: u8 = 15;
const PREFIX_CONTRACT: u8 = 8;
const PREFIX_CONTRACT_HASH: u8 = 12;

/// The ContractManagement native contract.
#[derive(Debug)]
pub struct ContractManagement {
    base: NativeContractBase,
}

impl ContractManagement {
    pub const NAME: &'static str = "ContractManagement";

    pub(super) fn new(id: i32) -> Result<Self> {
        let read = CallFlags::READ_STATES;
        let write = CallFlags::STATES | CallFlags::ALLOW_NOTIFY;
        let methods = vec![
            ContractMethodMetadata::new("getMinimumDeploymentFee", CallContext::Snapshot)
                .returns(Type::I64)
                .cpu_fee(1 << 15)
                .flags(read),
            ContractMethodMetadata::new("setMinimumDeploymentFee", CallContext::Engine)
                .param("value", Type::BigInteger)
                .cpu_fee(1 << 15)
                .flags(CallFlags::STATES),
            ContractMethodMetadata::new("getContract", CallContext::Snapshot)
                .param("hash", Type::Hash160)
                .returns(Type::Array)
                .cpu_fee(1 << 15)
                .flags(read),
            ContractMethodMetadata::new("getContractById", CallContext::Snapshot)
                .param("id", Type::I32)
                .returns(Type::Array)
                .cpu_fee(1 << 15)
                .flags(read),
            ContractMethodMetadata::new("getContractHashes", CallContext::Engine)
                .returns(Type::InteropInterface)
                .cpu_fee(1 << 15)
                .flags(read),
            ContractMethodMetadata::new("hasMethod", CallContext::Snapshot)
                .param("hash", Type::Hash160)
                .param("method", Type::String)
                .param("pcount", Type::I32)
                .returns(Type::Boolean)
                .cpu_fee(1 << 15)
                .flags(read),
            ContractMethodMetadata::new("deploy", CallContext::Engine)
                .param("nefFile", Type::ByteArray)
                .param("manifest", Type::ByteArray)
                .returns(Type::Array)
                .flags(write),
            ContractMethodMetadata::new("deploy", CallContext::Engine)
                .param("nefFile", Type::ByteArray)
                .param("manifest", Type::ByteArray)
                .param("data", Type::Any)
                .returns(Type::Array)
                .flags(write),
            ContractMethodMetadata::new("update", CallContext::Engine)
                .param("nefFile", Type::ByteArray)
                .param("manifest", Type::ByteArray)
                .flags(write),
            ContractMethodMetadata::new("update", CallContext::Engine)
                .param("nefFile", Type::ByteArray)
                .param("manifest", Type::ByteArray)
                .param("data", Type::Any)
                .flags(write),
            ContractMethodMetadata::new("destroy", CallContext::Engine)
                .cpu_fee(1 << 15)
                .flags(write),
        ];
        let hash_event = |name: &str| {
            ContractEventDescriptor::new(
                name,
                vec![ContractParameterDefinition::new("Hash", ContractParameterType::Hash160)],
            )
        };
        let events = vec![hash_event("Deploy"), hash_event("Update"), hash_event("Destroy")];
        Ok(Self {
            base: NativeContractBase::new(id, Self::NAME, methods, events)?,
        })
    }

    fn contract_key(&self, hash: &UInt160) -> StorageKey {
        KeyBuilder::new(self.id(), PREFIX_CONTRACT).add_u160(hash).build()
    }

    fn contract_hash_key(&self, id: i32) -> StorageKey {
        KeyBuilder::new(self.id(), PREFIX_CONTRACT_HASH)
            .add_big_endian(id)
            .build()
    }

    fn stored_contract(&self, snapshot: &DataCache, hash: &UInt160) -> Result<Option<ContractState>> {
        match snapshot.try_get(&self.contract_key(hash)) {
            Some(mut item) => Ok(Some(item.get_interoperable::<ContractState>()?.clone())),
            None => Ok(None),
        }
    }

    /// The contract deployed at `hash`, native or not.
    pub fn get_contract(&self, snapshot: &DataCache, hash: &UInt160) -> Result<Option<ContractState>> {
        if let Some(native) = super::registry().get(hash) {
            return Ok(Some(native.contract_state()));
        }
        self.stored_contract(snapshot, hash)
    }

    pub fn get_contract_by_id(&self, snapshot: &DataCache, id: i32) -> Result<Option<ContractState>> {
        if id < 0 {
            return Ok(super::registry().get_by_id(id).map(|c| c.contract_state()));
        }
        let Some(item) = snapshot.try_get(&self.contract_hash_key(id)) else {
            return Ok(None);
        };
        let hash = UInt160::from_bytes(&item.value()?)?;
        self.stored_contract(snapshot, &hash)
    }

    /// Hashes of the deployed contracts in id order, as `Struct[id, hash]`
    /// entries whose ids are big-endian. Only deployed contracts carry an id
    /// entry, so every id seen is non-negative.
    pub fn get_contract_hashes(&self, limits: ExecutionEngineLimits) -> StorageIterator {
        let prefix = StorageKey::create_search_prefix(self.id(), &[PREFIX_CONTRACT_HASH]);
        StorageIterator::new(prefix, 1, FindOptions::REMOVE_PREFIX, limits)
    }

    pub fn has_method(&self, snapshot: &DataCache, hash: &UInt160, method: &str, pcount: i32) -> Result<bool> {
        Ok(self
            .get_contract(snapshot, hash)?
            .map_or(false, |c| c.manifest.abi.get_method(method, pcount).is_some()))
    }

    pub fn get_minimum_deployment_fee(&self, snapshot: &DataCache) -> Result<i64> {
        let key = KeyBuilder::new(self.id(), PREFIX_MINIMUM_DEPLOYMENT_FEE).build();
        let item = snapshot
            .try_get(&key)
            .ok_or_else(|| Error::state("contract management is not initialized"))?;
        i64::try_from(item.to_integer()?)
            .map_err(|_| Error::format("minimum deployment fee out of range"))
    }

    fn set_minimum_deployment_fee(&self, engine: &mut ApplicationEngine, value: BigInt) -> Result<()> {
        if value < BigInt::from(0) {
            return Err(Error::argument(format!("minimum deployment fee {value} is negative")));
        }
        if !engine.check_committee()? {
            return Err(Error::permission("setMinimumDeploymentFee requires the committee"));
        }
        let key = KeyBuilder::new(self.id(), PREFIX_MINIMUM_DEPLOYMENT_FEE).build();
        engine
            .snapshot_mut()
            .get_or_add(&key, StorageItem::default)
            .set_integer(value);
        Ok(())
    }

    fn next_available_id(&self, snapshot: &mut DataCache) -> Result<i32> {
        let key = KeyBuilder::new(self.id(), PREFIX_NEXT_AVAILABLE_ID).build();
        let item = snapshot
            .get_and_change(&key)
            .ok_or_else(|| Error::state("contract management is not initialized"))?;
        let id = item.to_integer()?;
        item.add(BigInt::from(1))?;
        i32::try_from(&id).map_err(|_| Error::state("contract ids are exhausted"))
    }

    /// Deploys a contract sent by the transaction's sender.
    ///
    /// The returned task completes with the new contract state once
    /// `_deploy`, if the contract has one, has run.
    pub fn deploy(
        &self,
        engine: &mut ApplicationEngine,
        nef_file: Vec<u8>,
        manifest: Vec<u8>,
        data: StackItem,
    ) -> Result<ContractTask> {
        let sender = engine
            .container()
            .and_then(|tx| tx.sender())
            .ok_or_else(|| Error::state("contracts can only be deployed by a transaction"))?;
        if nef_file.is_empty() {
            return Err(Error::argument("NEF file length can't be zero"));
        }
        if manifest.is_empty() {
            return Err(Error::argument("manifest length can't be zero"));
        }
        let storage_fee = engine.storage_price() * (nef_file.len() + manifest.len()) as i64;
        let minimum_fee = self.get_minimum_deployment_fee(engine.snapshot())?;
        engine.add_gas(storage_fee.max(minimum_fee))?;

        let nef = NefFile::parse(&nef_file)?;
        let manifest = ContractManifest::parse(&manifest)?;
        check_script(&nef.script, &manifest.abi)?;
        let hash = get_contract_hash(&sender, nef.checksum, &manifest.name);
        if super::policy().is_blocked(engine.snapshot(), &hash)? {
            return Err(Error::state(format!("the contract {hash} has been blocked")));
        }
        let key = self.contract_key(&hash);
        if super::registry().get(&hash).is_some() || engine.snapshot().contains(&key) {
            return Err(Error::state(format!("contract already exists: {hash}")));
        }
        let id = self.next_available_id(engine.snapshot_mut())?;
        if !manifest.is_valid(engine.limits(), &hash) {
            return Err(Error::state(format!("invalid manifest for contract {hash}")));
        }
        let contract = ContractState::new(id, hash, nef, manifest);
        let snapshot = engine.snapshot_mut();
        snapshot.add(key, StorageItem::from_interoperable(Box::new(contract.clone())))?;
        snapshot.add(
            self.contract_hash_key(id),
            StorageItem::new(hash.to_array().to_vec()),
        )?;
        debug!(%hash, id, name = %contract.manifest.name, "contract deployed");
        let task = self.on_deploy(engine, &contract, data, false)?;
        Ok(task.then(move |_, _| Ok(InteropValue::from(contract))))
    }

    /// Updates the calling contract. Either part may be omitted, not both.
    pub fn update(
        &self,
        engine: &mut ApplicationEngine,
        nef_file: Option<Vec<u8>>,
        manifest: Option<Vec<u8>>,
        data: StackItem,
    ) -> Result<ContractTask> {
        if nef_file.is_none() && manifest.is_none() {
            return Err(Error::argument("the NEF file and the manifest can't both be null"));
        }
        let length = nef_file.as_ref().map_or(0, Vec::len) + manifest.as_ref().map_or(0, Vec::len);
        engine.add_gas(engine.storage_price() * length as i64)?;

        let hash = engine
            .calling_script_hash()
            .ok_or_else(|| Error::state("update must be called by a contract"))?;
        let mut contract = self
            .stored_contract(engine.snapshot(), &hash)?
            .ok_or_else(|| Error::state(format!("can't update non-existent contract {hash}")))?;
        if contract.update_counter == u16::MAX {
            return Err(Error::state(format!(
                "the contract {hash} reached the maximum number of updates"
            )));
        }
        if let Some(nef_file) = nef_file {
            if nef_file.is_empty() {
                return Err(Error::argument("NEF file length can't be zero"));
            }
            contract.nef = NefFile::parse(&nef_file)?;
        }
        if let Some(manifest) = manifest {
            if manifest.is_empty() {
                return Err(Error::argument("manifest length can't be zero"));
            }
            let manifest = ContractManifest::parse(&manifest)?;
            if manifest.name != contract.manifest.name {
                return Err(Error::state("the name of the contract can't be changed"));
            }
            if !manifest.is_valid(engine.limits(), &hash) {
                return Err(Error::state(format!("invalid manifest for contract {hash}")));
            }
            contract.manifest = manifest;
        }
        check_script(&contract.nef.script, &contract.manifest.abi)?;
        contract.update_counter += 1;
        engine
            .snapshot_mut()
            .get_or_add(&self.contract_key(&hash), StorageItem::default)
            .set_interoperable(Box::new(contract.clone()));
        debug!(%hash, update_counter = contract.update_counter, "contract updated");
        self.on_deploy(engine, &contract, data, true)
    }

    /// Destroys the calling contract with all its storage and blocks its
    /// hash for good.
    pub fn destroy(&self, engine: &mut ApplicationEngine) -> Result<()> {
        let hash = engine
            .calling_script_hash()
            .ok_or_else(|| Error::state("destroy must be called by a contract"))?;
        let Some(contract) = self.stored_contract(engine.snapshot(), &hash)? else {
            return Ok(());
        };
        let snapshot = engine.snapshot_mut();
        snapshot.delete(&self.contract_key(&hash));
        snapshot.delete(&self.contract_hash_key(contract.id));
        let prefix = StorageKey::create_search_prefix(contract.id, &[]);
        let keys: Vec<StorageKey> = snapshot
            .find(&prefix, SeekDirection::Forward)
            .map(|(key, _)| key)
            .collect();
        for key in &keys {
            snapshot.delete(key);
        }
        super::policy().block_account_internal(snapshot, &hash)?;
        debug!(%hash, id = contract.id, "contract destroyed");
        engine.send_notification(self.hash(), "Destroy", hash_state(&hash));
        Ok(())
    }

    /// Calls `_deploy(data, update)` when the contract declares it, then
    /// sends the `Deploy` or `Update` notification.
    fn on_deploy(
        &self,
        engine: &mut ApplicationEngine,
        contract: &ContractState,
        data: StackItem,
        update: bool,
    ) -> Result<ContractTask> {
        let own_hash = self.hash();
        let hash = contract.hash;
        let event = if update { "Update" } else { "Deploy" };
        if contract.manifest.abi.get_method("_deploy", 2).is_some() {
            let task = engine.call_from_native_contract(
                own_hash,
                hash,
                "_deploy",
                vec![data, StackItem::from(update)],
            )?;
            return Ok(task.then(move |engine, _| {
                engine.send_notification(own_hash, event, hash_state(&hash));
                Ok(InteropValue::Void)
            }));
        }
        engine.send_notification(own_hash, event, hash_state(&hash));
        Ok(ContractTask::completed())
    }
}

fn hash_state(hash: &UInt160) -> StackItem {
    StackItem::new_array(vec![StackItem::from(hash.to_array().to_vec())])
}

fn required_hash(args: &mut Arguments) -> Result<UInt160> {
    args.next()?
        .into_hash160()?
        .ok_or_else(|| Error::argument("hash can't be null"))
}

fn optional_data(args: &mut Arguments) -> Result<StackItem> {
    if args.is_empty() {
        Ok(StackItem::Null)
    } else {
        args.next()?.into_item()
    }
}

impl NativeContract for ContractManagement {
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
            "getMinimumDeploymentFee" => Ok(ContractTask::from_result(
                self.get_minimum_deployment_fee(context.snapshot()?)?,
            )),
            "setMinimumDeploymentFee" => {
                let value = args.next()?.into_integer()?;
                self.set_minimum_deployment_fee(context.engine()?, value)?;
                Ok(ContractTask::completed())
            }
            "getContract" => {
                let hash = required_hash(&mut args)?;
                Ok(ContractTask::from_result(
                    self.get_contract(context.snapshot()?, &hash)?,
                ))
            }
            "getContractById" => {
                let id: i32 = args.next()?.into_int()?;
                Ok(ContractTask::from_result(
                    self.get_contract_by_id(context.snapshot()?, id)?,
                ))
            }
            "getContractHashes" => {
                let limits = *context.engine()?.limits();
                let iterator = self.get_contract_hashes(limits);
                Ok(ContractTask::from_result(InteropValue::interface(iterator)))
            }
            "hasMethod" => {
                let hash = required_hash(&mut args)?;
                let name = args
                    .next()?
                    .into_string()?
                    .ok_or_else(|| Error::argument("method can't be null"))?;
                let pcount: i32 = args.next()?.into_int()?;
                Ok(ContractTask::from_result(self.has_method(
                    context.snapshot()?,
                    &hash,
                    &name,
                    pcount,
                )?))
            }
            "deploy" => {
                let nef_file = args.next()?.into_bytes()?.unwrap_or_default();
                let manifest = args.next()?.into_bytes()?.unwrap_or_default();
                let data = optional_data(&mut args)?;
                self.deploy(context.engine()?, nef_file, manifest, data)
            }
            "update" => {
                let nef_file = args.next()?.into_bytes()?;
                let manifest = args.next()?.into_bytes()?;
                let data = optional_data(&mut args)?;
                self.update(context.engine()?, nef_file, manifest, data)
            }
            "destroy" => {
                self.destroy(context.engine()?)?;
                Ok(ContractTask::completed())
            }
            _ => Err(Error::not_supported(format!(
                "method {method} of {} is not implemented",
                Self::NAME
            ))),
        }
    }

    fn initialize(&self, engine: &mut ApplicationEngine) -> Result<()> {
        let minimum_fee = engine.settings().minimum_deployment_fee;
        let snapshot = engine.snapshot_mut();
        snapshot.add(
            KeyBuilder::new(self.id(), PREFIX_MINIMUM_DEPLOYMENT_FEE).build(),
            StorageItem::from_integer(BigInt::from(minimum_fee)),
        )?;
        snapshot.add(
            KeyBuilder::new(self.id(), PREFIX_NEXT_AVAILABLE_ID).build(),
            StorageItem::from_integer(BigInt::from(1)),
        )?;
        Ok(())
    }
}

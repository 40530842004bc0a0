//! Gas accounting for the application engine.

use super::ApplicationEngine;
use crate::{Error, Result};
use tracing::warn;

impl ApplicationEngine {
    /// Charges `datoshi` against the gas limit.
    ///
    /// Going over the limit fails with [`Error::OutOfGas`], which faults the
    /// whole execution.
    pub fn add_gas(&mut self, datoshi: i64) -> Result<()> {
        if datoshi < 0 {
            return Err(Error::argument(format!("negative fee: {datoshi}")));
        }
        let consumed = self
            .fee_consumed
            .checked_add(datoshi)
            .ok_or_else(|| Error::argument("fee overflow"))?;
        self.fee_consumed = consumed;
        if consumed > self.gas_limit {
            warn!(consumed, limit = self.gas_limit, "gas exhausted");
            return Err(Error::OutOfGas {
                consumed,
                limit: self.gas_limit,
            });
        }
        Ok(())
    }

    /// Gas consumed so far, in datoshi.
    pub fn fee_consumed(&self) -> i64 {
        self.fee_consumed
    }

    pub fn gas_limit(&self) -> i64 {
        self.gas_limit
    }

    pub fn gas_left(&self) -> i64 {
        self.gas_limit - self.fee_consumed
    }

    /// Multiplier applied to opcode, syscall and native CPU prices.
    pub fn exec_fee_factor(&self) -> i64 {
        self.exec_fee_factor
    }

    /// Price of one byte of storage, in datoshi.
    pub fn storage_price(&self) -> i64 {
        self.storage_price
    }
}

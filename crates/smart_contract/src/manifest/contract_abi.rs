//! The ABI section of a manifest: methods and events.

use super::ContractParameterType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A named, typed parameter of a method or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameterDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub parameter_type: ContractParameterType,
}

impl ContractParameterDefinition {
    pub fn new(name: impl Into<String>, parameter_type: ContractParameterType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::format("parameter name can't be empty"));
        }
        if self.parameter_type == ContractParameterType::Void {
            return Err(Error::format(format!("parameter {} can't be Void", self.name)));
        }
        Ok(())
    }
}

fn validate_parameters(owner: &str, parameters: &[ContractParameterDefinition]) -> Result<()> {
    for (i, parameter) in parameters.iter().enumerate() {
        parameter.validate()?;
        if parameters[..i].iter().any(|p| p.name == parameter.name) {
            return Err(Error::format(format!(
                "{owner} declares parameter {} twice",
                parameter.name
            )));
        }
    }
    Ok(())
}

/// A method exposed by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMethodDescriptor {
    pub name: String,
    pub parameters: Vec<ContractParameterDefinition>,
    #[serde(rename = "returntype")]
    pub return_type: ContractParameterType,
    /// Entry point of the method in the contract script.
    pub offset: i32,
    /// Whether the method can be called without write or notify rights.
    pub safe: bool,
}

impl ContractMethodDescriptor {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::format("method name can't be empty"));
        }
        if self.offset < 0 {
            return Err(Error::format(format!(
                "method {} has a negative offset",
                self.name
            )));
        }
        validate_parameters(&self.name, &self.parameters)
    }
}

/// An event a contract may emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEventDescriptor {
    pub name: String,
    pub parameters: Vec<ContractParameterDefinition>,
}

impl ContractEventDescriptor {
    pub fn new(name: impl Into<String>, parameters: Vec<ContractParameterDefinition>) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// The methods and events of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContractAbi {
    pub methods: Vec<ContractMethodDescriptor>,
    pub events: Vec<ContractEventDescriptor>,
}

impl ContractAbi {
    /// Looks up a method by name and parameter count. A count of `-1`
    /// matches the first method with that name.
    pub fn get_method(&self, name: &str, pcount: i32) -> Option<&ContractMethodDescriptor> {
        if !(-1..=u16::MAX as i32).contains(&pcount) {
            return None;
        }
        self.methods.iter().find(|m| {
            m.name == name && (pcount < 0 || m.parameters.len() == pcount as usize)
        })
    }

    /// Checks the structural rules: at least one method, every method unique
    /// by name and parameter count, every event unique by name.
    pub fn validate(&self) -> Result<()> {
        if self.methods.is_empty() {
            return Err(Error::format("the ABI declares no methods"));
        }
        for (i, method) in self.methods.iter().enumerate() {
            method.validate()?;
            let duplicate = self.methods[..i].iter().any(|m| {
                m.name == method.name && m.parameters.len() == method.parameters.len()
            });
            if duplicate {
                return Err(Error::format(format!(
                    "method {}/{} is declared twice",
                    method.name,
                    method.parameters.len()
                )));
            }
        }
        for (i, event) in self.events.iter().enumerate() {
            if event.name.is_empty() {
                return Err(Error::format("event name can't be empty"));
            }
            validate_parameters(&event.name, &event.parameters)?;
            if self.events[..i].iter().any(|e| e.name == event.name) {
                return Err(Error::format(format!("event {} is declared twice", event.name)));
            }
        }
        Ok(())
    }
}

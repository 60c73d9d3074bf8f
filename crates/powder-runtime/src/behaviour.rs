//! Behaviour modules and the references that name their functions.

use crate::access::PowderAccess;
use powder_core::{Error, Powder, Result};
use std::fmt;

/// Module-local index of a resolved function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// A parsed `"module:function"` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BehaviourRef {
    pub module: String,
    pub function: String,
}

impl BehaviourRef {
    /// Split at the first `:`. Both halves must be non-empty.
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidBehaviour {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let (module, function) = reference
            .split_once(':')
            .ok_or_else(|| invalid("expected 'module:function'"))?;

        if module.is_empty() {
            return Err(invalid("module name is empty"));
        }
        if function.is_empty() {
            return Err(invalid("function name is empty"));
        }

        Ok(Self {
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

impl fmt::Display for BehaviourRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.function)
    }
}

/// A named bundle of behaviour functions plus per-tick hooks.
///
/// Functions are looked up by name once, at load time, and called through
/// the returned [`FunctionId`] afterwards.
pub trait BehaviourModule: Send {
    fn name(&self) -> &str;

    fn resolve(&self, function: &str) -> Option<FunctionId>;

    /// Run one function for `powder`. Returning `true` keeps the powder awake
    /// even if its state did not change.
    fn call(&mut self, function: FunctionId, access: &mut dyn PowderAccess, powder: Powder) -> bool;

    /// Runs once per tick before any powder is evaluated.
    fn pre_tick(&mut self, _access: &mut dyn PowderAccess) {}

    /// Runs once per tick after the sweep.
    fn post_tick(&mut self, _access: &mut dyn PowderAccess) {}
}

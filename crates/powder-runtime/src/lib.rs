//! Behaviour dispatch for powder types.
//!
//! This crate provides the seam between the simulation and the logic that
//! drives each powder type:
//! - `PowderAccess`, the host calls a behaviour can make
//! - `BehaviourModule`, a named set of functions plus per-tick hooks
//! - `BehaviourRegistry`, load-time resolution of `"module:function"` references

pub mod access;
pub mod behaviour;

pub use access::PowderAccess;
pub use behaviour::{BehaviourModule, BehaviourRef, FunctionId};

use powder_core::{Error, Powder, Result};
use tracing::{debug, info};

/// A resolved behaviour: which module to call and which of its functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviourId {
    module: usize,
    function: FunctionId,
}

/// Owns the loaded behaviour modules.
#[derive(Default)]
pub struct BehaviourRegistry {
    modules: Vec<Box<dyn BehaviourModule>>,
}

impl BehaviourRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module. Module names must be unique.
    pub fn register(&mut self, module: Box<dyn BehaviourModule>) -> Result<()> {
        if self.module_index(module.name()).is_some() {
            return Err(Error::Configuration(format!(
                "behaviour module '{}' is already registered",
                module.name()
            )));
        }

        info!(module = module.name(), "Registered behaviour module");
        self.modules.push(module);
        Ok(())
    }

    /// Resolve a `"module:function"` reference. Failure means the type data
    /// names something that was never loaded, which cannot be fixed at runtime.
    pub fn resolve(&self, reference: &str) -> Result<BehaviourId> {
        let parsed = BehaviourRef::parse(reference)?;

        let module = self.module_index(&parsed.module).ok_or_else(|| Error::InvalidBehaviour {
            reference: reference.to_string(),
            reason: format!("behaviour module '{}' not found", parsed.module),
        })?;

        let function = self.modules[module]
            .resolve(&parsed.function)
            .ok_or_else(|| Error::InvalidBehaviour {
                reference: reference.to_string(),
                reason: format!("behaviour function '{}' not found", parsed.function),
            })?;

        debug!(reference, "Resolved behaviour");
        Ok(BehaviourId { module, function })
    }

    /// Run a resolved behaviour. Returns the keep-awake flag.
    pub fn call(&mut self, id: BehaviourId, access: &mut dyn PowderAccess, powder: Powder) -> bool {
        self.modules[id.module].call(id.function, access, powder)
    }

    /// Run every module's pre-tick hook in registration order.
    pub fn pre_tick(&mut self, access: &mut dyn PowderAccess) {
        for module in &mut self.modules {
            module.pre_tick(access);
        }
    }

    /// Run every module's post-tick hook in registration order.
    pub fn post_tick(&mut self, access: &mut dyn PowderAccess) {
        for module in &mut self.modules {
            module.post_tick(access);
        }
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn module_index(&self, name: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powder_core::{GridPos, GridSize};
    use std::sync::Arc;

    struct NullAccess {
        log: Vec<String>,
    }

    impl PowderAccess for NullAccess {
        fn create_powder(&mut self, type_id: &str, _pos: GridPos) -> Option<Powder> {
            self.log.push(format!("create {type_id}"));
            None
        }
        fn remove_powder(&mut self, powder: Powder) {
            self.log.push(format!("remove {powder}"));
        }
        fn get_powder(&self, _pos: GridPos) -> Option<Powder> {
            None
        }
        fn get_powder_type(&self, _powder: Powder) -> Option<Arc<str>> {
            None
        }
        fn get_powder_pos(&self, _powder: Powder) -> Option<GridPos> {
            None
        }
        fn set_powder_pos(&mut self, _powder: Powder, _pos: GridPos) -> bool {
            false
        }
        fn grid_size(&self) -> GridSize {
            GridSize::new(8, 8)
        }
    }

    struct Recorder {
        name: &'static str,
    }

    impl BehaviourModule for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn resolve(&self, function: &str) -> Option<FunctionId> {
            match function {
                "wake" => Some(FunctionId(0)),
                "rest" => Some(FunctionId(1)),
                _ => None,
            }
        }

        fn call(&mut self, function: FunctionId, access: &mut dyn PowderAccess, powder: Powder) -> bool {
            access.remove_powder(powder);
            function == FunctionId(0)
        }

        fn pre_tick(&mut self, access: &mut dyn PowderAccess) {
            access.create_powder(&format!("{}-pre", self.name), GridPos::new(0, 0));
        }

        fn post_tick(&mut self, access: &mut dyn PowderAccess) {
            access.create_powder(&format!("{}-post", self.name), GridPos::new(0, 0));
        }
    }

    fn registry() -> BehaviourRegistry {
        let mut registry = BehaviourRegistry::new();
        registry.register(Box::new(Recorder { name: "a" })).unwrap();
        registry.register(Box::new(Recorder { name: "b" })).unwrap();
        registry
    }

    #[test]
    fn test_register_rejects_duplicate_names() {
        let mut registry = registry();
        assert!(registry.register(Box::new(Recorder { name: "a" })).is_err());
        assert_eq!(registry.module_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_and_call() {
        let mut registry = registry();
        let wake = registry.resolve("b:wake").unwrap();
        let rest = registry.resolve("b:rest").unwrap();
        assert_ne!(wake, rest);

        let mut access = NullAccess { log: Vec::new() };
        assert!(registry.call(wake, &mut access, powder_core::Handle(4)));
        assert!(!registry.call(rest, &mut access, powder_core::Handle(5)));
        assert_eq!(access.log, vec!["remove #4", "remove #5"]);
    }

    #[test]
    fn test_resolve_failures_are_fatal_errors() {
        let registry = registry();
        for bad in ["a", "missing:wake", "a:missing", ":wake"] {
            assert!(
                matches!(registry.resolve(bad), Err(Error::InvalidBehaviour { .. })),
                "{bad:?} should not resolve"
            );
        }
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let mut registry = registry();
        let mut access = NullAccess { log: Vec::new() };

        registry.pre_tick(&mut access);
        registry.post_tick(&mut access);

        assert_eq!(
            access.log,
            vec!["create a-pre", "create b-pre", "create a-post", "create b-post"]
        );
    }
}

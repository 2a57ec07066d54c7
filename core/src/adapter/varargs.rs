use std::sync::{Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::adapter::factory::Adapters;
use crate::adapter::handle::{CollectNode, Handle};
use crate::api::{AdaptError, Result};
use crate::conversion::is_null_conversion;
use crate::types::{Signature, Type};

/// A handle whose trailing array parameter also accepts its elements as
/// separate arguments.
///
/// Each caller arity needs its own collecting handle. Built handles are
/// memoized per arity; concurrent builders for the same arity may both
/// build, and the last one to finish wins. Nothing is ever evicted.
pub struct VarargsCollector<'t> {
    adapters: Adapters<'t>,
    target: Handle<'t>,
    array_type: &'t Type<'t>,
    cache: Mutex<HashMap<usize, Handle<'t>>>,
}

impl<'t> Adapters<'t> {
    /// Turns `target` into a varargs collector over its last parameter.
    pub fn as_varargs_collector(
        &self,
        target: Handle<'t>,
        array_type: &'t Type<'t>,
    ) -> Result<VarargsCollector<'t>> {
        let fits = array_type.element_type().is_some()
            && target
                .signature()
                .last_param()
                .is_some_and(|last| is_null_conversion(array_type, last));
        if !fits {
            return Err(AdaptError::not_convertible(target.signature(), array_type));
        }
        Ok(VarargsCollector {
            adapters: self.clone(),
            target,
            array_type,
            cache: Mutex::new(HashMap::new()),
        })
    }
}

impl<'t> VarargsCollector<'t> {
    pub fn signature(&self) -> &Signature<'t> {
        self.target.signature()
    }

    pub fn target(&self) -> &Handle<'t> {
        &self.target
    }

    pub fn array_type(&self) -> &'t Type<'t> {
        self.array_type
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<usize, Handle<'t>>> {
        // A panicking builder leaves at worst a stale entry behind.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller arities with a memoized collecting handle, ascending.
    pub fn cached_arities(&self) -> Vec<usize> {
        let mut arities: Vec<usize> = self.cache().keys().copied().collect();
        arities.sort_unstable();
        arities
    }

    /// Adapts the collector to a caller passing any number of trailing
    /// elements.
    pub fn adapt(&self, new: &Signature<'t>) -> Result<Handle<'t>> {
        let own = self.target.signature();
        let collect_arg = own.param_count() - 1;
        let new_arity = new.param_count();

        if new_arity == collect_arg + 1 && self.array_type.is_assignable_from(new.param(collect_arg)) {
            return self.adapters.adapt(new, self.target.clone());
        }

        let cached = self.cache().get(&new_arity).cloned();
        if let Some(collector) = cached {
            trace!(arity = new_arity, "varargs cache hit");
            return self.adapters.adapt(new, collector);
        }

        let Some(length) = new_arity.checked_sub(collect_arg) else {
            return Err(AdaptError::not_convertible(own, new));
        };
        let collector = CollectNode::wrap(self.target.clone(), self.array_type, length)
            .ok_or_else(|| AdaptError::not_convertible(own, new))?;
        debug!(arity = new_arity, length, "built varargs collector");
        self.cache().insert(new_arity, collector.clone());
        self.adapters.adapt(new, collector)
    }

    /// Re-targets the collector at another array type. The same array type
    /// gives back this collector.
    pub fn as_varargs_collector(self, array_type: &'t Type<'t>) -> Result<VarargsCollector<'t>> {
        if core::ptr::eq(array_type, self.array_type) || array_type == self.array_type {
            return Ok(self);
        }
        let adapters = self.adapters.clone();
        adapters.as_varargs_collector(self.target, array_type)
    }
}

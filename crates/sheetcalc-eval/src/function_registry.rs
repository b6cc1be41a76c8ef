use std::sync::Arc;

use rustc_hash::FxHashMap;
use sheetcalc_common::{ErrorKind, FormulaValue};

use crate::args::ArgumentHandle;
use crate::engine::EvalConfig;
use crate::function::{Builtin, Function};
use crate::traits::FunctionContext;

/// Immutable name → implementation table.
///
/// Names are stored upper-cased; lookups are case-insensitive. Build one
/// with [`FunctionRegistry::builder`] or take the full library from
/// [`FunctionRegistry::with_builtins`].
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::default()
    }

    /// Every builtin function.
    pub fn with_builtins() -> Self {
        let mut builder = Self::builder();
        crate::builtins::register_builtins(&mut builder);
        builder.build()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.lookup(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Call a function on already-evaluated arguments outside any workbook.
    pub fn call(&self, name: &str, args: &[FormulaValue]) -> FormulaValue {
        let ctx = DetachedContext::default();
        self.call_with(name, args, &ctx)
    }

    pub fn call_with(
        &self,
        name: &str,
        args: &[FormulaValue],
        ctx: &dyn FunctionContext,
    ) -> FormulaValue {
        let Some(f) = self.lookup(name) else {
            return FormulaValue::Error(ErrorKind::Name);
        };
        let handles: Vec<ArgumentHandle<'_, '_>> =
            args.iter().map(ArgumentHandle::from_value).collect();
        f.dispatch(&handles, ctx).into_scalar()
    }

    fn lookup(&self, name: &str) -> Option<&Arc<dyn Function>> {
        match self.functions.get(name) {
            Some(f) => Some(f),
            None => self.functions.get(&name.to_ascii_uppercase()),
        }
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct FunctionRegistryBuilder {
    functions: FxHashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistryBuilder {
    /// Register a function; a later registration under the same name wins.
    pub fn register(&mut self, f: Arc<dyn Function>) -> &mut Self {
        self.functions.insert(f.name().to_ascii_uppercase(), f);
        self
    }

    pub fn register_all(&mut self, builtins: &[Builtin]) -> &mut Self {
        for b in builtins {
            self.register(Arc::new(*b));
        }
        self
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}

/// Context for calls made outside an evaluation: no current cell, the
/// host clock, and a fixed-seed generator.
#[derive(Default)]
struct DetachedContext {
    config: EvalConfig,
    rng: std::cell::RefCell<Option<rand::rngs::SmallRng>>,
}

impl FunctionContext for DetachedContext {
    fn current_cell(&self) -> Option<(u32, u32)> {
        None
    }

    fn now(&self) -> Option<chrono::NaiveDateTime> {
        crate::traits::system_now()
    }

    fn random(&self) -> f64 {
        use rand::{Rng, SeedableRng};
        let mut slot = self.rng.borrow_mut();
        let rng = slot.get_or_insert_with(|| {
            rand::rngs::SmallRng::seed_from_u64(self.config.random_seed)
        });
        rng.gen_range(0.0..1.0)
    }

    fn config(&self) -> &EvalConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(args: &[FormulaValue], _: &dyn FunctionContext) -> crate::function::FnResult {
        Ok(FormulaValue::Number(crate::coercion::to_number(&args[0])? * 2.0))
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut b = FunctionRegistry::builder();
        b.register_all(&[Builtin::new("DOUBLE", double).args(1)]);
        let reg = b.build();
        assert!(reg.contains("double"));
        assert!(reg.contains("Double"));
        assert_eq!(reg.call("double", &[21.0.into()]), FormulaValue::Number(42.0));
    }

    #[test]
    fn unknown_name_and_bad_arity() {
        let mut b = FunctionRegistry::builder();
        b.register_all(&[Builtin::new("DOUBLE", double).args(1)]);
        let reg = b.build();
        assert_eq!(reg.call("NOPE", &[]), FormulaValue::Error(ErrorKind::Name));
        assert_eq!(reg.call("DOUBLE", &[]), FormulaValue::Error(ErrorKind::Value));
        assert_eq!(
            reg.call("DOUBLE", &[1.0.into(), 2.0.into()]),
            FormulaValue::Error(ErrorKind::Value)
        );
    }

    #[test]
    fn builtins_cover_every_domain() {
        let reg = FunctionRegistry::with_builtins();
        for name in [
            "SUM", "MEDIAN", "IF", "LEFT", "DATE", "VLOOKUP", "SUMIFS", "PMT", "ISBLANK", "SORT",
            "REGEXMATCH", "QUERY", "RAND",
        ] {
            assert!(reg.contains(name), "{name} missing");
        }
        let names = reg.names();
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }
}

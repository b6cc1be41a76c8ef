//! The `Function` trait, its capability flags, and the `Builtin` adapter that
//! turns a plain function pointer into a registrable function.

use sheetcalc_common::{ErrorKind, FormulaValue};
use smallvec::SmallVec;

use crate::args::ArgumentHandle;
use crate::traits::FunctionContext;

bitflags::bitflags! {
    /// Describes the capabilities and properties of a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FnCaps: u16 {
        /// Same output for the same input, no side effects.
        const PURE          = 0b0000_0001;
        /// Output can change with identical inputs (`RAND()`, `NOW()`).
        const VOLATILE      = 0b0000_0010;
        /// Reduces any number of inputs to a single value (`SUM`).
        const REDUCTION     = 0b0000_0100;
        /// Searches a block for a key (`VLOOKUP`).
        const LOOKUP        = 0b0000_1000;
        /// May return an array (`SORT`, `QUERY`).
        const ARRAY_RESULT  = 0b0001_0000;
        /// Receives unevaluated arguments and decides what to evaluate (`IF`).
        const SHORT_CIRCUIT = 0b0010_0000;
    }
}

/// Builtins report spreadsheet failures as `Err(kind)`; the dispatcher folds
/// them into [`FormulaValue::Error`].
pub type FnResult = Result<FormulaValue, ErrorKind>;

pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;

    fn min_args(&self) -> usize {
        0
    }

    /// `None` for variadic functions.
    fn max_args(&self) -> Option<usize> {
        None
    }

    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], ctx: &dyn FunctionContext) -> FnResult;

    /// Arity check, evaluation, and error folding.
    fn dispatch(&self, args: &[ArgumentHandle<'_, '_>], ctx: &dyn FunctionContext) -> FormulaValue {
        if args.len() < self.min_args() || self.max_args().is_some_and(|max| args.len() > max) {
            return FormulaValue::Error(ErrorKind::Value);
        }
        match self.eval(args, ctx) {
            Ok(v) => v,
            Err(e) => FormulaValue::Error(e),
        }
    }
}

/// Evaluated-argument implementation.
pub type EagerFn = fn(&[FormulaValue], &dyn FunctionContext) -> FnResult;
/// Unevaluated-argument implementation.
pub type LazyFn = fn(&[ArgumentHandle<'_, '_>], &dyn FunctionContext) -> FnResult;

#[derive(Clone, Copy)]
enum Implementation {
    Eager(EagerFn),
    Lazy(LazyFn),
}

/// A function-pointer backed [`Function`].
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    min_args: usize,
    max_args: Option<usize>,
    caps: FnCaps,
    imp: Implementation,
}

impl Builtin {
    pub const fn new(name: &'static str, f: EagerFn) -> Self {
        Self {
            name,
            min_args: 0,
            max_args: None,
            caps: FnCaps::PURE,
            imp: Implementation::Eager(f),
        }
    }

    pub const fn lazy(name: &'static str, f: LazyFn) -> Self {
        Self {
            name,
            min_args: 0,
            max_args: None,
            caps: FnCaps::PURE.union(FnCaps::SHORT_CIRCUIT),
            imp: Implementation::Lazy(f),
        }
    }

    /// Exact arity.
    pub const fn args(mut self, n: usize) -> Self {
        self.min_args = n;
        self.max_args = Some(n);
        self
    }

    pub const fn min(mut self, n: usize) -> Self {
        self.min_args = n;
        self
    }

    pub const fn max(mut self, n: usize) -> Self {
        self.max_args = Some(n);
        self
    }

    pub const fn range(self, min: usize, max: usize) -> Self {
        self.min(min).max(max)
    }

    pub const fn caps(mut self, caps: FnCaps) -> Self {
        self.caps = self.caps.union(caps);
        self
    }

    /// Mark as volatile; clears `PURE`.
    pub const fn volatile(mut self) -> Self {
        self.caps = self.caps.difference(FnCaps::PURE).union(FnCaps::VOLATILE);
        self
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("caps", &self.caps)
            .finish()
    }
}

impl Function for Builtin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        self.min_args
    }

    fn max_args(&self) -> Option<usize> {
        self.max_args
    }

    fn caps(&self) -> FnCaps {
        self.caps
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], ctx: &dyn FunctionContext) -> FnResult {
        match self.imp {
            Implementation::Lazy(f) => f(args, ctx),
            Implementation::Eager(f) => {
                let values: SmallVec<[FormulaValue; 4]> = args.iter().map(|a| a.value()).collect();
                f(&values, ctx)
            }
        }
    }
}

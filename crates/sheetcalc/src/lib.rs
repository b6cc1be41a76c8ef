//! Meta crate that re-exports the sheetcalc building blocks and adds a small
//! in-memory [`Workbook`] for callers that do not bring their own cell store.
//! Deeper integrations implement [`CellStore`] and drive [`Engine`] directly.

pub mod doc_examples;
mod store;
mod workbook;

pub use sheetcalc_common as common;
pub use sheetcalc_eval as eval;
pub use sheetcalc_parse as parse;

pub use sheetcalc_common::{CellKey, ErrorKind, FormulaValue, RangeKey};
pub use sheetcalc_eval::{
    CellSnapshot, CellStore, Engine, EngineError, EvalConfig, FunctionRegistry,
};
pub use sheetcalc_parse::{ASTNode, ParserError, parse, parse_formula};

pub use store::MemoryStore;
pub use workbook::{Workbook, WorkbookError};

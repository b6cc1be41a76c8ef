//! `QUERY(data, query, [headers])`: a small SQL-like language over a block
//! of values. The query text is tokenized, parsed, and run entirely here;
//! any failure surfaces as `#VALUE!`.

mod exec;
mod lexer;
mod parser;

pub use exec::Table;
pub use lexer::QueryError;
pub use parser::{Query, parse_query};

use std::sync::Arc;

use sheetcalc_common::{ErrorKind, FormulaValue};

use crate::args::ArgumentHandle;
use crate::coercion::{to_int, to_text};
use crate::function::{FnCaps, FnResult, Function};
use crate::function_registry::FunctionRegistryBuilder;
use crate::traits::FunctionContext;

/// Run `src` over `grid`, whose first `headers` rows are column labels.
/// The result starts with a header row.
pub fn run_query(
    grid: Vec<Vec<FormulaValue>>,
    src: &str,
    headers: usize,
) -> Result<Vec<Vec<FormulaValue>>, QueryError> {
    let query = parse_query(src)?;
    exec::execute(&query, &Table::new(grid, headers))
}

/// One header row when the first row is all text and more rows follow.
fn guess_headers(grid: &[Vec<FormulaValue>]) -> usize {
    match grid.first() {
        Some(first) if grid.len() > 1 && first.iter().all(|v| matches!(v, FormulaValue::Text(_))) => 1,
        _ => 0,
    }
}

#[derive(Debug)]
pub struct QueryFn;

impl Function for QueryFn {
    fn name(&self) -> &'static str {
        "QUERY"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ARRAY_RESULT
    }

    fn eval(&self, args: &[ArgumentHandle<'_, '_>], _: &dyn FunctionContext) -> FnResult {
        let grid = match args[0].value() {
            FormulaValue::Error(e) => return Err(e),
            v => v.into_rows(),
        };
        let src = match args[1].scalar() {
            FormulaValue::Error(e) => return Err(e),
            v => to_text(&v)?,
        };
        let headers = match args.get(2).map(ArgumentHandle::scalar) {
            None | Some(FormulaValue::Null) => guess_headers(&grid),
            Some(v) => usize::try_from(to_int(&v)?).map_err(|_| ErrorKind::Value)?,
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("QUERY", rows = grid.len(), headers).entered();

        match run_query(grid, &src, headers) {
            Ok(rows) => Ok(FormulaValue::Array(rows)),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, query = %src, "QUERY failed");
                Err(ErrorKind::Value)
            }
        }
    }
}

pub fn register_builtins(b: &mut FunctionRegistryBuilder) {
    b.register(Arc::new(QueryFn));
}

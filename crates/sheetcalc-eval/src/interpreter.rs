use std::cell::{Cell, RefCell};

use chrono::NaiveDateTime;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sheetcalc_common::{ErrorKind, FormulaValue};
use sheetcalc_parse::{
    ASTNode, ASTNodeType, BinaryOperator, CellReference, RangeReference, UnaryOperator,
};

use crate::args::ArgumentHandle;
use crate::coercion::{compare_values, sanitize, to_number, to_text};
use crate::engine::EvalConfig;
use crate::function_registry::FunctionRegistry;
use crate::traits::{EvaluationContext, FunctionContext};

/// Tree-walking evaluator for one formula.
///
/// Spreadsheet failures never escape as Rust errors: every path yields a
/// [`FormulaValue`], with errors carried as [`FormulaValue::Error`].
pub struct Interpreter<'a> {
    context: &'a dyn EvaluationContext,
    registry: &'a FunctionRegistry,
    config: EvalConfig,
    current_sheet: Option<&'a str>,
    current_cell: Option<(u32, u32)>,
    epoch: u64,
    depth: Cell<usize>,
    rng: RefCell<Option<SmallRng>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a dyn EvaluationContext, registry: &'a FunctionRegistry) -> Self {
        Self {
            context,
            registry,
            config: EvalConfig::default(),
            current_sheet: None,
            current_cell: None,
            epoch: 0,
            depth: Cell::new(0),
            rng: RefCell::new(None),
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Sheet that unqualified references resolve against.
    pub fn with_sheet(mut self, sheet: &'a str) -> Self {
        self.current_sheet = Some(sheet);
        self
    }

    /// Cell being evaluated, 0-based; drives `ROW()`/`COLUMN()`.
    pub fn with_cell(mut self, row: u32, col: u32) -> Self {
        self.current_cell = Some((row, col));
        self
    }

    /// Recalculation pass counter, so volatile functions draw fresh values
    /// on every pass while staying reproducible for a given seed.
    pub fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn current_sheet(&self) -> Option<&'a str> {
        self.current_sheet
    }

    pub fn registry(&self) -> &FunctionRegistry {
        self.registry
    }

    /* ===================  public  =================== */

    /// Evaluate a whole formula. A 1×1 result degrades to its element.
    pub fn evaluate(&self, node: &ASTNode) -> FormulaValue {
        self.evaluate_node(node).into_scalar()
    }

    pub(crate) fn evaluate_node(&self, node: &ASTNode) -> FormulaValue {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_depth {
            return FormulaValue::Error(ErrorKind::Value);
        }
        self.depth.set(depth);
        let out = self.evaluate_uncounted(node);
        self.depth.set(depth - 1);
        out
    }

    fn evaluate_uncounted(&self, node: &ASTNode) -> FormulaValue {
        match &node.node_type {
            ASTNodeType::Number(n) => FormulaValue::Number(*n),
            ASTNodeType::Text(s) => FormulaValue::Text(s.clone()),
            ASTNodeType::Boolean(b) => FormulaValue::Boolean(*b),
            ASTNodeType::Error(e) => FormulaValue::Error(*e),
            ASTNodeType::Empty => FormulaValue::Null,
            ASTNodeType::CellReference(cell) => self.eval_cell(cell),
            ASTNodeType::RangeReference(range) => self.eval_range(range),
            ASTNodeType::Name(name) => self
                .context
                .resolve_name(name)
                .unwrap_or(FormulaValue::Error(ErrorKind::Name)),
            ASTNodeType::UnaryOp { op, operand } => self.eval_unary(*op, operand),
            ASTNodeType::BinaryOp { op, left, right } => self.eval_binary(*op, left, right),
            ASTNodeType::FunctionCall { name, args } => self.eval_function(name, args),
            ASTNodeType::Array(rows) => self.eval_array_literal(rows),
        }
    }

    /* ===================  references  =================== */

    fn eval_cell(&self, cell: &CellReference) -> FormulaValue {
        let sheet = cell.sheet.as_deref().or(self.current_sheet);
        self.context.read_cell(sheet, cell.row, cell.col)
    }

    fn eval_range(&self, range: &RangeReference) -> FormulaValue {
        let (top, left, bottom, right) = range.bounds();
        let cells = (u64::from(bottom - top) + 1) * (u64::from(right - left) + 1);
        if cells > self.config.max_range_cells as u64 {
            return FormulaValue::Error(ErrorKind::Ref);
        }
        let sheet = range.sheet().or(self.current_sheet);
        FormulaValue::Array(self.context.read_range(sheet, top, left, bottom, right))
    }

    /* ===================  operators  =================== */

    fn eval_unary(&self, op: UnaryOperator, operand: &ASTNode) -> FormulaValue {
        let v = self.evaluate_node(operand).into_scalar();
        match op {
            UnaryOperator::Plus => v,
            UnaryOperator::Negate => map_array(v, |x| match to_number(x) {
                Ok(n) => FormulaValue::Number(-n),
                Err(e) => FormulaValue::Error(e),
            }),
        }
    }

    fn eval_binary(&self, op: BinaryOperator, left: &ASTNode, right: &ASTNode) -> FormulaValue {
        let l = self.evaluate_node(left).into_scalar();
        let r = self.evaluate_node(right).into_scalar();
        broadcast_apply(l, r, |a, b| binary_scalar(op, a, b))
    }

    /* ===================  function calls  =================== */

    fn eval_function(&self, name: &str, args: &[ASTNode]) -> FormulaValue {
        let Some(fun) = self.registry.get(name) else {
            return FormulaValue::Error(ErrorKind::Name);
        };
        let handles: Vec<ArgumentHandle<'_, '_>> =
            args.iter().map(|n| ArgumentHandle::new(n, self)).collect();
        fun.dispatch(&handles, self).into_scalar()
    }

    /* ===================  array literal  =================== */

    fn eval_array_literal(&self, rows: &[Vec<ASTNode>]) -> FormulaValue {
        FormulaValue::Array(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| self.evaluate_node(cell).into_scalar())
                        .collect()
                })
                .collect(),
        )
    }

    fn seed(&self) -> u64 {
        let cell = self
            .current_cell
            .map_or(0, |(r, c)| (u64::from(r) << 32) | u64::from(c));
        splitmix(self.config.random_seed ^ splitmix(self.epoch) ^ splitmix(cell.wrapping_add(1)))
    }
}

impl FunctionContext for Interpreter<'_> {
    fn current_cell(&self) -> Option<(u32, u32)> {
        self.current_cell
    }

    fn now(&self) -> Option<NaiveDateTime> {
        self.context.now()
    }

    fn random(&self) -> f64 {
        let mut slot = self.rng.borrow_mut();
        let rng = slot.get_or_insert_with(|| SmallRng::seed_from_u64(self.seed()));
        rng.gen_range(0.0..1.0)
    }

    fn config(&self) -> &EvalConfig {
        &self.config
    }
}

fn splitmix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/* ===================  scalar operator semantics  =================== */

/// One operator on two scalars. The left operand's error wins.
pub(crate) fn binary_scalar(op: BinaryOperator, a: &FormulaValue, b: &FormulaValue) -> FormulaValue {
    if let FormulaValue::Error(e) = a {
        return FormulaValue::Error(*e);
    }
    if let FormulaValue::Error(e) = b {
        return FormulaValue::Error(*e);
    }
    let result = match op {
        BinaryOperator::Add => numeric(a, b, |x, y| Ok(x + y)),
        BinaryOperator::Subtract => numeric(a, b, |x, y| Ok(x - y)),
        BinaryOperator::Multiply => numeric(a, b, |x, y| Ok(x * y)),
        BinaryOperator::Divide => numeric(a, b, |x, y| {
            if y == 0.0 {
                Err(ErrorKind::Div)
            } else {
                Ok(x / y)
            }
        }),
        BinaryOperator::Power => numeric(a, b, power),
        BinaryOperator::Concat => to_text(a).and_then(|x| Ok(FormulaValue::Text(x + &to_text(b)?))),
        BinaryOperator::Equal => Ok(FormulaValue::Boolean(compare_values(a, b).is_eq())),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(compare_values(a, b).is_ne())),
        BinaryOperator::Less => Ok(FormulaValue::Boolean(compare_values(a, b).is_lt())),
        BinaryOperator::Greater => Ok(FormulaValue::Boolean(compare_values(a, b).is_gt())),
        BinaryOperator::LessEqual => Ok(FormulaValue::Boolean(compare_values(a, b).is_le())),
        BinaryOperator::GreaterEqual => Ok(FormulaValue::Boolean(compare_values(a, b).is_ge())),
    };
    result.unwrap_or_else(FormulaValue::Error)
}

fn numeric(
    a: &FormulaValue,
    b: &FormulaValue,
    f: impl Fn(f64, f64) -> Result<f64, ErrorKind>,
) -> Result<FormulaValue, ErrorKind> {
    let x = to_number(a)?;
    let y = to_number(b)?;
    Ok(FormulaValue::Number(sanitize(f(x, y)?)?))
}

/// Negative base with a fractional exponent is `#NUM!`; `0^negative`
/// divides by zero; `0^0` is `#NUM!`.
pub(crate) fn power(base: f64, exp: f64) -> Result<f64, ErrorKind> {
    if base == 0.0 {
        if exp == 0.0 {
            return Err(ErrorKind::Num);
        }
        if exp < 0.0 {
            return Err(ErrorKind::Div);
        }
    }
    if base < 0.0 && exp.fract() != 0.0 {
        return Err(ErrorKind::Num);
    }
    Ok(base.powf(exp))
}

fn map_array(v: FormulaValue, f: impl Fn(&FormulaValue) -> FormulaValue) -> FormulaValue {
    match v {
        FormulaValue::Array(rows) => FormulaValue::Array(
            rows.iter()
                .map(|row| row.iter().map(&f).collect())
                .collect(),
        ),
        other => f(&other),
    }
}

/// Element-wise application with broadcasting: the result takes the larger
/// extent on each axis, an axis of length 1 repeats, and positions outside
/// a shorter operand are `#N/A`.
pub(crate) fn broadcast_apply(
    left: FormulaValue,
    right: FormulaValue,
    f: impl Fn(&FormulaValue, &FormulaValue) -> FormulaValue,
) -> FormulaValue {
    if !left.is_array() && !right.is_array() {
        return f(&left, &right);
    }
    let (lr, lc) = left.dims();
    let (rr, rc) = right.dims();
    let (rows, cols) = (lr.max(rr), lc.max(rc));
    let out = (0..rows)
        .map(|i| {
            (0..cols)
                .map(|j| match (project(&left, i, j), project(&right, i, j)) {
                    (Some(a), Some(b)) => f(a, b),
                    _ => FormulaValue::Error(ErrorKind::Na),
                })
                .collect()
        })
        .collect();
    FormulaValue::Array(out)
}

fn project(v: &FormulaValue, i: usize, j: usize) -> Option<&FormulaValue> {
    match v {
        FormulaValue::Array(data) => {
            let (rows, cols) = v.dims();
            let i = if rows == 1 { 0 } else { i };
            let j = if cols == 1 { 0 } else { j };
            data.get(i)?.get(j)
        }
        scalar => Some(scalar),
    }
}

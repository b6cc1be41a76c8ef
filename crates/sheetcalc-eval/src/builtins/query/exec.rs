//! Runs a parsed [`Query`] over a block of values.

use std::cmp::Ordering;

use sheetcalc_common::FormulaValue;
use sheetcalc_common::reference::{column_to_index, index_to_column};

use super::lexer::{CmpOp, QueryError};
use super::parser::{Aggregate, Condition, Operand, Query, SelectItem, Selection, TextOp};
use crate::coercion::{compare_values, to_text, values_equal};

type Row = Vec<FormulaValue>;

/// Data rows plus one label per column.
#[derive(Debug, Clone)]
pub struct Table {
    labels: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Split `grid` into `headers` label rows and data rows. Multiple header
    /// rows join per column with a space.
    pub fn new(mut grid: Vec<Row>, headers: usize) -> Self {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut grid {
            row.resize(width, FormulaValue::Null);
        }
        let rows = grid.split_off(headers.min(grid.len()));
        let labels = (0..width)
            .map(|c| {
                grid.iter()
                    .filter_map(|r| to_text(&r[c]).ok())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        Self { labels, rows }
    }

    pub fn width(&self) -> usize {
        self.labels.len()
    }

    /// A column letter inside the block wins over a header label.
    fn resolve(&self, name: &str) -> Result<usize, QueryError> {
        if name.bytes().all(|b| b.is_ascii_alphabetic()) {
            if let Ok(idx) = column_to_index(name) {
                if (idx as usize) < self.width() {
                    return Ok(idx as usize);
                }
            }
        }
        self.labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(name))
            .ok_or_else(|| QueryError::new(format!("unknown column '{name}'"), 0))
    }

    fn label(&self, idx: usize) -> String {
        match &self.labels[idx] {
            l if l.is_empty() => index_to_column(idx as u32),
            l => l.clone(),
        }
    }
}

/// Select item with its column resolved.
#[derive(Debug, Clone, Copy)]
struct Column {
    idx: usize,
    aggregate: Option<Aggregate>,
}

/// Condition with columns resolved.
enum Predicate<'q> {
    Compare(Value<'q>, CmpOp, Value<'q>),
    Text(Value<'q>, TextOp, Value<'q>),
    IsNull(Value<'q>, bool),
    Not(Box<Predicate<'q>>),
    And(Box<Predicate<'q>>, Box<Predicate<'q>>),
    Or(Box<Predicate<'q>>, Box<Predicate<'q>>),
}

#[derive(Clone, Copy)]
enum Value<'q> {
    Column(usize),
    Literal(&'q FormulaValue),
}

impl<'q> Value<'q> {
    fn get<'r>(self, row: &'r [FormulaValue]) -> &'r FormulaValue
    where
        'q: 'r,
    {
        match self {
            Value::Column(idx) => &row[idx],
            Value::Literal(v) => v,
        }
    }
}

pub fn execute(query: &Query, table: &Table) -> Result<Vec<Row>, QueryError> {
    let grouped = query.is_grouped();
    let columns: Vec<Column> = match &query.selection {
        Selection::All if grouped => {
            return Err(QueryError::new("SELECT * cannot be combined with GROUP BY", 0));
        }
        Selection::All => (0..table.width())
            .map(|idx| Column {
                idx,
                aggregate: None,
            })
            .collect(),
        Selection::Items(items) => items
            .iter()
            .map(|i| column(table, i))
            .collect::<Result<_, _>>()?,
    };
    let group_keys: Vec<usize> = query
        .group_by
        .iter()
        .map(|name| table.resolve(name))
        .collect::<Result<_, _>>()?;
    let order: Vec<(Column, bool)> = query
        .order_by
        .iter()
        .map(|k| Ok((column(table, &k.item)?, k.descending)))
        .collect::<Result<_, QueryError>>()?;

    if grouped {
        let ungrouped = columns
            .iter()
            .chain(order.iter().map(|(c, _)| c))
            .find(|c| c.aggregate.is_none() && !group_keys.contains(&c.idx));
        if let Some(c) = ungrouped {
            return Err(QueryError::new(
                format!("column '{}' must be aggregated or grouped", table.label(c.idx)),
                0,
            ));
        }
    }

    let predicate = query
        .filter
        .as_ref()
        .map(|c| compile(table, c))
        .transpose()?;
    let matching: Vec<&Row> = table
        .rows
        .iter()
        .filter(|row| predicate.as_ref().is_none_or(|p| p.test(row)))
        .collect();

    let mut groups: Vec<Vec<&Row>> = if !grouped {
        matching.into_iter().map(|r| vec![r]).collect()
    } else if group_keys.is_empty() {
        vec![matching]
    } else {
        group_rows(matching, &group_keys)
    };

    if !order.is_empty() {
        let mut keyed: Vec<(Row, Vec<&Row>)> = groups
            .into_iter()
            .map(|g| (order.iter().map(|(c, _)| c.value(&g)).collect(), g))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            order
                .iter()
                .zip(a.iter().zip(b))
                .map(|((_, desc), (x, y))| {
                    let ord = compare_values(x, y);
                    if *desc { ord.reverse() } else { ord }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        groups = keyed.into_iter().map(|(_, g)| g).collect();
    }

    if let Some(limit) = query.limit {
        groups.truncate(limit);
    }

    let header: Row = columns
        .iter()
        .map(|c| {
            let label = table.label(c.idx);
            FormulaValue::Text(match c.aggregate {
                Some(agg) => format!("{} {label}", agg.label()),
                None => label,
            })
        })
        .collect();
    let mut out = Vec::with_capacity(groups.len() + 1);
    out.push(header);
    out.extend(
        groups
            .iter()
            .map(|g| columns.iter().map(|c| c.value(g)).collect::<Row>()),
    );
    Ok(out)
}

fn column(table: &Table, item: &SelectItem) -> Result<Column, QueryError> {
    Ok(Column {
        idx: table.resolve(&item.column)?,
        aggregate: item.aggregate,
    })
}

/// Groups in first-seen order.
fn group_rows<'t>(rows: Vec<&'t Row>, keys: &[usize]) -> Vec<Vec<&'t Row>> {
    let mut groups: Vec<Vec<&Row>> = Vec::new();
    for row in rows {
        let existing = groups.iter_mut().find(|g| {
            keys.iter()
                .all(|&k| same_key(&g[0][k], &row[k]))
        });
        match existing {
            Some(g) => g.push(row),
            None => groups.push(vec![row]),
        }
    }
    groups
}

fn same_key(a: &FormulaValue, b: &FormulaValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b) && values_equal(a, b)
}

impl Column {
    /// The item's value for a group: its aggregate, or the first row's cell.
    fn value(&self, group: &[&Row]) -> FormulaValue {
        let Some(agg) = self.aggregate else {
            return group
                .first()
                .map_or(FormulaValue::Null, |r| r[self.idx].clone());
        };
        let cells = group.iter().map(|r| &r[self.idx]);
        if agg == Aggregate::Count {
            return FormulaValue::Number(cells.filter(|v| !is_blank(v)).count() as f64);
        }
        let nums: Vec<f64> = cells.filter_map(FormulaValue::as_number).collect();
        let result = match agg {
            Aggregate::Sum => Some(nums.iter().sum()),
            Aggregate::Avg if nums.is_empty() => None,
            Aggregate::Avg => Some(nums.iter().sum::<f64>() / nums.len() as f64),
            Aggregate::Min => nums.iter().copied().reduce(f64::min),
            Aggregate::Max => nums.iter().copied().reduce(f64::max),
            Aggregate::Count => None,
        };
        result.map_or(FormulaValue::Null, FormulaValue::Number)
    }
}

fn is_blank(v: &FormulaValue) -> bool {
    matches!(v, FormulaValue::Null) || matches!(v, FormulaValue::Text(s) if s.is_empty())
}

fn compile<'q>(table: &Table, cond: &'q Condition) -> Result<Predicate<'q>, QueryError> {
    let operand = |o: &'q Operand| -> Result<Value<'q>, QueryError> {
        Ok(match o {
            Operand::Column(name) => Value::Column(table.resolve(name)?),
            Operand::Literal(v) => Value::Literal(v),
        })
    };
    Ok(match cond {
        Condition::Compare { left, op, right } => {
            Predicate::Compare(operand(left)?, *op, operand(right)?)
        }
        Condition::Text { left, op, right } => Predicate::Text(operand(left)?, *op, operand(right)?),
        Condition::IsNull { operand: o, negated } => Predicate::IsNull(operand(o)?, *negated),
        Condition::Not(inner) => Predicate::Not(Box::new(compile(table, inner)?)),
        Condition::And(a, b) => {
            Predicate::And(Box::new(compile(table, a)?), Box::new(compile(table, b)?))
        }
        Condition::Or(a, b) => {
            Predicate::Or(Box::new(compile(table, a)?), Box::new(compile(table, b)?))
        }
    })
}

impl Predicate<'_> {
    /// Blank or error operands never satisfy a comparison or text test.
    fn test(&self, row: &[FormulaValue]) -> bool {
        match self {
            Predicate::Compare(l, op, r) => {
                let (a, b) = (l.get(row), r.get(row));
                if is_blank(a) || is_blank(b) || a.is_error() || b.is_error() {
                    return false;
                }
                let ord = compare_values(a, b);
                let same_kind = std::mem::discriminant(a) == std::mem::discriminant(b);
                match op {
                    CmpOp::Eq => same_kind && ord == Ordering::Equal,
                    CmpOp::Ne => !same_kind || ord != Ordering::Equal,
                    CmpOp::Lt => ord == Ordering::Less,
                    CmpOp::Le => ord != Ordering::Greater,
                    CmpOp::Gt => ord == Ordering::Greater,
                    CmpOp::Ge => ord != Ordering::Less,
                }
            }
            Predicate::Text(l, op, r) => {
                let (a, b) = (l.get(row), r.get(row));
                if is_blank(a) || a.is_error() || b.is_error() {
                    return false;
                }
                let (Ok(hay), Ok(pat)) = (to_text(a), to_text(b)) else {
                    return false;
                };
                match op {
                    TextOp::Contains => hay.contains(&pat),
                    TextOp::StartsWith => hay.starts_with(&pat),
                    TextOp::EndsWith => hay.ends_with(&pat),
                    TextOp::Like => like(
                        &hay.chars().collect::<Vec<_>>(),
                        &pat.chars().collect::<Vec<_>>(),
                    ),
                }
            }
            Predicate::IsNull(v, negated) => is_blank(v.get(row)) != *negated,
            Predicate::Not(inner) => !inner.test(row),
            Predicate::And(a, b) => a.test(row) && b.test(row),
            Predicate::Or(a, b) => a.test(row) || b.test(row),
        }
    }
}

/// SQL `LIKE`: `%` is any run, `_` any single character. Case-sensitive.
fn like(s: &[char], p: &[char]) -> bool {
    let (mut si, mut pi) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while si < s.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == s[si]) {
            si += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            backtrack = Some((pi, si));
            pi += 1;
        } else if let Some((bp, bs)) = backtrack {
            pi = bp + 1;
            si = bs + 1;
            backtrack = Some((bp, bs + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '%')
}

//! Accumulators used by grouped field selectors.
//!
//! An [`Aggregator`] is registered once in a resolver and creates a fresh
//! [`Accumulator`] for every group of every evaluation, so compiled
//! selectors never share fold state.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::value::{Value, partial_compare};

/// Per-group fold state.
pub trait Accumulator: Send {
    fn add(&mut self, value: Value);
    fn get(&self) -> Value;
}

/// Factory of accumulators.
pub trait Aggregator: Send + Sync {
    fn create(&self) -> Box<dyn Accumulator>;
}

impl<F> Aggregator for F
where
    F: Fn() -> Box<dyn Accumulator> + Send + Sync,
{
    fn create(&self) -> Box<dyn Accumulator> {
        self()
    }
}

/// What an aggregation directive resolves to.
#[derive(Clone)]
pub enum Aggregation {
    /// Plain group-by key; turns grouping on without folding the field
    GroupBy,

    /// Fold the field's values within each group
    Fold(Arc<dyn Aggregator>),
}

impl Aggregation {
    pub fn fold<A: Aggregator + 'static>(aggregator: A) -> Self {
        Aggregation::Fold(Arc::new(aggregator))
    }
}

impl fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::GroupBy => write!(f, "GroupBy"),
            Aggregation::Fold(_) => write!(f, "Fold(..)"),
        }
    }
}

/// Numeric total. Stays integer until a float is added; mixed additions go
/// through `Decimal` so `0.1 + 0.2` sums to `0.3`. Non-numbers are ignored.
pub struct Sum {
    exact: Option<Decimal>,
    approx: f64,
    has_float: bool,
}

impl Default for Sum {
    fn default() -> Self {
        Sum {
            exact: Some(Decimal::ZERO),
            approx: 0.0,
            has_float: false,
        }
    }
}

impl Sum {
    fn push(&mut self, exact: Option<Decimal>, approx: f64) {
        self.approx += approx;
        self.exact = match (self.exact, exact) {
            (Some(total), Some(n)) => total.checked_add(n),
            _ => None,
        };
    }

    fn total_float(&self) -> f64 {
        match self.exact {
            Some(total) => total.to_f64().unwrap_or(self.approx),
            None => self.approx,
        }
    }
}

impl Accumulator for Sum {
    fn add(&mut self, value: Value) {
        match value {
            Value::Integer(n) => self.push(Some(Decimal::from(n)), n as f64),
            Value::Float(n) => {
                self.has_float = true;
                self.push(Decimal::from_f64(n), n);
            }
            _ => {}
        }
    }

    fn get(&self) -> Value {
        if !self.has_float {
            if let Some(total) = self.exact.and_then(|t| t.to_i64()) {
                return Value::Integer(total);
            }
        }
        Value::Float(self.total_float())
    }
}

/// Collects every value in arrival order.
#[derive(Default)]
pub struct Values(Vec<Value>);

impl Accumulator for Values {
    fn add(&mut self, value: Value) {
        self.0.push(value);
    }

    fn get(&self) -> Value {
        Value::Array(self.0.clone())
    }
}

#[derive(Default)]
pub struct Count(i64);

impl Accumulator for Count {
    fn add(&mut self, _value: Value) {
        self.0 += 1;
    }

    fn get(&self) -> Value {
        Value::Integer(self.0)
    }
}

/// Arithmetic mean of the numeric values; `null` when there are none.
#[derive(Default)]
pub struct Avg {
    sum: Sum,
    count: usize,
}

impl Accumulator for Avg {
    fn add(&mut self, value: Value) {
        if value.is_number() {
            self.count += 1;
            self.sum.add(value);
        }
    }

    fn get(&self) -> Value {
        if self.count == 0 {
            return Value::Null;
        }
        Value::Float(self.sum.total_float() / self.count as f64)
    }
}

/// Smallest (or largest) value among those comparable with the first one
/// kept. `null` when nothing was added.
pub struct Extreme {
    keep: Ordering,
    best: Option<Value>,
}

impl Extreme {
    pub fn min() -> Self {
        Extreme {
            keep: Ordering::Less,
            best: None,
        }
    }

    pub fn max() -> Self {
        Extreme {
            keep: Ordering::Greater,
            best: None,
        }
    }
}

impl Accumulator for Extreme {
    fn add(&mut self, value: Value) {
        let replace = match &self.best {
            None => true,
            Some(best) => partial_compare(&value, best) == Some(self.keep),
        };
        if replace {
            self.best = Some(value);
        }
    }

    fn get(&self) -> Value {
        self.best.clone().unwrap_or(Value::Null)
    }
}

#[derive(Default)]
pub struct First(Option<Value>);

impl Accumulator for First {
    fn add(&mut self, value: Value) {
        if self.0.is_none() {
            self.0 = Some(value);
        }
    }

    fn get(&self) -> Value {
        self.0.clone().unwrap_or(Value::Null)
    }
}

#[derive(Default)]
pub struct Last(Option<Value>);

impl Accumulator for Last {
    fn add(&mut self, value: Value) {
        self.0 = Some(value);
    }

    fn get(&self) -> Value {
        self.0.clone().unwrap_or(Value::Null)
    }
}

/// The aggregators registered by [`crate::DefaultResolver::new`].
pub fn builtin_aggregations() -> Vec<(&'static str, Aggregation)> {
    fn boxed<A: Accumulator + 'static>(make: fn() -> A) -> Aggregation {
        Aggregation::fold(move || Box::new(make()) as Box<dyn Accumulator>)
    }

    vec![
        ("group", Aggregation::GroupBy),
        ("sum", boxed(Sum::default)),
        ("values", boxed(Values::default)),
        ("count", boxed(Count::default)),
        ("avg", boxed(Avg::default)),
        ("min", boxed(Extreme::min)),
        ("max", boxed(Extreme::max)),
        ("first", boxed(First::default)),
        ("last", boxed(Last::default)),
    ]
}

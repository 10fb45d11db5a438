//! Formula evaluation seam. The evaluator itself lives outside the engine.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::SaleTransaction;
use crate::errors::Result;
use crate::utils::Season;

/// Scalar produced by a formula, plus the evaluator's trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaEvaluation {
    pub value: Decimal,
    #[serde(default)]
    pub debug_log: Vec<String>,
}

/// Evaluates a rule's formula definition against a transaction context.
///
/// Implementations must be deterministic: identical inputs give identical
/// values.
pub trait FormulaEvaluatorTrait: Send + Sync {
    fn evaluate(
        &self,
        formula: &Value,
        context: &BTreeMap<String, Value>,
    ) -> Result<FormulaEvaluation>;
}

fn number(value: Decimal) -> Value {
    value
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn text(value: Option<&str>) -> Value {
    value
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

/// Variables exposed to a formula. Free-form transaction dimensions are added
/// first so the named variables always win.
pub fn build_formula_context(
    transaction: &SaleTransaction,
    season: Season,
) -> BTreeMap<String, Value> {
    let mut context: BTreeMap<String, Value> = transaction
        .dimensions
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    context.insert("units".to_string(), number(transaction.quantity));
    context.insert("quantity".to_string(), number(transaction.quantity));
    context.insert("salesVolume".to_string(), number(transaction.quantity));
    context.insert("grossAmount".to_string(), number(transaction.gross_amount));
    context.insert("season".to_string(), Value::String(season.to_string()));
    context.insert("territory".to_string(), text(transaction.territory.as_deref()));
    context.insert(
        "product".to_string(),
        Value::String(transaction.product_name.clone()),
    );
    context.insert("category".to_string(), text(transaction.category.as_deref()));
    context
}

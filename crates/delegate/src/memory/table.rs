// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row storage and constraint checks for one model.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use super::filter;
use crate::delegate::Row;
use crate::error::{DelegateError, DelegateErrorKind, DriverError};
use crate::numeric;
use crate::query::QueryOptions;
use crate::schema::{Aggregate, AssociationKind, DataType, ModelDefinition};

const UNIQUE_VIOLATION: &str = "23505";
const UNDEFINED_COLUMN: &str = "42703";

#[derive(Debug, Clone)]
pub(super) struct Column {
    pub data_type: DataType,
    pub allow_null: bool,
    pub unique: bool,
    pub auto_increment: bool,
    pub default: Option<Value>,
}

/// Resolved shape of a model.
#[derive(Debug, Clone)]
pub(super) struct Schema {
    pub model: String,
    pub table: String,
    pub columns: IndexMap<String, Column>,
    pub primary_keys: Vec<String>,
}

impl Schema {
    /// Models without a declared primary key get an auto-incrementing `id`.
    pub fn from_definition(definition: &ModelDefinition) -> Self {
        let mut columns = IndexMap::new();
        let mut primary_keys = definition.declared_primary_keys();
        if primary_keys.is_empty() {
            columns.insert(
                "id".to_string(),
                Column {
                    data_type: DataType::Integer,
                    allow_null: false,
                    unique: false,
                    auto_increment: true,
                    default: None,
                },
            );
            primary_keys.push("id".to_string());
        }
        for (name, spec) in &definition.attributes {
            columns.insert(
                name.clone(),
                Column {
                    data_type: spec.data_type(),
                    allow_null: spec.allows_null(),
                    unique: spec.is_unique(),
                    auto_increment: spec.auto_increment,
                    default: spec.default_value.clone(),
                },
            );
        }
        Self {
            model: definition.name.clone(),
            table: definition.table_name().to_string(),
            columns,
            primary_keys,
        }
    }

    fn column(&self, name: &str) -> Result<&Column, DelegateError> {
        self.columns.get(name).ok_or_else(|| {
            let message = format!("column \"{name}\" does not exist");
            DelegateError::database(message.clone())
                .with_original(DriverError::new(message, UNDEFINED_COLUMN))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Association {
    pub kind: AssociationKind,
    pub target: String,
    pub alias: Option<String>,
}

#[derive(Debug)]
pub(super) struct Table {
    pub schema: Schema,
    pub rows: Vec<Row>,
    pub associations: Vec<Association>,
    next_id: i64,
}

impl Table {
    pub fn new(schema: Schema) -> Self {
        Self { schema, rows: Vec::new(), associations: Vec::new(), next_id: 1 }
    }

    /// Empty the table and restart its sequence.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.next_id = 1;
    }

    /// Insert all records or none.
    pub fn insert(&mut self, records: Vec<Row>) -> Result<Vec<Row>, DelegateError> {
        let mut built = Vec::with_capacity(records.len());
        for record in records {
            built.push(self.build_row(record)?);
        }
        self.check_unique(self.rows.iter().chain(built.iter()))?;
        self.rows.extend(built.iter().cloned());
        Ok(built)
    }

    /// Unknown keys are dropped; missing columns take their default.
    fn build_row(&mut self, mut record: Row) -> Result<Row, DelegateError> {
        let mut row = Row::new();
        for (name, column) in &self.schema.columns {
            let value = match record.remove(name).filter(|v| !v.is_null()) {
                Some(value) => coerce(&self.schema.model, name, column, value)?,
                None => match &column.default {
                    Some(default) => coerce(&self.schema.model, name, column, default.clone())?,
                    None if column.auto_increment => {
                        let id = self.next_id;
                        self.next_id += 1;
                        Value::from(id)
                    }
                    None => Value::Null,
                },
            };
            if column.auto_increment {
                if let Some(explicit) = value.as_i64() {
                    self.next_id = self.next_id.max(explicit.saturating_add(1));
                }
            }
            check_null(&self.schema.model, name, column, &value)?;
            row.insert(name.clone(), value);
        }
        Ok(row)
    }

    fn check_unique<'a>(
        &self,
        rows: impl Iterator<Item = &'a Row> + Clone,
    ) -> Result<(), DelegateError> {
        let primary: Vec<&str> = self.schema.primary_keys.iter().map(String::as_str).collect();
        let mut keys = vec![(self.schema.primary_keys.join("_"), primary)];
        for (name, column) in &self.schema.columns {
            if column.unique {
                keys.push((name.clone(), vec![name.as_str()]));
            }
        }

        for (label, columns) in keys {
            let mut seen = HashSet::new();
            for row in rows.clone() {
                let values: Vec<Value> =
                    columns.iter().map(|c| row.get(*c).cloned().unwrap_or(Value::Null)).collect();
                if values.iter().any(Value::is_null) {
                    continue;
                }
                if !seen.insert(Value::from(values).to_string()) {
                    let constraint = format!("{}_{}_key", self.schema.table, label);
                    let driver = DriverError::new(
                        format!("duplicate key value violates unique constraint \"{constraint}\""),
                        UNIQUE_VIOLATION,
                    );
                    return Err(DelegateError::new(
                        DelegateErrorKind::UniqueConstraint,
                        "Validation error",
                    )
                    .with_original(driver));
                }
            }
        }
        Ok(())
    }

    /// Indices of the rows matching `query.where`, in storage order.
    fn matching(&self, query: &QueryOptions) -> Result<Vec<usize>, DelegateError> {
        let clause = query.filter.as_ref().unwrap_or(&filter::NULL);
        let mut indices = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            if filter::matches(row, clause)? {
                indices.push(index);
            }
        }
        Ok(indices)
    }

    pub fn find(&self, query: &QueryOptions) -> Result<Vec<Row>, DelegateError> {
        let mut rows: Vec<&Row> =
            self.matching(query)?.into_iter().map(|i| &self.rows[i]).collect();

        let terms = query.order_terms();
        for term in terms.iter().filter(|t| t.path.is_empty()) {
            self.schema.column(&term.column)?;
        }
        rows.sort_by(|a, b| {
            terms
                .iter()
                .filter(|t| t.path.is_empty())
                .map(|t| {
                    let ordering = filter::sort_key_order(
                        a.get(&t.column).unwrap_or(&filter::NULL),
                        b.get(&t.column).unwrap_or(&filter::NULL),
                    );
                    if t.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        let selected = rows.into_iter().skip(offset).take(limit);

        match &query.attributes {
            Some(attributes) => {
                for name in attributes {
                    self.schema.column(name)?;
                }
                Ok(selected
                    .map(|row| {
                        attributes
                            .iter()
                            .map(|name| {
                                (name.clone(), row.get(name).cloned().unwrap_or(Value::Null))
                            })
                            .collect()
                    })
                    .collect())
            }
            None => Ok(selected.cloned().collect()),
        }
    }

    pub fn aggregate(
        &self,
        function: Aggregate,
        column: Option<&str>,
        query: &QueryOptions,
    ) -> Result<Value, DelegateError> {
        let indices = self.matching(query)?;
        let Some(column) = column else {
            return match function {
                Aggregate::Count => Ok(Value::from(indices.len())),
                other => {
                    Err(DelegateError::database(format!("{} requires a column", other.as_str())))
                }
            };
        };
        self.schema.column(column)?;
        let values: Vec<&Value> = indices
            .iter()
            .filter_map(|i| self.rows[*i].get(column))
            .filter(|v| !v.is_null())
            .collect();

        match function {
            Aggregate::Count if query.distinct() => {
                let distinct: HashSet<String> = values.iter().map(|v| v.to_string()).collect();
                Ok(Value::from(distinct.len()))
            }
            Aggregate::Count => Ok(Value::from(values.len())),
            Aggregate::Max | Aggregate::Min => {
                let mut best: Option<&Value> = None;
                for value in values {
                    best = match best {
                        None => Some(value),
                        Some(current) => {
                            let ordering = filter::compare(value, current).ok_or_else(|| {
                                DelegateError::database(format!(
                                    "cannot compare {value} and {current} in column \"{column}\""
                                ))
                            })?;
                            let better = match function {
                                Aggregate::Max => ordering.is_gt(),
                                _ => ordering.is_lt(),
                            };
                            Some(if better { value } else { current })
                        }
                    };
                }
                Ok(best.cloned().unwrap_or(Value::Null))
            }
            Aggregate::Sum => {
                let mut total = Number::from(0);
                for value in values {
                    let n = value.as_number().ok_or_else(|| {
                        DelegateError::database(format!(
                            "cannot sum non-numeric column \"{column}\""
                        ))
                    })?;
                    total = numeric::add(&total, n)
                        .ok_or_else(|| DelegateError::database("numeric overflow in sum"))?;
                }
                Ok(Value::Number(total))
            }
        }
    }

    /// Returns the updated rows.
    pub fn increment(
        &mut self,
        deltas: &[(String, Number)],
        query: &QueryOptions,
    ) -> Result<Vec<Row>, DelegateError> {
        for (name, _) in deltas {
            let column = self.schema.column(name)?;
            let is_numeric = matches!(
                column.data_type,
                DataType::Integer | DataType::Float | DataType::Other(_)
            );
            if !is_numeric {
                return Err(DelegateError::database(format!(
                    "cannot increment non-numeric column \"{name}\""
                )));
            }
        }
        let indices = self.matching(query)?;
        let mut updated = Vec::with_capacity(indices.len());
        let mut staged = self.rows.clone();
        for index in indices {
            let row = &mut staged[index];
            for (name, delta) in deltas {
                let next = match row.get(name) {
                    None | Some(Value::Null) => Value::Null,
                    Some(Value::Number(current)) => {
                        numeric::add(current, delta).map(Value::Number).ok_or_else(|| {
                            DelegateError::database(format!("numeric overflow in \"{name}\""))
                        })?
                    }
                    Some(other) => {
                        return Err(DelegateError::database(format!(
                            "cannot increment non-numeric value {other} in \"{name}\""
                        )))
                    }
                };
                row.insert(name.clone(), next);
            }
            updated.push(row.clone());
        }
        self.check_unique(staged.iter())?;
        self.rows = staged;
        Ok(updated)
    }

    pub fn update(&mut self, values: &Row, query: &QueryOptions) -> Result<u64, DelegateError> {
        let mut coerced = Row::new();
        for (name, value) in values {
            let Some(column) = self.schema.columns.get(name) else {
                continue;
            };
            let value = coerce(&self.schema.model, name, column, value.clone())?;
            check_null(&self.schema.model, name, column, &value)?;
            coerced.insert(name.clone(), value);
        }
        let mut indices = self.matching(query)?;
        if let Some(limit) = query.limit {
            indices.truncate(limit as usize);
        }
        let mut staged = self.rows.clone();
        for index in &indices {
            for (name, value) in &coerced {
                staged[*index].insert(name.clone(), value.clone());
            }
        }
        self.check_unique(staged.iter())?;
        self.rows = staged;
        Ok(indices.len() as u64)
    }

    pub fn destroy(&mut self, query: &QueryOptions) -> Result<u64, DelegateError> {
        let mut indices = self.matching(query)?;
        if let Some(limit) = query.limit {
            indices.truncate(limit as usize);
        }
        let doomed: HashSet<usize> = indices.iter().copied().collect();
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = !doomed.contains(&index);
            index += 1;
            keep
        });
        Ok(doomed.len() as u64)
    }
}

fn check_null(
    model: &str,
    name: &str,
    column: &Column,
    value: &Value,
) -> Result<(), DelegateError> {
    if value.is_null() && !column.allow_null && !column.auto_increment {
        return Err(DelegateError::validation(format!(
            "notNull Violation: {model}.{name} cannot be null"
        )));
    }
    Ok(())
}

/// Convert `value` to the column's storage class.
fn coerce(model: &str, name: &str, column: &Column, value: Value) -> Result<Value, DelegateError> {
    let invalid = |value: &Value| {
        DelegateError::validation(format!(
            "Validation error: {model}.{name} expects {}, got {value}",
            column.data_type
        ))
    };
    let coerced = match (&column.data_type, value) {
        (_, Value::Null) => Value::Null,
        (DataType::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
                _ => return Err(invalid(&Value::Number(n))),
            },
        },
        (DataType::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Value::from(i),
            Err(_) => return Err(invalid(&Value::String(s))),
        },
        (DataType::Float, Value::Number(n)) => Value::Number(n),
        (DataType::Float, Value::String(s)) => {
            match s.trim().parse::<f64>().ok().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => return Err(invalid(&Value::String(s))),
            }
        }
        (DataType::Boolean, Value::Bool(b)) => Value::Bool(b),
        (DataType::Boolean, Value::Number(n)) if n.as_i64() == Some(0) => Value::Bool(false),
        (DataType::Boolean, Value::Number(n)) if n.as_i64() == Some(1) => Value::Bool(true),
        (DataType::Boolean, Value::String(s)) if s == "true" || s == "false" => {
            Value::Bool(s == "true")
        }
        (DataType::String, Value::String(s)) => Value::String(s),
        (DataType::String, Value::Number(n)) => Value::String(n.to_string()),
        (DataType::String, Value::Bool(b)) => Value::String(b.to_string()),
        (DataType::Date, v @ (Value::String(_) | Value::Number(_))) => v,
        (DataType::Json | DataType::Other(_), v) => v,
        (_, other) => return Err(invalid(&other)),
    };
    Ok(coerced)
}

//! Filter engine
//!
//! Turns the sparse prototype carried by a `Filters<T>` into typed
//! predicates. The relational store renders them to SQL; the volatile store
//! evaluates them against its records. Both backends therefore agree on
//! which records match and in what order.

use crate::error::{StoreError, StoreResult};
use bookshelf_types::{Field, FieldKind, FieldValue, Filters, Order, Record};
use std::cmp::Ordering;

/// Comparison applied to one attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive substring match. The needle is stored lowercased.
    Contains(String),
    /// Attribute value greater than or equal to the operand
    AtLeast(FieldValue),
}

pub struct Predicate<T: 'static> {
    pub field: &'static Field<T>,
    pub condition: Condition,
}

impl<T: 'static> Predicate<T> {
    pub fn matches(&self, record: &T) -> bool {
        let value = self.field.value(record);
        match &self.condition {
            Condition::Contains(needle) => match value {
                FieldValue::Text(text) => text.to_lowercase().contains(needle.as_str()),
                _ => false,
            },
            Condition::AtLeast(bound) => value
                .compare(bound)
                .map(|ord| ord != Ordering::Less)
                .unwrap_or(false),
        }
    }
}

/// A resolved list request: predicates ANDed together, then ordering and
/// pagination
pub struct Query<T: 'static> {
    pub predicates: Vec<Predicate<T>>,
    pub sort: &'static Field<T>,
    pub order: Order,
    pub limit: usize,
    pub offset: usize,
}

/// Resolve `filters` against the record's descriptor table.
///
/// Fails with `InvalidArgument` when the record declares an attribute type
/// that cannot be filtered, or when `sort_by` names no attribute. The order
/// token has already been validated by the caller and is used as is.
pub fn build<T: Record>(filters: &Filters<T>) -> StoreResult<Query<T>> {
    let mut predicates = Vec::new();

    for field in T::fields() {
        if field.kind == FieldKind::Boolean {
            return Err(StoreError::InvalidArgument(format!(
                "model field data type not supported: {} ({})",
                field.kind, field.name
            )));
        }

        // The primary key is never an implicit filter
        if field.is_primary_key() {
            continue;
        }

        let value = field.value(&filters.model);
        if !value.is_present() {
            continue;
        }

        let condition = match value {
            FieldValue::Text(text) => Condition::Contains(text.to_lowercase()),
            other => Condition::AtLeast(other),
        };
        predicates.push(Predicate { field, condition });
    }

    let sort = T::field(&filters.sort_by).ok_or_else(|| {
        StoreError::InvalidArgument(format!("cannot sort by unknown field '{}'", filters.sort_by))
    })?;

    Ok(Query {
        predicates,
        sort,
        order: filters.order,
        limit: filters.limit,
        offset: filters.offset,
    })
}

impl<T: Clone + 'static> Query<T> {
    pub fn matches(&self, record: &T) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }

    /// Filter, sort and paginate records held in memory.
    ///
    /// The sort is stable, so records with equal sort values keep the order
    /// in which `records` yields them.
    pub fn apply<'a, I>(&self, records: I) -> Vec<T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut matched: Vec<&T> = records.into_iter().filter(|r| self.matches(r)).collect();

        matched.sort_by(|a, b| {
            let ord = self
                .sort
                .value(a)
                .compare(&self.sort.value(b))
                .unwrap_or(Ordering::Equal);
            match self.order {
                Order::Asc => ord,
                Order::Desc => ord.reverse(),
            }
        });

        matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }
}

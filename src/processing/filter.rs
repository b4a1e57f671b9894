//! Typed equality filters.
//!
//! A [`Filter`] is built once per run from a [`RawTargetConfig`] and the column's resolved
//! [`PrimitiveType`]. Construction parses the literal into the column's domain, so a bad literal
//! fails before the first row is read; evaluation then only compares value tags and payloads.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::types::{PrimitiveType, RawTargetConfig, Row, TargetColumnName, TargetConfig};

use super::literal::PrimitiveDomain;

/// Outcome of evaluating a [`Filter`] against one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterResult {
    /// Never produced by a successful evaluation.
    #[default]
    Unspecified,
    /// The row's column equals the configured literal.
    Match,
    /// The column is absent, null, or holds a different value.
    Unmatch,
}

type Predicate = dyn Fn(&Row) -> RecordFilterResult<FilterResult> + Send + Sync;

/// A reusable, immutable column-equals-literal predicate.
///
/// Cloning is cheap and clones share the same comparator.
#[derive(Clone)]
pub struct Filter {
    column: TargetColumnName,
    target_type: PrimitiveType,
    predicate: Arc<Predicate>,
}

impl Filter {
    /// Evaluate the filter against one row.
    pub fn evaluate(&self, row: &Row) -> RecordFilterResult<FilterResult> {
        (self.predicate)(row)
    }

    pub fn column(&self) -> &TargetColumnName {
        &self.column
    }

    /// Primitive type the literal was parsed into.
    pub fn target_type(&self) -> PrimitiveType {
        self.target_type
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("column", &self.column)
            .field("target_type", &self.target_type)
            .finish()
    }
}

impl<T: PrimitiveDomain> TargetConfig<T> {
    /// Compare a value of this domain with the configured literal.
    pub fn compare(&self, candidate: &T) -> FilterResult {
        if *candidate == self.value {
            FilterResult::Match
        } else {
            FilterResult::Unmatch
        }
    }

    /// Classify and compare the row's field.
    ///
    /// - absent or null: `Unmatch`
    /// - present with `T`'s tag: `Match` / `Unmatch` by equality
    /// - present with another tag: `InvalidInput`
    pub fn evaluate(&self, row: &Row) -> RecordFilterResult<FilterResult> {
        let column = self.column.as_str();
        match row.get(column) {
            None => Ok(FilterResult::Unmatch),
            Some(v) if v.is_null() => Ok(FilterResult::Unmatch),
            Some(v) => match T::from_value(v) {
                Some(candidate) => Ok(self.compare(candidate)),
                None => Err(RecordFilterError::invalid_input(
                    column,
                    format!("expected {} value, found {}", T::PRIMITIVE, v.type_name()),
                )),
            },
        }
    }

    /// Wrap this config into a [`Filter`].
    pub fn into_filter(self) -> Filter {
        let column = self.column.clone();
        Filter {
            column,
            target_type: T::PRIMITIVE,
            predicate: Arc::new(move |row: &Row| self.evaluate(row)),
        }
    }
}

/// Builds typed configs and filters for one primitive domain `T`.
#[derive(Debug)]
pub struct TypedFilterFactory<T> {
    _domain: PhantomData<fn() -> T>,
}

impl<T: PrimitiveDomain> Default for TypedFilterFactory<T> {
    fn default() -> Self {
        Self {
            _domain: PhantomData,
        }
    }
}

impl<T: PrimitiveDomain> TypedFilterFactory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `raw` into `T` and pair it with `column`.
    pub fn build_config(
        &self,
        column: &TargetColumnName,
        raw: &str,
    ) -> RecordFilterResult<TargetConfig<T>> {
        let value = T::parse_literal(raw).map_err(|message| {
            RecordFilterError::invalid_input(
                column.as_str(),
                format!(
                    "cannot parse literal '{raw}' as {}: {message}",
                    T::PRIMITIVE
                ),
            )
        })?;
        Ok(TargetConfig {
            column: column.clone(),
            value,
        })
    }

    pub fn build_filter(&self, column: &TargetColumnName, raw: &str) -> RecordFilterResult<Filter> {
        self.build_config(column, raw).map(TargetConfig::into_filter)
    }
}

type BuildFilterFn = fn(&TargetColumnName, &str) -> RecordFilterResult<Filter>;

fn build_filter_for<T: PrimitiveDomain>(
    column: &TargetColumnName,
    raw: &str,
) -> RecordFilterResult<Filter> {
    TypedFilterFactory::<T>::new().build_filter(column, raw)
}

// One entry per dispatchable type. `Unspecified` has no entry.
const FACTORIES: [(PrimitiveType, BuildFilterFn); 6] = [
    (PrimitiveType::String, build_filter_for::<String>),
    (PrimitiveType::Int32, build_filter_for::<i32>),
    (PrimitiveType::Int64, build_filter_for::<i64>),
    (PrimitiveType::Float32, build_filter_for::<f32>),
    (PrimitiveType::Float64, build_filter_for::<f64>),
    (PrimitiveType::Bool, build_filter_for::<bool>),
];

/// Build the filter for a column whose type was resolved at run time.
///
/// Fails with `InvalidType` for [`PrimitiveType::Unspecified`] and with `InvalidInput` if the
/// literal does not parse as `resolved`.
pub fn resolve(resolved: PrimitiveType, raw: &RawTargetConfig) -> RecordFilterResult<Filter> {
    let build = FACTORIES
        .iter()
        .find(|(t, _)| *t == resolved)
        .map(|(_, build)| *build)
        .ok_or_else(|| RecordFilterError::InvalidType {
            name: resolved.name().to_string(),
        })?;
    build(&raw.column, &raw.value)
}

impl RawTargetConfig {
    /// Convenience for [`resolve`].
    pub fn to_filter(&self, resolved: PrimitiveType) -> RecordFilterResult<Filter> {
        resolve(resolved, self)
    }
}

//! Lazy, fail-fast application of a [`Filter`] over a row stream.

use crate::error::{RecordFilterError, RecordFilterResult};
use crate::execution::CancellationToken;
use crate::types::Row;

use super::filter::{Filter, FilterResult};

/// Iterator adapter returned by [`apply`].
///
/// Each call to `next` pulls upstream only as far as needed to produce one element. The first
/// error (cancellation, upstream, or filter) is yielded once and ends the sequence; after that no
/// upstream element is pulled again. Dropping the adapter drops the upstream iterator.
pub struct FilteredRows<I> {
    upstream: I,
    filter: Filter,
    cancel: CancellationToken,
    done: bool,
}

impl<I> FilteredRows<I> {
    fn terminate(&mut self, err: RecordFilterError) -> Option<RecordFilterResult<Row>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<I> Iterator for FilteredRows<I>
where
    I: Iterator<Item = RecordFilterResult<Row>>,
{
    type Item = RecordFilterResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.cancel.is_cancelled() {
                return self.terminate(RecordFilterError::Cancelled);
            }

            let row = match self.upstream.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => return self.terminate(e),
                Some(Ok(row)) => row,
            };

            match self.filter.evaluate(&row) {
                Ok(FilterResult::Match) => return Some(Ok(row)),
                Ok(_) => continue,
                Err(e) => return self.terminate(e),
            }
        }
        None
    }
}

/// Apply `filter` lazily to `input`, yielding only matching rows.
pub fn apply<I>(filter: &Filter, cancel: &CancellationToken, input: I) -> FilteredRows<I::IntoIter>
where
    I: IntoIterator<Item = RecordFilterResult<Row>>,
{
    FilteredRows {
        upstream: input.into_iter(),
        filter: filter.clone(),
        cancel: cancel.clone(),
        done: false,
    }
}

impl Filter {
    /// Method form of [`apply`].
    pub fn apply<I>(&self, cancel: &CancellationToken, input: I) -> FilteredRows<I::IntoIter>
    where
        I: IntoIterator<Item = RecordFilterResult<Row>>,
    {
        apply(self, cancel, input)
    }
}

//! Worst-covered-first orderings for the hitlist.

use std::cmp::Ordering;

use crate::model::ClassifiedResult;

/// Descending by number of missed lines.
pub fn by_miss_count_desc(a: &ClassifiedResult, b: &ClassifiedResult) -> Ordering {
    b.miss_count().cmp(&a.miss_count())
}

/// Descending by share of instrumented lines missed.
pub fn by_miss_fraction_desc(a: &ClassifiedResult, b: &ClassifiedResult) -> Ordering {
    b.miss_fraction().total_cmp(&a.miss_fraction())
}

/// The same results in two independent orders.
///
/// Both sorts are stable: results that compare equal keep their input order.
#[derive(Debug)]
pub struct Ranking<'a> {
    pub by_miss_count: Vec<&'a ClassifiedResult>,
    pub by_miss_fraction: Vec<&'a ClassifiedResult>,
}

/// One hitlist row. The two halves usually describe different files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitlistRow<'a> {
    pub worst_by_count: &'a ClassifiedResult,
    pub worst_by_fraction: &'a ClassifiedResult,
}

pub fn rank<'a, I>(results: I) -> Ranking<'a>
where
    I: IntoIterator<Item = &'a ClassifiedResult>,
{
    let mut by_miss_count: Vec<&ClassifiedResult> = results.into_iter().collect();
    let mut by_miss_fraction = by_miss_count.clone();

    by_miss_count.sort_by(|a, b| by_miss_count_desc(a, b));
    by_miss_fraction.sort_by(|a, b| by_miss_fraction_desc(a, b));

    Ranking {
        by_miss_count,
        by_miss_fraction,
    }
}

impl<'a> Ranking<'a> {
    pub fn len(&self) -> usize {
        self.by_miss_count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_miss_count.is_empty()
    }

    /// Pair the orderings position by position, keeping at most `limit`
    /// rows. No limit, or one past the end, keeps them all.
    pub fn rows(&self, limit: Option<usize>) -> Vec<HitlistRow<'a>> {
        let n = limit.map_or(self.len(), |l| l.min(self.len()));
        self.by_miss_count
            .iter()
            .zip(&self.by_miss_fraction)
            .take(n)
            .map(|(&worst_by_count, &worst_by_fraction)| HitlistRow {
                worst_by_count,
                worst_by_fraction,
            })
            .collect()
    }
}

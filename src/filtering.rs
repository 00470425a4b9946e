//! Keeping the top contributors that together cover a share of the total mass.

use crate::{
    error::{Error, Result},
    table::TradeTable,
};

/// An item with its running totals after sorting by descending value.
#[derive(Clone, Debug, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    pub value: f64,
    /// Running sum of the values up to and including this item.
    pub cumsum: f64,
    /// `cumsum` over the total.
    pub cumperc: f64,
}

/// Sorts `items` by descending value and keeps those whose cumulative share of the total is at
/// most `percentile`.
///
/// The sort is stable, equal values keep their input order. The leading item is always kept, so a
/// vanishing threshold retains exactly the largest contributor.
///
/// # Examples
///
/// ```
/// use faonet::filtering::top_percentile;
///
/// let flows = vec![("a", 10.0), ("b", 60.0), ("c", 30.0)];
/// let top = top_percentile(flows, |(_, value)| *value, 0.9)?;
///
/// assert_eq!(top.iter().map(|r| r.item.0).collect::<Vec<_>>(), vec!["b", "c"]);
/// assert_eq!(top[1].cumperc, 0.9);
/// # Ok::<(), faonet::Error>(())
/// ```
pub fn top_percentile<T, F>(items: Vec<T>, value: F, percentile: f64) -> Result<Vec<Ranked<T>>>
where
    F: Fn(&T) -> f64,
{
    if !(percentile > 0.0 && percentile <= 1.0) {
        return Err(Error::InvalidThreshold(percentile));
    }
    if items.is_empty() {
        return Err(Error::EmptyTable);
    }

    let mut valued: Vec<(f64, T)> = items.into_iter().map(|item| (value(&item), item)).collect();
    valued.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    let cumulative: Vec<f64> = valued
        .iter()
        .scan(0.0, |sum, (v, _)| {
            *sum += v;
            Some(*sum)
        })
        .collect();

    // The last running sum is the total, so the final share is exactly 1.
    let total = cumulative.last().copied().unwrap_or(0.0);
    if total == 0.0 {
        return Err(Error::ZeroTotal(String::new()));
    }

    Ok(valued
        .into_iter()
        .zip(cumulative)
        .enumerate()
        .map(|(i, ((value, item), cumsum))| {
            (
                i,
                Ranked {
                    item,
                    value,
                    cumsum,
                    cumperc: cumsum / total,
                },
            )
        })
        .take_while(|(i, ranked)| *i == 0 || ranked.cumperc <= percentile)
        .map(|(_, ranked)| ranked)
        .collect())
}

impl TradeTable {
    /// Sorts the rows by descending `column` and keeps the top rows covering `percentile` of the
    /// column's total, appending `cumsum` and `cumperc` columns.
    pub fn top_percentile(&self, column: &str, percentile: f64) -> Result<Self> {
        let values = self.numbers(column)?;
        let rows: Vec<(usize, f64)> = values.into_iter().enumerate().collect();

        let ranked = top_percentile(rows, |(_, value)| *value, percentile).map_err(|e| match e {
            Error::ZeroTotal(_) => Error::ZeroTotal(column.to_owned()),
            e => e,
        })?;

        let indices: Vec<usize> = ranked.iter().map(|r| r.item.0).collect();

        Ok(self
            .select_rows(&indices)
            .with_column("cumsum", ranked.iter().map(|r| r.cumsum.to_string()))
            .with_column("cumperc", ranked.iter().map(|r| r.cumperc.to_string())))
    }
}

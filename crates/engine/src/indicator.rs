//! Visual counters derived from collection aggregates.
//!
//! An [`Indicator`] is a cart badge, a cart total or a favorites count. It
//! never trusts event payloads for its value: when its context's
//! [`ChangeFeed`] reports a change to its collection, it re-reads the
//! aggregate from storage.
//!
//! Indicators only hear about mutations made in their own context. A second
//! context writing to the same store is picked up on the next [`Indicator::refresh`]
//! (page load, focus) or the next local mutation, not before.

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

use crate::collection::{Aggregate, CollectionKind};
use crate::feed::{ChangeEvent, ChangeFeed};

/// Something that can produce a fresh [`Aggregate`] for one collection.
pub trait AggregateSource {
    /// Collection the aggregate is computed over.
    fn kind(&self) -> CollectionKind;

    /// Recompute the aggregate from storage.
    fn aggregate(&self) -> Aggregate;
}

/// Which part of the aggregate an indicator displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMetric {
    /// Sum of quantities (cart) or number of entries (favorites).
    ItemCount,
    /// Number of distinct entries.
    LineCount,
    /// Money total in minor units. Zero for unpriced collections.
    Total,
}

impl IndicatorMetric {
    fn read(self, aggregate: &Aggregate) -> i64 {
        match self {
            Self::ItemCount => i64::from(aggregate.count),
            Self::LineCount => i64::try_from(aggregate.lines).unwrap_or(i64::MAX),
            Self::Total => aggregate.total.map_or(0, |total| total.minor_units()),
        }
    }
}

/// A displayed value kept in step with one collection.
#[derive(Debug)]
pub struct Indicator<S> {
    source: S,
    metric: IndicatorMetric,
    events: broadcast::Receiver<ChangeEvent>,
    value: i64,
}

impl<S: AggregateSource> Indicator<S> {
    /// Subscribe to `feed` and render the initial value.
    #[must_use]
    pub fn new(source: S, metric: IndicatorMetric, feed: &ChangeFeed) -> Self {
        let events = feed.subscribe();
        let value = metric.read(&source.aggregate());
        Self {
            source,
            metric,
            events,
            value,
        }
    }

    /// Last rendered value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// Which metric is shown.
    #[must_use]
    pub const fn metric(&self) -> IndicatorMetric {
        self.metric
    }

    /// Apply pending change notifications.
    ///
    /// Re-reads the aggregate if any pending event concerns this indicator's
    /// collection, or if events were dropped because the indicator fell behind.
    /// Returns `true` if the displayed value changed.
    pub fn sync(&mut self) -> bool {
        let kind = self.source.kind();
        let mut stale = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => stale |= event.kind == kind,
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(%kind, skipped, "Indicator lagged behind change feed");
                    stale = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        stale && self.refresh()
    }

    /// Re-read the aggregate unconditionally.
    ///
    /// Returns `true` if the displayed value changed.
    pub fn refresh(&mut self) -> bool {
        let value = self.metric.read(&self.source.aggregate());
        let changed = value != self.value;
        if changed {
            debug!(kind = %self.source.kind(), from = self.value, to = value, "Indicator updated");
        }
        self.value = value;
        changed
    }

    /// The aggregate source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }
}

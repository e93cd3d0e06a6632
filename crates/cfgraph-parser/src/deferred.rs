//! Bookkeeping for deferred import selectors: queued during the first phase, grouped and
//! resolved once every configuration class of the run has been parsed.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::Result;
use crate::filter::ClassFilter;
use crate::source_class::SourceClass;
use crate::strategy::{DeferredImportGroup, DeferredImportSelector, GroupEntry};

/// A deferred selector and the configuration class that declared it.
#[derive(Clone)]
pub(crate) struct DeferredImportHolder {
    pub owner: SourceClass,
    pub selector: Arc<dyn DeferredImportSelector>,
    /// Explicit priority, lowest value first.
    pub order: i32,
}

/// Queue of holders for the current run. While the queue is being drained it is closed, and
/// holders handed to it come straight back so the caller can process them on the spot.
pub(crate) struct DeferredImportSelectorHandler {
    pending: Option<Vec<DeferredImportHolder>>,
}

impl DeferredImportSelectorHandler {
    pub fn new() -> Self {
        Self {
            pending: Some(Vec::new()),
        }
    }

    /// Queues `holder`, or returns it when the queue is closed.
    pub fn handle(&mut self, holder: DeferredImportHolder) -> Option<DeferredImportHolder> {
        match &mut self.pending {
            Some(pending) => {
                pending.push(holder);
                None
            }
            None => Some(holder),
        }
    }

    /// Closes the queue and returns everything queued so far, stably sorted by priority.
    pub fn take(&mut self) -> Option<Vec<DeferredImportHolder>> {
        let mut holders = self.pending.take()?;
        holders.sort_by_key(|holder| holder.order);
        Some(holders)
    }

    /// Reopens the queue for the next run.
    pub fn reset(&mut self) {
        self.pending = Some(Vec::new());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Type(String),
    /// A selector without a declared group type gets a group of its own.
    Holder(usize),
}

pub(crate) struct DeferredImportGrouping {
    group: Box<dyn DeferredImportGroup>,
    holders: Vec<DeferredImportHolder>,
}

impl DeferredImportGrouping {
    /// Feeds every holder to the group, then asks it once for its entries.
    pub fn imports(&mut self) -> Vec<GroupEntry> {
        for holder in &self.holders {
            self.group
                .process(holder.owner.metadata(), holder.selector.as_ref());
        }
        self.group.select_imports()
    }

    /// `default` widened by each selector's own exclusion filter.
    pub fn candidate_filter(&self, default: &ClassFilter) -> ClassFilter {
        self.holders
            .iter()
            .filter_map(|holder| holder.selector.exclusion_filter())
            .fold(default.clone(), |merged, filter| merged.or(&filter))
    }
}

/// Groups registered holders and remembers which configuration classes they came from.
#[derive(Default)]
pub(crate) struct DeferredImportSelectorGroupingHandler {
    groupings: IndexMap<GroupKey, DeferredImportGrouping>,
    origins: IndexMap<String, SourceClass>,
}

impl DeferredImportSelectorGroupingHandler {
    pub fn register(
        &mut self,
        holder: DeferredImportHolder,
        create_group: impl FnOnce(Option<&str>) -> Result<Box<dyn DeferredImportGroup>>,
    ) -> Result<()> {
        let group_type = holder.selector.import_group();
        let key = match &group_type {
            Some(group_type) => GroupKey::Type(group_type.clone()),
            None => GroupKey::Holder(self.groupings.len()),
        };
        self.origins
            .entry(holder.owner.name().to_string())
            .or_insert_with(|| holder.owner.clone());

        if let Some(grouping) = self.groupings.get_mut(&key) {
            grouping.holders.push(holder);
            return Ok(());
        }
        let group = create_group(group_type.as_deref())?;
        self.groupings.insert(
            key,
            DeferredImportGrouping {
                group,
                holders: vec![holder],
            },
        );
        Ok(())
    }

    /// Splits into the groupings, in registration order, and the origin lookup.
    pub fn into_parts(self) -> (Vec<DeferredImportGrouping>, DeferredOrigins) {
        (
            self.groupings.into_values().collect(),
            DeferredOrigins(self.origins),
        )
    }
}

/// The configuration classes group entries refer to, as seen when their selectors were queued.
pub(crate) struct DeferredOrigins(IndexMap<String, SourceClass>);

impl DeferredOrigins {
    pub fn get(&self, class_name: &str) -> Option<&SourceClass> {
        self.0.get(class_name)
    }
}

//! Derives the effective member order and groups adjacent plain-data members
//! into bulk copies.

use alloc::vec::Vec;

use fixedbitset::FixedBitSet;

use crate::config::{CodecConfig, MemberOrder};
use crate::error::ConfigError;
use crate::schema::MemberDescriptor;

// -----------------------------------------------------------------------------
// Plan types

/// Adjacent members copied as one contiguous byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGroup {
    /// Offset of the first member inside the owner.
    pub offset: usize,
    /// Total byte length of the range.
    pub size: usize,
    /// Schema indices of the members, in effective order.
    pub members: Vec<usize>,
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    Batch(BatchGroup),
    /// A member handled on its own, by schema index.
    Member(usize),
}

/// The effective order of a schema and its partition into plan entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Schema indices in effective order.
    pub order: Vec<usize>,
    /// Covers `order` exactly, without reordering it.
    pub entries: Vec<PlanEntry>,
}

impl BatchPlan {
    pub fn groups(&self) -> impl Iterator<Item = &BatchGroup> {
        self.entries.iter().filter_map(|entry| match entry {
            PlanEntry::Batch(group) => Some(group),
            PlanEntry::Member(_) => None,
        })
    }
}

// -----------------------------------------------------------------------------
// Planning

/// Schema indices in the order members appear on the wire.
///
/// [`MemberOrder::Grouped`] is a stable partition by member class, so the
/// result depends only on the schema.
pub fn effective_order(members: &[MemberDescriptor], order: MemberOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..members.len()).collect();
    if order == MemberOrder::Grouped {
        indices.sort_by_key(|&index| members[index].class().order_rank());
    }
    indices
}

/// Whether a member may join a batch.
///
/// Readonly members never do; they are decoded into a local copy first.
fn batchable(member: &MemberDescriptor) -> bool {
    !member.is_readonly() && member.has_memory_image()
}

/// Groups maximal runs of batchable members that are adjacent both in the
/// effective order and in memory.
///
/// Runs of a single member stay plain entries. Batching is skipped entirely
/// when disabled or on big-endian targets.
pub fn plan(members: &[MemberDescriptor], config: &CodecConfig) -> BatchPlan {
    let order = effective_order(members, config.member_order);
    let enabled = config.batching && cfg!(target_endian = "little");

    let mut entries = Vec::with_capacity(order.len());
    let mut cursor = 0;
    while cursor < order.len() {
        let first = &members[order[cursor]];
        let mut end = cursor + 1;
        if enabled && batchable(first) {
            let mut tail = first.end();
            while end < order.len() {
                let next = &members[order[end]];
                if !batchable(next) || next.offset() != tail {
                    break;
                }
                tail = next.end();
                end += 1;
            }
        }

        if end - cursor >= 2 {
            entries.push(PlanEntry::Batch(BatchGroup {
                offset: first.offset(),
                size: members[order[end - 1]].end() - first.offset(),
                members: order[cursor..end].to_vec(),
            }));
        } else {
            entries.push(PlanEntry::Member(order[cursor]));
        }
        cursor = end;
    }

    BatchPlan { order, entries }
}

/// Checks that `plan` covers every member exactly once.
pub fn verify(type_name: &'static str, members: &[MemberDescriptor], plan: &BatchPlan) -> Result<(), ConfigError> {
    let mut seen = FixedBitSet::with_capacity(members.len());
    let mut visit = |index: usize| {
        if index >= members.len() || seen.put(index) {
            return Err(ConfigError::PlanCoverage { type_name, index });
        }
        Ok(())
    };

    for entry in &plan.entries {
        match entry {
            PlanEntry::Batch(group) => group.members.iter().try_for_each(|&index| visit(index))?,
            PlanEntry::Member(index) => visit(*index)?,
        }
    }

    match seen.zeroes().next() {
        Some(index) => Err(ConfigError::PlanCoverage { type_name, index }),
        None => Ok(()),
    }
}

// -----------------------------------------------------------------------------
// Tests

//! Net-index assignment: a dense, deterministic integer per node for
//! replication.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::hash::names_checksum;
use crate::layout::NetIndexLayout;
use crate::node::{NodeId, TagNode};
use crate::settings::TagSettings;
use crate::tag::Tag;

/// Network index of a tag.
pub type TagNetIndex = u16;

/// Stored on nodes that have no net index (before assignment, or truncated
/// away by an overflow). Never written to the wire; the assignment's own
/// [`invalid_index`](NetIndexTable::invalid_index) is.
pub const INVALID_TAG_NET_INDEX: TagNetIndex = TagNetIndex::MAX;

/// Result of a net-index assignment: index → node, plus the wire layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetIndexTable {
    order: Vec<NodeId>,
    invalid_index: TagNetIndex,
    true_bit_num: u8,
    first_segment_bits: u8,
    checksum: u64,
    assigned: bool,
}

impl NetIndexTable {
    /// Number of tags with an index.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// The "absent" index, `len + 1`.
    #[inline]
    pub fn invalid_index(&self) -> TagNetIndex {
        self.invalid_index
    }

    /// Bits needed to write any index up to and including the invalid index.
    #[inline]
    pub fn true_bit_num(&self) -> u8 {
        self.true_bit_num
    }

    #[inline]
    pub fn first_segment_bits(&self) -> u8 {
        self.first_segment_bits
    }

    /// Case-insensitive FNV-1a checksum of the names in index order.
    #[inline]
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    pub fn layout(&self) -> NetIndexLayout {
        NetIndexLayout::new(self.first_segment_bits, self.true_bit_num, self.invalid_index)
    }

    #[inline]
    pub(crate) fn node_at(&self, index: TagNetIndex) -> Option<NodeId> {
        self.order.get(usize::from(index)).copied()
    }
}

/// Assigns net indices to every node of a built tree.
pub(crate) struct NetIndexAssigner<'a> {
    settings: &'a TagSettings,
    diagnostics: &'a Diagnostics,
}

impl<'a> NetIndexAssigner<'a> {
    pub(crate) fn new(settings: &'a TagSettings, diagnostics: &'a Diagnostics) -> Self {
        Self {
            settings,
            diagnostics,
        }
    }

    /// Largest number of tags that can hold an index with the configured width.
    pub(crate) fn capacity(&self) -> usize {
        // the invalid index (len + 1) must stay below 2^bits
        ((1usize << self.settings.index_bits()) - 1).saturating_sub(1)
    }

    /// Sort, promote common tags, truncate to capacity, and store each node's
    /// index. `nodes[0]` is the synthetic root and is skipped.
    pub(crate) fn assign(&self, nodes: &mut [TagNode], common_tags: &[Tag]) -> NetIndexTable {
        let mut order: Vec<NodeId> = (1..nodes.len()).map(|i| NodeId(i as u32)).collect();
        order.sort_by(|a, b| {
            nodes[a.index()]
                .complete_name()
                .cmp(nodes[b.index()].complete_name())
        });

        let mut promoted = 0;
        for common in common_tags {
            let found = order[promoted..]
                .iter()
                .position(|id| nodes[id.index()].tag() == common);
            match found {
                Some(offset) => {
                    order.swap(promoted, promoted + offset);
                    promoted += 1;
                }
                None if order[..promoted].iter().any(|id| nodes[id.index()].tag() == common) => {}
                None => self.diagnostics.warn(
                    DiagnosticKind::MissingCommonTag,
                    common.name(),
                    format!("common tag '{common}' is not in the dictionary; skipped"),
                ),
            }
        }

        let capacity = self.capacity();
        if order.len() > capacity {
            let dropped = order.len() - capacity;
            self.diagnostics.error(
                DiagnosticKind::NetIndexOverflow,
                "net_index_capacity",
                format!(
                    "{} tags exceed the {}-bit net index capacity of {capacity}; \
                     the last {dropped} tags cannot replicate",
                    order.len(),
                    self.settings.index_bits(),
                ),
            );
            order.truncate(capacity);
        }

        for node in nodes.iter_mut() {
            node.net_index = INVALID_TAG_NET_INDEX;
        }
        for (index, id) in order.iter().enumerate() {
            let node = &mut nodes[id.index()];
            // capacity keeps every index below 2^16 - 1
            node.net_index = index as TagNetIndex;
            tracing::trace!(index, tag = %node.tag(), "assigned net index");
        }

        let invalid_index = (order.len() + 1) as TagNetIndex;
        let true_bit_num = bits_to_represent(invalid_index);
        let first_segment_bits = self
            .settings
            .net_index_first_bit_segment
            .clamp(1, true_bit_num);
        let checksum = names_checksum(order.iter().map(|id| nodes[id.index()].complete_name()));

        tracing::debug!(
            tags = order.len(),
            common = promoted,
            true_bit_num,
            first_segment_bits,
            checksum = %format!("{checksum:016x}"),
            "net indices assigned"
        );

        NetIndexTable {
            order,
            invalid_index,
            true_bit_num,
            first_segment_bits,
            checksum,
            assigned: true,
        }
    }
}

/// Number of bits needed to write `value`, at least 1.
fn bits_to_represent(value: TagNetIndex) -> u8 {
    (TagNetIndex::BITS - value.leading_zeros()).max(1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 2)]
    #[case(4, 3)]
    #[case(5, 3)]
    #[case(255, 8)]
    #[case(256, 9)]
    #[case(u16::MAX, 16)]
    fn bit_widths(#[case] value: TagNetIndex, #[case] bits: u8) {
        assert_eq!(bits_to_represent(value), bits);
    }

    #[rstest]
    #[case(16, 65534)]
    #[case(8, 254)]
    #[case(2, 2)]
    #[case(1, 0)]
    fn capacity_leaves_room_for_invalid_index(#[case] bits: u8, #[case] capacity: usize) {
        let settings = TagSettings {
            net_index_bits: bits,
            ..TagSettings::default()
        };
        let diagnostics = Diagnostics::silent();
        assert_eq!(NetIndexAssigner::new(&settings, &diagnostics).capacity(), capacity);
    }
}

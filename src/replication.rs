//! Replication: net-index lookups, tag wire encoding and replication
//! statistics.

use std::collections::HashMap;

use crate::container::TagContainer;
use crate::diagnostics::DiagnosticKind;
use crate::error::WireError;
use crate::layout::{BitReader, BitWriter, NetIndexLayout};
use crate::net_index::{INVALID_TAG_NET_INDEX, NetIndexTable, TagNetIndex};
use crate::registry::TagRegistry;
use crate::tag::Tag;

/// Per-tag replication counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplicationStats {
    /// Tag → (replicated alone, replicated inside a container).
    counts: HashMap<Tag, (u64, u64)>,
    /// Container size → number of containers written with that size.
    container_sizes: HashMap<usize, u64>,
}

impl ReplicationStats {
    pub(crate) fn record(&mut self, tag: &Tag, in_container: bool) {
        let entry = self.counts.entry(tag.clone()).or_default();
        if in_container {
            entry.1 += 1;
        } else {
            entry.0 += 1;
        }
    }

    pub(crate) fn record_container(&mut self, len: usize) {
        *self.container_sizes.entry(len).or_default() += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.counts.clear();
        self.container_sizes.clear();
    }

    /// Total replications of `tag`, alone or in containers.
    pub fn count(&self, tag: &Tag) -> u64 {
        self.counts.get(tag).map_or(0, |(single, contained)| single + contained)
    }

    pub fn single_count(&self, tag: &Tag) -> u64 {
        self.counts.get(tag).map_or(0, |c| c.0)
    }

    pub fn container_count(&self, tag: &Tag) -> u64 {
        self.counts.get(tag).map_or(0, |c| c.1)
    }

    /// Number of containers written with exactly `len` tags.
    pub fn containers_of_size(&self, len: usize) -> u64 {
        self.container_sizes.get(&len).copied().unwrap_or(0)
    }
}

/// Cost of one candidate first-segment width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentCandidate {
    pub first_segment_bits: u8,
    /// Bits the recorded traffic would have cost with this width, assuming
    /// the most replicated tags take the smallest indices.
    pub total_bits: u64,
    /// Bits saved against writing every index at full width without a flag.
    pub savings_bits: i64,
}

/// Summary of recorded replication traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationFrequencyReport {
    pub total_replications: u64,
    /// Tags by descending replication count (ties by name).
    pub tags: Vec<(Tag, u64)>,
    /// Bits the recorded traffic cost with the current assignment.
    pub current_bits: u64,
    /// Bits at full width without a flag.
    pub full_width_bits: u64,
    /// One entry per width from 1 to the full width.
    pub candidates: Vec<SegmentCandidate>,
    pub best_first_segment_bits: u8,
    /// The most replicated tags that fit the best width's short segment, in
    /// order; a drop-in value for `common_tags`.
    pub suggested_common_tags: Vec<Tag>,
}

impl TagRegistry {
    /// The current net-index assignment.
    #[inline]
    pub fn net_index_table(&self) -> &NetIndexTable {
        &self.net
    }

    /// Checksum of the net-index order; zero before assignment.
    #[inline]
    pub fn net_index_checksum(&self) -> u64 {
        self.net.checksum()
    }

    /// Net index of `tag`.
    ///
    /// The none tag, unknown tags and tags truncated by an overflow map to the
    /// table's invalid index; before assignment everything maps to
    /// [`INVALID_TAG_NET_INDEX`].
    pub fn tag_to_net_index(&self, tag: &Tag) -> TagNetIndex {
        if !self.net.is_assigned() {
            return INVALID_TAG_NET_INDEX;
        }
        match self.find_tag_node(tag).map(|n| n.net_index()) {
            Some(index) if index != INVALID_TAG_NET_INDEX => index,
            _ => self.net.invalid_index(),
        }
    }

    /// Tag for a received net index.
    ///
    /// Any index past the table is the none tag; an index other than the
    /// invalid index is also reported as [`DiagnosticKind::NetIndexDesync`].
    pub fn net_index_to_tag_name(&self, index: TagNetIndex) -> Tag {
        if let Some(id) = self.net.node_at(index) {
            return self.nodes[id.index()].tag().clone();
        }
        if index != self.net.invalid_index() {
            self.diagnostics.warn(
                DiagnosticKind::NetIndexDesync,
                index.to_string(),
                format!(
                    "received net index {index} but only {} tags are indexed",
                    self.net.len()
                ),
            );
        }
        Tag::none()
    }

    fn wire_layout(&self) -> Result<NetIndexLayout, WireError> {
        if self.net.is_assigned() {
            Ok(self.net.layout())
        } else {
            Err(WireError::NoNetIndex)
        }
    }

    fn index_for_wire(&self, tag: &Tag) -> Result<TagNetIndex, WireError> {
        let index = self.tag_to_net_index(tag);
        if index == self.net.invalid_index() && !tag.is_none() {
            return Err(WireError::UnknownTag(tag.name().to_string()));
        }
        Ok(index)
    }

    /// Write one tag. The none tag is written as the invalid index.
    pub fn write_tag(&self, writer: &mut BitWriter, tag: &Tag) -> Result<(), WireError> {
        let layout = self.wire_layout()?;
        let index = self.index_for_wire(tag)?;
        layout.write_index(writer, index);
        self.notify_tag_replicated(tag, false);
        Ok(())
    }

    pub fn read_tag(&self, reader: &mut BitReader<'_>) -> Result<Tag, WireError> {
        let layout = self.wire_layout()?;
        let index = layout.read_index(reader)?;
        Ok(self.net_index_to_tag_name(index))
    }

    /// Write a container: a `num_bits_for_container_size` count, then each tag.
    pub fn write_container(
        &self,
        writer: &mut BitWriter,
        container: &TagContainer,
    ) -> Result<(), WireError> {
        let layout = self.wire_layout()?;
        let size_bits = self.container_size_bits();
        let max = (1usize << size_bits) - 1;
        if container.len() > max {
            return Err(WireError::ContainerTooLarge {
                len: container.len(),
                max,
            });
        }

        let indices = container
            .iter()
            .map(|tag| self.index_for_wire(tag))
            .collect::<Result<Vec<_>, _>>()?;

        writer.write_bits(container.len() as u32, size_bits);
        for &index in &indices {
            layout.write_index(writer, index);
        }

        let mut stats = self.stats.lock();
        stats.record_container(container.len());
        for tag in container {
            stats.record(tag, true);
        }
        Ok(())
    }

    /// Read a container written by [`write_container`](Self::write_container).
    /// Indices that no longer name a tag are dropped.
    pub fn read_container(&self, reader: &mut BitReader<'_>) -> Result<TagContainer, WireError> {
        let layout = self.wire_layout()?;
        let len = reader.read_bits(self.container_size_bits())?;
        let mut container = TagContainer::new();
        for _ in 0..len {
            let index = layout.read_index(reader)?;
            container.add(self.net_index_to_tag_name(index));
        }
        Ok(container)
    }

    fn container_size_bits(&self) -> u8 {
        self.settings.num_bits_for_container_size.clamp(1, 31)
    }

    /// Count one replication of `tag`.
    pub fn notify_tag_replicated(&self, tag: &Tag, in_container: bool) {
        if tag.is_none() {
            return;
        }
        self.stats.lock().record(tag, in_container);
    }

    /// Snapshot of the replication counters.
    pub fn replication_stats(&self) -> ReplicationStats {
        self.stats.lock().clone()
    }

    /// Evaluate every first-segment width against the recorded traffic and
    /// suggest a width and a common-tag list.
    pub fn replication_frequency_report(&self) -> ReplicationFrequencyReport {
        let mut tags: Vec<(Tag, u64)> = {
            let stats = self.stats.lock();
            stats
                .counts
                .iter()
                .map(|(tag, (single, contained))| (tag.clone(), single + contained))
                .collect()
        };
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total_replications: u64 = tags.iter().map(|(_, count)| count).sum();
        let true_bits = self.net.true_bit_num().max(1);
        let full_width_bits = total_replications * u64::from(true_bits);

        let layout = self.net.layout();
        let current_bits: u64 = tags
            .iter()
            .map(|(tag, count)| count * u64::from(layout.encoded_bits(self.tag_to_net_index(tag))))
            .sum();

        let candidates: Vec<SegmentCandidate> = (1..=true_bits)
            .map(|bits| {
                let short_slots = 1usize << bits;
                let total_bits: u64 = tags
                    .iter()
                    .enumerate()
                    .map(|(rank, (_, count))| {
                        let width = if rank < short_slots && bits < true_bits {
                            bits
                        } else {
                            true_bits
                        };
                        count * (1 + u64::from(width))
                    })
                    .sum();
                SegmentCandidate {
                    first_segment_bits: bits,
                    total_bits,
                    savings_bits: full_width_bits as i64 - total_bits as i64,
                }
            })
            .collect();

        let best_first_segment_bits = candidates
            .iter()
            .max_by(|a, b| {
                a.savings_bits
                    .cmp(&b.savings_bits)
                    .then_with(|| b.first_segment_bits.cmp(&a.first_segment_bits))
            })
            .map_or(true_bits, |c| c.first_segment_bits);

        let suggested_common_tags = tags
            .iter()
            .take(1usize << best_first_segment_bits)
            .map(|(tag, _)| tag.clone())
            .collect();

        tracing::debug!(
            total_replications,
            current_bits,
            best_first_segment_bits,
            "replication frequency report"
        );

        ReplicationFrequencyReport {
            total_replications,
            tags,
            current_bits,
            full_width_bits,
            candidates,
            best_first_segment_bits,
            suggested_common_tags,
        }
    }
}

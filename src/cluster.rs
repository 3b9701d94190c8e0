//! Cluster boundaries and cluster-aware reordering.
//!
//! Everything here works on the store the buffer currently exposes:
//! glyph records and positions after shaping, scalars before.

use core::ops::{Bound, RangeBounds};

use crate::buffer::{ContentType, GlyphFlags, GlyphInfo};
use crate::{Buffer, BufferClusterLevel, Error};

impl Buffer {
    /// Returns the exclusive end of the cluster starting at `start`.
    ///
    /// With `merge_unsafe_to_break`, glyphs flagged
    /// [`UNSAFE_TO_BREAK`](GlyphFlags::UNSAFE_TO_BREAK) are fused into the
    /// preceding cluster together with the rest of their own cluster.
    /// Scalars carry no flags, so the merge only affects glyph content.
    pub fn cluster_end(&self, start: usize, merge_unsafe_to_break: bool) -> usize {
        let len = self.len();
        if start >= len {
            return len;
        }

        match self.content_type {
            ContentType::Glyphs => glyph_cluster_end(self.glyphs.infos(), start, merge_unsafe_to_break),
            _ => {
                let clusters = self.scalars.clusters();
                let cluster = clusters[start];
                let mut end = start + 1;
                while end < len && clusters[end] == cluster {
                    end += 1;
                }
                end
            }
        }
    }

    /// Reverses the buffer contents.
    pub fn reverse(&mut self) {
        let len = self.len();
        self.reverse_unchecked(0, len);
    }

    /// Reverses the buffer contents in `range`.
    ///
    /// No cluster awareness: records simply swap places.
    pub fn reverse_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<(), Error> {
        let (start, end) = resolve_range(range, self.len())?;
        self.reverse_unchecked(start, end);
        Ok(())
    }

    /// Reverses the order of clusters while keeping the contents of each
    /// cluster in logical order.
    ///
    /// Clusters are delimited by [`Buffer::cluster_end`] with unsafe-to-break
    /// merging, so fused clusters move as one unit.
    pub fn reverse_clusters(&mut self) {
        let len = self.len();
        if len == 0 {
            return;
        }

        let mut start = 0;
        while start < len {
            let end = self.cluster_end(start, true);
            self.reverse_unchecked(start, end);
            start = end;
        }

        self.reverse_unchecked(0, len);
    }

    /// Merges the clusters in `range` into one, using the smallest cluster value.
    ///
    /// Clusters touching the range are pulled in as well, so the result stays
    /// contiguous. With [`BufferClusterLevel::Characters`] clusters are never
    /// merged; glyphs in the range are marked unsafe to break instead.
    pub fn merge_clusters<R: RangeBounds<usize>>(&mut self, range: R) -> Result<(), Error> {
        let (start, end) = resolve_range(range, self.len())?;
        self.merge_clusters_unchecked(start, end);
        Ok(())
    }

    /// Sets each cluster to its index in the buffer.
    pub fn reset_clusters(&mut self) {
        match self.content_type {
            ContentType::Glyphs => {
                for (i, info) in self.glyphs.info[..self.glyphs.len].iter_mut().enumerate() {
                    info.cluster = i as u32;
                }
            }
            _ => {
                for (i, cluster) in self.scalars.clusters[..self.scalars.len].iter_mut().enumerate() {
                    *cluster = i as u32;
                }
            }
        }
    }

    pub(crate) fn reverse_unchecked(&mut self, start: usize, end: usize) {
        if end - start < 2 {
            return;
        }

        match self.content_type {
            ContentType::Glyphs => {
                self.glyphs.info[start..end].reverse();
                self.glyphs.pos[start..end].reverse();
            }
            _ => {
                self.scalars.codepoints[start..end].reverse();
                self.scalars.clusters[start..end].reverse();
                self.scalars.flags[start..end].reverse();
                self.sync_text();
            }
        }
    }

    pub(crate) fn merge_clusters_unchecked(&mut self, start: usize, end: usize) {
        if end - start < 2 {
            return;
        }

        if self.cluster_level == BufferClusterLevel::Characters {
            if self.content_type == ContentType::Glyphs {
                for info in &mut self.glyphs.info[start + 1..end] {
                    info.flags |= GlyphFlags::UNSAFE_TO_BREAK;
                }
            }
            return;
        }

        match self.content_type {
            ContentType::Glyphs => {
                let infos = &mut self.glyphs.info[..self.glyphs.len];
                merge_range(infos, start, end, |info| info.cluster, |info, cluster| {
                    info.cluster = cluster
                });
            }
            _ => {
                let clusters = &mut self.scalars.clusters[..self.scalars.len];
                merge_range(clusters, start, end, |c| *c, |c, cluster| *c = cluster);
            }
        }
    }
}

pub(crate) fn glyph_cluster_end(infos: &[GlyphInfo], start: usize, merge_unsafe_to_break: bool) -> usize {
    let len = infos.len();
    let mut cluster = infos[start].cluster;
    let mut end = start + 1;
    loop {
        while end < len && infos[end].cluster == cluster {
            end += 1;
        }

        if !merge_unsafe_to_break || end == len || !infos[end].unsafe_to_break() {
            return end;
        }

        // Take the unsafe glyph and whatever shares its cluster.
        cluster = infos[end].cluster;
        end += 1;
    }
}

fn merge_range<T>(
    items: &mut [T],
    mut start: usize,
    mut end: usize,
    get: impl Fn(&T) -> u32,
    set: impl Fn(&mut T, u32),
) {
    let cluster = items[start..end].iter().map(&get).min().unwrap_or(0);

    // Extend end.
    while end < items.len() && get(&items[end - 1]) == get(&items[end]) {
        end += 1;
    }

    // Extend start.
    while start > 0 && get(&items[start - 1]) == get(&items[start]) {
        start -= 1;
    }

    for item in &mut items[start..end] {
        set(item, cluster);
    }
}

pub(crate) fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Result<(usize, usize), Error> {
    let start = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n.saturating_add(1),
        Bound::Unbounded => 0,
    };

    let end = match range.end_bound() {
        Bound::Included(&n) => n.saturating_add(1),
        Bound::Excluded(&n) => n,
        Bound::Unbounded => len,
    };

    if start > end || end > len {
        return Err(Error::out_of_range(start, end, len));
    }

    Ok((start, end))
}

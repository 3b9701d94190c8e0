use crate::buffer::{ContentType, GlyphInfo, GlyphPosition};
use crate::cluster::glyph_cluster_end;
use crate::{Buffer, Error};

impl Buffer {
    /// Reorders and repositions the glyphs of each cluster into a canonical form.
    ///
    /// Clusters are delimited by [`Buffer::cluster_end`] with unsafe-to-break
    /// merging. Within a cluster of more than one glyph:
    ///
    /// - offsets become relative to the cluster origin;
    /// - the whole cluster advance goes to the first glyph, or to the last one
    ///   for backward directions, every other advance is zeroed;
    /// - all glyphs but that anchor are sorted by descending glyph id.
    ///
    /// The sort is a stable insertion sort, quadratic in the cluster size,
    /// and positions move together with their glyphs.
    ///
    /// A fused cluster spanning several cluster values takes the smallest one
    /// first, unless the cluster level is [`Characters`](crate::BufferClusterLevel::Characters),
    /// so sorting cannot interleave them.
    ///
    /// Clusters produced by two shaping backends that differ only in the order
    /// they emit marks in normalize to the same result.
    ///
    /// Advance sums and offset shifts wrap around on overflow, like the
    /// `int` arithmetic of HarfBuzz.
    pub fn normalize_glyphs(&mut self) -> Result<(), Error> {
        if self.content_type != ContentType::Glyphs || self.glyphs.len == 0 {
            return Err(Error::invalid_operation("normalize", self.content_type));
        }

        let backward = self.direction.is_backward();
        let merge = self.cluster_level.is_monotone();
        let len = self.glyphs.len;
        let infos = &mut self.glyphs.info[..len];
        let positions = &mut self.glyphs.pos[..len];

        let mut start = 0;
        while start < len {
            let end = glyph_cluster_end(infos, start, true);
            if end - start > 1 {
                if merge {
                    merge_cluster_values(&mut infos[start..end]);
                }
                normalize_cluster(&mut infos[start..end], &mut positions[start..end], backward);
            }
            start = end;
        }

        Ok(())
    }
}

fn merge_cluster_values(infos: &mut [GlyphInfo]) {
    let cluster = infos.iter().map(|info| info.cluster).min().unwrap_or(0);
    for info in infos {
        info.cluster = cluster;
    }
}

fn normalize_cluster(infos: &mut [GlyphInfo], positions: &mut [GlyphPosition], backward: bool) {
    let mut total_x_advance = 0i32;
    let mut total_y_advance = 0i32;
    for pos in positions.iter_mut() {
        pos.x_offset = pos.x_offset.wrapping_add(total_x_advance);
        pos.y_offset = pos.y_offset.wrapping_add(total_y_advance);

        total_x_advance = total_x_advance.wrapping_add(pos.x_advance);
        total_y_advance = total_y_advance.wrapping_add(pos.y_advance);

        pos.x_advance = 0;
        pos.y_advance = 0;
    }

    let last = infos.len() - 1;
    if backward {
        positions[last].x_advance = total_x_advance;
        positions[last].y_advance = total_y_advance;

        sort_by_glyph_id(&mut infos[..last], &mut positions[..last]);
    } else {
        positions[0].x_advance = total_x_advance;
        positions[0].y_advance = total_y_advance;
        for pos in &mut positions[1..] {
            pos.x_offset = pos.x_offset.wrapping_sub(total_x_advance);
            pos.y_offset = pos.y_offset.wrapping_sub(total_y_advance);
        }

        sort_by_glyph_id(&mut infos[1..], &mut positions[1..]);
    }
}

/// Stable insertion sort by descending glyph id.
fn sort_by_glyph_id(infos: &mut [GlyphInfo], positions: &mut [GlyphPosition]) {
    for i in 1..infos.len() {
        let glyph_id = infos[i].glyph_id;

        let mut j = i;
        while j > 0 && infos[j - 1].glyph_id < glyph_id {
            j -= 1;
        }

        if j != i {
            infos[j..=i].rotate_right(1);
            positions[j..=i].rotate_right(1);
        }
    }
}

//! Unicode processing done on the scalar store before shaping.

use smallvec::SmallVec;

use crate::buffer::{ContentType, ScalarFlags};
use crate::{Buffer, BufferFlags, Direction};

// Most runs are short, longer ones spill to the heap for the call only.
type ClassScratch = SmallVec<[u8; 64]>;

impl Buffer {
    /// Runs the Unicode preprocessing passes over the buffer's scalars.
    ///
    /// The passes run in a fixed order:
    ///
    /// 1. default ignorables (`Format` category) are removed, if
    ///    [`REMOVE_DEFAULT_IGNORABLES`](BufferFlags::REMOVE_DEFAULT_IGNORABLES)
    ///    is set and
    ///    [`PRESERVE_DEFAULT_IGNORABLES`](BufferFlags::PRESERVE_DEFAULT_IGNORABLES)
    ///    is not;
    /// 2. scalars are mirrored, if the direction is right-to-left;
    /// 3. combining marks are reordered by combining class.
    ///
    /// Does nothing unless the buffer holds Unicode content.
    /// Returns whether any scalar changed. Running it again on its own
    /// output changes nothing.
    pub fn apply_unicode_processing(&mut self) -> bool {
        if self.content_type != ContentType::Unicode || self.scalars.len == 0 {
            return false;
        }

        let mut changed = false;
        changed |= self.remove_default_ignorables();
        changed |= self.mirror();
        changed |= self.reorder_marks();

        if changed {
            self.sync_text();
        }

        changed
    }

    fn remove_default_ignorables(&mut self) -> bool {
        if !self.flags.contains(BufferFlags::REMOVE_DEFAULT_IGNORABLES)
            || self.flags.contains(BufferFlags::PRESERVE_DEFAULT_IGNORABLES)
        {
            return false;
        }

        let len = self.scalars.len;
        let mut j = 0;
        for i in 0..len {
            let u = self.scalars.codepoints[i];
            if self.unicode.is_default_ignorable(u) {
                continue;
            }

            self.scalars.codepoints[j] = u;
            self.scalars.clusters[j] = self.scalars.clusters[i];
            self.scalars.flags[j] = self.scalars.flags[i];
            j += 1;
        }

        self.scalars.len = j;

        log::trace!("removed {} default ignorables", len - j);
        j != len
    }

    fn mirror(&mut self) -> bool {
        if self.direction != Direction::RightToLeft {
            return false;
        }

        let len = self.scalars.len;
        let scalars = self.scalars.codepoints[..len].iter_mut().zip(&mut self.scalars.flags[..len]);

        let mut changed = false;
        for (u, flags) in scalars {
            // Mirroring twice would undo it.
            if flags.contains(ScalarFlags::MIRRORED) {
                continue;
            }

            flags.insert(ScalarFlags::MIRRORED);
            if let Some(mirrored) = self.unicode.mirroring(*u) {
                if mirrored != *u {
                    *u = mirrored;
                    changed = true;
                }
            }
        }

        changed
    }

    /// A stable insertion sort by combining class.
    ///
    /// A scalar of class zero never moves and nothing moves across it.
    /// Any other scalar moves left past the preceding scalars of a strictly
    /// greater class, so equal classes keep their order. This is O(n²) in
    /// the length of a run of marks, which is short in practice.
    ///
    /// Moving a scalar merges the clusters it crosses.
    fn reorder_marks(&mut self) -> bool {
        let len = self.scalars.len;
        let classes: ClassScratch = self
            .scalars
            .codepoints()
            .iter()
            .map(|&u| self.unicode.combining_class(u))
            .collect();

        // Nothing to do without marks, which is by far the common case.
        if classes.iter().all(|&class| class == 0) {
            return false;
        }

        let mut classes = classes;
        let mut changed = false;
        for i in 1..len {
            let class = classes[i];
            if class == 0 {
                continue;
            }

            let mut j = i;
            while j > 0 && classes[j - 1] > class {
                j -= 1;
            }

            if j == i {
                continue;
            }

            self.merge_clusters_unchecked(j, i + 1);
            self.scalars.codepoints[j..=i].rotate_right(1);
            self.scalars.clusters[j..=i].rotate_right(1);
            self.scalars.flags[j..=i].rotate_right(1);
            classes[j..=i].rotate_right(1);
            changed = true;
        }

        if changed {
            log::debug!("reordered combining marks");
        }

        changed
    }
}

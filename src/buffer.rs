use core::str::FromStr;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::unicode::UnicodeFuncs;
use crate::{Direction, Error, Language, Script};

/// How many scalars of surrounding text are kept on each side of the buffer.
pub const CONTEXT_LENGTH: usize = 5;

bitflags! {
    /// Per-glyph flags set by the shaping backend.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GlyphFlags: u32 {
        /// Breaking the text before this glyph and shaping the two halves
        /// separately would change the result.
        const UNSAFE_TO_BREAK = 0x00000001;
        /// Concatenating the text ending here with other text and reshaping
        /// would change the result.
        const UNSAFE_TO_CONCAT = 0x00000002;
        /// A tatweel may be inserted before this glyph.
        const SAFE_TO_INSERT_TATWEEL = 0x00000004;
        /// All the defined flags.
        const DEFINED = 0x00000007;
    }
}

bitflags! {
    /// Per-scalar processing state.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub(crate) struct ScalarFlags: u8 {
        /// Already went through the mirroring pass.
        const MIRRORED = 0x01;
    }
}

bitflags! {
    /// Flags controlling how the buffer is processed.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferFlags: u32 {
        /// The buffer holds the beginning of the text.
        const BEGINNING_OF_TEXT             = 0x00000001;
        /// The buffer holds the end of the text.
        const END_OF_TEXT                   = 0x00000002;
        /// Keep default ignorables, even when removal is requested.
        const PRESERVE_DEFAULT_IGNORABLES   = 0x00000004;
        /// Remove default ignorables during Unicode processing.
        const REMOVE_DEFAULT_IGNORABLES     = 0x00000008;
        /// Do not insert a dotted circle before broken clusters.
        const DO_NOT_INSERT_DOTTED_CIRCLE   = 0x00000010;
    }
}

/// How clusters are formed and merged.
#[allow(missing_docs)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub enum BufferClusterLevel {
    #[default]
    MonotoneGraphemes,
    MonotoneCharacters,
    Characters,
}

impl BufferClusterLevel {
    /// Checks that clusters never decrease in logical order.
    #[inline]
    pub fn is_monotone(self) -> bool {
        matches!(
            self,
            BufferClusterLevel::MonotoneGraphemes | BufferClusterLevel::MonotoneCharacters
        )
    }
}

impl FromStr for BufferClusterLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(BufferClusterLevel::MonotoneGraphemes),
            "1" => Ok(BufferClusterLevel::MonotoneCharacters),
            "2" => Ok(BufferClusterLevel::Characters),
            _ => Err("invalid cluster level"),
        }
    }
}

/// What the buffer currently holds.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub enum ContentType {
    /// Nothing was added yet.
    #[default]
    Invalid,
    /// Unicode scalars, before shaping.
    Unicode,
    /// Glyphs, after shaping or deserialization.
    Glyphs,
}

/// A glyph record.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct GlyphInfo {
    /// Glyph id, assigned by the shaping backend.
    pub glyph_id: u32,
    /// Index of the source text this glyph belongs to.
    pub cluster: u32,
    /// Glyph flags.
    pub flags: GlyphFlags,
}

impl GlyphInfo {
    #[inline]
    pub(crate) fn unsafe_to_break(&self) -> bool {
        self.flags.contains(GlyphFlags::UNSAFE_TO_BREAK)
    }
}

/// Holds the positions of the glyph in both horizontal and vertical directions.
///
/// All positions are relative to the current point.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct GlyphPosition {
    /// How much the line advances after drawing this glyph when setting text in
    /// horizontal direction.
    pub x_advance: i32,
    /// How much the line advances after drawing this glyph when setting text in
    /// vertical direction.
    pub y_advance: i32,
    /// How much the glyph moves on the X-axis before drawing it, this should not
    /// affect how much the line advances.
    pub x_offset: i32,
    /// How much the glyph moves on the Y-axis before drawing it, this should
    /// not affect how much the line advances.
    pub y_offset: i32,
}

// Both stores keep an explicit logical length next to the allocation,
// so clearing and refilling a buffer reuses its memory.

#[derive(Clone, Default, Debug)]
pub(crate) struct ScalarStore {
    pub len: usize,
    pub codepoints: Vec<u32>,
    pub clusters: Vec<u32>,
    pub flags: Vec<ScalarFlags>,
}

impl ScalarStore {
    fn ensure(&mut self, size: usize) {
        let allocated = self.codepoints.len();
        if size > allocated {
            let new_allocated = size.max(allocated + (allocated >> 1) + 32);
            self.codepoints.resize(new_allocated, 0);
            self.clusters.resize(new_allocated, 0);
            self.flags.resize(new_allocated, ScalarFlags::empty());
        }
    }

    pub fn push(&mut self, codepoint: u32, cluster: u32) {
        self.ensure(self.len + 1);
        self.codepoints[self.len] = codepoint;
        self.clusters[self.len] = cluster;
        self.flags[self.len] = ScalarFlags::empty();
        self.len += 1;
    }

    #[inline]
    pub fn codepoints(&self) -> &[u32] {
        &self.codepoints[..self.len]
    }

    #[inline]
    pub fn clusters(&self) -> &[u32] {
        &self.clusters[..self.len]
    }
}

#[derive(Clone, Default, Debug)]
pub(crate) struct GlyphStore {
    pub len: usize,
    pub info: Vec<GlyphInfo>,
    pub pos: Vec<GlyphPosition>,
}

impl GlyphStore {
    /// Sets the logical length, zero-filling new records.
    pub fn resize(&mut self, len: usize) {
        let allocated = self.info.len();
        if len > allocated {
            let new_allocated = len.max(allocated + (allocated >> 1) + 32);
            self.info.resize(new_allocated, GlyphInfo::default());
            self.pos.resize(new_allocated, GlyphPosition::default());
        }

        for i in self.len.min(len)..len {
            self.info[i] = GlyphInfo::default();
            self.pos[i] = GlyphPosition::default();
        }

        self.len = len;
    }

    #[inline]
    pub fn infos(&self) -> &[GlyphInfo] {
        &self.info[..self.len]
    }

    #[inline]
    pub fn positions(&self) -> &[GlyphPosition] {
        &self.pos[..self.len]
    }
}

/// A shaping buffer.
///
/// A buffer is filled with Unicode text, optionally preprocessed, then shaped
/// into glyphs which can be reordered, normalized and serialized.
/// Mixing text and glyphs is an error: once a buffer holds glyphs it has to
/// be cleared before new text can be added.
///
/// The allocations of both stores are reused across [`Buffer::clear_contents`]
/// calls, so keeping one buffer around and refilling it is cheap.
#[derive(Clone)]
pub struct Buffer {
    pub(crate) scalars: ScalarStore,
    pub(crate) glyphs: GlyphStore,
    pub(crate) content_type: ContentType,

    pub(crate) direction: Direction,
    pub(crate) script: Option<Script>,
    pub(crate) language: Option<Language>,
    pub(crate) cluster_level: BufferClusterLevel,
    pub(crate) flags: BufferFlags,
    pub(crate) replacement: u32,
    pub(crate) invisible: u32,
    pub(crate) unicode: UnicodeFuncs,

    /// Text before and after the buffer contents, both in logical order.
    pub(crate) context: [SmallVec<[u32; CONTEXT_LENGTH]>; 2],

    text: String,
    text_offsets: Vec<usize>,
}

impl Buffer {
    /// The default replacement for scalars that cannot be encoded.
    pub const DEFAULT_REPLACEMENT_CODEPOINT: u32 = 0xFFFD;

    /// Creates a new empty `Buffer`.
    pub fn new() -> Self {
        Buffer {
            scalars: ScalarStore::default(),
            glyphs: GlyphStore::default(),
            content_type: ContentType::Invalid,
            direction: Direction::Invalid,
            script: None,
            language: None,
            cluster_level: BufferClusterLevel::default(),
            flags: BufferFlags::empty(),
            replacement: Self::DEFAULT_REPLACEMENT_CODEPOINT,
            invisible: 0,
            unicode: UnicodeFuncs::default(),
            context: [SmallVec::new(), SmallVec::new()],
            text: String::new(),
            text_offsets: Vec::new(),
        }
    }

    /// Returns what the buffer currently holds.
    #[inline]
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Returns the number of scalars, or of glyphs after shaping.
    #[inline]
    pub fn len(&self) -> usize {
        match self.content_type {
            ContentType::Glyphs => self.glyphs.len,
            _ => self.scalars.len,
        }
    }

    /// Checks that the buffer contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the scalar values.
    ///
    /// The scalar store survives shaping, so this stays available
    /// alongside the glyphs.
    #[inline]
    pub fn codepoints(&self) -> &[u32] {
        self.scalars.codepoints()
    }

    /// Returns the cluster of each scalar value.
    #[inline]
    pub fn scalar_clusters(&self) -> &[u32] {
        self.scalars.clusters()
    }

    /// Returns the glyph records. Empty unless the buffer holds glyphs.
    #[inline]
    pub fn glyph_infos(&self) -> &[GlyphInfo] {
        match self.content_type {
            ContentType::Glyphs => self.glyphs.infos(),
            _ => &[],
        }
    }

    /// Returns the glyph positions. Empty unless the buffer holds glyphs.
    #[inline]
    pub fn glyph_positions(&self) -> &[GlyphPosition] {
        match self.content_type {
            ContentType::Glyphs => self.glyphs.positions(),
            _ => &[],
        }
    }

    /// Returns the scalar values as UTF-8 text.
    ///
    /// Scalars that cannot be encoded are replaced with the
    /// [replacement codepoint](Buffer::set_replacement_codepoint).
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the byte offset into [`Buffer::text`] of each scalar.
    #[inline]
    pub fn text_offsets(&self) -> &[usize] {
        &self.text_offsets
    }

    /// Returns the scalars preceding the buffer contents.
    #[inline]
    pub fn pre_context(&self) -> &[u32] {
        &self.context[0]
    }

    /// Returns the scalars following the buffer contents.
    #[inline]
    pub fn post_context(&self) -> &[u32] {
        &self.context[1]
    }

    /// Set the text direction of the `Buffer`'s contents.
    #[inline]
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Returns the `Buffer`'s text direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Set the script.
    #[inline]
    pub fn set_script(&mut self, script: Script) {
        self.script = Some(script);
    }

    /// Returns the buffer's script.
    #[inline]
    pub fn script(&self) -> Option<Script> {
        self.script
    }

    /// Set the buffer language.
    #[inline]
    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
    }

    /// Returns the buffer language.
    #[inline]
    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Set the cluster level.
    #[inline]
    pub fn set_cluster_level(&mut self, cluster_level: BufferClusterLevel) {
        self.cluster_level = cluster_level;
    }

    /// Returns the cluster level.
    #[inline]
    pub fn cluster_level(&self) -> BufferClusterLevel {
        self.cluster_level
    }

    /// Set the buffer flags.
    #[inline]
    pub fn set_flags(&mut self, flags: BufferFlags) {
        self.flags = flags;
    }

    /// Returns the buffer flags.
    #[inline]
    pub fn flags(&self) -> BufferFlags {
        self.flags
    }

    /// Sets the codepoint written in place of unencodable scalars.
    ///
    /// U+FFFD by default.
    #[inline]
    pub fn set_replacement_codepoint(&mut self, codepoint: u32) {
        self.replacement = codepoint;
    }

    /// Returns the replacement codepoint.
    #[inline]
    pub fn replacement_codepoint(&self) -> u32 {
        self.replacement
    }

    /// Sets the glyph that replaces invisible characters in the shaping result.
    ///
    /// If set to zero (default), invisible characters keep their own glyph.
    #[inline]
    pub fn set_invisible_glyph(&mut self, glyph: u32) {
        self.invisible = glyph;
    }

    /// Returns the invisible glyph.
    #[inline]
    pub fn invisible_glyph(&self) -> u32 {
        self.invisible
    }

    /// Sets the Unicode property lookups.
    #[inline]
    pub fn set_unicode_funcs(&mut self, funcs: UnicodeFuncs) {
        self.unicode = funcs;
    }

    /// Returns the Unicode property lookups.
    #[inline]
    pub fn unicode_funcs(&self) -> &UnicodeFuncs {
        &self.unicode
    }

    /// Guess the segment properties (direction and script) for the current buffer.
    ///
    /// Only unset properties are guessed. The script is taken from the first
    /// scalar with a script of its own and the direction from that script.
    pub fn guess_segment_properties(&mut self) {
        if self.script.is_none() {
            let unicode = &self.unicode;
            self.script = self
                .scalars
                .codepoints()
                .iter()
                .map(|&u| unicode.script(u))
                .find(|script| !script.is_neutral());
        }

        if self.direction == Direction::Invalid {
            self.direction = self
                .script
                .and_then(Script::horizontal_direction)
                .unwrap_or(Direction::LeftToRight);
        }
    }

    /// Adds a single scalar value with its cluster.
    pub fn add(&mut self, codepoint: u32, cluster: u32) -> Result<(), Error> {
        self.check_ingestion()?;
        self.enter_unicode();
        self.scalars.push(codepoint, cluster);
        self.sync_text();
        Ok(())
    }

    /// Adds a string. Clusters are byte offsets.
    pub fn add_str(&mut self, text: &str) -> Result<(), Error> {
        self.add_utf8(text.as_bytes(), 0, None)
    }

    /// Adds `len` bytes of UTF-8 text starting at `offset`, or everything
    /// after `offset` when `len` is `None`.
    ///
    /// Clusters are byte offsets into `text`. Decoding stops at the first
    /// invalid sequence. Text around the item is kept as context.
    pub fn add_utf8(&mut self, text: &[u8], offset: usize, len: Option<usize>) -> Result<(), Error> {
        self.add_utf::<Utf8>(text, offset, len)
    }

    /// Adds UTF-16 text. Clusters are code unit offsets into `text`.
    ///
    /// See [`Buffer::add_utf8`].
    pub fn add_utf16(&mut self, text: &[u16], offset: usize, len: Option<usize>) -> Result<(), Error> {
        self.add_utf::<Utf16>(text, offset, len)
    }

    /// Adds UTF-32 text. Clusters are indices into `text`.
    ///
    /// See [`Buffer::add_utf8`].
    pub fn add_utf32(&mut self, text: &[u32], offset: usize, len: Option<usize>) -> Result<(), Error> {
        self.add_utf::<Utf32>(text, offset, len)
    }

    /// Adds scalar values. Same as [`Buffer::add_utf32`].
    pub fn add_codepoints(&mut self, text: &[u32], offset: usize, len: Option<usize>) -> Result<(), Error> {
        self.add_utf32(text, offset, len)
    }

    fn add_utf<U: Utf>(&mut self, text: &[U::Unit], offset: usize, len: Option<usize>) -> Result<(), Error> {
        self.check_ingestion()?;

        let end = match len {
            Some(len) => offset.saturating_add(len),
            None => text.len().max(offset),
        };

        if offset > text.len() || end > text.len() {
            return Err(Error::out_of_range(offset, end, text.len()));
        }

        self.enter_unicode();

        if self.scalars.len == 0 && offset > 0 {
            // Decode a bounded window before the item, keeping the last scalars.
            let mut start = offset.saturating_sub(CONTEXT_LENGTH * U::MAX_UNITS);
            while start < offset && U::is_continuation(text[start]) {
                start += 1;
            }

            self.context[0].clear();
            let mut pos = start;
            while pos < offset {
                match U::decode(&text[pos..offset]) {
                    Some((u, n)) => {
                        if self.context[0].len() == CONTEXT_LENGTH {
                            self.context[0].remove(0);
                        }
                        self.context[0].push(u);
                        pos += n;
                    }
                    None => {
                        // Context before garbage is meaningless.
                        self.context[0].clear();
                        pos += 1;
                    }
                }
            }
        }

        let mut pos = offset;
        while pos < end {
            match U::decode(&text[pos..end]) {
                Some((u, n)) => {
                    self.scalars.push(u, pos as u32);
                    pos += n;
                }
                None => {
                    log::warn!("invalid {} sequence at offset {}, decoding stopped", U::NAME, pos);
                    break;
                }
            }
        }

        self.context[1].clear();
        let mut pos = end;
        while pos < text.len() && self.context[1].len() < CONTEXT_LENGTH {
            match U::decode(&text[pos..]) {
                Some((u, n)) => {
                    self.context[1].push(u);
                    pos += n;
                }
                None => break,
            }
        }

        self.sync_text();
        Ok(())
    }

    fn check_ingestion(&self) -> Result<(), Error> {
        if self.content_type == ContentType::Glyphs && self.glyphs.len != 0 {
            return Err(Error::invalid_operation("add text to", self.content_type));
        }

        Ok(())
    }

    fn enter_unicode(&mut self) {
        // Only an empty glyph buffer gets here, start over from scratch.
        if self.content_type == ContentType::Glyphs {
            self.glyphs.len = 0;
            self.scalars.len = 0;
        }

        self.content_type = ContentType::Unicode;
    }

    /// Rebuilds the UTF-8 presentation of the scalar store.
    pub(crate) fn sync_text(&mut self) {
        let replacement = char::from_u32(self.replacement).unwrap_or(char::REPLACEMENT_CHARACTER);

        self.text.clear();
        self.text_offsets.clear();
        for &u in self.scalars.codepoints() {
            self.text_offsets.push(self.text.len());
            self.text.push(char::from_u32(u).unwrap_or(replacement));
        }
    }

    /// Clears the contents of the buffer.
    ///
    /// Direction, script and language are unset as well, since they describe
    /// the removed text. Flags, cluster level, replacement and invisible
    /// glyph and Unicode lookups are kept. Allocations are reused.
    pub fn clear_contents(&mut self) {
        self.scalars.len = 0;
        self.glyphs.len = 0;
        self.content_type = ContentType::Invalid;
        self.direction = Direction::Invalid;
        self.script = None;
        self.language = None;
        self.context[0].clear();
        self.context[1].clear();
        self.text.clear();
        self.text_offsets.clear();
    }

    /// Clears the contents and resets every setting to its default.
    pub fn reset(&mut self) {
        self.clear_contents();
        self.cluster_level = BufferClusterLevel::default();
        self.flags = BufferFlags::empty();
        self.replacement = Self::DEFAULT_REPLACEMENT_CODEPOINT;
        self.invisible = 0;
        self.unicode = UnicodeFuncs::default();
    }

    /// Sets the number of glyphs, switching the buffer to glyph content.
    ///
    /// New glyphs are zeroed. Used by shaping backends together with
    /// [`Buffer::set_glyph`] and [`Buffer::set_position`].
    pub fn set_length(&mut self, len: usize) {
        if self.content_type != ContentType::Glyphs {
            self.glyphs.len = 0;
        }

        self.glyphs.resize(len);
        self.content_type = ContentType::Glyphs;
    }

    /// Sets the glyph record at `index`.
    pub fn set_glyph(
        &mut self,
        index: usize,
        glyph_id: u32,
        cluster: u32,
        flags: GlyphFlags,
    ) -> Result<(), Error> {
        self.check_glyph_index(index)?;
        self.glyphs.info[index] = GlyphInfo {
            glyph_id,
            cluster,
            flags: flags & GlyphFlags::DEFINED,
        };
        Ok(())
    }

    /// Sets the glyph position at `index`.
    pub fn set_position(
        &mut self,
        index: usize,
        x_advance: i32,
        y_advance: i32,
        x_offset: i32,
        y_offset: i32,
    ) -> Result<(), Error> {
        self.check_glyph_index(index)?;
        self.glyphs.pos[index] = GlyphPosition {
            x_advance,
            y_advance,
            x_offset,
            y_offset,
        };
        Ok(())
    }

    fn check_glyph_index(&self, index: usize) -> Result<(), Error> {
        if self.content_type != ContentType::Glyphs || index >= self.glyphs.len {
            let len = self.glyph_infos().len();
            return Err(Error::out_of_range(index, index.saturating_add(1), len));
        }

        Ok(())
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}

impl core::fmt::Debug for Buffer {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt.debug_struct("Buffer")
            .field("content_type", &self.content_type)
            .field("len", &self.len())
            .field("direction", &self.direction)
            .field("script", &self.script)
            .field("language", &self.language)
            .field("cluster_level", &self.cluster_level)
            .field("flags", &self.flags)
            .finish()
    }
}

/// A Unicode encoding form the buffer can ingest.
trait Utf {
    type Unit: Copy;
    const NAME: &'static str;
    /// Longest encoding of one scalar, in code units.
    const MAX_UNITS: usize;

    fn is_continuation(unit: Self::Unit) -> bool;

    /// Decodes the first scalar and returns it with its length in code units.
    /// `None` on an invalid or truncated sequence.
    fn decode(text: &[Self::Unit]) -> Option<(u32, usize)>;
}

struct Utf8;

impl Utf for Utf8 {
    type Unit = u8;
    const NAME: &'static str = "UTF-8";
    const MAX_UNITS: usize = 4;

    #[inline]
    fn is_continuation(unit: u8) -> bool {
        unit & 0xC0 == 0x80
    }

    fn decode(text: &[u8]) -> Option<(u32, usize)> {
        let window = &text[..text.len().min(Self::MAX_UNITS)];
        let valid = match core::str::from_utf8(window) {
            Ok(s) => s,
            // The window may end inside a following scalar.
            Err(e) => core::str::from_utf8(&window[..e.valid_up_to()]).ok()?,
        };

        let c = valid.chars().next()?;
        Some((u32::from(c), c.len_utf8()))
    }
}

struct Utf16;

impl Utf for Utf16 {
    type Unit = u16;
    const NAME: &'static str = "UTF-16";
    const MAX_UNITS: usize = 2;

    #[inline]
    fn is_continuation(unit: u16) -> bool {
        (0xDC00..=0xDFFF).contains(&unit)
    }

    fn decode(text: &[u16]) -> Option<(u32, usize)> {
        let c = char::decode_utf16(text.iter().copied()).next()?.ok()?;
        Some((u32::from(c), c.len_utf16()))
    }
}

struct Utf32;

impl Utf for Utf32 {
    type Unit = u32;
    const NAME: &'static str = "UTF-32";
    const MAX_UNITS: usize = 1;

    #[inline]
    fn is_continuation(_: u32) -> bool {
        false
    }

    fn decode(text: &[u32]) -> Option<(u32, usize)> {
        let c = char::from_u32(*text.first()?)?;
        Some((u32::from(c), 1))
    }
}

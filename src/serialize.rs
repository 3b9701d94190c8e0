//! HarfBuzz-compatible text and JSON output.
//!
//! Glyph text: `[uni0041=0+1000|acutecomb=0@-20,-27+0#1<0,0,0,0>]`.
//! Glyph JSON: `[{"g":"uni0041","cl":0,"dx":0,"dy":0,"ax":1000,"ay":0}]`.
//! Unicode text: `<U+0041=0|U+0301=1>`, Unicode JSON: `[{"u":65,"cl":0}]`.

use core::fmt::Write;
use core::str::FromStr;

use bitflags::bitflags;

use crate::buffer::{ContentType, GlyphFlags, GlyphInfo, GlyphPosition};
use crate::face::GlyphExtents;
use crate::{Buffer, Error, Face};

/// A serialization grammar.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SerializeFormat {
    /// The `hb-shape` text format.
    Text,
    /// An array of JSON objects.
    Json,
}

impl FromStr for SerializeFormat {
    type Err = Error;

    /// Parses a format name, ignoring case.
    ///
    /// Only the first four characters are checked, like in HarfBuzz,
    /// so `t` and `j` work too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase();
        let prefix = name.get(..4).unwrap_or(&name);
        match prefix {
            "text" | "t" => Ok(SerializeFormat::Text),
            "json" | "j" => Ok(SerializeFormat::Json),
            _ => Err(Error::NotSupported(s.to_string())),
        }
    }
}

impl core::fmt::Display for SerializeFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SerializeFormat::Text => f.write_str("text"),
            SerializeFormat::Json => f.write_str("json"),
        }
    }
}

bitflags! {
    /// Fields left out of or added to the serialized output.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SerializeFlags: u8 {
        /// Do not serialize glyph cluster.
        const NO_CLUSTERS       = 0b00000001;
        /// Do not serialize glyph position information.
        const NO_POSITIONS      = 0b00000010;
        /// Do no serialize glyph name.
        const NO_GLYPH_NAMES    = 0b00000100;
        /// Serialize glyph extents.
        const GLYPH_EXTENTS     = 0b00001000;
        /// Serialize glyph flags.
        const GLYPH_FLAGS       = 0b00010000;
        /// Do not serialize glyph advances,
        /// glyph offsets will reflect absolute glyph positions.
        ///
        /// Lossy: the output cannot be deserialized back into the same positions.
        const NO_ADVANCES       = 0b00100000;
    }
}

/// The pen position both grammars print offsets against.
///
/// Stays at the origin unless advances are omitted, in which case each
/// advance is folded into the offsets of the glyphs that follow.
#[derive(Default)]
struct PenAccumulator {
    x: i32,
    y: i32,
    fold_advances: bool,
}

impl PenAccumulator {
    fn new(flags: SerializeFlags) -> Self {
        PenAccumulator {
            fold_advances: flags.contains(SerializeFlags::NO_ADVANCES),
            ..PenAccumulator::default()
        }
    }

    #[inline]
    fn offset(&self, pos: &GlyphPosition) -> (i32, i32) {
        (self.x.wrapping_add(pos.x_offset), self.y.wrapping_add(pos.y_offset))
    }

    // The pen wraps around on overflow, like in HarfBuzz.
    #[inline]
    fn advance(&mut self, pos: &GlyphPosition) {
        if self.fold_advances {
            self.x = self.x.wrapping_add(pos.x_advance);
            self.y = self.y.wrapping_add(pos.y_advance);
        }
    }
}

struct GlyphWriter<'a, 'b> {
    face: Option<&'a Face<'b>>,
    flags: SerializeFlags,
    pen: PenAccumulator,
}

impl GlyphWriter<'_, '_> {
    fn name(&self, glyph_id: u32) -> Option<&str> {
        self.face?.glyph_name(glyph_id)
    }

    fn extents(&self, glyph_id: u32) -> GlyphExtents {
        self.face
            .map(|face| face.glyph_extents(glyph_id))
            .unwrap_or_default()
    }

    fn write_text<W: Write>(
        &mut self,
        out: &mut W,
        infos: &[GlyphInfo],
        positions: &[GlyphPosition],
    ) -> core::fmt::Result {
        out.write_char('[')?;
        for (i, (info, pos)) in infos.iter().zip(positions).enumerate() {
            if i > 0 {
                out.write_char('|')?;
            }

            if self.flags.contains(SerializeFlags::NO_GLYPH_NAMES) {
                write!(out, "{}", info.glyph_id)?;
            } else if let Some(name) = self.name(info.glyph_id) {
                out.write_str(name)?;
            } else {
                write!(out, "gid{}", info.glyph_id)?;
            }

            if !self.flags.contains(SerializeFlags::NO_CLUSTERS) {
                write!(out, "={}", info.cluster)?;
            }

            if !self.flags.contains(SerializeFlags::NO_POSITIONS) {
                let (x, y) = self.pen.offset(pos);
                if x != 0 || y != 0 {
                    write!(out, "@{},{}", x, y)?;
                }

                if !self.flags.contains(SerializeFlags::NO_ADVANCES) {
                    write!(out, "+{}", pos.x_advance)?;
                    if pos.y_advance != 0 {
                        write!(out, ",{}", pos.y_advance)?;
                    }
                }
            }

            if self.flags.contains(SerializeFlags::GLYPH_FLAGS) {
                let flags = info.flags & GlyphFlags::DEFINED;
                if !flags.is_empty() {
                    write!(out, "#{:X}", flags.bits())?;
                }
            }

            if self.flags.contains(SerializeFlags::GLYPH_EXTENTS) {
                let e = self.extents(info.glyph_id);
                write!(out, "<{},{},{},{}>", e.x_bearing, e.y_bearing, e.width, e.height)?;
            }

            self.pen.advance(pos);
        }
        out.write_char(']')
    }

    fn write_json<W: Write>(
        &mut self,
        out: &mut W,
        infos: &[GlyphInfo],
        positions: &[GlyphPosition],
    ) -> core::fmt::Result {
        out.write_char('[')?;
        for (i, (info, pos)) in infos.iter().zip(positions).enumerate() {
            if i > 0 {
                out.write_char(',')?;
            }

            out.write_str("{\"g\":")?;
            if self.flags.contains(SerializeFlags::NO_GLYPH_NAMES) {
                write!(out, "{}", info.glyph_id)?;
            } else if let Some(name) = self.name(info.glyph_id) {
                write_json_string(out, name)?;
            } else {
                write!(out, "\"gid{}\"", info.glyph_id)?;
            }

            if !self.flags.contains(SerializeFlags::NO_CLUSTERS) {
                write!(out, ",\"cl\":{}", info.cluster)?;
            }

            if !self.flags.contains(SerializeFlags::NO_POSITIONS) {
                let (x, y) = self.pen.offset(pos);
                write!(out, ",\"dx\":{},\"dy\":{}", x, y)?;

                if !self.flags.contains(SerializeFlags::NO_ADVANCES) {
                    write!(out, ",\"ax\":{},\"ay\":{}", pos.x_advance, pos.y_advance)?;
                }
            }

            if self.flags.contains(SerializeFlags::GLYPH_FLAGS) {
                let flags = info.flags & GlyphFlags::DEFINED;
                if !flags.is_empty() {
                    write!(out, ",\"fl\":{}", flags.bits())?;
                }
            }

            if self.flags.contains(SerializeFlags::GLYPH_EXTENTS) {
                let e = self.extents(info.glyph_id);
                write!(out, ",\"xb\":{},\"yb\":{}", e.x_bearing, e.y_bearing)?;
                write!(out, ",\"w\":{},\"h\":{}", e.width, e.height)?;
            }

            out.write_char('}')?;
            self.pen.advance(pos);
        }
        out.write_char(']')
    }
}

fn write_json_string<W: Write>(out: &mut W, s: &str) -> core::fmt::Result {
    out.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => out.write_str("\\\"")?,
            '\\' => out.write_str("\\\\")?,
            c if u32::from(c) < 0x20 => write!(out, "\\u{:04x}", u32::from(c))?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('"')
}

fn write_unicode_text<W: Write>(
    out: &mut W,
    codepoints: &[u32],
    clusters: &[u32],
    flags: SerializeFlags,
) -> core::fmt::Result {
    out.write_char('<')?;
    for (i, (u, cluster)) in codepoints.iter().zip(clusters).enumerate() {
        if i > 0 {
            out.write_char('|')?;
        }

        write!(out, "U+{:04X}", u)?;
        if !flags.contains(SerializeFlags::NO_CLUSTERS) {
            write!(out, "={}", cluster)?;
        }
    }
    out.write_char('>')
}

fn write_unicode_json<W: Write>(
    out: &mut W,
    codepoints: &[u32],
    clusters: &[u32],
    flags: SerializeFlags,
) -> core::fmt::Result {
    out.write_char('[')?;
    for (i, (u, cluster)) in codepoints.iter().zip(clusters).enumerate() {
        if i > 0 {
            out.write_char(',')?;
        }

        write!(out, "{{\"u\":{}", u)?;
        if !flags.contains(SerializeFlags::NO_CLUSTERS) {
            write!(out, ",\"cl\":{}", cluster)?;
        }
        out.write_char('}')?;
    }
    out.write_char(']')
}

impl Buffer {
    /// Serializes the glyphs.
    ///
    /// Glyph names come from `face`. Without one, glyphs are written as
    /// `gid<N>` and [`SerializeFlags::GLYPH_EXTENTS`] prints zero extents.
    ///
    /// Fails unless the buffer holds glyphs.
    pub fn serialize_glyphs(
        &self,
        face: Option<&Face>,
        format: SerializeFormat,
        flags: SerializeFlags,
    ) -> Result<String, Error> {
        if self.content_type != ContentType::Glyphs || self.glyphs.len == 0 {
            return Err(Error::invalid_operation("serialize glyphs of", self.content_type));
        }

        let mut out = String::new();
        // Writing into a `String` cannot fail.
        let _ = self.write_glyphs(&mut out, face, format, flags);
        Ok(out)
    }

    /// Serializes the scalars and their clusters.
    ///
    /// Only [`SerializeFlags::NO_CLUSTERS`] applies.
    ///
    /// Fails unless the buffer holds Unicode text.
    pub fn serialize_unicode(
        &self,
        format: SerializeFormat,
        flags: SerializeFlags,
    ) -> Result<String, Error> {
        if self.content_type != ContentType::Unicode || self.scalars.len == 0 {
            return Err(Error::invalid_operation("serialize scalars of", self.content_type));
        }

        let mut out = String::new();
        let _ = self.write_unicode(&mut out, format, flags);
        Ok(out)
    }

    fn write_glyphs<W: Write>(
        &self,
        out: &mut W,
        face: Option<&Face>,
        format: SerializeFormat,
        flags: SerializeFlags,
    ) -> core::fmt::Result {
        let mut writer = GlyphWriter {
            face,
            flags,
            pen: PenAccumulator::new(flags),
        };

        let infos = self.glyphs.infos();
        let positions = self.glyphs.positions();
        match format {
            SerializeFormat::Text => writer.write_text(out, infos, positions),
            SerializeFormat::Json => writer.write_json(out, infos, positions),
        }
    }

    fn write_unicode<W: Write>(
        &self,
        out: &mut W,
        format: SerializeFormat,
        flags: SerializeFlags,
    ) -> core::fmt::Result {
        let codepoints = self.scalars.codepoints();
        let clusters = self.scalars.clusters();
        match format {
            SerializeFormat::Text => write_unicode_text(out, codepoints, clusters, flags),
            SerializeFormat::Json => write_unicode_json(out, codepoints, clusters, flags),
        }
    }
}

impl core::fmt::Display for Buffer {
    /// Prints the text serialization of whatever the buffer holds,
    /// glyphs without a face, with default flags.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let flags = SerializeFlags::default();
        match self.content_type {
            ContentType::Glyphs => self.write_glyphs(f, None, SerializeFormat::Text, flags),
            ContentType::Unicode => self.write_unicode(f, SerializeFormat::Text, flags),
            ContentType::Invalid => f.write_str("[]"),
        }
    }
}

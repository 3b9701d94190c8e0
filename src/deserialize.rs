//! Parsers for the grammars written by [`Buffer::serialize_glyphs`]
//! and [`Buffer::serialize_unicode`].
//!
//! Input is parsed completely before the buffer is touched, so a malformed
//! string leaves the buffer as it was.

use serde::Deserialize;

use crate::buffer::{ContentType, GlyphFlags, GlyphInfo, GlyphPosition};
use crate::text_parser::TextParser;
use crate::{Buffer, Error, Face, SerializeFormat};

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonGlyphId {
    Id(u32),
    Name(String),
}

#[derive(Deserialize)]
struct JsonGlyph {
    g: JsonGlyphId,
    #[serde(default)]
    cl: u32,
    #[serde(default)]
    dx: i32,
    #[serde(default)]
    dy: i32,
    #[serde(default)]
    ax: i32,
    #[serde(default)]
    ay: i32,
    #[serde(default)]
    fl: u32,
}

#[derive(Deserialize)]
struct JsonScalar {
    u: u32,
    #[serde(default)]
    cl: u32,
}

impl Buffer {
    /// Replaces the contents with glyphs parsed from `input`.
    ///
    /// Glyph tokens are resolved as a decimal glyph id, as `gid<N>`,
    /// or else as a glyph name looked up in `face`. Extents are accepted
    /// and ignored.
    ///
    /// The buffer has to be empty and must not hold glyphs already.
    pub fn deserialize_glyphs(
        &mut self,
        input: &str,
        face: Option<&Face>,
        format: SerializeFormat,
    ) -> Result<(), Error> {
        self.check_deserialization()?;

        let glyphs = match format {
            SerializeFormat::Text => parse_glyphs_text(input, face)?,
            SerializeFormat::Json => parse_glyphs_json(input, face)?,
        };

        self.set_length(glyphs.len());
        for (i, (info, pos)) in glyphs.into_iter().enumerate() {
            self.glyphs.info[i] = info;
            self.glyphs.pos[i] = pos;
        }

        Ok(())
    }

    /// Replaces the contents with scalars parsed from `input`.
    ///
    /// Missing clusters default to zero. Same preconditions as
    /// [`Buffer::deserialize_glyphs`]. Leaves the buffer holding Unicode text.
    pub fn deserialize_unicode(&mut self, input: &str, format: SerializeFormat) -> Result<(), Error> {
        self.check_deserialization()?;

        let scalars = match format {
            SerializeFormat::Text => parse_unicode_text(input)?,
            SerializeFormat::Json => parse_unicode_json(input)?,
        };

        self.content_type = ContentType::Unicode;
        for (u, cluster) in scalars {
            self.scalars.push(u, cluster);
        }
        self.sync_text();

        Ok(())
    }

    fn check_deserialization(&self) -> Result<(), Error> {
        if !self.is_empty() || self.content_type == ContentType::Glyphs {
            return Err(Error::invalid_operation("deserialize into", self.content_type));
        }

        Ok(())
    }
}

fn resolve_glyph(token: &str, face: Option<&Face>) -> Option<u32> {
    if !token.is_empty() && token.bytes().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }

    if let Some(id) = token.strip_prefix("gid") {
        if let Ok(id) = id.parse() {
            return Some(id);
        }
    }

    face?.glyph_from_name(token)
}

fn parse_glyphs_text(input: &str, face: Option<&Face>) -> Result<Vec<(GlyphInfo, GlyphPosition)>, Error> {
    let err = |p: &TextParser, reason: &str| Error::format(SerializeFormat::Text, p.offset(), reason);

    let mut p = TextParser::new(input);
    p.skip_spaces();
    p.consume_byte(b'[').ok_or_else(|| err(&p, "expected '['"))?;

    let mut glyphs = Vec::new();
    if p.consume_byte(b']').is_none() {
        loop {
            glyphs.push(parse_glyph_entry(&mut p, face)?);

            match p.curr_byte() {
                Some(b'|') => p.advance(1),
                Some(b']') => {
                    p.advance(1);
                    break;
                }
                _ => return Err(err(&p, "expected '|' or ']'")),
            }
        }
    }

    p.skip_spaces();
    if !p.at_end() {
        return Err(err(&p, "trailing characters"));
    }

    Ok(glyphs)
}

fn parse_glyph_entry(p: &mut TextParser, face: Option<&Face>) -> Result<(GlyphInfo, GlyphPosition), Error> {
    let err = |p: &TextParser, reason: &str| Error::format(SerializeFormat::Text, p.offset(), reason);

    let start = p.offset();
    let token = p.consume_bytes(|c| !matches!(c, b'=' | b'@' | b'+' | b'#' | b'<' | b'|' | b']'));
    if token.is_empty() {
        return Err(err(p, "expected a glyph"));
    }

    let glyph_id = resolve_glyph(token, face).ok_or_else(|| {
        Error::format(SerializeFormat::Text, start, format!("unknown glyph '{}'", token))
    })?;

    let mut info = GlyphInfo {
        glyph_id,
        ..GlyphInfo::default()
    };
    let mut pos = GlyphPosition::default();

    if p.consume_byte(b'=').is_some() {
        info.cluster = p.consume_u32().ok_or_else(|| err(p, "expected a cluster"))?;
    }

    if p.consume_byte(b'@').is_some() {
        let (x, y) = p.consume_i32_pair().ok_or_else(|| err(p, "expected an offset"))?;
        pos.x_offset = x;
        pos.y_offset = y;
    }

    if p.consume_byte(b'+').is_some() {
        pos.x_advance = p.consume_i32().ok_or_else(|| err(p, "expected an advance"))?;
        if p.consume_byte(b',').is_some() {
            pos.y_advance = p.consume_i32().ok_or_else(|| err(p, "expected an advance"))?;
        }
    }

    if p.consume_byte(b'#').is_some() {
        let flags = p.consume_hex_u32().ok_or_else(|| err(p, "expected flags"))?;
        info.flags = GlyphFlags::from_bits_truncate(flags);
    }

    if p.consume_byte(b'<').is_some() {
        p.consume_i32_pair().ok_or_else(|| err(p, "expected extents"))?;
        p.consume_byte(b',').ok_or_else(|| err(p, "expected extents"))?;
        p.consume_i32_pair().ok_or_else(|| err(p, "expected extents"))?;
        p.consume_byte(b'>').ok_or_else(|| err(p, "expected '>'"))?;
    }

    Ok((info, pos))
}

fn parse_glyphs_json(input: &str, face: Option<&Face>) -> Result<Vec<(GlyphInfo, GlyphPosition)>, Error> {
    let entries: Vec<JsonGlyph> =
        serde_json::from_str(input).map_err(|e| json_error(input, &e))?;

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let glyph_id = match entry.g {
                JsonGlyphId::Id(id) => Some(id),
                JsonGlyphId::Name(ref name) => resolve_glyph(name, face),
            };

            let glyph_id = glyph_id.ok_or_else(|| {
                Error::format(SerializeFormat::Json, 0, format!("unknown glyph in entry {}", i))
            })?;

            let info = GlyphInfo {
                glyph_id,
                cluster: entry.cl,
                flags: GlyphFlags::from_bits_truncate(entry.fl),
            };

            let pos = GlyphPosition {
                x_advance: entry.ax,
                y_advance: entry.ay,
                x_offset: entry.dx,
                y_offset: entry.dy,
            };

            Ok((info, pos))
        })
        .collect()
}

fn parse_unicode_text(input: &str) -> Result<Vec<(u32, u32)>, Error> {
    let err = |p: &TextParser, reason: &str| Error::format(SerializeFormat::Text, p.offset(), reason);

    let mut p = TextParser::new(input);
    p.skip_spaces();
    p.consume_byte(b'<').ok_or_else(|| err(&p, "expected '<'"))?;

    let mut scalars = Vec::new();
    if p.consume_byte(b'>').is_none() {
        loop {
            p.consume_byte(b'U').ok_or_else(|| err(&p, "expected 'U+'"))?;
            p.consume_byte(b'+').ok_or_else(|| err(&p, "expected 'U+'"))?;
            let u = p.consume_hex_u32().ok_or_else(|| err(&p, "expected a codepoint"))?;

            let mut cluster = 0;
            if p.consume_byte(b'=').is_some() {
                cluster = p.consume_u32().ok_or_else(|| err(&p, "expected a cluster"))?;
            }

            scalars.push((u, cluster));

            match p.curr_byte() {
                Some(b'|') => p.advance(1),
                Some(b'>') => {
                    p.advance(1);
                    break;
                }
                _ => return Err(err(&p, "expected '|' or '>'")),
            }
        }
    }

    p.skip_spaces();
    if !p.at_end() {
        return Err(err(&p, "trailing characters"));
    }

    Ok(scalars)
}

fn parse_unicode_json(input: &str) -> Result<Vec<(u32, u32)>, Error> {
    let entries: Vec<JsonScalar> =
        serde_json::from_str(input).map_err(|e| json_error(input, &e))?;

    Ok(entries.into_iter().map(|entry| (entry.u, entry.cl)).collect())
}

fn json_error(input: &str, e: &serde_json::Error) -> Error {
    // serde_json reports 1-based lines and columns.
    let line_start: usize = input
        .split_inclusive('\n')
        .take(e.line().saturating_sub(1))
        .map(str::len)
        .sum();

    let offset = (line_start + e.column().saturating_sub(1)).min(input.len());
    Error::format(SerializeFormat::Json, offset, e.to_string())
}

use crate::buffer::{ContentType, GlyphFlags};
use crate::{Buffer, BufferFlags, Direction, Error, Face, Language, Script};

/// What a shaping backend gets to see of a buffer.
#[derive(Clone, Copy, Debug)]
pub struct ShapeRequest<'a> {
    /// The buffer scalars as UTF-8.
    pub text: &'a str,
    /// Resolved text direction.
    pub direction: Direction,
    /// Resolved script, if any scalar has one.
    pub script: Option<Script>,
    /// Text language.
    pub language: Option<&'a Language>,
    /// Buffer flags.
    pub flags: BufferFlags,
    /// Scalars preceding the text, in logical order.
    pub pre_context: &'a [u32],
    /// Scalars following the text, in logical order.
    pub post_context: &'a [u32],
}

/// A glyph produced by a shaping backend.
#[derive(Clone, Copy, Default, PartialEq, Debug)]
pub struct ShapedGlyph {
    /// Glyph id.
    pub glyph_id: u32,
    /// Byte offset into [`ShapeRequest::text`] of the first character
    /// this glyph was produced from.
    pub cluster: u32,
    /// Glyph flags.
    pub flags: GlyphFlags,
    /// Horizontal advance.
    pub x_advance: f32,
    /// Vertical advance.
    pub y_advance: f32,
    /// Horizontal offset.
    pub x_offset: f32,
    /// Vertical offset.
    pub y_offset: f32,
}

/// A shaping engine.
pub trait ShapingBackend {
    /// Shapes `request.text` into glyphs, in visual order.
    ///
    /// Returning no glyphs makes [`shape`] fall back to identity mapping.
    fn shape(&self, face: Option<&Face>, request: &ShapeRequest) -> Vec<ShapedGlyph>;
}

/// Maps each character to its nominal glyph and advance.
///
/// No substitution or positioning. Characters missing from the font map to
/// glyph zero. Without a face nothing is produced.
#[derive(Clone, Copy, Default, Debug)]
pub struct NominalBackend;

impl ShapingBackend for NominalBackend {
    fn shape(&self, face: Option<&Face>, request: &ShapeRequest) -> Vec<ShapedGlyph> {
        let Some(face) = face else {
            return Vec::new();
        };

        let vertical = request.direction.is_vertical();
        let mut glyphs: Vec<ShapedGlyph> = request
            .text
            .char_indices()
            .map(|(offset, c)| {
                let glyph_id = face.nominal_glyph(u32::from(c)).unwrap_or(0);
                let mut glyph = ShapedGlyph {
                    glyph_id,
                    cluster: offset as u32,
                    ..ShapedGlyph::default()
                };

                if vertical {
                    glyph.y_advance = face.glyph_v_advance(glyph_id) as f32;
                } else {
                    glyph.x_advance = face.glyph_h_advance(glyph_id) as f32;
                }

                glyph
            })
            .collect();

        if request.direction.is_backward() {
            glyphs.reverse();
        }

        glyphs
    }
}

/// Shapes the buffer contents.
///
/// Segment properties are guessed first. Backend clusters are mapped back
/// to the buffer clusters of the scalars they point at and positions are
/// rounded half to even.
///
/// When there is no backend, or it produces nothing, every scalar becomes
/// one glyph with its codepoint as glyph id and zero positions.
/// Default ignorables become the [invisible glyph](Buffer::set_invisible_glyph)
/// when one is set, unless
/// [`PRESERVE_DEFAULT_IGNORABLES`](BufferFlags::PRESERVE_DEFAULT_IGNORABLES)
/// is set.
///
/// Fails if the buffer already holds glyphs.
pub fn shape(
    buffer: &mut Buffer,
    face: Option<&Face>,
    backend: Option<&dyn ShapingBackend>,
) -> Result<(), Error> {
    if buffer.content_type == ContentType::Glyphs {
        return Err(Error::invalid_operation("shape", buffer.content_type));
    }

    buffer.guess_segment_properties();

    let shaped = match backend {
        Some(backend) => {
            let request = ShapeRequest {
                text: buffer.text(),
                direction: buffer.direction,
                script: buffer.script,
                language: buffer.language.as_ref(),
                flags: buffer.flags,
                pre_context: buffer.pre_context(),
                post_context: buffer.post_context(),
            };
            backend.shape(face, &request)
        }
        None => Vec::new(),
    };

    if shaped.is_empty() {
        log::debug!("no shaping output, mapping {} scalars to glyphs", buffer.len());
        fill_identity(buffer);
    } else {
        fill_shaped(buffer, &shaped);
    }

    Ok(())
}

fn fill_shaped(buffer: &mut Buffer, shaped: &[ShapedGlyph]) {
    let clusters: Vec<u32> = shaped
        .iter()
        .map(|glyph| source_cluster(buffer, glyph.cluster as usize))
        .collect();

    buffer.set_length(shaped.len());
    for (i, (glyph, cluster)) in shaped.iter().zip(clusters).enumerate() {
        buffer.glyphs.info[i].glyph_id = glyph.glyph_id;
        buffer.glyphs.info[i].cluster = cluster;
        buffer.glyphs.info[i].flags = glyph.flags & GlyphFlags::DEFINED;

        let pos = &mut buffer.glyphs.pos[i];
        pos.x_advance = glyph.x_advance.round_ties_even() as i32;
        pos.y_advance = glyph.y_advance.round_ties_even() as i32;
        pos.x_offset = glyph.x_offset.round_ties_even() as i32;
        pos.y_offset = glyph.y_offset.round_ties_even() as i32;
    }
}

fn fill_identity(buffer: &mut Buffer) {
    let use_invisible = buffer.invisible != 0
        && !buffer.flags.contains(BufferFlags::PRESERVE_DEFAULT_IGNORABLES);

    let len = buffer.scalars.len;
    buffer.set_length(len);
    for i in 0..len {
        let u = buffer.scalars.codepoints[i];
        let glyph_id = if use_invisible && buffer.unicode.is_default_ignorable(u) {
            buffer.invisible
        } else {
            u
        };

        let info = &mut buffer.glyphs.info[i];
        info.glyph_id = glyph_id;
        info.cluster = buffer.scalars.clusters[i];
    }
}

/// Returns the cluster of the scalar the byte `offset` falls into.
fn source_cluster(buffer: &Buffer, offset: usize) -> u32 {
    let index = match buffer.text_offsets().binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    };

    buffer.scalar_clusters().get(index).copied().unwrap_or(0)
}

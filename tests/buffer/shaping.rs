use std::cell::RefCell;

use shapebuf::{
    script, shape, Buffer, ContentType, Direction, Error, Face, GlyphFlags, NominalBackend,
    ShapeRequest, ShapedGlyph, ShapingBackend,
};

use crate::{dump, shape as shape_text};

/// Remembers what it was asked and answers with canned glyphs.
#[derive(Default)]
struct ScriptedBackend {
    output: Vec<ShapedGlyph>,
    seen: RefCell<Option<(String, Direction, Option<shapebuf::Script>, Vec<u32>, Vec<u32>)>>,
}

impl ShapingBackend for ScriptedBackend {
    fn shape(&self, _: Option<&Face>, request: &ShapeRequest) -> Vec<ShapedGlyph> {
        *self.seen.borrow_mut() = Some((
            request.text.to_string(),
            request.direction,
            request.script,
            request.pre_context.to_vec(),
            request.post_context.to_vec(),
        ));
        self.output.clone()
    }
}

fn glyph(glyph_id: u32, cluster: u32, x_advance: f32) -> ShapedGlyph {
    ShapedGlyph {
        glyph_id,
        cluster,
        x_advance,
        ..ShapedGlyph::default()
    }
}

fn utf16_buffer(text: &str, offset: usize, len: usize) -> Buffer {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut buffer = Buffer::new();
    buffer.add_utf16(&units, offset, Some(len)).unwrap();
    buffer
}

#[test]
fn backend_sees_materialized_text() {
    let backend = ScriptedBackend::default();
    let mut buffer = utf16_buffer("xa\u{E9}by", 1, 3);
    shape(&mut buffer, None, Some(&backend)).unwrap();

    let seen = backend.seen.borrow().clone().unwrap();
    assert_eq!(seen.0, "a\u{E9}b");
    assert_eq!(seen.1, Direction::LeftToRight);
    assert_eq!(seen.2, Some(script::LATIN));
    assert_eq!(seen.3, [u32::from('x')]);
    assert_eq!(seen.4, [u32::from('y')]);
}

#[test]
fn byte_clusters_map_to_source_clusters() {
    // UTF-16 clusters are 1, 2, 3; UTF-8 offsets are 0, 1, 3.
    let backend = ScriptedBackend {
        output: vec![glyph(10, 0, 100.0), glyph(11, 2, 50.0), glyph(12, 3, 25.0)],
        ..ScriptedBackend::default()
    };

    let mut buffer = utf16_buffer("xa\u{E9}by", 1, 3);
    shape(&mut buffer, None, Some(&backend)).unwrap();
    assert_eq!(buffer.content_type(), ContentType::Glyphs);
    assert_eq!(dump(&buffer), "[gid10=1+100|gid11=2+50|gid12=3+25]");
}

#[test]
fn ligature() {
    let backend = ScriptedBackend {
        output: vec![glyph(42, 0, 600.0)],
        ..ScriptedBackend::default()
    };

    let mut buffer = Buffer::new();
    buffer.add_str("ffi").unwrap();
    shape(&mut buffer, None, Some(&backend)).unwrap();
    assert_eq!(dump(&buffer), "[gid42=0+600]");

    // The scalars stay around.
    assert_eq!(buffer.codepoints(), &[0x66, 0x66, 0x69]);
}

#[test]
fn positions_round_half_to_even() {
    let backend = ScriptedBackend {
        output: vec![
            ShapedGlyph {
                glyph_id: 1,
                cluster: 0,
                flags: GlyphFlags::empty(),
                x_advance: 2.5,
                y_advance: -1.5,
                x_offset: 3.5,
                y_offset: 0.49,
            },
            glyph(2, 1, -0.5),
        ],
        ..ScriptedBackend::default()
    };

    let mut buffer = Buffer::new();
    buffer.add_str("ab").unwrap();
    shape(&mut buffer, None, Some(&backend)).unwrap();
    assert_eq!(dump(&buffer), "[gid1=0@4,0+2,-2|gid2=1+0]");
}

#[test]
fn undefined_flags_are_dropped() {
    let backend = ScriptedBackend {
        output: vec![ShapedGlyph {
            glyph_id: 1,
            flags: GlyphFlags::from_bits_retain(0xF1),
            ..ShapedGlyph::default()
        }],
        ..ScriptedBackend::default()
    };

    let mut buffer = Buffer::new();
    buffer.add_str("a").unwrap();
    shape(&mut buffer, None, Some(&backend)).unwrap();
    assert_eq!(buffer.glyph_infos()[0].flags, GlyphFlags::UNSAFE_TO_BREAK);
}

#[test]
fn empty_output_falls_back_to_identity() {
    let backend = ScriptedBackend::default();
    let mut buffer = Buffer::new();
    buffer.add_str("ab").unwrap();
    shape(&mut buffer, None, Some(&backend)).unwrap();
    assert_eq!(dump(&buffer), "[gid97=0+0|gid98=1+0]");
}

#[test]
fn nominal_backend_needs_a_face() {
    let mut buffer = Buffer::new();
    buffer.add_str("ab").unwrap();
    shape(&mut buffer, None, Some(&NominalBackend)).unwrap();
    assert_eq!(dump(&buffer), "[gid97=0+0|gid98=1+0]");
}

#[test]
fn invisible_glyph() {
    assert_eq!(
        shape_text("a\u{200D}b", ""),
        "[gid97=0+0|gid8205=1+0|gid98=4+0]"
    );
    assert_eq!(
        shape_text("a\u{200D}b", "--invisible-glyph=3"),
        "[gid97=0+0|gid3=1+0|gid98=4+0]"
    );
    assert_eq!(
        shape_text("a\u{200D}b", "--invisible-glyph=3 --preserve-default-ignorables"),
        "[gid97=0+0|gid8205=1+0|gid98=4+0]"
    );
    assert_eq!(
        shape_text("a\u{200D}b", "--invisible-glyph=3 --remove-default-ignorables"),
        "[gid97=0+0|gid98=4+0]"
    );
}

#[test]
fn rtl_text_is_mirrored_before_shaping() {
    assert_eq!(
        shape_text("(\u{5D0})", "--direction=rtl --no-clusters --no-positions"),
        "[gid41|gid1488|gid40]"
    );
}

#[test]
fn empty_buffer() {
    let mut buffer = Buffer::new();
    shape(&mut buffer, None, None).unwrap();
    assert_eq!(buffer.content_type(), ContentType::Glyphs);
    assert!(buffer.is_empty());
}

#[test]
fn cannot_shape_twice() {
    let mut buffer = Buffer::new();
    buffer.add_str("a").unwrap();
    shape(&mut buffer, None, None).unwrap();
    assert_eq!(
        shape(&mut buffer, None, None),
        Err(Error::InvalidOperation {
            operation: "shape",
            content: ContentType::Glyphs,
        })
    );
}

#[test]
fn fill_api() {
    let mut buffer = Buffer::new();
    buffer.add_str("abc").unwrap();

    assert_eq!(
        buffer.set_glyph(0, 1, 0, GlyphFlags::empty()),
        Err(Error::ArgumentOutOfRange { start: 0, end: 1, len: 0 })
    );

    buffer.set_length(2);
    assert_eq!(buffer.content_type(), ContentType::Glyphs);
    buffer.set_glyph(0, 5, 0, GlyphFlags::UNSAFE_TO_CONCAT).unwrap();
    buffer.set_glyph(1, 6, 2, GlyphFlags::empty()).unwrap();
    buffer.set_position(1, 10, 0, -1, 2).unwrap();
    assert_eq!(
        buffer.set_position(2, 0, 0, 0, 0),
        Err(Error::ArgumentOutOfRange { start: 2, end: 3, len: 2 })
    );

    assert_eq!(
        buffer.set_glyph(usize::MAX, 1, 0, GlyphFlags::empty()),
        Err(Error::ArgumentOutOfRange { start: usize::MAX, end: usize::MAX, len: 2 })
    );
    assert_eq!(
        buffer.set_position(usize::MAX, 0, 0, 0, 0),
        Err(Error::ArgumentOutOfRange { start: usize::MAX, end: usize::MAX, len: 2 })
    );

    assert_eq!(dump(&buffer), "[gid5=0+0#2|gid6=2@-1,2+10]");
}

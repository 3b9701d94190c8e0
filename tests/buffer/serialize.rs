use std::str::FromStr;

use shapebuf::{Buffer, ContentType, Direction, Error, SerializeFlags, SerializeFormat};

use crate::{dump, glyphs, shape};

const SAMPLE: &str = "[gid1=0+100|gid2=1@5,-7+50#1|gid3=1+30,10#3|gid4=4@-2,0+0]";

#[test]
fn decomposed_e_acute() {
    assert_eq!(shape("e\u{301}", "--utf16"), "[gid101=0+0|gid769=1+0]");
}

#[test]
fn no_glyph_names() {
    assert_eq!(shape("e\u{301}", "--no-glyph-names"), "[101=0+0|769=1+0]");
}

#[test]
fn no_clusters() {
    assert_eq!(shape("e\u{301}", "--no-clusters"), "[gid101+0|gid769+0]");
}

#[test]
fn no_positions() {
    assert_eq!(shape("e\u{301}", "--no-positions"), "[gid101=0|gid769=1]");
}

#[test]
fn extents_without_face() {
    assert_eq!(
        shape("e\u{301}", "--show-extents"),
        "[gid101=0+0<0,0,0,0>|gid769=1+0<0,0,0,0>]"
    );
}

#[test]
fn json() {
    assert_eq!(
        shape("e\u{301}", "--output-format=json"),
        "[{\"g\":\"gid101\",\"cl\":0,\"dx\":0,\"dy\":0,\"ax\":0,\"ay\":0},\
          {\"g\":\"gid769\",\"cl\":1,\"dx\":0,\"dy\":0,\"ax\":0,\"ay\":0}]"
    );
}

#[test]
fn json_no_glyph_names() {
    assert_eq!(
        shape("e", "--output-format=json --no-glyph-names --no-positions"),
        "[{\"g\":101,\"cl\":0}]"
    );
}

#[test]
fn json_extents() {
    assert_eq!(
        shape("e", "--output-format=json --no-positions --show-extents"),
        "[{\"g\":\"gid101\",\"cl\":0,\"xb\":0,\"yb\":0,\"w\":0,\"h\":0}]"
    );
}

#[test]
fn flags() {
    let buffer = glyphs(SAMPLE, Direction::LeftToRight);
    assert_eq!(
        buffer.to_string(),
        "[gid1=0+100|gid2=1@5,-7+50|gid3=1+30,10|gid4=4@-2,0+0]"
    );
    assert_eq!(dump(&buffer), SAMPLE);

    let json = buffer
        .serialize_glyphs(
            None,
            SerializeFormat::Json,
            SerializeFlags::GLYPH_FLAGS | SerializeFlags::NO_POSITIONS,
        )
        .unwrap();
    assert_eq!(
        json,
        "[{\"g\":\"gid1\",\"cl\":0},{\"g\":\"gid2\",\"cl\":1,\"fl\":1},\
          {\"g\":\"gid3\",\"cl\":1,\"fl\":3},{\"g\":\"gid4\",\"cl\":4}]"
    );
}

#[test]
fn no_advances_folds_advances_into_offsets() {
    let buffer = glyphs("[gid1=0+100|gid2=1@5,0+50|gid3=2+30,10|gid4=3]", Direction::LeftToRight);

    let text = buffer
        .serialize_glyphs(None, SerializeFormat::Text, SerializeFlags::NO_ADVANCES)
        .unwrap();
    assert_eq!(text, "[gid1=0|gid2=1@105,0|gid3=2@150,0|gid4=3@180,10]");

    let json = buffer
        .serialize_glyphs(None, SerializeFormat::Json, SerializeFlags::NO_ADVANCES)
        .unwrap();
    assert_eq!(
        json,
        "[{\"g\":\"gid1\",\"cl\":0,\"dx\":0,\"dy\":0},\
          {\"g\":\"gid2\",\"cl\":1,\"dx\":105,\"dy\":0},\
          {\"g\":\"gid3\",\"cl\":2,\"dx\":150,\"dy\":0},\
          {\"g\":\"gid4\",\"cl\":3,\"dx\":180,\"dy\":10}]"
    );
}

#[test]
fn no_advances_pen_wraps_around() {
    let buffer = glyphs("[gid1=0+2147483647|gid2=1+1|gid3=2+0]", Direction::LeftToRight);
    let text = buffer
        .serialize_glyphs(None, SerializeFormat::Text, SerializeFlags::NO_ADVANCES)
        .unwrap();
    assert_eq!(text, "[gid1=0|gid2=1@2147483647,0|gid3=2@-2147483648,0]");
}

#[test]
fn ned() {
    assert_eq!(shape("ab", "--ned"), "[gid97|gid98]");
}

fn assert_round_trip(format: SerializeFormat, flags: SerializeFlags) {
    let original = glyphs(SAMPLE, Direction::LeftToRight);
    let serialized = original.serialize_glyphs(None, format, flags).unwrap();

    let mut restored = Buffer::new();
    restored.deserialize_glyphs(&serialized, None, format).unwrap();
    assert_eq!(restored.content_type(), ContentType::Glyphs);
    assert_eq!(restored.glyph_positions(), original.glyph_positions());

    let ids = |b: &Buffer| -> Vec<(u32, u32)> {
        b.glyph_infos().iter().map(|i| (i.glyph_id, i.cluster)).collect()
    };
    assert_eq!(ids(&restored), ids(&original));

    if flags.contains(SerializeFlags::GLYPH_FLAGS) {
        assert_eq!(restored.glyph_infos(), original.glyph_infos());
    }
}

#[test]
fn round_trip_text() {
    assert_round_trip(SerializeFormat::Text, SerializeFlags::default());
    assert_round_trip(SerializeFormat::Text, SerializeFlags::GLYPH_FLAGS);
    assert_round_trip(SerializeFormat::Text, SerializeFlags::NO_GLYPH_NAMES);
    assert_round_trip(
        SerializeFormat::Text,
        SerializeFlags::GLYPH_EXTENTS | SerializeFlags::GLYPH_FLAGS,
    );
}

#[test]
fn round_trip_json() {
    assert_round_trip(SerializeFormat::Json, SerializeFlags::default());
    assert_round_trip(SerializeFormat::Json, SerializeFlags::GLYPH_FLAGS);
    assert_round_trip(SerializeFormat::Json, SerializeFlags::NO_GLYPH_NAMES);
    assert_round_trip(
        SerializeFormat::Json,
        SerializeFlags::GLYPH_EXTENTS | SerializeFlags::GLYPH_FLAGS,
    );
}

#[test]
fn glyph_tokens() {
    let buffer = glyphs("  [12=3+0|gid7|gid65535=1]  ", Direction::LeftToRight);
    let ids: Vec<(u32, u32)> = buffer
        .glyph_infos()
        .iter()
        .map(|i| (i.glyph_id, i.cluster))
        .collect();
    assert_eq!(ids, [(12, 3), (7, 0), (65535, 1)]);

    let mut buffer = Buffer::new();
    buffer
        .deserialize_glyphs(
            "[{\"g\":\"gid7\",\"cl\":2},{\"g\":\"8\"},{\"g\":9,\"ax\":4}]",
            None,
            SerializeFormat::Json,
        )
        .unwrap();
    assert_eq!(dump(&buffer), "[gid7=2+0|gid8=0+0|gid9=0+4]");
}

#[test]
fn deserialize_ignores_extents() {
    let buffer = glyphs("[gid1=0+10<1,2,3,-4>]", Direction::LeftToRight);
    assert_eq!(dump(&buffer), "[gid1=0+10]");
}

#[test]
fn deserialize_empty() {
    let buffer = glyphs("[]", Direction::LeftToRight);
    assert_eq!(buffer.content_type(), ContentType::Glyphs);
    assert!(buffer.is_empty());
}

fn text_error(input: &str) -> (usize, String) {
    let mut buffer = Buffer::new();
    let err = buffer
        .deserialize_glyphs(input, None, SerializeFormat::Text)
        .unwrap_err();

    assert_eq!(buffer.content_type(), ContentType::Invalid);
    assert!(buffer.is_empty());

    match err {
        Error::Format { format: SerializeFormat::Text, offset, reason } => (offset, reason),
        e => panic!("unexpected error: {e}"),
    }
}

#[test]
fn malformed_text() {
    assert_eq!(text_error("gid1=0]"), (0, "expected '['".to_string()));
    assert_eq!(text_error("[gid1=0+10").0, 10);
    assert_eq!(text_error("[gid1=x]").0, 6);
    assert_eq!(text_error("[gid1=0@3]").0, 9);
    assert_eq!(text_error("[gid1]x").0, 6);
    assert_eq!(text_error("[|gid1]").0, 1);
    assert_eq!(text_error("[uni0041=0]"), (1, "unknown glyph 'uni0041'".to_string()));
}

#[test]
fn malformed_json() {
    for input in ["[{\"g\":1,}]", "{\"g\":1}", "[{\"cl\":1}]", "[{\"g\":\"uni0041\"}]"] {
        let mut buffer = Buffer::new();
        let err = buffer
            .deserialize_glyphs(input, None, SerializeFormat::Json)
            .unwrap_err();
        assert!(
            matches!(err, Error::Format { format: SerializeFormat::Json, .. }),
            "{input}: {err}"
        );
        assert!(buffer.is_empty());
    }
}

#[test]
fn preconditions() {
    let mut buffer = Buffer::new();
    buffer.add_str("a").unwrap();
    assert_eq!(
        buffer.serialize_glyphs(None, SerializeFormat::Text, SerializeFlags::default()),
        Err(Error::InvalidOperation {
            operation: "serialize glyphs of",
            content: ContentType::Unicode,
        })
    );
    assert_eq!(
        buffer.deserialize_glyphs("[gid1]", None, SerializeFormat::Text),
        Err(Error::InvalidOperation {
            operation: "deserialize into",
            content: ContentType::Unicode,
        })
    );

    let mut buffer = glyphs("[]", Direction::LeftToRight);
    assert_eq!(
        buffer.deserialize_glyphs("[gid1]", None, SerializeFormat::Text),
        Err(Error::InvalidOperation {
            operation: "deserialize into",
            content: ContentType::Glyphs,
        })
    );
    assert_eq!(
        buffer.serialize_glyphs(None, SerializeFormat::Text, SerializeFlags::default()),
        Err(Error::InvalidOperation {
            operation: "serialize glyphs of",
            content: ContentType::Glyphs,
        })
    );
    assert_eq!(
        buffer.serialize_unicode(SerializeFormat::Text, SerializeFlags::default()),
        Err(Error::InvalidOperation {
            operation: "serialize scalars of",
            content: ContentType::Glyphs,
        })
    );
}

#[test]
fn format_names() {
    assert_eq!(SerializeFormat::from_str("text"), Ok(SerializeFormat::Text));
    assert_eq!(SerializeFormat::from_str("TEXT"), Ok(SerializeFormat::Text));
    assert_eq!(SerializeFormat::from_str("t"), Ok(SerializeFormat::Text));
    assert_eq!(SerializeFormat::from_str("json"), Ok(SerializeFormat::Json));
    assert_eq!(SerializeFormat::from_str("Json"), Ok(SerializeFormat::Json));
    assert_eq!(SerializeFormat::from_str("j"), Ok(SerializeFormat::Json));
    assert_eq!(
        SerializeFormat::from_str("xml"),
        Err(Error::NotSupported("xml".to_string()))
    );
    assert_eq!(
        SerializeFormat::from_str(""),
        Err(Error::NotSupported(String::new()))
    );
    assert_eq!(SerializeFormat::Json.to_string(), "json");
}

#[test]
fn unicode_text() {
    let mut buffer = Buffer::new();
    buffer
        .deserialize_unicode("<U+0065=0|U+0301=1>", SerializeFormat::Text)
        .unwrap();
    assert_eq!(buffer.content_type(), ContentType::Unicode);
    assert_eq!(buffer.codepoints(), &[0x65, 0x301]);
    assert_eq!(buffer.scalar_clusters(), &[0, 1]);
    assert_eq!(buffer.text(), "e\u{301}");
    assert_eq!(buffer.to_string(), "<U+0065=0|U+0301=1>");
    assert_eq!(
        buffer
            .serialize_unicode(SerializeFormat::Text, SerializeFlags::NO_CLUSTERS)
            .unwrap(),
        "<U+0065|U+0301>"
    );
}

#[test]
fn unicode_json() {
    let input = "[{\"u\":101,\"cl\":0},{\"u\":128512,\"cl\":1}]";
    let mut buffer = Buffer::new();
    buffer.deserialize_unicode(input, SerializeFormat::Json).unwrap();
    assert_eq!(buffer.codepoints(), &[101, 0x1F600]);
    assert_eq!(
        buffer
            .serialize_unicode(SerializeFormat::Json, SerializeFlags::default())
            .unwrap(),
        input
    );
    assert_eq!(
        buffer.serialize_unicode(SerializeFormat::Text, SerializeFlags::default()).unwrap(),
        "<U+0065=0|U+1F600=1>"
    );
}

#[test]
fn malformed_unicode() {
    let mut buffer = Buffer::new();
    assert!(matches!(
        buffer.deserialize_unicode("<U+0065=0|0301>", SerializeFormat::Text),
        Err(Error::Format { offset: 10, .. })
    ));
    assert!(matches!(
        buffer.deserialize_unicode("[{\"cl\":0}]", SerializeFormat::Json),
        Err(Error::Format { format: SerializeFormat::Json, .. })
    ));
    assert!(buffer.is_empty());
}

#[test]
fn display() {
    assert_eq!(Buffer::new().to_string(), "[]");

    let mut buffer = Buffer::new();
    buffer.add_str("a").unwrap();
    assert_eq!(buffer.to_string(), "<U+0061=0>");

    shapebuf::shape(&mut buffer, None, None).unwrap();
    assert_eq!(buffer.to_string(), "[gid97=0+0]");
}

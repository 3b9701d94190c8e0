use shapebuf::unicode::UnicodeFuncs;
use shapebuf::{Buffer, BufferFlags, Direction, SerializeFormat};

use crate::preprocess;

fn is_monotone(clusters: &[u32]) -> bool {
    clusters.windows(2).all(|w| w[0] <= w[1])
}

#[test]
fn default_ignorables_are_kept_by_default() {
    assert_eq!(
        preprocess("a\u{200D}b", "--utf16"),
        "<U+0061=0|U+200D=1|U+0062=2>"
    );
}

#[test]
fn default_ignorables_removed_with_original_clusters() {
    assert_eq!(
        preprocess("a\u{200D}b", "--utf16 --remove-default-ignorables"),
        "<U+0061=0|U+0062=2>"
    );
}

#[test]
fn preserve_wins_over_remove() {
    assert_eq!(
        preprocess(
            "a\u{200D}b",
            "--utf16 --remove-default-ignorables --preserve-default-ignorables"
        ),
        "<U+0061=0|U+200D=1|U+0062=2>"
    );
}

#[test]
fn rtl_mirroring() {
    assert_eq!(
        preprocess("(a)", "--direction=rtl"),
        "<U+0029=0|U+0061=1|U+0028=2>"
    );
    assert_eq!(
        preprocess("(a)", "--direction=ltr"),
        "<U+0028=0|U+0061=1|U+0029=2>"
    );
}

#[test]
fn mirroring_updates_text() {
    let mut buffer = Buffer::new();
    buffer.add_str("[x]").unwrap();
    buffer.set_direction(Direction::RightToLeft);
    assert!(buffer.apply_unicode_processing());
    assert_eq!(buffer.text(), "]x[");
}

#[test]
fn mirroring_can_be_disabled() {
    let mut buffer = Buffer::new();
    buffer.set_unicode_funcs(UnicodeFuncs {
        mirroring: Some(|_| None),
        ..UnicodeFuncs::default()
    });
    buffer.add_str("(a)").unwrap();
    buffer.set_direction(Direction::RightToLeft);
    assert!(!buffer.apply_unicode_processing());
    assert_eq!(buffer.text(), "(a)");
}

#[test]
fn sorted_marks_stay() {
    assert_eq!(preprocess("e\u{301}", "--utf16"), "<U+0065=0|U+0301=1>");

    let mut buffer = Buffer::new();
    buffer.add_str("e\u{301}").unwrap();
    assert!(!buffer.apply_unicode_processing());
}

#[test]
fn lower_class_moves_first_and_merges_clusters() {
    // U+0301 is 230, U+093E is 220 with the default classes.
    assert_eq!(
        preprocess("a\u{301}\u{93E}", ""),
        "<U+0061=0|U+093E=1|U+0301=1>"
    );
}

#[test]
fn characters_level_keeps_clusters() {
    assert_eq!(
        preprocess("a\u{301}\u{93E}", "--cluster-level=2"),
        "<U+0061=0|U+093E=3|U+0301=1>"
    );
}

#[test]
fn equal_classes_keep_order() {
    assert_eq!(
        preprocess("a\u{301}\u{300}", ""),
        "<U+0061=0|U+0301=1|U+0300=3>"
    );
}

#[test]
fn class_zero_is_a_barrier() {
    assert_eq!(
        preprocess("\u{301}a\u{93E}", "--no-clusters"),
        "<U+0301|U+0061|U+093E>"
    );
}

#[test]
fn ucd_classes() {
    let text = "a\u{301}\u{323}";

    // Both are nonspacing marks, so the default classes are equal.
    let mut buffer = Buffer::new();
    buffer.add_str(text).unwrap();
    assert!(!buffer.apply_unicode_processing());

    let mut buffer = Buffer::new();
    buffer.set_unicode_funcs(UnicodeFuncs::ucd());
    buffer.add_str(text).unwrap();
    assert!(buffer.apply_unicode_processing());
    assert_eq!(buffer.codepoints(), &[0x61, 0x323, 0x301]);
    assert_eq!(buffer.scalar_clusters(), &[0, 1, 1]);
    assert_eq!(buffer.text(), "a\u{323}\u{301}");
}

#[test]
fn long_mark_run() {
    // Alternating classes, more marks than the inline scratch holds.
    let mut text = String::from("a");
    for _ in 0..40 {
        text.push('\u{301}');
        text.push('\u{93E}');
    }

    let mut buffer = Buffer::new();
    buffer.add_str(&text).unwrap();
    assert!(buffer.apply_unicode_processing());

    let codepoints = buffer.codepoints();
    assert_eq!(codepoints[0], 0x61);
    assert!(codepoints[1..41].iter().all(|&u| u == 0x93E));
    assert!(codepoints[41..].iter().all(|&u| u == 0x301));
    assert!(is_monotone(buffer.scalar_clusters()));
}

#[test]
fn idempotent() {
    let text = "(\u{200D}a\u{301}\u{323}b\u{300}\u{316})";
    let mut buffer = Buffer::new();
    buffer.set_unicode_funcs(UnicodeFuncs::ucd());
    buffer.set_flags(BufferFlags::REMOVE_DEFAULT_IGNORABLES);
    buffer.set_direction(Direction::RightToLeft);
    buffer.add_str(text).unwrap();

    assert!(buffer.apply_unicode_processing());
    let once = buffer.serialize_unicode(SerializeFormat::Text, Default::default()).unwrap();
    assert!(is_monotone(buffer.scalar_clusters()));

    assert!(!buffer.apply_unicode_processing());
    let twice = buffer.serialize_unicode(SerializeFormat::Text, Default::default()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn appended_text_is_mirrored_once() {
    let mut buffer = Buffer::new();
    buffer.set_direction(Direction::RightToLeft);
    buffer.add_str("(").unwrap();
    buffer.apply_unicode_processing();
    buffer.add_utf8(b"<(", 1, None).unwrap();
    buffer.apply_unicode_processing();
    assert_eq!(buffer.text(), "))");
}

#[test]
fn only_unicode_content_is_processed() {
    let mut buffer = Buffer::new();
    buffer.set_direction(Direction::RightToLeft);
    assert!(!buffer.apply_unicode_processing());

    buffer
        .deserialize_glyphs("[gid40=0+0]", None, SerializeFormat::Text)
        .unwrap();
    assert!(!buffer.apply_unicode_processing());
    assert_eq!(buffer.glyph_infos()[0].glyph_id, 40);
}

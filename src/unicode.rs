//! Pluggable Unicode property lookups.

pub use unicode_properties::GeneralCategory;
use unicode_properties::UnicodeGeneralCategory;
use unicode_script::UnicodeScript;

use crate::{script, Script, Tag};

/// Returns the general category of a codepoint.
pub type GeneralCategoryFn = fn(u32) -> GeneralCategory;
/// Returns the combining class of a codepoint.
pub type CombiningClassFn = fn(u32) -> u8;
/// Returns the mirrored counterpart of a codepoint, if any.
pub type MirroringFn = fn(u32) -> Option<u32>;
/// Returns the script of a codepoint.
pub type ScriptFn = fn(u32) -> Script;

/// A set of Unicode property lookups used by the buffer.
///
/// Every slot is optional. An empty slot falls back to the built-in default
/// documented on the matching `default_*` function.
#[derive(Clone, Copy, Default, Debug)]
pub struct UnicodeFuncs {
    /// General category lookup.
    pub general_category: Option<GeneralCategoryFn>,
    /// Combining class lookup.
    pub combining_class: Option<CombiningClassFn>,
    /// Mirroring lookup.
    pub mirroring: Option<MirroringFn>,
    /// Script lookup.
    pub script: Option<ScriptFn>,
}

impl UnicodeFuncs {
    /// Lookups backed by the Unicode Character Database.
    ///
    /// Unlike the defaults, combining classes are the real canonical
    /// combining classes instead of being derived from the general category.
    pub fn ucd() -> Self {
        UnicodeFuncs {
            combining_class: Some(ucd_combining_class),
            ..UnicodeFuncs::default()
        }
    }

    #[inline]
    pub(crate) fn general_category(&self, u: u32) -> GeneralCategory {
        self.general_category.unwrap_or(default_general_category)(u)
    }

    #[inline]
    pub(crate) fn combining_class(&self, u: u32) -> u8 {
        self.combining_class.unwrap_or(default_combining_class)(u)
    }

    #[inline]
    pub(crate) fn mirroring(&self, u: u32) -> Option<u32> {
        self.mirroring.unwrap_or(default_mirroring)(u)
    }

    #[inline]
    pub(crate) fn script(&self, u: u32) -> Script {
        self.script.unwrap_or(default_script)(u)
    }

    /// Default ignorables are the scalars of the `Format` category.
    #[inline]
    pub(crate) fn is_default_ignorable(&self, u: u32) -> bool {
        self.general_category(u) == GeneralCategory::Format
    }
}

/// The Unicode general category, `Unassigned` for non-scalar values
/// and `Surrogate` for lone surrogates.
pub fn default_general_category(u: u32) -> GeneralCategory {
    match char::from_u32(u) {
        Some(c) => c.general_category(),
        None if (0xD800..=0xDFFF).contains(&u) => GeneralCategory::Surrogate,
        None => GeneralCategory::Unassigned,
    }
}

/// A coarse combining class derived from the general category.
///
/// Nonspacing and enclosing marks are 230 (above), spacing marks are 220 (below),
/// everything else is 0 (not reordered).
pub fn default_combining_class(u: u32) -> u8 {
    match default_general_category(u) {
        GeneralCategory::NonspacingMark | GeneralCategory::EnclosingMark => {
            combining_class::ABOVE
        }
        GeneralCategory::SpacingMark => combining_class::BELOW,
        _ => combining_class::NOT_REORDERED,
    }
}

/// The Bidi_Mirroring_Glyph property.
pub fn default_mirroring(u: u32) -> Option<u32> {
    let c = char::from_u32(u)?;
    unicode_bidi_mirroring::get_mirrored(c).map(u32::from)
}

/// The Unicode Script property.
pub fn default_script(u: u32) -> Script {
    let Some(c) = char::from_u32(u) else {
        return script::UNKNOWN;
    };

    let name = c.script().short_name();
    Script::from_iso15924_tag(Tag::from_bytes_lossy(name.as_bytes())).unwrap_or(script::UNKNOWN)
}

/// The Canonical_Combining_Class property.
pub fn ucd_combining_class(u: u32) -> u8 {
    match char::from_u32(u) {
        Some(c) => unicode_ccc::get_canonical_combining_class(c) as u8,
        None => combining_class::NOT_REORDERED,
    }
}

/// Combining classes the built-in lookups produce.
pub mod combining_class {
    /// Base characters and anything that never reorders.
    pub const NOT_REORDERED: u8 = 0;
    /// Marks attached below the base.
    pub const BELOW: u8 = 220;
    /// Marks attached above the base.
    pub const ABOVE: u8 = 230;
}

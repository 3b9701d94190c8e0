use ttf_parser::{GlyphId, PlatformId};

// https://docs.microsoft.com/en-us/typography/opentype/spec/cmap#windows-platform-platform-id--3
const WINDOWS_SYMBOL_ENCODING: u16 = 0;
const WINDOWS_UNICODE_BMP_ENCODING: u16 = 1;
const WINDOWS_UNICODE_FULL_ENCODING: u16 = 10;

// https://docs.microsoft.com/en-us/typography/opentype/spec/name#platform-specific-encoding-and-language-ids-unicode-platform-platform-id--0
const UNICODE_1_0_ENCODING: u16 = 0;
const UNICODE_1_1_ENCODING: u16 = 1;
const UNICODE_ISO_ENCODING: u16 = 2;
const UNICODE_2_0_BMP_ENCODING: u16 = 3;
const UNICODE_2_0_FULL_ENCODING: u16 = 4;
const UNICODE_FULL_ENCODING: u16 = 6;

/// Glyph ink extents in font units.
///
/// `height` is negative for glyphs drawn above the baseline, like in HarfBuzz.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub struct GlyphExtents {
    /// Left side of the glyph relative to its origin.
    pub x_bearing: i32,
    /// Top side of the glyph relative to its origin.
    pub y_bearing: i32,
    /// Distance from the left to the right side.
    pub width: i32,
    /// Distance from the top to the bottom side.
    pub height: i32,
}

/// A font face handle.
///
/// Only what the buffer needs: nominal glyph mapping, advances, extents
/// and glyph names. Everything else is reachable through the underlying
/// [`ttf_parser::Face`].
#[derive(Clone)]
pub struct Face<'a> {
    ttfp_face: ttf_parser::Face<'a>,
    cmap_subtable: Option<u16>,
}

impl<'a> AsRef<ttf_parser::Face<'a>> for Face<'a> {
    #[inline]
    fn as_ref(&self) -> &ttf_parser::Face<'a> {
        &self.ttfp_face
    }
}

impl<'a> core::ops::Deref for Face<'a> {
    type Target = ttf_parser::Face<'a>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.ttfp_face
    }
}

impl<'a> Face<'a> {
    /// Creates a new `Face` from data.
    ///
    /// Data will be referenced, not owned.
    pub fn from_slice(data: &'a [u8], face_index: u32) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, face_index).ok()?;
        Some(Self::from_face(face))
    }

    /// Creates a new `Face` from [`ttf_parser::Face`].
    pub fn from_face(face: ttf_parser::Face<'a>) -> Self {
        Face {
            cmap_subtable: find_best_cmap_subtable(&face),
            ttfp_face: face,
        }
    }

    /// Maps a codepoint to its glyph using the best Unicode `cmap` subtable.
    pub fn nominal_glyph(&self, c: u32) -> Option<u32> {
        let subtable_idx = self.cmap_subtable?;
        let subtable = self.tables().cmap?.subtables.get(subtable_idx)?;

        // The Mac Roman subtable is only trusted for ASCII.
        if subtable.platform_id == PlatformId::Macintosh && c > 0x7F {
            return None;
        }

        if let Some(gid) = subtable.glyph_index(c) {
            return Some(u32::from(gid.0));
        }

        // Symbol fonts duplicate U+F000..U+F0FF at U+0000..U+00FF.
        if subtable.platform_id == PlatformId::Windows
            && subtable.encoding_id == WINDOWS_SYMBOL_ENCODING
            && c <= 0x00FF
        {
            return subtable.glyph_index(0xF000 + c).map(|gid| u32::from(gid.0));
        }

        None
    }

    /// Returns the horizontal advance of a glyph.
    ///
    /// Falls back to the em size when the face has no `hmtx` table.
    pub fn glyph_h_advance(&self, glyph: u32) -> i32 {
        let Some(glyph) = to_glyph_id(glyph) else {
            return 0;
        };

        if self.tables().hmtx.is_some() {
            i32::from(self.glyph_hor_advance(glyph).unwrap_or(0))
        } else {
            i32::from(self.units_per_em())
        }
    }

    /// Returns the vertical advance of a glyph.
    ///
    /// Negative, since the pen moves down in vertical text.
    /// Falls back to the ascender to descender distance when the face has no `vmtx` table.
    pub fn glyph_v_advance(&self, glyph: u32) -> i32 {
        let Some(glyph) = to_glyph_id(glyph) else {
            return 0;
        };

        let advance = if self.tables().vmtx.is_some() {
            i32::from(self.glyph_ver_advance(glyph).unwrap_or(0))
        } else {
            i32::from(self.ascender()) - i32::from(self.descender())
        };

        -advance
    }

    /// Returns the glyph extents from its bounding box.
    ///
    /// Empty or unknown glyphs have zero extents.
    pub fn glyph_extents(&self, glyph: u32) -> GlyphExtents {
        let bbox = to_glyph_id(glyph).and_then(|glyph| self.glyph_bounding_box(glyph));
        let Some(bbox) = bbox else {
            return GlyphExtents::default();
        };

        GlyphExtents {
            x_bearing: i32::from(bbox.x_min),
            y_bearing: i32::from(bbox.y_max),
            width: i32::from(bbox.x_max) - i32::from(bbox.x_min),
            height: i32::from(bbox.y_min) - i32::from(bbox.y_max),
        }
    }

    /// Returns the glyph name from the `post` or `CFF` table.
    pub fn glyph_name(&self, glyph: u32) -> Option<&str> {
        self.ttfp_face.glyph_name(to_glyph_id(glyph)?)
    }

    /// Finds a glyph by its name.
    ///
    /// A linear scan over all glyphs.
    pub fn glyph_from_name(&self, name: &str) -> Option<u32> {
        (0..self.number_of_glyphs())
            .find(|&id| self.ttfp_face.glyph_name(GlyphId(id)) == Some(name))
            .map(u32::from)
    }
}

impl core::fmt::Debug for Face<'_> {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt.debug_struct("Face")
            .field("number_of_glyphs", &self.number_of_glyphs())
            .field("units_per_em", &self.units_per_em())
            .finish()
    }
}

#[inline]
fn to_glyph_id(glyph: u32) -> Option<GlyphId> {
    u16::try_from(glyph).ok().map(GlyphId)
}

fn find_best_cmap_subtable(face: &ttf_parser::Face) -> Option<u16> {
    // Symbol first, then 32-bit, then 16-bit Unicode, then Mac Roman.
    const PREFERRED: &[(PlatformId, u16)] = &[
        (PlatformId::Windows, WINDOWS_SYMBOL_ENCODING),
        (PlatformId::Windows, WINDOWS_UNICODE_FULL_ENCODING),
        (PlatformId::Unicode, UNICODE_FULL_ENCODING),
        (PlatformId::Unicode, UNICODE_2_0_FULL_ENCODING),
        (PlatformId::Windows, WINDOWS_UNICODE_BMP_ENCODING),
        (PlatformId::Unicode, UNICODE_2_0_BMP_ENCODING),
        (PlatformId::Unicode, UNICODE_ISO_ENCODING),
        (PlatformId::Unicode, UNICODE_1_1_ENCODING),
        (PlatformId::Unicode, UNICODE_1_0_ENCODING),
        (PlatformId::Macintosh, 0),
    ];

    let subtables = face.tables().cmap?.subtables;
    PREFERRED.iter().find_map(|&(platform_id, encoding_id)| {
        subtables
            .into_iter()
            .position(|s| s.platform_id == platform_id && s.encoding_id == encoding_id)
            .map(|i| i as u16)
    })
}

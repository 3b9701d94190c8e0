/*!
`shapebuf` is a [harfbuzz](https://github.com/harfbuzz/harfbuzz)-style shaping buffer.

It holds the text handed to a shaping engine and the glyphs it produces:
UTF-8/16/32 ingestion with surrounding context, Unicode preprocessing
(default ignorable removal, mirroring, combining mark reordering),
cluster-aware reordering, glyph normalization, and the `hb-shape`
text and JSON serialization formats.

The shaping itself is delegated to a [`ShapingBackend`].

```
use shapebuf::{shape, Buffer, SerializeFlags, SerializeFormat};

let mut buffer = Buffer::new();
buffer.add_str("e\u{301}").unwrap();
buffer.apply_unicode_processing();
shape(&mut buffer, None, None).unwrap();

let text = buffer
    .serialize_glyphs(None, SerializeFormat::Text, SerializeFlags::default())
    .unwrap();
assert_eq!(text, "[gid101=0+0|gid769=1+0]");
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod cluster;
mod common;
mod deserialize;
mod error;
mod face;
mod normalize;
mod preprocess;
mod serialize;
mod shape;
mod text_parser;
pub mod unicode;

pub use ttf_parser;

pub use crate::buffer::{
    Buffer, BufferClusterLevel, BufferFlags, ContentType, GlyphFlags, GlyphInfo, GlyphPosition,
    CONTEXT_LENGTH,
};
pub use crate::common::{script, Direction, Language, Script, Tag};
pub use crate::error::Error;
pub use crate::face::{Face, GlyphExtents};
pub use crate::serialize::{SerializeFlags, SerializeFormat};
pub use crate::shape::{shape, NominalBackend, ShapeRequest, ShapedGlyph, ShapingBackend};
pub use crate::unicode::UnicodeFuncs;

use crate::Tag;

/// A byte cursor over ASCII-delimited text.
pub(crate) struct TextParser<'a> {
    pos: usize,
    text: &'a str,
}

impl<'a> TextParser<'a> {
    #[inline]
    pub fn new(text: &'a str) -> Self {
        TextParser { pos: 0, text }
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn curr_byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Consumes `c` if it is the current byte.
    pub fn consume_byte(&mut self, c: u8) -> Option<()> {
        if self.curr_byte()? != c {
            return None;
        }

        self.advance(1);
        Some(())
    }

    /// Consumes bytes while `f` returns `true` and returns them.
    ///
    /// Stops on the first non-ASCII byte only if `f` rejects it,
    /// so callers must not split a multibyte sequence.
    pub fn consume_bytes<F>(&mut self, f: F) -> &'a str
    where
        F: Fn(u8) -> bool,
    {
        let start = self.pos;
        self.skip_bytes(f);
        &self.text[start..self.pos]
    }

    pub fn skip_bytes<F>(&mut self, f: F)
    where
        F: Fn(u8) -> bool,
    {
        while let Some(c) = self.curr_byte() {
            if !f(c) {
                break;
            }

            self.advance(1);
        }
    }

    #[inline]
    pub fn skip_spaces(&mut self) {
        self.skip_bytes(|c| c.is_ascii_whitespace());
    }

    pub fn consume_tag(&mut self) -> Option<Tag> {
        let tag = self.consume_bytes(|c| c.is_ascii_alphanumeric() || c == b'_');
        if tag.len() > 4 {
            return None;
        }

        Some(Tag::from_bytes_lossy(tag.as_bytes()))
    }

    pub fn consume_i32(&mut self) -> Option<i32> {
        let start = self.pos;

        if matches!(self.curr_byte(), Some(b'-') | Some(b'+')) {
            self.advance(1);
        }

        self.skip_bytes(|c| c.is_ascii_digit());
        match self.text[start..self.pos].parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    pub fn consume_u32(&mut self) -> Option<u32> {
        let start = self.pos;
        self.skip_bytes(|c| c.is_ascii_digit());
        match self.text[start..self.pos].parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    pub fn consume_hex_u32(&mut self) -> Option<u32> {
        let start = self.pos;
        self.skip_bytes(|c| c.is_ascii_hexdigit());
        match u32::from_str_radix(&self.text[start..self.pos], 16) {
            Ok(n) => Some(n),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// Consumes `a,b`.
    pub fn consume_i32_pair(&mut self) -> Option<(i32, i32)> {
        let a = self.consume_i32()?;
        self.consume_byte(b',')?;
        let b = self.consume_i32()?;
        Some((a, b))
    }
}

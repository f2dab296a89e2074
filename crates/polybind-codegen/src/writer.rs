//! Tab-indented text buffer shared by the emitters.

/// Accumulates generated source one line at a time.
#[derive(Debug, Default, Clone)]
pub struct CodeWriter {
    buf: String,
    depth: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `text` at the current indentation, followed by a newline.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        for _ in 0..self.depth {
            self.buf.push('\t');
        }
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// Write verbatim, without indentation or newline.
    pub fn raw(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.buf.push_str(text.as_ref());
        self
    }

    /// Write `open`, then indent until the matching [`close`](Self::close).
    pub fn open(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.line(text);
        self.depth += 1;
        self
    }

    pub fn close(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self.line(text)
    }

    /// Close the current block and open a sibling, as in `} else {`.
    pub fn reopen(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.close(text);
        self.depth += 1;
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

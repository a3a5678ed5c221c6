//! I/O wrappers that report transferred bytes on a node.
//!
//! [`ProgressReader`] and [`ProgressWriter`] wrap any [`std::io::Read`] or
//! [`std::io::Write`] and advance a [`ProgressNode`] by every byte that goes through.
//! Typical uses are downloads (spawn a child with the content length, wrap the body) and
//! copying or hashing large files.
//!
//! Advancing is clamped like any other tick, so an inaccurate length never overshoots the bar.

use std::io::{self, Read, Write};

use crate::ProgressNode;

/// A wrapper around [`Read`] that advances a node by the bytes read.
pub struct ProgressReader<R> {
    inner: R,
    node: ProgressNode,
}

impl<R> ProgressReader<R> {
    /// Creates a new `ProgressReader` reporting on `node`.
    pub const fn new(inner: R, node: ProgressNode) -> Self {
        Self { inner, node }
    }

    /// Returns the node being advanced.
    pub const fn node(&self) -> &ProgressNode {
        &self.node
    }

    /// Unwraps the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.node.advance(n as u64);
        Ok(n)
    }
}

/// A wrapper around [`Write`] that advances a node by the bytes written.
pub struct ProgressWriter<W> {
    inner: W,
    node: ProgressNode,
}

impl<W> ProgressWriter<W> {
    /// Creates a new `ProgressWriter` reporting on `node`.
    pub const fn new(inner: W, node: ProgressNode) -> Self {
        Self { inner, node }
    }

    /// Returns the node being advanced.
    pub const fn node(&self) -> &ProgressNode {
        &self.node
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.node.advance(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read as _, Write as _};

    use super::{ProgressReader, ProgressWriter};
    use crate::ProgressNode;

    #[test]
    fn test_reader_advances_node() {
        let data = vec![0u8; 100];
        let root = ProgressNode::new("downloads");
        let file = root.spawn(100);
        let mut reader = ProgressReader::new(Cursor::new(&data), file.clone());

        let mut buf = [0u8; 10];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(file.current(), 10);

        io::copy(&mut reader, &mut io::sink()).unwrap();
        assert!(file.is_complete());
    }

    #[test]
    fn test_writer_is_clamped_by_total() {
        let file = ProgressNode::new("root").spawn(4);
        let mut writer = ProgressWriter::new(Vec::new(), file.clone());

        writer.write_all(&[1, 2, 3, 4, 5, 6]).unwrap();

        assert_eq!(writer.into_inner().len(), 6);
        assert_eq!(file.current(), 4, "The node never passes its total");
    }
}

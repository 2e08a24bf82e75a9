//! Wrapper trait for the readers the [InputScanner](crate::input_scanner::InputScanner) can consume.
//!
//! Requires that the reader implements [std::io::Read] and can be sent to the reader thread.
use std::fs::File;
use std::io;

/// Any reader that XMIT data can be scanned from.
///
/// Implemented for a buffered file reader, the [StdInReader](crate::stdin_reader::StdInReader)
/// and in-memory cursors, so that the same scanner works on files, pipes and test buffers.
pub trait BufferedReaderWrapper: io::Read + Send {}

impl BufferedReaderWrapper for io::BufReader<File> {}

impl BufferedReaderWrapper for io::Cursor<Vec<u8>> {}

impl<'a> BufferedReaderWrapper for io::Cursor<&'a [u8]> {}

impl<T> BufferedReaderWrapper for &mut T where T: BufferedReaderWrapper + ?Sized {}

impl<T> BufferedReaderWrapper for Box<T> where T: BufferedReaderWrapper + ?Sized {}

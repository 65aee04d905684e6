//! `futures-io` adapters for [`ByteBuffer`].

use std::future::poll_fn;
use std::io;
use std::pin::Pin;

use futures_io::{AsyncRead, AsyncWrite};

use crate::buffer::{ByteBuffer, MAX_READ};
use crate::error::BufferError;

impl ByteBuffer {
    /// Async form of [`read_from`](ByteBuffer::read_from).
    ///
    /// Stops after a read returns fewer bytes than were offered, or once more
    /// than [`MAX_READ`] bytes have been read in this call.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Io`] if the source fails. Bytes read before the
    /// failure stay in the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the source reports more bytes than it was offered.
    pub async fn read_from_async<R>(&mut self, r: &mut R) -> Result<u64, BufferError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut total = 0u64;
        loop {
            let mut fill = self.fill_spare();
            let offered = fill.offered();
            let m = loop {
                match poll_fn(|cx| Pin::new(&mut *r).poll_read(cx, fill.spare())).await {
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    res => break res?,
                }
            };
            fill.commit(m);

            total += m as u64;
            if m != offered || total > MAX_READ as u64 {
                return Ok(total);
            }
        }
    }

    /// Async form of [`write_to`](ByteBuffer::write_to): one write of the
    /// unread region, after which the buffer is reset.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::ShortWrite`] if the sink accepts fewer bytes
    /// than offered, or [`BufferError::Io`] if it fails.
    pub async fn write_to_async<W>(&mut self, w: &mut W) -> Result<u64, BufferError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if self.is_empty() {
            self.reset();
            return Ok(0);
        }

        let res = loop {
            match poll_fn(|cx| Pin::new(&mut *w).poll_write(cx, self.as_bytes())).await {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                res => break res,
            }
        };
        self.finish_write(res)
    }
}

use std::io;

/// Datagram pipe to a single server.
///
/// `recv` never blocks: `Ok(None)` means nothing is waiting this tick.
pub trait Transport {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize>;
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

//! In-memory transport for testing.

use tokio::io::{DuplexStream, duplex};

use crate::transport::Transport;

/// An in-memory, bidirectional byte channel.
///
/// # Example
///
/// ```
/// use transport::testing::MemoryTransport;
/// use transport::{Message, Request, split};
///
/// let (client, backend) = MemoryTransport::pair();
///
/// let (client_reader, client_writer) = split::<_, Message, Request>(client);
/// let (backend_reader, backend_writer) = split::<_, Request, Message>(backend);
/// ```
pub struct MemoryTransport {
    read: DuplexStream,
    write: DuplexStream,
}

impl MemoryTransport {
    /// Create a connected pair with 64KB of buffering in each direction.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_buffer_size(64 * 1024)
    }

    pub fn pair_with_buffer_size(buffer_size: usize) -> (Self, Self) {
        let (a_to_b_write, a_to_b_read) = duplex(buffer_size);
        let (b_to_a_write, b_to_a_read) = duplex(buffer_size);

        let transport_a = MemoryTransport {
            read: b_to_a_read,
            write: a_to_b_write,
        };

        let transport_b = MemoryTransport {
            read: a_to_b_read,
            write: b_to_a_write,
        };

        (transport_a, transport_b)
    }
}

impl Transport for MemoryTransport {
    type Read = DuplexStream;
    type Write = DuplexStream;

    fn into_split(self) -> (Self::Read, Self::Write) {
        (self.read, self.write)
    }
}

//! Client-side wire protocol
//!
//! Every message in either direction is `uint32_be(len) || payload`. There is
//! no type tag: each protocol step agrees out of band on what the payload
//! means (compiled command, `user_policy` handshake, `ACK`, response, or the
//! `query(exit)` sentinel).

mod codec;
mod errors;
mod transport;

pub use codec::{encode, read_frame, write_frame, ACK, EXIT_SENTINEL, HEADER_LEN};
pub use errors::{WireError, WireResult};
pub use transport::{
    Connector, FramedTransport, ProcessConnector, ProcessTransport, TcpConnector, TcpTransport,
    Transport,
};

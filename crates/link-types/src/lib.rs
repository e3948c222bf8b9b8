//! Domain types shared by the `ibc-link` relayer.
//!
//! These are host-independent representations of the IBC objects the
//! relayer reads from and writes to a pair of Tendermint chains: light
//! client state, connection and channel ends, packets, acknowledgments,
//! the messages of the client/connection/channel handshakes and the
//! events extracted from transaction logs.
//!
//! Wire encoding (protobuf) is deliberately out of scope: it is the
//! concern of a concrete chain transport, not of the relaying logic.

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod channel;
pub mod client;
pub mod commitment;
pub mod connection;
pub mod error;
pub mod events;
pub mod header;
pub mod height;
pub mod identifier;
pub mod msgs;
pub mod packet;
pub mod proofs;
pub mod signer;
pub mod timestamp;

pub use height::Height;
pub use timestamp::Timestamp;

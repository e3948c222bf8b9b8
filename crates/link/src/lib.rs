//! A pull-based IBC relayer core for a pair of Tendermint chains.
//!
//! The entry point is [`link::Link`]: a pair of [`endpoint::Endpoint`]s
//! over two [`chain::ChainHandle`]s. A link is created either by
//! adopting an already-open connection pair
//! ([`link::Link::create_with_existing_connections`]) or by
//! bootstrapping clients and a fresh connection
//! ([`link::Link::create_with_new_connections`]); it can then open
//! channels and run the bidirectional relay pipeline one iteration at a
//! time via [`link::Link::check_and_relay_packets_and_acks`], threading
//! a [`cursor::RelayedHeights`] through iterations.
//!
//! The relayer keeps no durable state of its own: everything it needs
//! lives on the two chains, and the cursor is a discardable
//! optimization.

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod chain;
pub mod config;
pub mod cursor;
pub mod endpoint;
pub mod error;
pub mod link;
pub mod proof;

pub use crate::cursor::RelayedHeights;
pub use crate::endpoint::Endpoint;
pub use crate::link::{ChannelPair, Link, Side};

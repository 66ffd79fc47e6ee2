//! # A2S Query Client
//!
//! Minimal client for the Source engine server query protocol, limited to the
//! `A2S_INFO` request used to read a server's name, map, player count and
//! keywords.
//!
//! ## Module Organization
//!
//! ### Packet Module (`packet`)
//! Wire format of the exchange:
//! - Request encoding, with and without a challenge
//! - Response classification (info, challenge, split)
//! - `A2S_INFO` payload decoding including the extra data block
//!
//! ### Network Module (`network`)
//! UDP transport:
//! - One socket per query, bound to an ephemeral port
//! - Challenge handshake
//! - Overall deadline covering every round trip
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use a2s::A2sClient;
//! use std::time::Duration;
//!
//! let client = A2sClient::new();
//! let info = client.query_info("127.0.0.1:27016", Duration::from_secs(3), 1400).await?;
//! println!("{} players on {}", info.players, info.map);
//! ```

pub mod network;
pub mod packet;

pub use network::A2sClient;
pub use packet::QueryError;

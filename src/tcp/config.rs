//! Tunables for the sender/receiver pair. Kept as `pub const`s the way the
//! teacher keeps `MTU`/`TTL`/`ISS`/`WINDOW_SIZE` in `connection.rs`, rather
//! than behind a config file or env vars. The hard core takes no
//! persisted configuration (see the crate's error-handling design notes).

/// Largest receive window a [`crate::tcp::message::TCPReceiverMessage`] can advertise.
pub const MAX_RWND: u16 = u16::MAX;

/// Largest payload a single outbound segment carries.
pub const MAX_PAYLOAD_SIZE: usize = 1452;

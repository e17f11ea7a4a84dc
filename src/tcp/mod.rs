//! The split sender/receiver pair that drives a TCP connection's byte
//! streams. There is no unified TCB here; see `receiver` and `sender`.

pub mod config;
pub mod message;
pub mod receiver;
pub mod sender;
pub mod timer;

pub use message::{TcpReceiverMessage, TcpSenderMessage};
pub use receiver::TcpReceiver;
pub use sender::TcpSender;

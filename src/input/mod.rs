pub mod commands;
pub mod listener;
pub mod packet;
pub mod replay;
pub mod socket_io;
pub mod status_poller;

pub use commands::{Command, CommandReader};
pub use listener::TransportListener;
pub use replay::EventReplay;
pub use socket_io::{SocketIoClient, TransportEvent};
pub use status_poller::StatusPoller;

pub mod protocol;
pub mod replay;
pub mod session;
pub mod transport;

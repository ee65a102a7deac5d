pub mod clock;
pub mod config;
pub mod device;
pub mod error;
pub mod tcp;

#[cfg(test)]
mod test;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use device::{Device, Tun};
pub use error::Error;
pub use tcp::Endpoint;

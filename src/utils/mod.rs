pub mod ip;

pub use ip::{client_ip, forwarded_ip, UNKNOWN_IP};

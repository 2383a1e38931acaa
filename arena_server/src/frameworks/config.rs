use std::{env, time::Duration};

// Runtime/server settings (gameplay tuning lives in `domain::tuning`).

pub fn http_host() -> [u8; 4] {
    env::var("ARENA_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse::<std::net::Ipv4Addr>().ok())
        .map(|ip| ip.octets())
        .unwrap_or([127, 0, 0, 1])
}

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    let millis = env::var("ARENA_TICK_INTERVAL_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(16);
    Duration::from_millis(millis)
}

pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;
pub const EVENT_BROADCAST_CAPACITY: usize = 1024;
pub const FRAME_BROADCAST_CAPACITY: usize = 1024;

// Applies to the dial, the client's handshake and the server's wait for it.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

// Interface adapters: wire protocol, network handling and the client session.

pub mod clients;
pub mod http;
pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;

pub mod aggregate;
pub mod archives;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod game_cache;
pub mod games_fetch;
pub mod http_client;
pub mod openings;
pub mod session;

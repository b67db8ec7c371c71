//! Domain entities and the ports they are persisted through.

pub mod card;
pub mod ports;
pub mod user;

//! Boundary adapters: how external collaborators talk to the core.

pub mod csv;

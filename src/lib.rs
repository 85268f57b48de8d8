//! Client core for the 3dflat property browser: listing search and filters,
//! the embedded 3D model viewer, the backend API, and the stored session.

pub mod api;
pub mod bookings;
pub mod config;
pub mod filter;
pub mod host;
pub mod models;
pub mod session;
pub mod viewer;

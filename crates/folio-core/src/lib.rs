//! Core of a paged document viewer driven by a directional remote.
//!
//! Two engines do the real work: [`cache::AssetCache`] acquires the best
//! available encoding of each page, and [`navigation::Navigator`] interprets
//! the remote's arrows, OK and Back according to the current mode. The
//! [`viewer::Viewer`] wires them together behind an [`gate::InputGate`].

pub mod cache;
pub mod candidates;
pub mod config;
pub mod controller;
pub mod error;
pub mod focus;
pub mod gate;
pub mod loader;
pub mod models;
pub mod navigation;
pub mod normalize;
pub mod storage;
pub mod text_field;
pub mod viewer;

#[cfg(test)]
mod testing;

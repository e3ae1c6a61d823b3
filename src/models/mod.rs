//! Data models for the PawHaven platform.
//!
//! JSON field names are camelCase so stored collections stay readable by the
//! web and mobile clients.

mod adoption;
mod application;
mod donation;
mod event;
mod facility;
mod foster;
mod health;
mod inventory;
mod pet;
mod preferences;
mod profile;
mod vaccination;
mod volunteer;
mod weather;

pub use adoption::*;
pub use application::*;
pub use donation::*;
pub use event::*;
pub use facility::*;
pub use foster::*;
pub use health::*;
pub use inventory::*;
pub use pet::*;
pub use preferences::*;
pub use profile::*;
pub use vaccination::*;
pub use volunteer::*;
pub use weather::*;

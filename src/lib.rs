//! Radial force layout and gesture interaction for categorized skill graphs.
//!
//! Skills sit in angular sectors by primary tag and on radial rings by
//! difficulty. [`engine::RadialEngine`] ties the pieces together for a host
//! view: it seeds and runs the force simulation, interprets pointer streams
//! as pan, pinch, drag or tap, and reports taps through
//! [`engine::InteractionHandler`].

pub mod config;
pub mod engine;
pub mod gesture;
pub mod hit_test;
pub mod layout;
pub mod model;
pub mod physics;
pub mod scale;
pub mod snapshot;
pub mod transform;

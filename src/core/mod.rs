//! Client-side models of the floating chat widget.
//!
//! These carry no rendering; a UI layer feeds them pointer events and viewport sizes and draws
//! whatever state they report.

pub mod chat;
pub mod placement;
pub mod traits;
pub mod widget;

//! Terminal UI layer for interactive sessions.
//!
//! - [`chat_loop`]: the interaction loop that dispatches user input to
//!   [`crate::commands`] and coordinates streaming via
//!   [`crate::core::chat_stream`].
//! - [`renderer`]: frame composition for the two-tab view.
//!
//! Ownership boundary: this layer presents and captures interaction state,
//! while [`crate::core`] owns domain logic and daemon coordination.

pub mod chat_loop;
pub mod renderer;

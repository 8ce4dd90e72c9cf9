//! Rendering capability and renderable values
//!
//! Sinks never format records themselves: they ask a [`RenderCapability`]
//! for either a plain line or a styled [`Renderable`], then draw that on
//! their own surface.

pub mod capability;
pub mod renderable;
pub mod style;

pub use capability::{RenderCapability, TextRenderer};
pub use renderable::{Align, Line, Renderable, Rule, Span};
pub use style::Style;

//! Template renderer.
//!
//! Interprets the instruction list of a compiled
//! [`Template`][`crate::Template`] against a [`Scope`][`crate::Scope`],
//! delegating every stored fragment to an [`Evaluator`][`crate::Evaluator`].
//! The scope is never mutated; bindings made by loops and statements live
//! in a [`Stack`][`stack::Stack`] of frames laid over it.

mod pipe;
mod renderer;
mod stack;

pub use renderer::Renderer;

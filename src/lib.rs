//! This library crate contains everything needed to run the `users` and `orders` services.
//!
//! Submodules have been introduced to split responsibilities. They form a chain of dependencies from
//! the low-level, project agnostic [`library`], over the [`domain`] specific logic (entities, events,
//! the consistency cache and the dependency validation policy), through the executable [`harness`],
//! up to the high-level [`modules`](module) which bundle everything into runnable services.

#![warn(missing_docs)]

pub mod constants;
pub mod domain;
pub mod harness;
pub mod library;
pub mod module;

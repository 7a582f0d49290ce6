#![warn(missing_docs)]

//! Typed AST surface consumed by the monitor synthesis pipeline.
//!
//! This crate does not parse HPL's concrete syntax. It defines the
//! capability interface ([`predicate::Predicate`], [`event::Event`],
//! [`property::Property`]) that the pattern builder in `monitor-core`
//! consumes, plus a synthetic constructor API ([`builder`]) for assembling
//! properties directly in Rust.

pub mod builder;
pub mod error;
pub mod event;
pub mod predicate;
pub mod property;
pub mod spec_format;

pub use error::PredicateError;
pub use event::{Event, SimpleEvent};
pub use predicate::{Bindings, Message, Predicate};
pub use property::{Pattern, PatternKind, Property, Scope};
pub use spec_format::load_properties_from_str;

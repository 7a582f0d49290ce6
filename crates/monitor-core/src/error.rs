//! Errors raised while lowering a property into a [`crate::spec::MonitorSpec`].

use thiserror::Error;

/// Errors the pattern builder can raise. Construction errors are fatal for
/// the affected property: no spec is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The property's pattern kind was not one the builder knows how to
    /// lower. With the typed [`hpl_ast::Pattern`] this is structurally
    /// unreachable today; it is reserved for a future AST implementation
    /// backed by a real HPL parser, where a malformed pattern tag could
    /// reach the builder before being validated.
    #[error("unknown pattern kind")]
    UnknownPattern,
    /// The property's scope was not one the builder knows how to lower. See
    /// [`Error::UnknownPattern`] for why this variant exists despite being
    /// unreachable via the typed AST.
    #[error("unknown scope kind")]
    UnknownScope,
    /// A requirement/response/prevention pattern had no trigger event.
    #[error("pattern requires a trigger event but none was given")]
    MissingTrigger,
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

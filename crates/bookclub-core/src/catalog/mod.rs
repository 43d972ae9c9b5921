//! Static catalog for the book club store.
//!
//! The catalog names every table and view, records which tables use soft
//! delete, and lists the relations and unique constraints the store enforces.
//! Everything here is resolved at compile time; there is no runtime schema.

mod constraint;
mod kind;
mod relation;
mod view;

pub use constraint::{UniqueDef, UNIQUE_CONSTRAINTS};
pub use kind::{DeletePolicy, EntityKind, LinkKind, UnknownName};
pub use relation::{relations_from, relations_to, DeleteBehavior, RelationDef, RELATIONS};
pub use view::{Target, ViewKind};

//! xson: typed JSON object model.
//!
//! A flyweight schema system ([`template`]) shared read-only across any
//! number of mutable document instances ([`instance`]), with optional
//! delegation of slots to external business objects ([`binding`]),
//! per-context mutation tracking ([`changelog`]), RFC 6901 pointer
//! resolution ([`pointer`]), RFC 6902 patch construction and application
//! ([`patch`]), and full-document JSON encode/decode ([`ser`]).
//!
//! The intended flow: a request handler creates or loads a [`Json`] from an
//! `Arc<Schema>`, mutates it through the typed accessors (possibly backed
//! by data objects), and at the end of the cycle flushes the [`ChangeLog`]
//! into a patch set for the connected client. Inbound patches resolve
//! through [`pointer::evaluate`] and apply with recording suppressed so
//! they are not bounced back.

pub mod template;
pub mod value;
pub mod binding;
pub mod instance;
pub mod changelog;
pub mod pointer;
pub mod patch;
pub mod ser;

pub use template::{Bind, Kind, Schema, SchemaBuilder, SchemaError, Template, TemplateId};
pub use value::ScalarValue;
pub use binding::{BindingError, DataObject};
pub use instance::{Json, NodeId};
pub use changelog::{Change, ChangeLog, ChangeType, ViewModelVersion};
pub use pointer::{evaluate, index_path_for, PointerError, Target};
pub use patch::{
    apply_patches, build_patch, create_patches, patch_to_string, PatchError, PatchOp, PatchOpKind,
};
pub use ser::{populate_from_json, populate_value, to_json, to_json_value, PopulateError, PopulateMode};

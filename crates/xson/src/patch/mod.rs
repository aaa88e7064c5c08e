//! JSON Patch synchronization (RFC 6902 subset).
//!
//! Outgoing: [`create_patches`] converts the change log into an ordered
//! patch set addressed with RFC 6901 pointers. Incoming: [`apply_patches`]
//! resolves each operation's path against the document and writes through
//! the binding-aware setters, optionally with change recording suppressed
//! so the patch is not echoed back to its originator.

pub mod types;
pub mod build;
pub mod apply;

pub use types::{
    from_json, from_json_patch, patch_to_string, to_json, to_json_patch, PatchError, PatchOp,
    PatchOpKind,
};
pub use build::{build_patch, create_patches};
pub use apply::{apply_op, apply_patches};

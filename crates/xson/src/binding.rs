//! Data binding: delegating slot reads and writes to an external business
//! object.
//!
//! A bound template never consults its raw slot; the attached data object is
//! authoritative. Which property a template is bound to is resolved once at
//! schema freeze (see [`Template::effective_bind`]), never per call.
//!
//! [`Template::effective_bind`]: crate::template::Template::effective_bind

use std::fmt;

use thiserror::Error;

use crate::value::ScalarValue;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BindingError {
    #[error("PROPERTY_MISSING: '{property}' not found on the data object bound to '{template}'")]
    PropertyMissing { property: String, template: String },
    #[error("NO_DATA_OBJECT: '{template}' is bound but its instance has no data object attached")]
    NoDataObject { template: String },
    #[error("BINDING_KIND_MISMATCH: data property '{property}' is {found} where '{template}' expects {expected}")]
    KindMismatch {
        property: String,
        template: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A business object that exposes named scalar properties.
///
/// Anything that can answer "get/set the property named X" can back a bound
/// template; `get_property` returns `None` for properties the object does
/// not have, and `set_property` returns `false` when the property is missing
/// or not writable.
pub trait DataObject: fmt::Debug {
    fn get_property(&self, name: &str) -> Option<ScalarValue>;
    fn set_property(&mut self, name: &str, value: ScalarValue) -> bool;
}

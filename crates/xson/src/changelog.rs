//! Change tracking.
//!
//! A [`ChangeLog`] is a plain owned value scoped to one logical context (a
//! request or a session). Mutating calls on a document take the log as an
//! explicit argument; there is no ambient or thread-local log, so two
//! sessions are isolated simply by owning two logs. Passing `None` where a
//! log is expected suppresses recording, which is how an applied inbound
//! patch avoids being echoed back to the client that sent it.

use crate::instance::NodeId;
use crate::template::TemplateId;

/// What happened to a slot or an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Update,
    Add,
    Remove,
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// The instance whose slot changed, or the array instance for
    /// `Add`/`Remove`.
    pub instance: NodeId,
    pub template: TemplateId,
    pub op: ChangeType,
    /// Element position: the insertion index for `Add`, the pre-removal
    /// index for `Remove`.
    pub index: Option<usize>,
    /// The inserted element, for `Add` records; lets the patch builder
    /// serialize the element even after later mutations shift its position.
    pub item: Option<NodeId>,
}

/// Client/server version counters for the patch handshake.
///
/// When attached to a log, every generated patch set leads with a `replace`
/// of the local version (bumped per flush) and a `test` of the last version
/// seen from the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModelVersion {
    pub local_property: String,
    pub remote_property: String,
    pub local: i64,
    pub remote: i64,
}

impl ViewModelVersion {
    pub fn new(local_property: impl Into<String>, remote_property: impl Into<String>) -> Self {
        ViewModelVersion {
            local_property: local_property.into(),
            remote_property: remote_property.into(),
            local: 0,
            remote: 0,
        }
    }
}

/// Ordered record of mutations since the last flush.
#[derive(Debug, Default)]
pub struct ChangeLog {
    changes: Vec<Change>,
    version: Option<ViewModelVersion>,
}

impl ChangeLog {
    pub fn new() -> Self {
        ChangeLog::default()
    }

    pub fn with_version(version: ViewModelVersion) -> Self {
        ChangeLog {
            changes: Vec::new(),
            version: Some(version),
        }
    }

    /// Record a slot update. Idempotent per (instance, template) within one
    /// flush cycle: a slot dirtied twice still yields a single record, the
    /// value being read at patch-build time anyway.
    pub fn update_value(&mut self, instance: NodeId, template: TemplateId) {
        let already = self.changes.iter().any(|c| {
            c.op == ChangeType::Update && c.instance == instance && c.template == template
        });
        if already {
            return;
        }
        self.changes.push(Change {
            instance,
            template,
            op: ChangeType::Update,
            index: None,
            item: None,
        });
    }

    /// Record an element insertion at `index`.
    pub fn add_item_in_list(
        &mut self,
        array: NodeId,
        template: TemplateId,
        index: usize,
        item: NodeId,
    ) {
        self.changes.push(Change {
            instance: array,
            template,
            op: ChangeType::Add,
            index: Some(index),
            item: Some(item),
        });
    }

    /// Record an element removal at its pre-removal `index`.
    pub fn remove_item_in_list(&mut self, array: NodeId, template: TemplateId, index: usize) {
        self.changes.push(Change {
            instance: array,
            template,
            op: ChangeType::Remove,
            index: Some(index),
            item: None,
        });
    }

    /// Return all records in order and clear the log. Record order is the
    /// mutation order; array records are only meaningful in that order.
    pub fn flush(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn version(&self) -> Option<&ViewModelVersion> {
        self.version.as_ref()
    }

    pub fn version_mut(&mut self) -> Option<&mut ViewModelVersion> {
        self.version.as_mut()
    }
}

//! # Modal Contract
//!
//! Commands that need user input open a modal through the host and await
//! its outcome. The editor treats the modal as an opaque async boundary:
//! nothing is committed while it is open, and a cancelled modal commits
//! nothing at all.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::{ready, Future};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalKind {
    Link,
    Image,
    Source,
}

impl fmt::Display for ModalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModalKind::Link => write!(f, "link"),
            ModalKind::Image => write!(f, "image"),
            ModalKind::Source => write!(f, "source"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkForm {
    pub url: String,
    pub text: String,
    pub title: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageForm {
    pub src: String,
    pub alt: String,
    pub width: String,
    pub height: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceForm {
    pub source: String,
}

/// Form values going into (defaults) or coming out of (submission) a modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModalForm {
    Link(LinkForm),
    Image(ImageForm),
    Source(SourceForm),
}

impl ModalForm {
    pub fn kind(&self) -> ModalKind {
        match self {
            ModalForm::Link(_) => ModalKind::Link,
            ModalForm::Image(_) => ModalKind::Image,
            ModalForm::Source(_) => ModalKind::Source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalOutcome {
    Submitted(ModalForm),
    Cancelled,
}

/// An open dialog
pub trait Modal {
    /// Show the dialog prefilled with `defaults` and wait for the user
    fn show(self, defaults: ModalForm) -> impl Future<Output = ModalOutcome>;
}

/// Creates dialogs on behalf of commands
pub trait ModalHost {
    type Modal: Modal;

    fn create_modal(&mut self, kind: ModalKind) -> Self::Modal;
}

/// Host without dialogs: every modal is cancelled immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoModals;

pub struct CancelledModal;

impl Modal for CancelledModal {
    fn show(self, _defaults: ModalForm) -> impl Future<Output = ModalOutcome> {
        ready(ModalOutcome::Cancelled)
    }
}

impl ModalHost for NoModals {
    type Modal = CancelledModal;

    fn create_modal(&mut self, _kind: ModalKind) -> Self::Modal {
        CancelledModal
    }
}

/// Host that answers modals from a queue of prepared outcomes, recording
/// the defaults each modal was shown with. Used by scripted sessions and
/// the browser bridge, where the answer is known before dispatch.
#[derive(Debug, Default, Clone)]
pub struct ScriptedModals {
    responses: Rc<RefCell<VecDeque<ModalOutcome>>>,
    shown: Rc<RefCell<Vec<ModalForm>>>,
}

impl ScriptedModals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, outcome: ModalOutcome) {
        self.responses.borrow_mut().push_back(outcome);
    }

    /// Defaults of every modal shown so far
    pub fn shown(&self) -> Vec<ModalForm> {
        self.shown.borrow().clone()
    }

    pub fn pending(&self) -> usize {
        self.responses.borrow().len()
    }
}

pub struct ScriptedModal {
    kind: ModalKind,
    responses: Rc<RefCell<VecDeque<ModalOutcome>>>,
    shown: Rc<RefCell<Vec<ModalForm>>>,
}

impl ScriptedModal {
    pub fn kind(&self) -> ModalKind {
        self.kind
    }
}

impl Modal for ScriptedModal {
    fn show(self, defaults: ModalForm) -> impl Future<Output = ModalOutcome> {
        self.shown.borrow_mut().push(defaults);
        let outcome = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(ModalOutcome::Cancelled);
        ready(outcome)
    }
}

impl ModalHost for ScriptedModals {
    type Modal = ScriptedModal;

    fn create_modal(&mut self, kind: ModalKind) -> Self::Modal {
        ScriptedModal {
            kind,
            responses: Rc::clone(&self.responses),
            shown: Rc::clone(&self.shown),
        }
    }
}

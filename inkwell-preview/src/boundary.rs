//! Host-side bookkeeping for preview boundaries.
//!
//! A boundary is one isolated iframe document. The host keeps at most one
//! per slot; mounting into an occupied slot tears the old one down, which
//! closes every report subscription it had so nothing from a superseded
//! boundary can reach the host.

use crate::document::DocumentOptions;
use crate::error::PreviewResult;
use crate::realm::{self, PreflightOutcome};
use crate::{prepare, PreparedPreview};
use inkwell_ui::render::escape_html;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// `type` of the message a boundary posts to its parent on failure.
pub const BOUNDARY_ERROR_MESSAGE: &str = "inkwell-boundary-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryId(Uuid);

impl BoundaryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BoundaryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where in the boundary's life a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPhase {
    /// Transpilation or parsing.
    Compile,
    /// Evaluating the module body.
    Module,
    /// No entry component could be found.
    Entry,
    /// Mounting or rendering, including errors thrown after mount.
    Render,
    /// Unhandled promise rejection.
    Async,
    /// `console.error` output.
    Console,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryReport {
    pub boundary: BoundaryId,
    pub phase: BoundaryPhase,
    pub message: String,
}

impl BoundaryReport {
    /// Reads a message posted by a boundary; anything else yields `None`.
    pub fn from_message(value: &serde_json::Value) -> Option<Self> {
        if value.get("type")?.as_str()? != BOUNDARY_ERROR_MESSAGE {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

/// Capabilities a boundary may be granted. Top-level navigation is not one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxCapability {
    Forms,
    Modals,
    Popups,
    Presentation,
    SameOrigin,
    Scripts,
}

impl SandboxCapability {
    pub fn token(self) -> &'static str {
        match self {
            SandboxCapability::Forms => "allow-forms",
            SandboxCapability::Modals => "allow-modals",
            SandboxCapability::Popups => "allow-popups",
            SandboxCapability::Presentation => "allow-presentation",
            SandboxCapability::SameOrigin => "allow-same-origin",
            SandboxCapability::Scripts => "allow-scripts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    capabilities: Vec<SandboxCapability>,
}

impl SandboxPolicy {
    /// The allowlist every preview boundary runs with.
    pub fn preview() -> Self {
        Self {
            capabilities: vec![
                SandboxCapability::Forms,
                SandboxCapability::Modals,
                SandboxCapability::Popups,
                SandboxCapability::Presentation,
                SandboxCapability::SameOrigin,
                SandboxCapability::Scripts,
            ],
        }
    }

    pub fn allows(&self, capability: SandboxCapability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Value of the iframe `sandbox` attribute.
    pub fn attribute(&self) -> String {
        self.capabilities
            .iter()
            .map(|c| c.token())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::preview()
    }
}

/// Single-slot register for the entry component of one boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySlot(Option<String>);

impl EntrySlot {
    pub fn reset(&mut self) {
        self.0 = None;
    }

    pub fn bind(&mut self, name: impl Into<String>) {
        self.0 = Some(name.into());
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.0.is_some()
    }
}

pub struct Boundary {
    id: BoundaryId,
    prepared: PreparedPreview,
    entry: EntrySlot,
    listeners: Vec<UnboundedSender<BoundaryReport>>,
}

impl Boundary {
    pub fn id(&self) -> BoundaryId {
        self.id
    }

    pub fn prepared(&self) -> &PreparedPreview {
        &self.prepared
    }

    pub fn document(&self) -> &str {
        &self.prepared.document
    }

    pub fn entry(&self) -> &EntrySlot {
        &self.entry
    }

    fn broadcast(&mut self, report: &BoundaryReport) {
        self.listeners.retain(|tx| tx.send(report.clone()).is_ok());
    }
}

#[derive(Default)]
pub struct BoundaryHost {
    slots: HashMap<String, Boundary>,
    policy: SandboxPolicy,
    options: DocumentOptions,
}

impl BoundaryHost {
    pub fn new(options: DocumentOptions) -> Self {
        Self {
            slots: HashMap::new(),
            policy: SandboxPolicy::preview(),
            options,
        }
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    /// Prepares `code` into a fresh boundary in `slot`, replacing any boundary
    /// already there.
    pub fn mount(&mut self, slot: &str, code: Option<&str>) -> BoundaryId {
        self.close(slot);
        let id = BoundaryId::new();
        let options = self.options.clone().with_boundary(id);
        let prepared = prepare(code, &options);
        tracing::debug!(slot, boundary = %id, shape = ?prepared.shape, "mounted preview boundary");
        self.slots.insert(
            slot.to_string(),
            Boundary {
                id,
                prepared,
                entry: EntrySlot::default(),
                listeners: Vec::new(),
            },
        );
        id
    }

    /// Tears down the boundary in `slot`, closing its subscriptions.
    pub fn close(&mut self, slot: &str) -> bool {
        match self.slots.remove(slot) {
            Some(old) => {
                tracing::debug!(slot, boundary = %old.id, "closed preview boundary");
                true
            }
            None => false,
        }
    }

    pub fn boundary(&self, slot: &str) -> Option<&Boundary> {
        self.slots.get(slot)
    }

    fn find_mut(&mut self, id: BoundaryId) -> Option<&mut Boundary> {
        self.slots.values_mut().find(|b| b.id == id)
    }

    /// Registers a report listener. `None` when the boundary is gone.
    pub fn subscribe(&mut self, id: BoundaryId) -> Option<UnboundedReceiver<BoundaryReport>> {
        let boundary = self.find_mut(id)?;
        let (tx, rx) = unbounded_channel();
        boundary.listeners.push(tx);
        Some(rx)
    }

    pub fn listener_count(&self, id: BoundaryId) -> usize {
        self.slots
            .values()
            .find(|b| b.id == id)
            .map_or(0, |b| b.listeners.len())
    }

    /// Routes a report to the listeners of its boundary. Reports for unknown
    /// or superseded boundaries are dropped and `false` is returned.
    pub fn deliver(&mut self, report: BoundaryReport) -> bool {
        match self.find_mut(report.boundary) {
            Some(boundary) => {
                boundary.broadcast(&report);
                true
            }
            None => {
                tracing::warn!(boundary = %report.boundary, phase = ?report.phase, "dropped report from superseded boundary");
                false
            }
        }
    }

    /// Runs the headless preflight for the component in `slot`.
    ///
    /// The entry slot is reset first and bound when the component mounts.
    /// Failures go to the boundary's listeners. `None` when the slot is empty
    /// or holds something other than a component.
    pub fn preflight(
        &mut self,
        slot: &str,
        timeout: Duration,
    ) -> Option<PreviewResult<PreflightOutcome>> {
        let boundary = self.slots.get_mut(slot)?;
        let code = boundary.prepared.neutralized.as_ref()?;
        boundary.entry.reset();

        let outcome = realm::preflight_neutralized(code, timeout);
        match &outcome {
            Ok(PreflightOutcome::Mounted { entry, .. }) => boundary.entry.bind(entry.clone()),
            Ok(failure) => {
                if let Some(report) = failure.report(boundary.id) {
                    boundary.broadcast(&report);
                }
            }
            Err(e) => tracing::warn!(slot, error = %e, "preflight could not run"),
        }
        Some(outcome)
    }

    /// `<iframe>` markup for the boundary in `slot`.
    pub fn iframe_markup(&self, slot: &str) -> Option<String> {
        let boundary = self.slots.get(slot)?;
        Some(format!(
            r#"<iframe title="Preview" data-boundary="{}" sandbox="{}" srcdoc="{}" style="width:100%;height:100%;border:0"></iframe>"#,
            boundary.id,
            self.policy.attribute(),
            escape_html(boundary.document())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::error::TryRecvError;

    #[test]
    fn policy_attribute_lists_allowlist() {
        assert_eq!(
            SandboxPolicy::preview().attribute(),
            "allow-forms allow-modals allow-popups allow-presentation allow-same-origin allow-scripts"
        );
    }

    #[test]
    fn report_reads_posted_message() {
        let id = BoundaryId::new();
        let msg = json!({
            "type": BOUNDARY_ERROR_MESSAGE,
            "boundary": id.to_string(),
            "phase": "compile",
            "message": "Unexpected token"
        });
        let report = BoundaryReport::from_message(&msg).unwrap();
        assert_eq!(report.boundary, id);
        assert_eq!(report.phase, BoundaryPhase::Compile);
    }

    #[test]
    fn foreign_messages_are_ignored() {
        assert_eq!(BoundaryReport::from_message(&json!({"type": "other"})), None);
        assert_eq!(BoundaryReport::from_message(&json!("text")), None);
    }

    #[test]
    fn entry_slot_starts_empty() {
        let mut slot = EntrySlot::default();
        assert!(!slot.is_bound());
        slot.bind("App");
        assert_eq!(slot.get(), Some("App"));
        slot.reset();
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn remount_closes_old_subscriptions() {
        let mut host = BoundaryHost::default();
        let first = host.mount("main", Some("<div>one</div>"));
        let mut rx = host.subscribe(first).unwrap();
        assert_eq!(host.listener_count(first), 1);

        let second = host.mount("main", Some("<div>two</div>"));
        assert_ne!(first, second);
        assert_eq!(host.listener_count(first), 0);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Disconnected));

        let stale = BoundaryReport {
            boundary: first,
            phase: BoundaryPhase::Render,
            message: "late".into(),
        };
        assert!(!host.deliver(stale));
    }

    #[test]
    fn iframe_markup_escapes_document() {
        let mut host = BoundaryHost::default();
        host.mount("main", Some("<p class=\"x\">hi</p>"));
        let markup = host.iframe_markup("main").unwrap();
        assert!(markup.contains("sandbox=\"allow-forms"));
        assert!(markup.contains("&lt;p class=&quot;x&quot;&gt;hi&lt;/p&gt;"));
    }
}

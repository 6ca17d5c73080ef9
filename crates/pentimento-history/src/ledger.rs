#![forbid(unsafe_code)]

//! The history ledger: dual bounded stacks plus the capture lifecycle.
//!
//! One ledger serves one document. It owns the open [`CaptureSession`] (at
//! most one at a time), the undo stack with its byte budget and entry cap,
//! and the redo stack that any new commit invalidates. The host wires in a
//! [`Renderer`] and an [`EventSink`] at construction; the repository is
//! passed per call so the ledger never holds a borrow across host work.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, warn};

use pentimento_raster::{LayerId, LayerRepository, PixelBuffer, PixelRegion};

use crate::events::{EventSink, HistoryEvent, HistoryStatus, NullRenderer, NullSink, Renderer};
use crate::eviction::{BudgetedDeque, ByteCost};
use crate::patch::{HistoryEntry, RasterPatch};
use crate::session::CaptureSession;

const BYTES_PER_MIB: usize = 1024 * 1024;

/// Capacity limits for a ledger. `0` disables the corresponding limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum entries on the undo stack.
    pub max_entries: usize,
    /// Byte budget for the undo stack.
    pub max_memory_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_memory_bytes: 64 * BYTES_PER_MIB,
        }
    }
}

impl HistoryConfig {
    /// Create a config with explicit limits (`0` = unlimited).
    #[must_use]
    pub const fn new(max_entries: usize, max_memory_bytes: usize) -> Self {
        Self {
            max_entries,
            max_memory_bytes,
        }
    }

    /// A config with no limits at all.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self::new(0, 0)
    }
}

/// Undo/redo engine for one document.
pub struct HistoryLedger {
    undo_stack: BudgetedDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    redo_bytes: usize,
    session: Option<CaptureSession>,
    renderer: Box<dyn Renderer>,
    events: Box<dyn EventSink>,
}

impl fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("memory_bytes", &self.memory_bytes())
            .field("capturing", &self.session.is_some())
            .finish()
    }
}

impl HistoryLedger {
    /// Create a ledger wired to the host's renderer and event sink.
    #[must_use]
    pub fn new(
        config: HistoryConfig,
        renderer: Box<dyn Renderer>,
        events: Box<dyn EventSink>,
    ) -> Self {
        Self {
            undo_stack: BudgetedDeque::new(config.max_memory_bytes, config.max_entries),
            redo_stack: VecDeque::new(),
            redo_bytes: 0,
            session: None,
            renderer,
            events,
        }
    }

    /// Create a ledger with no renderer and no event sink, for headless use
    /// and tests.
    #[must_use]
    pub fn detached(config: HistoryConfig) -> Self {
        Self::new(config, Box::new(NullRenderer), Box::new(NullSink))
    }

    // --- capture lifecycle ---

    /// Open a capture session for one user action.
    ///
    /// If a session is already open it is committed first; losing in-flight
    /// capture data is worse than an extra history entry.
    pub fn begin_capture(
        &mut self,
        repo: &dyn LayerRepository,
        label: impl Into<String>,
        layer_ids: &[LayerId],
        bounds: Option<PixelRegion>,
    ) {
        if self.session.is_some() {
            warn!("capture opened while another was in flight; committing the old one");
            self.commit_capture(repo);
        }
        self.session = Some(CaptureSession::begin(repo, label, layer_ids, bounds));
    }

    /// Grow the open session's eager capture bounds around a point.
    /// No-op when no session is open.
    pub fn expand_bounds(&mut self, repo: &dyn LayerRepository, x: u32, y: u32, radius: u32) {
        if let Some(session) = &mut self.session {
            session.expand(repo, x, y, radius);
        }
    }

    /// Open the structural bracket, starting a capture session under `label`
    /// if none is open. Topology as of this call becomes the undo target.
    pub fn begin_structural_change(
        &mut self,
        repo: &dyn LayerRepository,
        label: impl Into<String>,
    ) {
        if self.session.is_none() {
            self.session = Some(CaptureSession::begin(repo, label, &[], None));
        }
        if let Some(session) = &mut self.session {
            session.begin_structural(repo);
        }
    }

    /// Serialize a layer's full content into the open structural bracket.
    /// Must be called before the host removes the layer.
    pub fn store_deleted_layer(&mut self, repo: &dyn LayerRepository, id: LayerId) {
        let Some(layer) = repo.layer(id) else {
            warn!(layer = id.raw(), "layer to store is already gone; its pixels are unrecoverable");
            return;
        };
        match &mut self.session {
            Some(session) => session.store_deleted_layer(layer),
            None => warn!(
                layer = id.raw(),
                "deleted layer outside a capture session; its pixels are unrecoverable"
            ),
        }
    }

    /// Close the open session and push the resulting entry.
    ///
    /// Returns `true` if an entry was pushed, `false` when no session was
    /// open or the action turned out to be a no-op.
    pub fn commit_capture(&mut self, repo: &dyn LayerRepository) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        match session.commit(repo) {
            Some(entry) => {
                self.push(entry);
                true
            }
            None => false,
        }
    }

    /// Discard the open session without touching the ledger.
    pub fn abort_capture(&mut self) {
        if self.session.take().is_some() {
            debug!("capture session aborted");
        }
    }

    /// Whether a capture session is open.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    // --- stacks ---

    fn push(&mut self, entry: HistoryEntry) {
        if entry.is_empty() {
            return;
        }
        // A new action forks history: everything undone is unreachable now.
        self.redo_stack.clear();
        self.redo_bytes = 0;

        let label = entry.label().to_string();
        let evicted = self.undo_stack.push_back(entry);
        if evicted > 0 {
            debug!(evicted, label = %label, "evicted oldest entries to fit new action");
        }
        self.emit_status();
    }

    /// Revert the newest entry. Returns `false` when the undo stack is
    /// empty.
    ///
    /// An open capture session is committed first so its pixels are not
    /// silently lost underneath the restore.
    pub fn undo(&mut self, repo: &mut dyn LayerRepository) -> bool {
        if self.session.is_some() {
            warn!("undo requested mid-capture; committing the open session first");
            self.commit_capture(repo);
        }
        let Some(entry) = self.undo_stack.pop_back() else {
            return false;
        };

        // Topology first: a patch may target a layer this entry deleted.
        if let Some(change) = entry.structural() {
            change.before.restore(repo);
        }
        for patch in entry.patches() {
            Self::apply(repo, patch, patch.before());
        }

        self.redo_bytes += entry.byte_cost();
        self.redo_stack.push_back(entry);
        self.after_restore();
        true
    }

    /// Reapply the most recently undone entry. Returns `false` when the
    /// redo stack is empty.
    pub fn redo(&mut self, repo: &mut dyn LayerRepository) -> bool {
        let Some(entry) = self.redo_stack.pop_back() else {
            return false;
        };
        self.redo_bytes = self.redo_bytes.saturating_sub(entry.byte_cost());

        if let Some(change) = entry.structural() {
            change.after.restore(repo);
        }
        for patch in entry.patches() {
            Self::apply(repo, patch, patch.after());
        }

        // Re-entering the undo stack never evicts: the entry came from it.
        self.undo_stack.push_back(entry);
        self.after_restore();
        true
    }

    /// Undo or redo until the undo stack holds `target_depth` entries
    /// (clamped to what the stacks can reach).
    pub fn jump_to(&mut self, repo: &mut dyn LayerRepository, target_depth: usize) {
        while self.undo_stack.len() > target_depth {
            if !self.undo(repo) {
                break;
            }
        }
        while self.undo_stack.len() < target_depth {
            if !self.redo(repo) {
                break;
            }
        }
    }

    fn apply(repo: &mut dyn LayerRepository, patch: &RasterPatch, pixels: &PixelBuffer) {
        let region = patch.region();
        match repo.layer_mut(patch.layer()) {
            Some(layer) => layer.write_region(pixels, region.x, region.y),
            None => {
                debug!(
                    layer = patch.layer().raw(),
                    "patched layer no longer exists; skipping"
                );
            }
        }
    }

    fn after_restore(&mut self) {
        self.renderer.request_render();
        self.events.emit(HistoryEvent::LayersRestored);
        self.emit_status();
    }

    // --- limits ---

    /// Replace the undo stack's byte budget, in MiB (`0` = unlimited).
    /// Evicts oldest entries until the new budget holds.
    pub fn set_max_memory_mb(&mut self, mib: usize) {
        let bytes = mib.saturating_mul(BYTES_PER_MIB);
        let evicted = self.undo_stack.set_limits(bytes, self.undo_stack.max_items());
        if evicted > 0 {
            debug!(evicted, mib, "memory budget lowered; evicted oldest entries");
        }
        self.emit_status();
    }

    /// Replace the undo stack's entry cap (`0` = unlimited). Evicts oldest
    /// entries until the new cap holds.
    pub fn set_max_entries(&mut self, max_entries: usize) {
        let evicted = self
            .undo_stack
            .set_limits(self.undo_stack.max_bytes(), max_entries);
        if evicted > 0 {
            debug!(evicted, max_entries, "entry cap lowered; evicted oldest entries");
        }
        self.emit_status();
    }

    // --- inspection ---

    /// Entries available to undo.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Entries available to redo.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Labels of undoable entries, oldest first.
    #[must_use]
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo_stack.iter().map(HistoryEntry::label).collect()
    }

    /// Memory held by history entries, both stacks combined.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.undo_stack.total_bytes() + self.redo_bytes
    }

    /// Current ledger status for UI display.
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_usage_mb: self.memory_bytes() as f64 / BYTES_PER_MIB as f64,
            max_memory_mb: self.undo_stack.max_bytes() as f64 / BYTES_PER_MIB as f64,
        }
    }

    /// Drop all history and any open session.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.redo_bytes = 0;
        self.session = None;
        self.emit_status();
    }

    fn emit_status(&mut self) {
        self.events.emit(HistoryEvent::HistoryChanged(self.status()));
    }
}

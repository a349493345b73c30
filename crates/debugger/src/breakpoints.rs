//! Client-side projection of the backend's breakpoints.
//!
//! The backend is authoritative. [`BreakpointRegistry`] keeps what the client
//! last learned about each breakpoint, keyed by name with a secondary index by
//! anchor, plus the state that only exists on the client: the configuration
//! row being edited and inline request errors.

use std::collections::{HashMap, HashSet};

use transport::BreakpointBody;

use crate::error::SessionError;
use crate::source_view::ListingView;
use crate::view::{LineDescriptor, Marker};

/// Where a breakpoint attaches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Anchor {
    pub filename: String,
    pub line: usize,
}

impl Anchor {
    pub fn new(filename: impl Into<String>, line: usize) -> Self {
        Self {
            filename: filename.into(),
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub name: String,
    pub anchor: Anchor,
    pub enabled: bool,
    /// Configuration the backend last reported.
    pub config: String,
}

impl From<BreakpointBody> for Breakpoint {
    fn from(body: BreakpointBody) -> Self {
        Self {
            name: body.identity(),
            anchor: Anchor::new(body.filename, body.line),
            enabled: body.enabled,
            config: body.config,
        }
    }
}

/// The editable configuration row drawn under a breakpoint's line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    pub name: String,
    pub text: String,
    /// Height in lines.
    pub rows: usize,
    /// The backend rejected `text`. The text is kept so the operator can fix it.
    pub invalid: bool,
}

impl ConfigRow {
    fn new(name: &str, text: &str, min_rows: usize) -> Self {
        let mut row = Self {
            name: name.to_string(),
            text: String::new(),
            rows: min_rows,
            invalid: false,
        };
        row.set_text(text, min_rows);
        row
    }

    fn set_text(&mut self, text: &str, min_rows: usize) {
        self.text = text.to_string();
        self.rows = text.split('\n').count().max(min_rows);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Annotation {
    breakpoint: Breakpoint,
    row: ConfigRow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRegistry {
    entries: HashMap<String, Annotation>,
    by_anchor: HashMap<Anchor, String>,
    line_errors: HashMap<Anchor, String>,
    min_rows: usize,
}

impl Default for BreakpointRegistry {
    fn default() -> Self {
        Self::new(2)
    }
}

impl BreakpointRegistry {
    pub fn new(min_rows: usize) -> Self {
        Self {
            entries: HashMap::new(),
            by_anchor: HashMap::new(),
            line_errors: HashMap::new(),
            min_rows: min_rows.max(1),
        }
    }

    /// Merge a snapshot. Breakpoints missing from it are left alone.
    ///
    /// Names the snapshot re-anchors are never evicted by one another, so
    /// breakpoints that trade lines keep their rows.
    pub fn apply_snapshot<I>(&mut self, snapshot: I)
    where
        I: IntoIterator<Item = Breakpoint>,
    {
        let snapshot: Vec<Breakpoint> = snapshot.into_iter().collect();
        let reported: HashSet<String> = snapshot.iter().map(|bp| bp.name.clone()).collect();
        for breakpoint in snapshot {
            self.place(breakpoint, &reported);
        }
    }

    /// Create or update a single breakpoint.
    pub fn merge(&mut self, breakpoint: Breakpoint) {
        self.place(breakpoint, &HashSet::new());
    }

    fn place(&mut self, breakpoint: Breakpoint, reported: &HashSet<String>) {
        let name = breakpoint.name.clone();

        let stale = self
            .by_anchor
            .get(&breakpoint.anchor)
            .filter(|owner| **owner != name && !reported.contains(owner.as_str()))
            .cloned();
        if let Some(stale) = stale {
            tracing::debug!(%stale, %name, "anchor claimed by another breakpoint");
            self.remove(&stale);
        }

        match self.entries.get_mut(&name) {
            Some(entry) => {
                if entry.breakpoint.anchor != breakpoint.anchor {
                    tracing::debug!(
                        %name,
                        from = entry.breakpoint.anchor.line,
                        to = breakpoint.anchor.line,
                        "breakpoint moved"
                    );
                    // the old anchor may already belong to a breakpoint moved earlier
                    if self
                        .by_anchor
                        .get(&entry.breakpoint.anchor)
                        .is_some_and(|owner| *owner == name)
                    {
                        self.by_anchor.remove(&entry.breakpoint.anchor);
                    }
                    self.by_anchor
                        .insert(breakpoint.anchor.clone(), name.clone());
                }
                if !entry.row.invalid {
                    entry.row.set_text(&breakpoint.config, self.min_rows);
                }
                entry.breakpoint = breakpoint;
            }
            None => {
                self.by_anchor
                    .insert(breakpoint.anchor.clone(), name.clone());
                let row = ConfigRow::new(&name, &breakpoint.config, self.min_rows);
                self.entries.insert(name, Annotation { breakpoint, row });
            }
        }
    }

    /// Remove a breakpoint together with its configuration row and any
    /// error shown on its line.
    pub fn remove(&mut self, name: &str) -> Option<Breakpoint> {
        let entry = self.entries.remove(name)?;
        self.line_errors.remove(&entry.breakpoint.anchor);
        if self
            .by_anchor
            .get(&entry.breakpoint.anchor)
            .is_some_and(|owner| owner == name)
        {
            self.by_anchor.remove(&entry.breakpoint.anchor);
        }
        Some(entry.breakpoint)
    }

    pub fn remove_at(&mut self, anchor: &Anchor) -> Option<Breakpoint> {
        let name = self.by_anchor.get(anchor)?.clone();
        self.remove(&name)
    }

    pub fn get(&self, name: &str) -> Option<&Breakpoint> {
        self.entries.get(name).map(|e| &e.breakpoint)
    }

    pub fn at(&self, anchor: &Anchor) -> Option<&Breakpoint> {
        self.by_anchor.get(anchor).and_then(|name| self.get(name))
    }

    pub fn config_row(&self, name: &str) -> Option<&ConfigRow> {
        self.entries.get(name).map(|e| &e.row)
    }

    /// Replace a row's text ahead of sending it to the backend.
    ///
    /// Returns where the breakpoint is anchored.
    pub fn edit_config(&mut self, name: &str, text: &str) -> Result<Anchor, SessionError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| SessionError::UnknownBreakpoint(name.to_string()))?;
        entry.row.set_text(text, self.min_rows);
        Ok(entry.breakpoint.anchor.clone())
    }

    /// Record the backend's verdict on the row's current text.
    pub fn resolve_config(&mut self, name: &str, accepted: bool) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        entry.row.invalid = !accepted;
        if accepted {
            entry.breakpoint.config.clone_from(&entry.row.text);
        }
    }

    pub fn record_line_error(&mut self, anchor: Anchor, message: impl Into<String>) {
        self.line_errors.insert(anchor, message.into());
    }

    pub fn clear_line_error(&mut self, anchor: &Anchor) {
        self.line_errors.remove(anchor);
    }

    /// All breakpoints ordered by anchor.
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        let mut all: Vec<_> = self.entries.values().map(|e| e.breakpoint.clone()).collect();
        all.sort_by(|a, b| a.anchor.cmp(&b.anchor));
        all
    }

    /// Describe every line of `view` with its annotations.
    pub fn descriptors(&self, view: &ListingView) -> Vec<LineDescriptor> {
        view.lines
            .iter()
            .map(|line| {
                let anchor = Anchor::new(view.filename.as_str(), line.number);
                let entry = self
                    .by_anchor
                    .get(&anchor)
                    .and_then(|name| self.entries.get(name));
                let focused = line.number == view.focus_line;

                LineDescriptor {
                    number: line.number,
                    text: line.text.clone(),
                    selected: focused,
                    arrow: focused && view.show_arrow,
                    marker: entry.map(|e| Marker {
                        name: e.breakpoint.name.clone(),
                        enabled: e.breakpoint.enabled,
                    }),
                    config_row: entry.map(|e| e.row.clone()),
                    error: self.line_errors.get(&anchor).cloned(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transport::SourceLine;

    fn bp(name: &str, line: usize, enabled: bool, config: &str) -> Breakpoint {
        Breakpoint {
            name: name.to_string(),
            anchor: Anchor::new("main.go", line),
            enabled,
            config: config.to_string(),
        }
    }

    fn view(focus: usize) -> ListingView {
        let lines = (1..=20)
            .map(|number| SourceLine {
                number,
                text: format!("l{number}"),
            })
            .collect();
        ListingView::new("main.go", focus, true, lines)
    }

    #[test]
    fn snapshot_creates_annotations() {
        let mut registry = BreakpointRegistry::default();

        registry.apply_snapshot([bp("B1", 10, true, ""), bp("B2", 12, false, "args")]);

        assert_eq!(registry.breakpoints().len(), 2);
        assert!(registry.at(&Anchor::new("main.go", 10)).unwrap().enabled);
        let row = registry.config_row("B2").unwrap();
        assert_eq!(row.text, "args");
        assert_eq!(row.rows, 2);
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut once = BreakpointRegistry::default();
        let snapshot = [bp("B1", 10, true, "args"), bp("B2", 12, false, "")];
        once.apply_snapshot(snapshot.clone());

        let mut twice = once.clone();
        twice.apply_snapshot(snapshot);

        assert_eq!(once, twice);
        assert_eq!(once.descriptors(&view(10)), twice.descriptors(&view(10)));
    }

    #[test]
    fn snapshot_is_a_merge() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, ""), bp("B2", 12, true, "")]);

        registry.apply_snapshot([bp("B1", 10, false, "locals")]);

        assert!(!registry.get("B1").unwrap().enabled);
        assert_eq!(registry.config_row("B1").unwrap().text, "locals");
        assert!(registry.get("B2").is_some());
    }

    #[test]
    fn removed_breakpoint_is_not_resurrected() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, ""), bp("B2", 12, true, "")]);

        assert!(registry.remove("B1").is_some());
        registry.apply_snapshot([bp("B2", 12, true, "")]);

        assert!(registry.get("B1").is_none());
        assert!(registry.at(&Anchor::new("main.go", 10)).is_none());
        assert!(registry.config_row("B1").is_none());
    }

    #[test]
    fn known_name_moves_to_new_anchor() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, "")]);

        registry.apply_snapshot([bp("B1", 14, true, "")]);

        assert!(registry.at(&Anchor::new("main.go", 10)).is_none());
        assert_eq!(registry.at(&Anchor::new("main.go", 14)).unwrap().name, "B1");
        assert_eq!(registry.breakpoints().len(), 1);
    }

    #[test]
    fn new_name_evicts_stale_annotation() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, "")]);

        registry.apply_snapshot([bp("B3", 10, true, "")]);

        assert!(registry.get("B1").is_none());
        assert_eq!(registry.at(&Anchor::new("main.go", 10)).unwrap().name, "B3");
    }

    #[test]
    fn swapped_breakpoints_keep_their_rows() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, "locals"), bp("B2", 12, true, "args")]);
        registry.edit_config("B2", "bogus").unwrap();
        registry.resolve_config("B2", false);

        registry.apply_snapshot([bp("B1", 12, true, "locals"), bp("B2", 10, true, "args")]);

        assert_eq!(registry.breakpoints().len(), 2);
        assert_eq!(registry.at(&Anchor::new("main.go", 12)).unwrap().name, "B1");
        assert_eq!(registry.at(&Anchor::new("main.go", 10)).unwrap().name, "B2");
        let row = registry.config_row("B2").unwrap();
        assert!(row.invalid);
        assert_eq!(row.text, "bogus");
        assert_eq!(registry.config_row("B1").unwrap().text, "locals");

        let marked: Vec<_> = registry
            .descriptors(&view(10))
            .into_iter()
            .filter_map(|d| d.marker.map(|m| (d.number, m.name)))
            .collect();
        assert_eq!(marked, [(10, "B2".to_string()), (12, "B1".to_string())]);
    }

    #[test]
    fn removing_a_breakpoint_clears_its_line_error() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, ""), bp("B2", 12, true, "")]);
        registry.record_line_error(Anchor::new("main.go", 10), "could not clear");
        registry.record_line_error(Anchor::new("main.go", 12), "could not clear");

        registry.remove("B1");
        registry.remove_at(&Anchor::new("main.go", 12));

        assert!(registry.descriptors(&view(10)).iter().all(|d| d.error.is_none()));
    }

    #[test]
    fn edit_config_reports_the_anchor() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, "")]);

        assert_eq!(registry.edit_config("B1", "args").unwrap(), Anchor::new("main.go", 10));
    }

    #[test]
    fn invalid_row_keeps_pending_text() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([bp("B1", 10, true, "args")]);

        registry.edit_config("B1", "bogus\ndirective\nhere").unwrap();
        registry.resolve_config("B1", false);
        registry.apply_snapshot([bp("B1", 10, true, "args")]);

        let row = registry.config_row("B1").unwrap();
        assert!(row.invalid);
        assert_eq!(row.text, "bogus\ndirective\nhere");
        assert_eq!(row.rows, 3);
        assert_eq!(registry.get("B1").unwrap().config, "args");

        registry.edit_config("B1", "locals").unwrap();
        registry.resolve_config("B1", true);

        let row = registry.config_row("B1").unwrap();
        assert!(!row.invalid);
        assert_eq!(registry.get("B1").unwrap().config, "locals");
    }

    #[test]
    fn edit_unknown_breakpoint() {
        let mut registry = BreakpointRegistry::default();
        assert!(matches!(
            registry.edit_config("B9", "args"),
            Err(SessionError::UnknownBreakpoint(name)) if name == "B9"
        ));
    }

    #[test]
    fn descriptors_place_one_marker_and_row_per_breakpoint() {
        let mut registry = BreakpointRegistry::default();
        registry.apply_snapshot([
            bp("B1", 10, true, ""),
            bp("B2", 12, false, ""),
            Breakpoint {
                name: "B3".to_string(),
                anchor: Anchor::new("other.go", 10),
                enabled: true,
                config: String::new(),
            },
        ]);
        registry.record_line_error(Anchor::new("main.go", 5), "could not find location");

        let descriptors = registry.descriptors(&view(10));

        assert_eq!(descriptors.len(), 20);
        let marked: Vec<_> = descriptors
            .iter()
            .filter_map(|d| d.marker.as_ref().map(|m| (d.number, m.name.as_str(), m.enabled)))
            .collect();
        assert_eq!(marked, [(10, "B1", true), (12, "B2", false)]);
        assert_eq!(descriptors.iter().filter(|d| d.config_row.is_some()).count(), 2);

        let focus = &descriptors[9];
        assert!(focus.selected && focus.arrow);
        assert_eq!(descriptors[4].error.as_deref(), Some("could not find location"));
    }
}

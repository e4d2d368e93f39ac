//! Optimistic edit overlay: three-tier value resolution over a remote
//! baseline.
//!
//! Display resolution for a field `f`:
//!
//! ```text
//! Editing  -> buffer[f]   (seeded from snapshot ?? baseline on entry)
//! otherwise-> snapshot[f] ?? baseline[f]
//! ```
//!
//! The saved snapshot is what lets the sheet show just-saved values
//! instantly, before the remote baseline has refreshed; it survives leaving
//! `Editing` and is cleared only when the session closes and a refresh has
//! been requested. The baseline is never mutated here except by an
//! authoritative refresh or the post-open detail fetch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::FieldMap;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EditOverlay {
    baseline: FieldMap,
    snapshot: Option<FieldMap>,
    buffer: Option<FieldMap>,
}

impl EditOverlay {
    #[must_use]
    pub fn new(baseline: FieldMap) -> Self {
        Self {
            baseline,
            snapshot: None,
            buffer: None,
        }
    }

    #[must_use]
    pub const fn baseline(&self) -> &FieldMap {
        &self.baseline
    }

    /// Authoritative refresh: the owning collaborator replaced the record.
    pub fn set_baseline(&mut self, fields: FieldMap) {
        self.baseline = fields;
    }

    /// Detail fetch: enrich the baseline with full-record fields. Existing
    /// keys are overwritten; the buffer and snapshot are untouched, so an
    /// in-flight edit is never clobbered.
    pub fn merge_baseline(&mut self, fields: FieldMap) {
        self.baseline.extend(fields);
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.buffer.is_some()
    }

    /// Enter editing: the buffer becomes a clone of the snapshot if one
    /// exists, else the baseline. Re-entering while already editing keeps
    /// the current buffer (long-press in `Editing` is a no-op).
    pub fn begin_edit(&mut self) {
        if self.buffer.is_none() {
            self.buffer = Some(self.seed().clone());
        }
    }

    pub fn discard_edit(&mut self) {
        self.buffer = None;
    }

    /// Record a local edit. Returns false (and does nothing) when no edit
    /// session is active.
    pub fn edit_field(&mut self, field: &str, value: Value) -> bool {
        match &mut self.buffer {
            Some(buffer) => {
                buffer.insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Minimal diff: buffer entries that differ from the seed the buffer
    /// was cloned from. This is exactly what goes over the wire on save.
    #[must_use]
    pub fn changed_fields(&self) -> FieldMap {
        let Some(buffer) = &self.buffer else {
            return FieldMap::new();
        };
        let seed = self.seed();
        buffer
            .iter()
            .filter(|(k, v)| seed.get(*k) != Some(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Re-evaluated on demand at every call site; never cached or polled.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        let Some(buffer) = &self.buffer else {
            return false;
        };
        let seed = self.seed();
        buffer.iter().any(|(k, v)| seed.get(k) != Some(v))
    }

    /// A write succeeded: fold the written fields into the snapshot and
    /// drop the buffer.
    pub fn commit_saved(&mut self, written: FieldMap) {
        self.snapshot.get_or_insert_with(FieldMap::new).extend(written);
        self.buffer = None;
    }

    /// Session over: drop the snapshot and any buffer. The caller is
    /// responsible for having requested a baseline refresh first.
    pub fn clear_session(&mut self) {
        self.snapshot = None;
        self.buffer = None;
    }

    #[must_use]
    pub fn saved_snapshot(&self) -> Option<&FieldMap> {
        self.snapshot.as_ref()
    }

    /// Resolve a single field for display.
    #[must_use]
    pub fn resolve(&self, editing: bool, field: &str) -> Option<&Value> {
        if editing {
            if let Some(v) = self.buffer.as_ref().and_then(|b| b.get(field)) {
                return Some(v);
            }
        } else if let Some(v) = self.snapshot.as_ref().and_then(|s| s.get(field)) {
            return Some(v);
        }
        self.baseline.get(field)
    }

    /// Resolve the full field map for display. While editing this is the
    /// baseline with the buffer layered on top, so detail fields that
    /// arrived after the buffer was seeded still show through.
    #[must_use]
    pub fn display_fields(&self, editing: bool) -> FieldMap {
        let mut fields = self.baseline.clone();
        if editing {
            if let Some(buffer) = &self.buffer {
                fields.extend(buffer.clone());
            }
        } else if let Some(snapshot) = &self.snapshot {
            fields.extend(snapshot.clone());
        }
        fields
    }

    fn seed(&self) -> &FieldMap {
        self.snapshot.as_ref().unwrap_or(&self.baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn baseline() -> FieldMap {
        FieldMap::from([
            ("name".to_string(), json!("Flat White")),
            ("price".to_string(), json!(4.50)),
            ("stock".to_string(), json!(12)),
        ])
    }

    #[test]
    fn viewing_without_snapshot_shows_baseline() {
        let overlay = EditOverlay::new(baseline());
        assert_eq!(overlay.resolve(false, "price"), Some(&json!(4.50)));
        assert_eq!(overlay.display_fields(false), baseline());
    }

    #[test]
    fn buffer_is_seeded_from_baseline_and_edits_do_not_touch_it() {
        let mut overlay = EditOverlay::new(baseline());
        overlay.begin_edit();
        overlay.edit_field("price", json!(5.00));

        assert_eq!(overlay.resolve(true, "price"), Some(&json!(5.00)));
        assert_eq!(overlay.baseline().get("price"), Some(&json!(4.50)));
    }

    #[test]
    fn no_edits_means_no_changes_and_identical_display_after_discard() {
        let mut overlay = EditOverlay::new(baseline());
        let before = overlay.display_fields(false);

        overlay.begin_edit();
        assert!(!overlay.has_changes());
        overlay.discard_edit();

        assert_eq!(overlay.display_fields(false), before);
    }

    #[test]
    fn editing_a_field_back_to_its_seed_value_clears_has_changes() {
        let mut overlay = EditOverlay::new(baseline());
        overlay.begin_edit();
        overlay.edit_field("price", json!(5.00));
        assert!(overlay.has_changes());
        overlay.edit_field("price", json!(4.50));
        assert!(!overlay.has_changes());
    }

    #[test]
    fn changed_fields_is_the_minimal_diff() {
        let mut overlay = EditOverlay::new(baseline());
        overlay.begin_edit();
        overlay.edit_field("price", json!(5.00));
        overlay.edit_field("name", json!("Flat White")); // unchanged value

        let diff = overlay.changed_fields();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.get("price"), Some(&json!(5.00)));
    }

    #[test]
    fn saved_values_show_while_viewing_and_reseed_the_next_edit() {
        let mut overlay = EditOverlay::new(baseline());
        overlay.begin_edit();
        overlay.edit_field("price", json!(5.00));
        overlay.commit_saved(overlay.changed_fields());

        // Viewing shows the just-saved value, not the stale baseline.
        assert!(!overlay.is_editing());
        assert_eq!(overlay.resolve(false, "price"), Some(&json!(5.00)));

        // Re-entering edit in the same session seeds from the snapshot.
        overlay.begin_edit();
        assert_eq!(overlay.resolve(true, "price"), Some(&json!(5.00)));
        assert!(!overlay.has_changes());
    }

    #[test]
    fn baseline_refresh_does_not_clobber_an_open_buffer() {
        let mut overlay = EditOverlay::new(baseline());
        overlay.begin_edit();
        overlay.edit_field("price", json!(5.00));

        let mut refreshed = baseline();
        refreshed.insert("price".to_string(), json!(3.00));
        refreshed.insert("stock".to_string(), json!(7));
        overlay.set_baseline(refreshed);

        // Edited field keeps the local value; the untouched field also keeps
        // its seeded value because the buffer cloned the whole seed map.
        assert_eq!(overlay.resolve(true, "price"), Some(&json!(5.00)));
        assert_eq!(overlay.resolve(true, "stock"), Some(&json!(12)));
    }

    #[test]
    fn late_detail_fields_show_through_an_open_buffer() {
        let mut overlay = EditOverlay::new(baseline());
        overlay.begin_edit();
        overlay.merge_baseline(FieldMap::from([(
            "notes".to_string(),
            json!("oat milk"),
        )]));

        assert_eq!(overlay.resolve(true, "notes"), Some(&json!("oat milk")));
        assert_eq!(
            overlay.display_fields(true).get("notes"),
            Some(&json!("oat milk"))
        );
    }

    #[test]
    fn clear_session_drops_snapshot_and_buffer() {
        let mut overlay = EditOverlay::new(baseline());
        overlay.begin_edit();
        overlay.edit_field("price", json!(5.00));
        overlay.commit_saved(overlay.changed_fields());
        overlay.clear_session();

        assert!(overlay.saved_snapshot().is_none());
        assert_eq!(overlay.resolve(false, "price"), Some(&json!(4.50)));
    }
}

//! The contact form as data.
//!
//! [`FormSurface`] is the seam between the core logic and whatever renders the
//! form (a DOM in the browser, a terminal in the CLI, an in-memory double in
//! tests). Lookups return `Option` so a missing element is never a panic.

use std::collections::BTreeMap;

/// Canonical field order used for validation and focus.
pub const CANONICAL_FIELDS: [&str; 4] = ["name", "email", "subject", "message"];

/// Hidden fields that humans never fill in.
pub const HONEYPOT_FIELDS: [&str; 3] = ["website", "confirm_email", "phone"];

/// Field values captured at submit time, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    fields: Vec<(String, String)>,
}

impl FormSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Reads every field of `surface` in its declared order.
    #[must_use]
    pub fn capture(surface: &dyn FormSurface) -> Self {
        let fields = surface
            .field_names()
            .into_iter()
            .map(|name| {
                let value = surface.value(&name).unwrap_or_default();
                (name, value)
            })
            .collect();
        Self { fields }
    }

    /// Returns the raw value of `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Sets `field`, keeping its position if it already exists.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == field) {
            slot.1 = value;
        } else {
            self.fields.push((field, value));
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Iterates `(field, value)` pairs in form order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of captured fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (k, v) in iter {
            snapshot.set(k, v);
        }
        snapshot
    }
}

/// Whatever renders the contact form.
pub trait FormSurface: Send {
    /// Current raw value of `field`, `None` if the form has no such field.
    fn value(&self, field: &str) -> Option<String>;

    /// Field names in form order.
    fn field_names(&self) -> Vec<String>;

    /// Attaches (`Some`) or removes (`None`) the error annotation on `field`.
    ///
    /// Returns `false` if the form has no such field.
    fn set_error(&mut self, field: &str, message: Option<String>) -> bool;

    /// The error annotation currently shown on `field`.
    fn error(&self, field: &str) -> Option<String>;

    /// Moves focus to `field`.
    fn focus(&mut self, field: &str) -> bool;

    /// Clears every field value.
    fn reset(&mut self);

    /// Enables or disables the submit control.
    fn set_submit_enabled(&mut self, enabled: bool);
}

/// An in-memory [`FormSurface`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryForm {
    order: Vec<String>,
    values: BTreeMap<String, String>,
    errors: BTreeMap<String, String>,
    focused: Option<String>,
    submit_enabled: bool,
}

impl InMemoryForm {
    /// Creates a form with the given fields, all empty.
    #[must_use]
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order: Vec<String> = fields.into_iter().map(Into::into).collect();
        let values = order.iter().map(|f| (f.clone(), String::new())).collect();
        Self {
            order,
            values,
            errors: BTreeMap::new(),
            focused: None,
            submit_enabled: true,
        }
    }

    /// The portfolio contact form: visible fields plus hidden honeypots.
    #[must_use]
    pub fn contact() -> Self {
        Self::with_fields(CANONICAL_FIELDS.iter().chain(HONEYPOT_FIELDS.iter()).copied())
    }

    /// Sets the value of an existing field. Unknown fields are ignored.
    pub fn fill(&mut self, field: &str, value: impl Into<String>) -> &mut Self {
        if let Some(slot) = self.values.get_mut(field) {
            *slot = value.into();
        }
        self
    }

    /// Field holding focus, if any.
    #[must_use]
    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Whether the submit control is enabled.
    #[must_use]
    pub const fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Fields currently carrying an error annotation.
    #[must_use]
    pub fn annotated_fields(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|f| self.errors.contains_key(*f))
            .map(String::as_str)
            .collect()
    }
}

impl FormSurface for InMemoryForm {
    fn value(&self, field: &str) -> Option<String> {
        self.values.get(field).cloned()
    }

    fn field_names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn set_error(&mut self, field: &str, message: Option<String>) -> bool {
        if !self.values.contains_key(field) {
            return false;
        }
        match message {
            Some(message) => {
                self.errors.insert(field.to_string(), message);
            },
            None => {
                self.errors.remove(field);
            },
        }
        true
    }

    fn error(&self, field: &str) -> Option<String> {
        self.errors.get(field).cloned()
    }

    fn focus(&mut self, field: &str) -> bool {
        if self.values.contains_key(field) {
            self.focused = Some(field.to_string());
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        for value in self.values.values_mut() {
            value.clear();
        }
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_preserves_form_order() {
        let mut form = InMemoryForm::contact();
        form.fill("email", "a@b.co").fill("name", "Ana");

        let snapshot = FormSnapshot::capture(&form);
        let names: Vec<_> = snapshot.iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            ["name", "email", "subject", "message", "website", "confirm_email", "phone"]
        );
        assert_eq!(snapshot.get("name"), Some("Ana"));
        assert_eq!(snapshot.get("missing"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut snapshot = FormSnapshot::new().with("a", "1").with("b", "2");
        snapshot.set("a", "3");
        assert_eq!(snapshot.iter().collect::<Vec<_>>(), [("a", "3"), ("b", "2")]);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_set_error_on_unknown_field() {
        let mut form = InMemoryForm::contact();
        assert!(!form.set_error("nope", Some("x".into())));
        assert!(form.set_error("name", Some("x".into())));
        assert_eq!(form.error("name").as_deref(), Some("x"));
    }

    #[test]
    fn test_reset_clears_values_only() {
        let mut form = InMemoryForm::contact();
        form.fill("name", "Ana");
        form.set_error("email", Some("bad".into()));
        form.reset();
        assert_eq!(form.value("name").as_deref(), Some(""));
        assert_eq!(form.error("email").as_deref(), Some("bad"));
    }
}

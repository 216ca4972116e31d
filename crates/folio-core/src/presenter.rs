//! Per-field error annotations on the contact form.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::form::FormSurface;
use crate::validation::FormVerdict;

/// A form surface shared between the services that touch it.
pub type SharedForm = Arc<Mutex<dyn FormSurface>>;

/// Attaches and removes field error annotations.
///
/// All operations are idempotent: showing an error twice leaves the second
/// message, clearing a clean field does nothing.
#[derive(Clone)]
pub struct FieldErrorPresenter {
    form: SharedForm,
}

impl FieldErrorPresenter {
    /// Creates a presenter for `form`.
    #[must_use]
    pub fn new(form: SharedForm) -> Self {
        Self { form }
    }

    fn lock(&self) -> MutexGuard<'_, dyn FormSurface + 'static> {
        self.form
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Shows `message` on `field`, replacing any previous one.
    pub fn show_error(&self, field: &str, message: &str) -> bool {
        let shown = self.lock().set_error(field, Some(message.to_string()));
        if !shown {
            tracing::debug!(field, "no such field to annotate");
        }
        shown
    }

    /// Removes the annotation on `field`, if any.
    pub fn clear_error(&self, field: &str) {
        let mut form = self.lock();
        if form.error(field).is_some() {
            form.set_error(field, None);
        }
    }

    /// Removes every annotation.
    pub fn clear_all(&self) {
        let mut form = self.lock();
        for field in form.field_names() {
            if form.error(&field).is_some() {
                form.set_error(&field, None);
            }
        }
    }

    /// Replaces all annotations with the errors in `verdict`.
    pub fn present(&self, verdict: &FormVerdict) {
        self.clear_all();
        for error in &verdict.field_errors {
            self.show_error(&error.field, &error.message);
        }
    }

    /// Focuses the first annotated field in form order.
    pub fn focus_first_invalid(&self) -> Option<String> {
        let mut form = self.lock();
        let first = form
            .field_names()
            .into_iter()
            .find(|field| form.error(field).is_some())?;
        form.focus(&first);
        Some(first)
    }
}

impl std::fmt::Debug for FieldErrorPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldErrorPresenter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::InMemoryForm;
    use crate::validation::FieldError;

    fn setup() -> (Arc<Mutex<InMemoryForm>>, FieldErrorPresenter) {
        let form = Arc::new(Mutex::new(InMemoryForm::contact()));
        let presenter = FieldErrorPresenter::new(form.clone());
        (form, presenter)
    }

    #[test]
    fn test_show_twice_replaces() {
        let (form, presenter) = setup();
        presenter.show_error("email", "first");
        presenter.show_error("email", "second");
        assert_eq!(form.lock().unwrap().error("email").as_deref(), Some("second"));
    }

    #[test]
    fn test_clear_twice_equals_once() {
        let (form, presenter) = setup();
        presenter.show_error("name", "bad");

        presenter.clear_error("name");
        let once = form.lock().unwrap().annotated_fields().len();
        presenter.clear_error("name");
        let twice = form.lock().unwrap().annotated_fields().len();

        assert_eq!(once, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_present_and_focus_first_invalid() {
        let (form, presenter) = setup();
        presenter.show_error("name", "stale");

        let verdict = FormVerdict {
            valid: false,
            field_errors: vec![
                FieldError {
                    field: "message".into(),
                    message: "too short".into(),
                },
                FieldError {
                    field: "email".into(),
                    message: "invalid".into(),
                },
            ],
        };
        presenter.present(&verdict);

        assert_eq!(form.lock().unwrap().annotated_fields(), ["email", "message"]);
        assert_eq!(presenter.focus_first_invalid().as_deref(), Some("email"));
        assert_eq!(form.lock().unwrap().focused(), Some("email"));
    }

    #[test]
    fn test_focus_without_errors() {
        let (_form, presenter) = setup();
        assert_eq!(presenter.focus_first_invalid(), None);
    }
}

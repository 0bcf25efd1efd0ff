//! Field-scoped validation errors.
//!
//! A failed save collects every problem found on the record so the caller can
//! render each message next to the offending form field.

use std::fmt;

/// Fields of a phase record that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseField {
    /// The phase kind
    Kind,
    /// Start date
    StartsAt,
    /// End date
    EndsAt,
    /// Translated name
    Name,
    /// Translated summary
    Summary,
    /// Translated description
    Description,
    /// Link of the main call-to-action button
    MainButtonUrl,
}

impl PhaseField {
    /// Attribute name as it appears in forms and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::StartsAt => "starts_at",
            Self::EndsAt => "ends_at",
            Self::Name => "name",
            Self::Summary => "summary",
            Self::Description => "description",
            Self::MainButtonUrl => "main_button_url",
        }
    }
}

impl fmt::Display for PhaseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single error attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field the message belongs to
    pub field: PhaseField,
    /// Message shown to the administrator
    pub message: String,
}

/// Ordered collection of field errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Attaches `message` to `field`.
    pub fn add(&mut self, field: PhaseField, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// True when nothing was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when at least one error is attached to `field`.
    #[must_use]
    pub fn has(&self, field: PhaseField) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Messages attached to `field`, in insertion order.
    pub fn on(&self, field: PhaseField) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// All recorded errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Converts into a `Result`, failing when any error was recorded.
    pub fn into_result(self) -> crate::errors::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::errors::Error::Validation(self))
        }
    }

    /// Builds a collection holding one error.
    #[must_use]
    pub fn single(field: PhaseField, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} {}", error.field, error.message)?;
        }
        Ok(())
    }
}

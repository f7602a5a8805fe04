//! Viewer identity used for watermarking.

use serde::{Deserialize, Serialize};

/// Contact identifiers of the signed-in viewer.
///
/// Supplied by the backend per lecture and used only to build watermark
/// text. It never carries a name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewerIdentity {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ViewerIdentity {
    /// Creates an identity from its two contact fields.
    pub fn new(email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Text stamped onto rendered surfaces: `email | phone`.
    ///
    /// Falls back to whichever field is present when the other is blank.
    #[must_use]
    pub fn watermark_text(&self) -> String {
        let email = self.email.trim();
        let phone = self.phone.trim();
        match (email.is_empty(), phone.is_empty()) {
            (false, false) => format!("{email} | {phone}"),
            (false, true) => email.to_string(),
            (true, false) => phone.to_string(),
            (true, true) => String::new(),
        }
    }

    /// Returns true if there is nothing to stamp.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.email.trim().is_empty() && self.phone.trim().is_empty()
    }
}

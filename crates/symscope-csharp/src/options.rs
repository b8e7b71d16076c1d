//! Analysis options supplied by the host.

use serde::{Deserialize, Serialize};
use symscope_core::error::SemanticResult;

/// Options controlling lookup, naming and completion output.
///
/// Hosts usually pass these as JSON; missing keys take their defaults and
/// unknown keys are rejected.
///
/// ```
/// use symscope_csharp::options::AnalysisOptions;
///
/// let options = AnalysisOptions::from_json(r#"{ "hide_obsolete": true }"#).unwrap();
/// assert!(options.hide_obsolete);
/// assert!(options.collapse_overloads);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOptions {
    /// Compare names case-sensitively (shadowing and unique-name collisions).
    pub case_sensitive: bool,
    /// Collapse method overloads into one completion item.
    pub collapse_overloads: bool,
    /// Exclude obsolete symbols from completion.
    pub hide_obsolete: bool,
    /// Display generic symbols with a `<>` suffix.
    pub generic_display_suffix: bool,
    /// Offer extension methods on value receivers.
    pub include_extension_methods: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            case_sensitive: true,
            collapse_overloads: true,
            hide_obsolete: false,
            generic_display_suffix: true,
            include_extension_methods: true,
        }
    }
}

impl AnalysisOptions {
    /// Parse options from JSON.
    pub fn from_json(json: &str) -> SemanticResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set obsolete filtering.
    pub fn with_hide_obsolete(mut self, hide_obsolete: bool) -> Self {
        self.hide_obsolete = hide_obsolete;
        self
    }

    /// Set overload collapsing.
    pub fn with_collapse_overloads(mut self, collapse: bool) -> Self {
        self.collapse_overloads = collapse;
        self
    }

    /// Fold a name for comparison under these options.
    pub(crate) fn fold_name(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }
}

//! Directive vocabulary.

/// Element and attribute names recognized by the engine.
///
/// Element names are matched ASCII case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directives {
    /// Invocation element; children become the body, attributes the variables.
    pub invocation: String,
    /// Marker replaced by the invocation body.
    pub body_slot: String,
    /// Marker replaced by a variable value.
    pub variable_slot: String,
    /// Invocation attribute naming the template.
    pub location_attribute: String,
    /// Variable slot attribute naming the variable.
    pub name_attribute: String,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            invocation: "template-invocation".to_owned(),
            body_slot: "template-body-slot".to_owned(),
            variable_slot: "template-variable-slot".to_owned(),
            location_attribute: "location".to_owned(),
            name_attribute: "name".to_owned(),
        }
    }
}

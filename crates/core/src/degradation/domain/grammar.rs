use crate::shared::constants::{NAME_SEP, PARAMETERS_SEP};

/// Separators of the textual degradation syntax `name[,v1,v2...]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecGrammar {
    pub name_sep: String,
    pub parameters_sep: String,
}

impl SpecGrammar {
    pub fn new(name_sep: impl Into<String>, parameters_sep: impl Into<String>) -> Self {
        Self {
            name_sep: name_sep.into(),
            parameters_sep: parameters_sep.into(),
        }
    }

    /// Canonical grammar with the given parameter separator, e.g. `//` to
    /// allow literal commas inside values.
    pub fn with_parameters_sep(parameters_sep: impl Into<String>) -> Self {
        Self::new(NAME_SEP, parameters_sep)
    }

    /// Split on the first name separator into name and optional remainder.
    pub fn split<'s>(&self, spec: &'s str) -> (&'s str, Option<&'s str>) {
        match spec.split_once(self.name_sep.as_str()) {
            Some((name, rest)) => (name, Some(rest)),
            None => (spec, None),
        }
    }

    pub fn split_values<'s>(&self, remainder: &'s str) -> Vec<&'s str> {
        remainder.split(self.parameters_sep.as_str()).collect()
    }
}

impl Default for SpecGrammar {
    fn default() -> Self {
        Self::new(NAME_SEP, PARAMETERS_SEP)
    }
}

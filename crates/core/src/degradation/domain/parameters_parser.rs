use super::degradation::{Degradation, ParameterValues};
use super::degradation_error::DegradationError;
use super::grammar::SpecGrammar;
use super::registry::DegradationRegistry;

/// Turns textual specs such as `gain,6` into configured degradations.
///
/// Values bind positionally to the parameters declared by the degradation's
/// schema, and the number of values must match exactly.
pub struct ParametersParser<'r> {
    registry: &'r DegradationRegistry,
    grammar: SpecGrammar,
}

impl<'r> ParametersParser<'r> {
    pub fn new(registry: &'r DegradationRegistry) -> Self {
        Self::with_grammar(registry, SpecGrammar::default())
    }

    pub fn with_grammar(registry: &'r DegradationRegistry, grammar: SpecGrammar) -> Self {
        Self { registry, grammar }
    }

    pub fn grammar(&self) -> &SpecGrammar {
        &self.grammar
    }

    pub fn parse(&self, spec: &str) -> Result<Box<dyn Degradation>, DegradationError> {
        let malformed = |reason: String| DegradationError::MalformedSpec {
            spec: spec.to_string(),
            reason,
        };

        let spec_trimmed = spec.trim();
        if spec_trimmed.is_empty() {
            return Err(malformed("empty degradation".to_string()));
        }

        let (name, remainder) = self.grammar.split(spec_trimmed);
        let factory = self.registry.resolve(name.trim())?;
        let info = factory.info;

        let raw_values = match remainder {
            Some(rest) => self.grammar.split_values(rest),
            None => Vec::new(),
        };
        if raw_values.len() != info.arity() {
            return Err(malformed(format!(
                "{} expects {} parameter(s) ({}), got {}",
                info.name,
                info.arity(),
                info.parameter_names().collect::<Vec<_>>().join(", "),
                raw_values.len()
            )));
        }

        let values: ParameterValues = info.parameter_names().zip(raw_values).collect();
        let mut degradation = factory.create();
        degradation.configure(values)?;
        log::debug!("Parsed {spec_trimmed} as {}", info.name);
        Ok(degradation)
    }

    /// Parse every spec in order, failing on the first error.
    pub fn parse_all<S: AsRef<str>>(
        &self,
        specs: &[S],
    ) -> Result<Vec<Box<dyn Degradation>>, DegradationError> {
        specs.iter().map(|s| self.parse(s.as_ref())).collect()
    }
}

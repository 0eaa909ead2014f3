use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::audio::domain::audio_buffer::AudioBuffer;

use super::degradation_env::DegradationEnv;
use super::degradation_error::DegradationError;

/// Schema entry for one positional parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub example: &'static str,
    pub description: &'static str,
}

/// Immutable schema of a degradation kind, used for parsing and help.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DegradationInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ParameterInfo],
}

impl DegradationInfo {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parameters.iter().map(|p| p.name)
    }
}

/// Raw string values bound to one degradation instance, keyed by parameter
/// name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterValues {
    values: HashMap<String, String>,
}

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a declared parameter; missing is an `InvalidParameter`.
    pub fn require(&self, info: &DegradationInfo, name: &str) -> Result<&str, DegradationError> {
        self.get(name).ok_or_else(|| {
            DegradationError::invalid_parameter(info.name, name, "", "missing value")
        })
    }

    /// Parse a declared parameter with `FromStr`, trimming whitespace.
    pub fn parse<T>(&self, info: &DegradationInfo, name: &str) -> Result<T, DegradationError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.require(info, name)?;
        raw.trim()
            .parse::<T>()
            .map_err(|e| DegradationError::invalid_parameter(info.name, name, raw, e.to_string()))
    }

    /// Parse a finite float.
    pub fn parse_f64(&self, info: &DegradationInfo, name: &str) -> Result<f64, DegradationError> {
        let value: f64 = self.parse(info, name)?;
        if !value.is_finite() {
            let raw = self.require(info, name)?;
            return Err(DegradationError::invalid_parameter(
                info.name,
                name,
                raw,
                "must be a finite number",
            ));
        }
        Ok(value)
    }

    /// Parse a finite float that must be strictly positive.
    pub fn parse_positive(
        &self,
        info: &DegradationInfo,
        name: &str,
    ) -> Result<f64, DegradationError> {
        let value = self.parse_f64(info, name)?;
        if value <= 0.0 {
            let raw = self.require(info, name)?;
            return Err(DegradationError::invalid_parameter(
                info.name,
                name,
                raw,
                "must be greater than zero",
            ));
        }
        Ok(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

/// One named, parameterized transformation of an [`AudioBuffer`].
///
/// Instances move Constructed -> Configured -> Applied and are applied at
/// most once.
pub trait Degradation: Send + fmt::Debug {
    fn info(&self) -> &'static DegradationInfo;

    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Bind and validate parameter values.
    fn configure(&mut self, values: ParameterValues) -> Result<(), DegradationError>;

    /// Raw values bound by the last successful `configure`.
    fn parameters_values(&self) -> &ParameterValues;

    fn apply(
        &mut self,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError>;
}

/// A degradation kind: its schema, typed parameters and processing.
///
/// Implementors only describe what is specific to the kind; [`DegradationOp`]
/// supplies the lifecycle.
pub trait DegradationKind: Send + 'static {
    type Params: Send + fmt::Debug;

    fn info() -> &'static DegradationInfo;

    fn parse(values: &ParameterValues) -> Result<Self::Params, DegradationError>;

    fn process(
        params: &Self::Params,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError>;
}

#[derive(Debug)]
enum Lifecycle<P> {
    Constructed,
    Configured(P),
    Applied,
}

/// Lifecycle wrapper turning a [`DegradationKind`] into a [`Degradation`].
pub struct DegradationOp<K: DegradationKind> {
    state: Lifecycle<K::Params>,
    values: ParameterValues,
    _kind: PhantomData<fn() -> K>,
}

impl<K: DegradationKind> DegradationOp<K> {
    pub fn new() -> Self {
        Self {
            state: Lifecycle::Constructed,
            values: ParameterValues::new(),
            _kind: PhantomData,
        }
    }

    /// Typed parameters, once configured and not yet applied.
    pub fn params(&self) -> Option<&K::Params> {
        match &self.state {
            Lifecycle::Configured(params) => Some(params),
            _ => None,
        }
    }
}

impl<K: DegradationKind> Default for DegradationOp<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: DegradationKind> fmt::Debug for DegradationOp<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DegradationOp")
            .field("name", &K::info().name)
            .field("state", &self.state)
            .finish()
    }
}

impl<K: DegradationKind> Degradation for DegradationOp<K> {
    fn info(&self) -> &'static DegradationInfo {
        K::info()
    }

    fn configure(&mut self, values: ParameterValues) -> Result<(), DegradationError> {
        if matches!(self.state, Lifecycle::Applied) {
            return Err(DegradationError::AlreadyApplied(K::info().name.to_string()));
        }
        let params = K::parse(&values)?;
        self.values = values;
        self.state = Lifecycle::Configured(params);
        Ok(())
    }

    fn parameters_values(&self) -> &ParameterValues {
        &self.values
    }

    fn apply(
        &mut self,
        audio: &mut AudioBuffer,
        env: &DegradationEnv,
    ) -> Result<(), DegradationError> {
        let name = K::info().name;
        let params = match std::mem::replace(&mut self.state, Lifecycle::Applied) {
            Lifecycle::Configured(params) => params,
            Lifecycle::Constructed => {
                self.state = Lifecycle::Constructed;
                return Err(DegradationError::NotConfigured(name.to_string()));
            }
            Lifecycle::Applied => return Err(DegradationError::AlreadyApplied(name.to_string())),
        };
        K::process(&params, audio, env)
    }
}

use std::collections::HashMap;

use super::degradation::{Degradation, DegradationInfo, DegradationKind, DegradationOp};
use super::degradation_error::DegradationError;

/// Schema plus constructor for one degradation kind.
#[derive(Clone, Copy)]
pub struct DegradationFactory {
    pub info: &'static DegradationInfo,
    create: fn() -> Box<dyn Degradation>,
}

impl DegradationFactory {
    pub fn new(info: &'static DegradationInfo, create: fn() -> Box<dyn Degradation>) -> Self {
        Self { info, create }
    }

    pub fn of<K: DegradationKind>() -> Self {
        Self::new(K::info(), create_op::<K>)
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// A fresh, unconfigured instance.
    pub fn create(&self) -> Box<dyn Degradation> {
        (self.create)()
    }
}

impl std::fmt::Debug for DegradationFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DegradationFactory")
            .field("name", &self.info.name)
            .finish()
    }
}

fn create_op<K: DegradationKind>() -> Box<dyn Degradation> {
    Box::new(DegradationOp::<K>::new())
}

/// Maps degradation names to factories, in registration order.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Default)]
pub struct DegradationRegistry {
    factories: Vec<DegradationFactory>,
    index: HashMap<&'static str, usize>,
}

impl DegradationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory. Registering a name again replaces the earlier factory
    /// in place.
    pub fn register(&mut self, factory: DegradationFactory) {
        match self.index.get(factory.name()) {
            Some(&i) => self.factories[i] = factory,
            None => {
                self.index.insert(factory.name(), self.factories.len());
                self.factories.push(factory);
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Result<&DegradationFactory, DegradationError> {
        self.index
            .get(name)
            .map(|&i| &self.factories[i])
            .ok_or_else(|| DegradationError::UnknownDegradation(name.to_string()))
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Degradation>, DegradationError> {
        Ok(self.resolve(name)?.create())
    }

    pub fn all(&self) -> &[DegradationFactory] {
        &self.factories
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.iter().map(DegradationFactory::name).collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl FromIterator<DegradationFactory> for DegradationRegistry {
    fn from_iter<I: IntoIterator<Item = DegradationFactory>>(iter: I) -> Self {
        let mut registry = Self::new();
        for factory in iter {
            registry.register(factory);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_buffer::AudioBuffer;
    use crate::degradation::domain::degradation::{ParameterInfo, ParameterValues};
    use crate::degradation::domain::degradation_env::DegradationEnv;

    static SILENCE_INFO: DegradationInfo = DegradationInfo {
        name: "silence",
        description: "Zero every sample",
        parameters: &[],
    };

    static SHIFT_INFO: DegradationInfo = DegradationInfo {
        name: "shift",
        description: "Add a constant",
        parameters: &[ParameterInfo {
            name: "offset",
            example: "0.1",
            description: "Value added to each sample",
        }],
    };

    struct Silence;

    impl DegradationKind for Silence {
        type Params = ();

        fn info() -> &'static DegradationInfo {
            &SILENCE_INFO
        }

        fn parse(_values: &ParameterValues) -> Result<(), DegradationError> {
            Ok(())
        }

        fn process(
            _params: &(),
            audio: &mut AudioBuffer,
            _env: &DegradationEnv,
        ) -> Result<(), DegradationError> {
            audio.samples_mut().fill(0.0);
            Ok(())
        }
    }

    struct Shift;

    impl DegradationKind for Shift {
        type Params = f64;

        fn info() -> &'static DegradationInfo {
            &SHIFT_INFO
        }

        fn parse(values: &ParameterValues) -> Result<f64, DegradationError> {
            values.parse_f64(&SHIFT_INFO, "offset")
        }

        fn process(
            offset: &f64,
            audio: &mut AudioBuffer,
            _env: &DegradationEnv,
        ) -> Result<(), DegradationError> {
            let offset = *offset as f32;
            audio.samples_mut().mapv_inplace(|x| x + offset);
            Ok(())
        }
    }

    fn registry() -> DegradationRegistry {
        [DegradationFactory::of::<Silence>(), DegradationFactory::of::<Shift>()]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_names_in_registration_order() {
        assert_eq!(registry().names(), vec!["silence", "shift"]);
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = registry().resolve("frobnicate").unwrap_err();
        assert!(matches!(err, DegradationError::UnknownDegradation(n) if n == "frobnicate"));
    }

    #[test]
    fn test_create_returns_fresh_instances() {
        let registry = registry();
        let mut first = registry.create("shift").unwrap();
        first
            .configure([("offset", "0.5")].into_iter().collect())
            .unwrap();
        let second = registry.create("shift").unwrap();
        assert_eq!(second.name(), "shift");
        assert!(second.parameters_values().is_empty());
    }

    #[test]
    fn test_register_same_name_replaces_in_place() {
        let mut registry = registry();
        registry.register(DegradationFactory::new(&SILENCE_INFO, create_op::<Shift>));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["silence", "shift"]);
        let replaced = registry.create("silence").unwrap();
        assert_eq!(replaced.name(), "shift");
    }

    #[test]
    fn test_empty_registry() {
        let registry = DegradationRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.is_registered("gain"));
    }
}

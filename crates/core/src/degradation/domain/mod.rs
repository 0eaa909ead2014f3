pub mod degradation;
pub mod degradation_env;
pub mod degradation_error;
pub mod grammar;
pub mod kernels;
pub mod parameters_parser;
pub mod registry;
pub mod usage_doc;

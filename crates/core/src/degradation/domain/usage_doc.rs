use crate::shared::constants::{DESCRIPTION_SEP, NAME_SEP, PARAMETERS_SEP};

use super::degradation::DegradationInfo;
use super::registry::DegradationRegistry;

const HEADER_INDENT: &str = "    ";
const BLOCK_INDENT: &str = "        ";
const ENTRY_INDENT: &str = "            ";

/// Renders the usage text of degradations from their schemas.
pub struct DegradationUsageDocGenerator;

impl DegradationUsageDocGenerator {
    /// `    name[,p1,p2]: description`
    pub fn header(info: &DegradationInfo) -> String {
        let names: Vec<&str> = info.parameter_names().collect();
        format!(
            "{HEADER_INDENT}{}{DESCRIPTION_SEP}{}",
            signature(info.name, &names),
            info.description
        )
    }

    pub fn params_info(info: &DegradationInfo) -> String {
        let mut doc = format!("\n{BLOCK_INDENT}parameters:");
        for p in info.parameters {
            doc.push_str(&format!(
                "\n{ENTRY_INDENT}{}{DESCRIPTION_SEP}{}",
                p.name, p.description
            ));
        }
        doc
    }

    pub fn example(info: &DegradationInfo) -> String {
        let examples: Vec<&str> = info.parameters.iter().map(|p| p.example).collect();
        format!(
            "\n{BLOCK_INDENT}example:\n{ENTRY_INDENT}{}",
            signature(info.name, &examples)
        )
    }

    /// Full help of one degradation, without a trailing newline.
    pub fn help(info: &DegradationInfo) -> String {
        let mut doc = Self::header(info);
        doc.push_str(&Self::params_info(info));
        doc.push_str(&Self::example(info));
        doc
    }

    /// Help of every registered degradation, in registration order.
    pub fn all_help(registry: &DegradationRegistry) -> String {
        registry
            .all()
            .iter()
            .map(|f| Self::help(f.info))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn signature(name: &str, parts: &[&str]) -> String {
    if parts.is_empty() {
        name.to_string()
    } else {
        format!("{name}{NAME_SEP}{}", parts.join(PARAMETERS_SEP))
    }
}

//! Expert personas
//!
//! A [`Role`] selects which fixed system instruction accompanies each prompt.
//! Six personas cover cement plant disciplines; `GeneralAi` is a plain
//! assistant. The role can change mid-conversation; later turns simply use
//! the new instruction.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persona used to build the model's system instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Operations & Maintenance
    #[default]
    #[serde(rename = "Operations")]
    Operations,
    /// EPC project management
    #[serde(rename = "Project Management")]
    ProjectManagement,
    /// Sales & Marketing
    #[serde(rename = "Sales & Marketing")]
    SalesMarketing,
    /// Procurement & Supply Chain
    #[serde(rename = "Procurement")]
    Procurement,
    /// Erection & Commissioning
    #[serde(rename = "Erection & Commissioning")]
    ErectionCommissioning,
    /// Engineering & Design
    #[serde(rename = "Engineering & Design")]
    EngineeringDesign,
    /// General purpose assistant
    #[serde(rename = "General AI")]
    GeneralAi,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    /// All selectable roles, in menu order
    pub const ALL: [Role; 7] = [
        Role::Operations,
        Role::ProjectManagement,
        Role::SalesMarketing,
        Role::Procurement,
        Role::ErectionCommissioning,
        Role::EngineeringDesign,
        Role::GeneralAi,
    ];

    /// Canonical name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operations => "Operations",
            Self::ProjectManagement => "Project Management",
            Self::SalesMarketing => "Sales & Marketing",
            Self::Procurement => "Procurement",
            Self::ErectionCommissioning => "Erection & Commissioning",
            Self::EngineeringDesign => "Engineering & Design",
            Self::GeneralAi => "General AI",
        }
    }

    /// Short command-line slug
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Operations => "operations",
            Self::ProjectManagement => "project-management",
            Self::SalesMarketing => "sales-marketing",
            Self::Procurement => "procurement",
            Self::ErectionCommissioning => "erection-commissioning",
            Self::EngineeringDesign => "engineering-design",
            Self::GeneralAi => "general",
        }
    }

    /// Parse a role from its slug, canonical name, or a loose abbreviation
    ///
    /// Matching ignores case, spaces, `&`, `-` and `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cemtras::roles::Role;
    ///
    /// assert_eq!(Role::parse_str("ops").unwrap(), Role::Operations);
    /// assert_eq!(Role::parse_str("Sales & Marketing").unwrap(), Role::SalesMarketing);
    /// assert_eq!(Role::parse_str("general-ai").unwrap(), Role::GeneralAi);
    /// assert!(Role::parse_str("astronaut").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "operations" | "ops" | "operationsmaintenance" | "om" => Ok(Self::Operations),
            "projectmanagement" | "pm" | "project" => Ok(Self::ProjectManagement),
            "salesmarketing" | "sales" | "marketing" => Ok(Self::SalesMarketing),
            "procurement" | "supplychain" | "procurementsupplychain" => Ok(Self::Procurement),
            "erectioncommissioning" | "erection" | "commissioning" => {
                Ok(Self::ErectionCommissioning)
            }
            "engineeringdesign" | "engineering" | "design" => Ok(Self::EngineeringDesign),
            "generalai" | "general" | "ai" | "assistant" => Ok(Self::GeneralAi),
            _ => Err(format!("Unknown role: {}", s.trim())),
        }
    }

    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Operations => "Operations & Maintenance",
            Self::ProjectManagement => "Project Management",
            Self::SalesMarketing => "Sales & Marketing",
            Self::Procurement => "Procurement & Supply Chain",
            Self::ErectionCommissioning => "Erection & Commissioning",
            Self::EngineeringDesign => "Engineering & Design",
            Self::GeneralAi => "General AI Assistant",
        }
    }

    /// One-line description of the persona's focus
    pub fn description(&self) -> &'static str {
        match self {
            Self::Operations => "Machinery troubleshooting & process optimization",
            Self::ProjectManagement => "EPC scheduling & resource planning",
            Self::SalesMarketing => "Market analysis & customer strategies",
            Self::Procurement => "Vendor negotiations & inventory optimization",
            Self::ErectionCommissioning => "Installation sequencing & safety compliance",
            Self::EngineeringDesign => "Process flow design & equipment selection",
            Self::GeneralAi => "General purpose AI for any questions",
        }
    }

    /// Fixed system instruction sent with every prompt for this role
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Self::GeneralAi => {
                "You are a helpful AI assistant. Provide natural, conversational responses to any \
                 questions across all topics and domains. Be informative, clear, and engaging. \
                 Respond naturally like ChatGPT but maintain professionalism."
            }
            Self::Operations => {
                "You are an expert Operations & Maintenance consultant for cement plants. Respond \
                 naturally and conversationally, drawing from deep expertise in machinery \
                 troubleshooting, process optimization, preventive maintenance, energy efficiency, \
                 and operational safety. Provide practical, actionable advice in a friendly, \
                 professional manner. Act like a seasoned plant operations manager sharing insights."
            }
            Self::ProjectManagement => {
                "You are an expert EPC Project Management consultant for cement plants. Respond \
                 naturally and conversationally, sharing insights on project scheduling, resource \
                 planning, risk management, erection coordination, and progress monitoring. \
                 Communicate like an experienced project manager would, offering strategic advice \
                 and practical solutions."
            }
            Self::SalesMarketing => {
                "You are an expert Sales & Marketing consultant for the cement industry. Respond \
                 naturally and conversationally, providing insights on market analysis, customer \
                 strategies, pricing optimization, distribution channels, and brand development. \
                 Share knowledge like a seasoned sales professional with deep market understanding."
            }
            Self::Procurement => {
                "You are an expert Procurement & Supply Chain consultant for cement plants. Respond \
                 naturally and conversationally, offering guidance on vendor management, strategic \
                 sourcing, inventory optimization, compliance, and cost-saving strategies. \
                 Communicate like an experienced procurement professional with strong negotiation \
                 skills and supplier relationships."
            }
            Self::ErectionCommissioning => {
                "You are an expert Erection & Commissioning consultant for cement plants. Respond \
                 naturally and conversationally, providing expertise on installation sequencing, \
                 contractor management, safety protocols, pre-commissioning checks, and \
                 performance validation. Share knowledge like a field expert with hands-on \
                 experience."
            }
            Self::EngineeringDesign => {
                "You are an expert Engineering & Design consultant for cement plants. Respond \
                 naturally and conversationally, offering insights on process flow design, plant \
                 layout, equipment selection, sustainability integration, and engineering best \
                 practices. Communicate like a senior design engineer with innovative solutions \
                 and technical depth."
            }
        }
    }

    /// Colored bracketed tag for prompts and status lines
    pub fn colored_tag(&self) -> String {
        let name = self.as_str();
        let tag = match self {
            Self::Operations => name.yellow(),
            Self::ProjectManagement => name.blue(),
            Self::SalesMarketing => name.green(),
            Self::Procurement => name.purple(),
            Self::ErectionCommissioning => name.red(),
            Self::EngineeringDesign => name.bright_red(),
            Self::GeneralAi => name.cyan(),
        };
        format!("[{}]", tag)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_operations() {
        assert_eq!(Role::default(), Role::Operations);
    }

    #[test]
    fn test_parse_slugs_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse_str(role.slug()).unwrap(), role);
            assert_eq!(Role::parse_str(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn test_parse_is_case_and_punctuation_insensitive() {
        assert_eq!(
            Role::parse_str("ERECTION_&_commissioning").unwrap(),
            Role::ErectionCommissioning
        );
        assert_eq!(Role::parse_str("  PM ").unwrap(), Role::ProjectManagement);
    }

    #[test]
    fn test_parse_unknown_role() {
        let err = Role::parse_str("astronaut").unwrap_err();
        assert_eq!(err, "Unknown role: astronaut");
    }

    #[test]
    fn test_serialized_names_match_display() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role));
        }
    }

    #[test]
    fn test_general_instruction_is_generic() {
        let text = Role::GeneralAi.system_instruction();
        assert!(text.starts_with("You are a helpful AI assistant."));
        assert!(!text.contains("cement"));
    }

    #[test]
    fn test_expert_instructions_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for role in Role::ALL {
            assert!(seen.insert(role.system_instruction()));
        }
        assert!(Role::Procurement
            .system_instruction()
            .contains("Procurement & Supply Chain consultant"));
    }
}

//! The parameter description table.
//!
//! One [`Description`] per logical parameter of the device: its sysex page,
//! its index within that page, whether it is duplicated per part or shared
//! across all parts, and whether it is exposed to the host or kept internal
//! to the control surface. The table also owns the named packet templates
//! the device speaks.
//!
//! The table is built once at plugin load (from whatever configuration
//! source the product uses - typically a generated description file) and is
//! read-only afterwards; everything downstream relies on that.

use std::collections::HashMap;

use crate::template::SysexTemplate;

// =============================================================================
// Description
// =============================================================================

/// Static metadata for one logical parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Symbolic name, unique per logical control (e.g. "Cutoff").
    pub name: String,
    /// Sysex page the parameter lives on.
    pub page: u8,
    /// Ordinal within the page.
    pub index: u32,
    /// `true` if every part gets its own instance, `false` for global
    /// controls shared by all parts.
    pub part_sensitive: bool,
    /// `true` if the instance is handed to the host for automation/GUI,
    /// `false` for control-surface-internal parameters.
    pub is_public: bool,
    /// Initial value of freshly constructed instances.
    pub default_value: u8,
}

impl Description {
    /// Create a public, per-part parameter description.
    pub fn new(name: impl Into<String>, page: u8, index: u32) -> Self {
        Self {
            name: name.into(),
            page,
            index,
            part_sensitive: true,
            is_public: true,
            default_value: 0,
        }
    }

    /// Mark the parameter as shared across all parts.
    pub fn shared(mut self) -> Self {
        self.part_sensitive = false;
        self
    }

    /// Mark the parameter as internal (not exposed to the host).
    pub fn internal(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: u8) -> Self {
        self.default_value = value;
        self
    }
}

// =============================================================================
// ParameterDescriptions
// =============================================================================

/// The full description table: parameters in definition order plus the named
/// packet templates.
///
/// Template order matters: packet identification probes templates in table
/// order and accepts the first match, so templates whose literal prefixes
/// could overlap should be listed most-specific first (better: keep the
/// prefixes disjoint).
#[derive(Debug, Default)]
pub struct ParameterDescriptions {
    descriptions: Vec<Description>,
    index_by_name: HashMap<String, u32>,
    templates: Vec<SysexTemplate>,
    template_by_name: HashMap<String, usize>,
}

impl ParameterDescriptions {
    /// Build the table from parameter descriptions and packet templates.
    ///
    /// Duplicate parameter names keep their first flat index (later entries
    /// at the same address are the "derived" duplicates the registry
    /// disambiguates by uid).
    pub fn new(descriptions: Vec<Description>, templates: Vec<SysexTemplate>) -> Self {
        let mut index_by_name = HashMap::with_capacity(descriptions.len());
        for (i, desc) in descriptions.iter().enumerate() {
            index_by_name.entry(desc.name.clone()).or_insert(i as u32);
        }

        let mut template_by_name = HashMap::with_capacity(templates.len());
        for (i, template) in templates.iter().enumerate() {
            template_by_name
                .entry(template.name().to_string())
                .or_insert(i);
        }

        Self {
            descriptions,
            index_by_name,
            templates,
            template_by_name,
        }
    }

    /// All parameter descriptions in definition order.
    pub fn descriptions(&self) -> &[Description] {
        &self.descriptions
    }

    /// Flat index of a parameter by name.
    pub fn index_by_name(&self, name: &str) -> Option<u32> {
        self.index_by_name.get(name).copied()
    }

    /// Description of a parameter by name.
    pub fn description_by_name(&self, name: &str) -> Option<&Description> {
        let index = self.index_by_name(name)?;
        self.descriptions.get(index as usize)
    }

    /// A packet template by name.
    pub fn template(&self, name: &str) -> Option<&SysexTemplate> {
        let index = *self.template_by_name.get(name)?;
        self.templates.get(index)
    }

    /// All packet templates in table order.
    pub fn templates(&self) -> impl Iterator<Item = &SysexTemplate> {
        self.templates.iter()
    }
}

//! Host framework seam.
//!
//! The registry hands its public parameter instances to the host plugin
//! framework grouped the way DAWs display them: one global group for shared
//! parameters plus one group per part. The host only ever reads and writes
//! a parameter's numeric value; it shares ownership of the instances via
//! `Arc`, so host-side lifetime management never dangles the registry's
//! handles.

use std::sync::Arc;

use crate::parameter::Parameter;

/// A named group of public parameters for host display.
#[derive(Debug, Clone)]
pub struct ParameterGroup {
    /// Stable group identifier (e.g. "global", "ch1").
    pub id: String,
    /// Display name (e.g. "Global", "Ch 1").
    pub name: String,
    /// The group's parameters, in description order.
    pub params: Vec<Arc<Parameter>>,
}

impl ParameterGroup {
    /// Create a group.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            params: Vec::new(),
        }
    }
}

/// Receiver for the registry's public parameter groups.
///
/// Implemented by the plugin-framework glue; called once per group during
/// registry construction.
pub trait ParameterHost {
    /// Take (shared) ownership of one group of public parameters.
    fn add_parameter_group(&mut self, group: ParameterGroup);
}

/// No-op host for control surfaces without an attached plugin framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl ParameterHost for NoHost {
    fn add_parameter_group(&mut self, _group: ParameterGroup) {}
}

/// Test/utility host that just collects every group it is given.
#[derive(Debug, Default)]
pub struct CollectingHost {
    /// All groups in registration order.
    pub groups: Vec<ParameterGroup>,
}

impl ParameterHost for CollectingHost {
    fn add_parameter_group(&mut self, group: ParameterGroup) {
        self.groups.push(group);
    }
}

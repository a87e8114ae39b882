//! The parameter registry and control-surface controller.
//!
//! [`Controller`] owns the live side of the system: one [`Parameter`]
//! instance per (part x description), the address maps that resolve wire
//! addresses to instances, and the outbound MIDI queue. It drives the
//! codec against live values - encode reads them, decode writes them back.
//!
//! Registration happens once at startup ([`Controller::register_parameters`]);
//! every map the controller builds there is read-only afterwards, which is
//! what makes the lookup paths safe to share across threads without locks.
//! Parameter values themselves are atomics.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use patchwire_core::{
    FieldDef, FieldKind, FieldValues, NamedValues, ParamAddress, ParamValues,
    ParameterDescriptions, PartId, PART_COUNT,
};

use crate::error::{ControllerError, ControllerResult};
use crate::host::{ParameterGroup, ParameterHost};
use crate::parameter::Parameter;
use crate::queue::{MidiEvent, MidiOutQueue, MidiSource};

/// Opaque handle to a registered parameter instance.
///
/// Handles index the controller's instance table and stay valid for the
/// controller's lifetime. Derived-parameter links are stored as handles so
/// same-address duplicates never hold references into each other.
pub type ParamHandle = usize;

/// The parameter registry plus the sysex entry points built on it.
pub struct Controller {
    descriptions: ParameterDescriptions,
    /// Instance table; `ParamHandle` indexes into this.
    params: Vec<Arc<Parameter>>,
    /// Per-handle derived links (uid 0 instance -> its duplicates).
    derived: Vec<Vec<ParamHandle>>,
    /// Address map for host-visible (public) instances.
    synth_params: BTreeMap<ParamAddress, Vec<ParamHandle>>,
    /// Address map for registry-owned (internal) instances.
    internal_params: BTreeMap<ParamAddress, Vec<ParamHandle>>,
    /// Positional lookup: part -> flat description index -> handle.
    /// Shared parameters alias part 0's handle on every part.
    params_by_part: Vec<Vec<ParamHandle>>,
    midi_out: MidiOutQueue,
}

impl Controller {
    /// Create a controller over a description table.
    ///
    /// No instances exist until [`register_parameters`](Self::register_parameters)
    /// runs.
    pub fn new(descriptions: ParameterDescriptions) -> Self {
        Self {
            descriptions,
            params: Vec::new(),
            derived: Vec::new(),
            synth_params: BTreeMap::new(),
            internal_params: BTreeMap::new(),
            params_by_part: vec![Vec::new(); PART_COUNT],
            midi_out: MidiOutQueue::new(),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Build every parameter instance and hand public ones to the host.
    ///
    /// Iterates parts outer, descriptions inner. Shared (non-part-sensitive)
    /// descriptions get exactly one instance on part 0; the other parts
    /// alias it positionally. Descriptions that repeat an address get
    /// ascending uids, and each duplicate is linked as derived from every
    /// instance already registered at that address.
    ///
    /// Public instances are grouped into one group per part plus a trailing
    /// global group for shared parameters; internal instances stay with the
    /// registry.
    pub fn register_parameters(&mut self, host: &mut dyn ParameterHost) {
        let descriptions = self.descriptions.descriptions().to_vec();
        let mut next_uid: HashMap<ParamAddress, u32> = HashMap::new();
        let mut global = ParameterGroup::new("global", "Global");

        for part in 0..PART_COUNT as PartId {
            let mut group =
                ParameterGroup::new(format!("ch{}", part + 1), format!("Ch {}", part + 1));

            for desc in &descriptions {
                if !desc.part_sensitive && part != 0 {
                    // Shared parameter: alias part 0's instance positionally.
                    let position = self.params_by_part[part as usize].len();
                    let alias = self.params_by_part[0][position];
                    self.params_by_part[part as usize].push(alias);
                    continue;
                }

                let address = ParamAddress::new(desc.page, part, desc.index);
                let uid = *next_uid
                    .entry(address)
                    .and_modify(|uid| *uid += 1)
                    .or_insert(0);

                let handle = self.params.len();
                let param = Arc::new(Parameter::new(desc.clone(), part, uid));
                self.params.push(Arc::clone(&param));
                self.derived.push(Vec::new());

                if uid > 0 {
                    let existing: Vec<ParamHandle> =
                        self.find_synth_param(address).to_vec();
                    for h in existing {
                        self.derived[h].push(handle);
                    }
                }

                self.params_by_part[part as usize].push(handle);

                if desc.is_public {
                    self.synth_params.entry(address).or_default().push(handle);
                    if desc.part_sensitive {
                        group.params.push(param);
                    } else {
                        global.params.push(param);
                    }
                } else {
                    self.internal_params.entry(address).or_default().push(handle);
                }
            }

            host.add_parameter_group(group);
        }

        host.add_parameter_group(global);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// The description table this controller was built over.
    pub fn descriptions(&self) -> &ParameterDescriptions {
        &self.descriptions
    }

    /// Resolve a handle to its instance.
    pub fn parameter(&self, handle: ParamHandle) -> Option<&Arc<Parameter>> {
        self.params.get(handle)
    }

    /// Positional lookup: flat description index on a given part.
    ///
    /// Shared parameters return part 0's instance on every part. Out of
    /// range yields `None`, never a panic.
    pub fn get_parameter(&self, index: u32, part: PartId) -> Option<&Arc<Parameter>> {
        let handles = self.params_by_part.get(part as usize)?;
        let handle = handles.get(index as usize)?;
        self.params.get(*handle)
    }

    /// Flat description index of a parameter by name.
    pub fn parameter_index_by_name(&self, name: &str) -> Option<u32> {
        self.descriptions.index_by_name(name)
    }

    /// Every registered instance at an address, public map first.
    ///
    /// Always returns an iterable slice - an absent address yields an empty
    /// slice, never a null.
    pub fn find_synth_param(&self, address: ParamAddress) -> &[ParamHandle] {
        if let Some(handles) = self.synth_params.get(&address) {
            return handles;
        }
        self.internal_params
            .get(&address)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// [`find_synth_param`](Self::find_synth_param) from address components.
    pub fn find_synth_param_at(&self, part: PartId, page: u8, index: u32) -> &[ParamHandle] {
        self.find_synth_param(ParamAddress::new(page, part, index))
    }

    /// The live instances a packet needs before it can be encoded.
    ///
    /// `part` resolves wildcard-part fields. Fails if the template is
    /// unknown, references an unknown parameter, or addresses a slot with
    /// no registered instance.
    pub fn parameters_for_packet(
        &self,
        packet: &str,
        part: PartId,
    ) -> ControllerResult<Vec<ParamHandle>> {
        let template = self
            .descriptions
            .template(packet)
            .ok_or_else(|| ControllerError::UnknownPacket(packet.to_string()))?;

        let addresses = template.parameter_addresses(&self.descriptions, part)?;
        let mut handles = Vec::with_capacity(addresses.len());

        for address in addresses {
            let found = self.find_synth_param(address);
            if found.is_empty() {
                return Err(ControllerError::MissingInstance {
                    part: address.part,
                    index: address.index,
                });
            }
            handles.extend_from_slice(found);
        }

        Ok(handles)
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Set an instance's value and propagate it to its derived duplicates.
    pub fn set_parameter_value(&self, handle: ParamHandle, value: u8) {
        if let Some(param) = self.params.get(handle) {
            param.set_value(value);
        }
        if let Some(links) = self.derived.get(handle) {
            for &h in links {
                if let Some(param) = self.params.get(h) {
                    param.set_value(value);
                }
            }
        }
    }

    /// Write decoded parameter values into the matching live instances.
    ///
    /// Addresses with no registered instance are skipped; decode output for
    /// parameters this surface doesn't model is not an error.
    pub fn apply_parameter_values(&self, values: &ParamValues) {
        for (address, value) in values {
            let handles = self.find_synth_param(*address).to_vec();
            for handle in handles {
                self.set_parameter_value(handle, *value);
            }
        }
    }

    // =========================================================================
    // Encode / send
    // =========================================================================

    /// Encode a named packet from direct values and live parameter values.
    ///
    /// `part` becomes the message's `Part` value unless `data` already
    /// carries one; wildcard parameter fields resolve against it. Values
    /// for parameter fields are read from the registered instances.
    pub fn create_sysex(
        &self,
        packet: &str,
        data: &FieldValues,
        part: PartId,
    ) -> ControllerResult<Vec<u8>> {
        let template = self
            .descriptions
            .template(packet)
            .ok_or_else(|| ControllerError::UnknownPacket(packet.to_string()))?;

        let mut data = data.clone();
        data.entry(FieldKind::Part).or_insert(part);
        let wire_part = data[&FieldKind::Part];

        let mut params = NamedValues::new();
        for field in template.fields() {
            if let FieldDef::Parameter(pf) = field {
                let index = self
                    .descriptions
                    .index_by_name(&pf.name)
                    .ok_or_else(|| ControllerError::UnknownParameter(pf.name.clone()))?;
                let part = pf.part.resolve(wire_part);
                let param = self
                    .get_parameter(index, part)
                    .ok_or(ControllerError::MissingInstance { part, index })?;
                params.insert((part, pf.name.clone()), param.value());
            }
        }

        Ok(template.create(&data, &params)?)
    }

    /// Encode a named packet and stage it for transmission.
    ///
    /// On failure nothing is enqueued - a malformed device command is
    /// never transmitted.
    pub fn send_sysex_with(
        &self,
        packet: &str,
        data: &FieldValues,
        part: PartId,
    ) -> ControllerResult<()> {
        match self.create_sysex(packet, data, part) {
            Ok(sysex) => {
                self.send_sysex_raw(sysex);
                Ok(())
            }
            Err(err) => {
                log::warn!("failed to encode sysex packet '{}': {}", packet, err);
                Err(err)
            }
        }
    }

    /// [`send_sysex_with`](Self::send_sysex_with) without direct values, on
    /// part 0.
    pub fn send_sysex(&self, packet: &str) -> ControllerResult<()> {
        self.send_sysex_with(packet, &FieldValues::new(), 0)
    }

    /// Stage a fully-formed sysex buffer, tagged as editor-originated.
    pub fn send_sysex_raw(&self, sysex: Vec<u8>) {
        self.midi_out.push(MidiEvent::sysex(sysex, MidiSource::Editor));
    }

    /// The outbound staging queue, for the audio/MIDI output path to drain.
    pub fn midi_out(&self) -> &MidiOutQueue {
        &self.midi_out
    }

    // =========================================================================
    // Decode
    // =========================================================================

    /// Parse an inbound buffer against a named template.
    ///
    /// Checksum mismatches are tolerated here, matching the usual handling
    /// of dumps from devices that fill checksum bytes lazily; use the
    /// template's own `parse` for strict verification.
    pub fn parse_sysex(
        &self,
        packet: &str,
        src: &[u8],
    ) -> ControllerResult<(FieldValues, ParamValues)> {
        let template = self
            .descriptions
            .template(packet)
            .ok_or_else(|| ControllerError::UnknownPacket(packet.to_string()))?;

        Ok(template.parse(src, &self.descriptions, true)?)
    }

    /// Identify which known packet an arbitrary inbound buffer is.
    ///
    /// Probes every template in table order and accepts the first that
    /// parses with literals and checksums intact; ties go to the earlier
    /// table entry, so identification templates should keep their literal
    /// prefixes disjoint. `None` means the buffer is unrecognized and
    /// should be dropped.
    pub fn identify_sysex(&self, src: &[u8]) -> Option<(&str, FieldValues, ParamValues)> {
        for template in self.descriptions.templates() {
            if let Ok((data, values)) = template.parse(src, &self.descriptions, false) {
                return Some((template.name(), data, values));
            }
        }

        log::debug!("unrecognized sysex buffer of {} bytes", src.len());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CollectingHost;
    use patchwire_core::{ChecksumSpec, Description, SysexTemplate};

    fn descriptions() -> ParameterDescriptions {
        ParameterDescriptions::new(
            vec![
                Description::new("Cutoff", 0, 16),
                Description::new("Resonance", 0, 17),
                Description::new("MasterVolume", 2, 0).shared().with_default(0x64),
                Description::new("LfoPhase", 0, 18).internal(),
            ],
            vec![
                SysexTemplate::new(
                    "parameterchange",
                    vec![
                        FieldDef::Byte(0xf0),
                        FieldDef::Byte(0x18),
                        FieldDef::Part,
                        FieldDef::ParameterIndex,
                        FieldDef::ParameterValue,
                        FieldDef::Checksum(ChecksumSpec::new(2, 4)),
                    ],
                ),
                SysexTemplate::new(
                    "singledump",
                    vec![
                        FieldDef::Byte(0xf0),
                        FieldDef::Byte(0x19),
                        FieldDef::DeviceId,
                        FieldDef::Part,
                        FieldDef::param("Cutoff"),
                        FieldDef::param("Resonance"),
                        FieldDef::param("MasterVolume"),
                        FieldDef::Checksum(ChecksumSpec::new(2, 6)),
                        FieldDef::Byte(0xf7),
                    ],
                ),
            ],
        )
    }

    fn controller() -> Controller {
        let mut controller = Controller::new(descriptions());
        controller.register_parameters(&mut CollectingHost::default());
        controller
    }

    #[test]
    fn test_instance_counts() {
        let c = controller();

        // Part 0 constructs all four descriptions; parts 1-15 skip the
        // shared MasterVolume.
        assert_eq!(c.params.len(), 4 + 15 * 3);
        for part in 0..PART_COUNT {
            assert_eq!(c.params_by_part[part].len(), 4);
        }
    }

    #[test]
    fn test_shared_parameter_aliases_part_zero() {
        let c = controller();
        let index = c.parameter_index_by_name("MasterVolume").unwrap();

        let first = c.get_parameter(index, 0).unwrap();
        for part in 1..PART_COUNT as PartId {
            let other = c.get_parameter(index, part).unwrap();
            assert!(Arc::ptr_eq(first, other));
        }
        assert_eq!(first.value(), 0x64);
    }

    #[test]
    fn test_part_sensitive_parameters_are_distinct() {
        let c = controller();
        let index = c.parameter_index_by_name("Cutoff").unwrap();

        for part_a in 0..PART_COUNT as PartId {
            for part_b in (part_a + 1)..PART_COUNT as PartId {
                let a = c.get_parameter(index, part_a).unwrap();
                let b = c.get_parameter(index, part_b).unwrap();
                assert!(!Arc::ptr_eq(a, b));
            }
        }
    }

    #[test]
    fn test_get_parameter_bounds() {
        let c = controller();
        assert!(c.get_parameter(0, 16).is_none());
        assert!(c.get_parameter(99, 0).is_none());
    }

    #[test]
    fn test_find_synth_param_never_null() {
        let c = controller();

        assert!(!c.find_synth_param_at(0, 0, 16).is_empty());
        // Internal parameters are found through the second map.
        assert!(!c.find_synth_param_at(3, 0, 18).is_empty());
        // Absent address: empty slice, not a failure.
        assert!(c.find_synth_param_at(0, 0x7f, 1234).is_empty());
    }

    #[test]
    fn test_uid_disambiguation_and_derived_links() {
        let mut c = Controller::new(ParameterDescriptions::new(
            vec![
                Description::new("OscShape", 1, 4),
                Description::new("OscShapeLayerB", 1, 4),
            ],
            Vec::new(),
        ));
        c.register_parameters(&mut CollectingHost::default());

        let handles = c.find_synth_param_at(0, 1, 4);
        assert_eq!(handles.len(), 2);
        let (first, second) = (handles[0], handles[1]);
        assert_eq!(c.parameter(first).unwrap().uid(), 0);
        assert_eq!(c.parameter(second).unwrap().uid(), 1);

        // Writing the uid-0 instance propagates along the derived link.
        c.set_parameter_value(first, 0x2a);
        assert_eq!(c.parameter(second).unwrap().value(), 0x2a);
    }

    #[test]
    fn test_host_groups() {
        let mut host = CollectingHost::default();
        let mut c = Controller::new(descriptions());
        c.register_parameters(&mut host);

        // 16 part groups, then the global group.
        assert_eq!(host.groups.len(), PART_COUNT + 1);
        assert_eq!(host.groups[0].id, "ch1");
        assert_eq!(host.groups[PART_COUNT].id, "global");

        // Part groups carry the public per-part parameters only.
        let ch1: Vec<_> = host.groups[0].params.iter().map(|p| p.name()).collect();
        assert_eq!(ch1, ["Cutoff", "Resonance"]);

        // Shared parameters land in the global group, once.
        let global: Vec<_> = host.groups[PART_COUNT]
            .params
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(global, ["MasterVolume"]);

        // Parts past the first contribute nothing global.
        assert!(host.groups[5].params.iter().all(|p| p.part() == 5));
    }

    #[test]
    fn test_create_sysex_reads_live_values() {
        let c = controller();
        let cutoff = c.parameter_index_by_name("Cutoff").unwrap();
        c.get_parameter(cutoff, 3).unwrap().set_value(0x5a);

        let sysex = c.create_sysex("singledump", &device_id(0x10), 3).unwrap();
        assert_eq!(sysex[3], 3); // part byte
        assert_eq!(sysex[4], 0x5a); // cutoff on part 3
        assert_eq!(sysex[6], 0x64); // shared master volume default
    }

    fn device_id(id: u8) -> FieldValues {
        [(FieldKind::DeviceId, id)].into_iter().collect()
    }

    #[test]
    fn test_send_sysex_stages_event() {
        let c = controller();
        c.send_sysex_with("singledump", &device_id(0x10), 0).unwrap();

        let events = c.midi_out().drain_all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, MidiSource::Editor);
        assert_eq!(events[0].sysex.len(), 9);
    }

    #[test]
    fn test_failed_encode_sends_nothing() {
        let c = controller();

        let err = c.send_sysex("nosuchpacket").unwrap_err();
        assert_eq!(err, ControllerError::UnknownPacket("nosuchpacket".to_string()));

        // Missing DeviceId value: encode fails, queue stays empty.
        assert!(c.send_sysex("singledump").is_err());
        assert!(c.midi_out().is_empty());
    }

    #[test]
    fn test_identify_sysex_first_match() {
        let c = controller();
        let data: FieldValues = [
            (FieldKind::Part, 3),
            (FieldKind::ParameterIndex, 10),
            (FieldKind::ParameterValue, 64),
        ]
        .into_iter()
        .collect();
        let sysex = c.create_sysex("parameterchange", &data, 3).unwrap();

        let (name, data, values) = c.identify_sysex(&sysex).unwrap();
        assert_eq!(name, "parameterchange");
        assert_eq!(data[&FieldKind::ParameterValue], 64);
        assert!(values.is_empty());

        assert!(c.identify_sysex(&[0xf0, 0x7e, 0xf7]).is_none());
    }

    #[test]
    fn test_parse_and_apply_parameter_values() {
        let c = controller();

        // Build a dump for part 2 with known values.
        let cutoff = c.parameter_index_by_name("Cutoff").unwrap();
        let volume = c.parameter_index_by_name("MasterVolume").unwrap();
        c.get_parameter(cutoff, 2).unwrap().set_value(0x21);
        c.get_parameter(volume, 2).unwrap().set_value(0x33);
        let sysex = c.create_sysex("singledump", &device_id(0x10), 2).unwrap();

        // Reset, then decode and apply - values must come back.
        c.get_parameter(cutoff, 2).unwrap().set_value(0);
        c.get_parameter(volume, 0).unwrap().set_value(0);

        let (data, values) = c.parse_sysex("singledump", &sysex).unwrap();
        assert_eq!(data[&FieldKind::Part], 2);
        c.apply_parameter_values(&values);

        assert_eq!(c.get_parameter(cutoff, 2).unwrap().value(), 0x21);
        // The shared parameter was applied to the single part-0 instance.
        assert_eq!(c.get_parameter(volume, 7).unwrap().value(), 0x33);
    }

    #[test]
    fn test_parameters_for_packet() {
        let c = controller();

        let handles = c.parameters_for_packet("singledump", 4).unwrap();
        let names: Vec<_> = handles
            .iter()
            .map(|&h| c.parameter(h).unwrap().name())
            .collect();
        assert_eq!(names, ["Cutoff", "Resonance", "MasterVolume"]);
        assert!(handles
            .iter()
            .all(|&h| matches!(c.parameter(h).unwrap().part(), 0 | 4)));

        // No parameter fields: empty, not an error.
        assert!(c.parameters_for_packet("parameterchange", 0).unwrap().is_empty());

        assert_eq!(
            c.parameters_for_packet("nosuchpacket", 0).unwrap_err(),
            ControllerError::UnknownPacket("nosuchpacket".to_string())
        );
    }
}

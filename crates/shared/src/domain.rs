use serde::{Deserialize, Serialize};

/// Index into the mode registry. Ids are positional: the n-th configured
/// mode name has id n.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    pub id: ModeId,
    pub name: String,
}

/// Fixed, ordered list of display modes. Immutable after startup.
///
/// Position 0 is the off panel; the registry owns that convention so no
/// other component hardcodes the index.
#[derive(Debug, Clone)]
pub struct ModeRegistry {
    modes: Vec<Mode>,
    default: ModeId,
}

impl ModeRegistry {
    /// Builds a registry from the configured mode names. A `default`
    /// index outside the list is clamped to 0.
    pub fn new<I, S>(names: I, default: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let modes: Vec<Mode> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Mode {
                id: ModeId(i),
                name: name.into(),
            })
            .collect();
        let default = if default < modes.len() {
            ModeId(default)
        } else {
            ModeId(0)
        };
        Self { modes, default }
    }

    /// The mode vocabulary of the original device: off, the two network
    /// interfaces, clock, and the system panels. Default is the clock.
    pub fn builtin() -> Self {
        Self::new(
            [
                "Turn off",
                "Wifi",
                "Ethernet",
                "Clock",
                "Load",
                "Disk usage",
                "CPU Temp",
                "RAM",
            ],
            3,
        )
    }

    pub fn default_mode(&self) -> ModeId {
        self.default
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Exact byte-for-byte match of an inbound command payload against a
    /// registered mode name.
    pub fn resolve(&self, payload: &str) -> Option<ModeId> {
        self.modes
            .iter()
            .find(|mode| mode.name == payload)
            .map(|mode| mode.id)
    }

    pub fn contains(&self, id: ModeId) -> bool {
        id.0 < self.modes.len()
    }

    /// A valid id passes through; an out-of-range id maps to the default.
    pub fn clamp(&self, id: ModeId) -> ModeId {
        if self.contains(id) {
            id
        } else {
            self.default
        }
    }

    /// Name of a mode; out-of-range ids resolve to the default's name.
    pub fn name(&self, id: ModeId) -> &str {
        &self.modes[self.clamp(id).0].name
    }

    pub fn is_off(&self, id: ModeId) -> bool {
        id.0 == 0 && self.contains(id)
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_names_to_positional_ids() {
        let registry = ModeRegistry::builtin();
        assert_eq!(registry.resolve("Wifi"), Some(ModeId(1)));
        assert_eq!(registry.resolve("RAM"), Some(ModeId(7)));
        assert_eq!(registry.resolve("wifi"), None);
        assert_eq!(registry.resolve("Wifi "), None);
    }

    #[test]
    fn clamps_out_of_range_ids_to_default() {
        let registry = ModeRegistry::builtin();
        assert_eq!(registry.clamp(ModeId(2)), ModeId(2));
        assert_eq!(registry.clamp(ModeId(99)), ModeId(3));
        assert_eq!(registry.name(ModeId(99)), "Clock");
    }

    #[test]
    fn off_is_position_zero() {
        let registry = ModeRegistry::builtin();
        assert!(registry.is_off(ModeId(0)));
        assert!(!registry.is_off(ModeId(3)));
        assert!(!registry.is_off(ModeId(42)));
    }

    #[test]
    fn invalid_default_index_falls_back_to_zero() {
        let registry = ModeRegistry::new(["Off", "Clock"], 9);
        assert_eq!(registry.default_mode(), ModeId(0));
    }
}

use viewgate_core::{ResourceId, SharingLevel};

/// Access context for a request the gate let through.
///
/// Inserted by the gate middleware; handlers of the guarded resource read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    resource_id: ResourceId,
    sharing: SharingLevel,
}

impl AccessContext {
    pub fn new(resource_id: ResourceId, sharing: SharingLevel) -> Self {
        Self {
            resource_id,
            sharing,
        }
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn sharing(&self) -> SharingLevel {
        self.sharing
    }
}

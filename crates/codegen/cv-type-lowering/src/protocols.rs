//! Protocol conformance tables

use crate::error::{LoweringError, LoweringResult};
use crate::lowering::{TypeLowering, expect_lowered};
use cv_lir::BackendType;
use cv_types::{Type, TypeDefId};

/// Slot assignment of a type's conformance table
///
/// The runtime finds the conformance to a protocol at slot
/// `protocol index - lowest index`. Slots between conformances stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceSlots {
    lowest_index: u32,
    slots: Vec<Option<TypeDefId>>,
}

impl ConformanceSlots {
    /// Protocol index stored at slot 0
    pub fn lowest_index(&self) -> u32 {
        self.lowest_index
    }

    /// Number of slots, including empty ones
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the type conforms to no protocol
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Protocol occupying `slot`
    pub fn protocol_at(&self, slot: usize) -> Option<TypeDefId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Slot of the protocol with package-wide index `protocol_index`
    pub fn slot_of(&self, protocol_index: u32) -> Option<usize> {
        let slot = protocol_index.checked_sub(self.lowest_index)? as usize;
        self.slots.get(slot).copied().flatten().map(|_| slot)
    }
}

/// Protocols of a multiprotocol, sorted by definition
fn canonical_protocols(protocols: &[Type]) -> Vec<TypeDefId> {
    let mut defs: Vec<TypeDefId> = protocols.iter().filter_map(Type::type_definition).collect();
    defs.sort();
    defs.dedup();
    defs
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "engine queries are grouped by the layout they produce"
)]
impl TypeLowering<'_> {
    /// Conformance slots of a type definition
    ///
    /// Classes also conform to every protocol of their superclasses.
    pub fn conformance_slots(&self, def: TypeDefId) -> ConformanceSlots {
        if self.package.try_definition(def).is_none() {
            return ConformanceSlots::default();
        }
        let mut conformances: Vec<(u32, TypeDefId)> = self
            .package
            .superclass_chain(def)
            .flat_map(|ancestor| self.package.definition(ancestor).conformances.iter())
            .filter_map(Type::type_definition)
            .filter_map(|protocol| {
                let index = self.package.try_definition(protocol)?.protocol_index()?;
                Some((index, protocol))
            })
            .collect();
        conformances.sort();
        conformances.dedup();

        let (Some(&(lowest, _)), Some(&(highest, _))) =
            (conformances.first(), conformances.last())
        else {
            return ConformanceSlots::default();
        };
        let mut slots = vec![None; (highest - lowest + 1) as usize];
        for (index, protocol) in conformances {
            slots[(index - lowest) as usize] = Some(protocol);
        }
        ConformanceSlots {
            lowest_index: lowest,
            slots,
        }
    }

    /// `[N x ptr]` holding the conformance table of a type definition
    pub fn conformance_table_type(&self, def: TypeDefId) -> BackendType {
        BackendType::array(BackendType::Ptr, self.conformance_slots(def).len() as u64)
    }

    /// Conformance array of a multiprotocol value
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a well-formed multiprotocol.
    pub fn multiprotocol_conformance(&mut self, ty: &Type) -> BackendType {
        expect_lowered(self.try_multiprotocol_conformance(ty))
    }

    /// Conformance array of a multiprotocol value
    ///
    /// One pointer per protocol, ordered by protocol definition so that the
    /// order in which the protocols were written does not matter.
    ///
    /// # Errors
    ///
    /// Fails if `ty` is not a multiprotocol or names something other than
    /// protocols.
    pub fn try_multiprotocol_conformance(&mut self, ty: &Type) -> LoweringResult<BackendType> {
        let resolved = self.resolve(ty);
        let Type::MultiProtocol(protocols) = &resolved else {
            return Err(LoweringError::NotAMultiprotocol { ty: self.display(&resolved) });
        };
        self.lower_resolved(&resolved)?;
        Ok(BackendType::array(BackendType::Ptr, canonical_protocols(protocols).len() as u64))
    }

    /// Slot of `protocol` inside the conformance array of the multiprotocol `ty`
    ///
    /// # Errors
    ///
    /// Fails if `ty` is not a multiprotocol.
    pub fn multiprotocol_slot(
        &self,
        ty: &Type,
        protocol: TypeDefId,
    ) -> LoweringResult<Option<usize>> {
        match self.resolve(ty) {
            Type::MultiProtocol(protocols) => {
                Ok(canonical_protocols(&protocols).iter().position(|&def| def == protocol))
            }
            other => Err(LoweringError::NotAMultiprotocol { ty: self.display(&other) }),
        }
    }
}

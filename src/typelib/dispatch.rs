//! Dispatch ID allocation for one interface.
//!
//! Every member of an interface gets a generated ID from a counter seeded at the ABI's base
//! (`0x60020000` for dispatch-based interfaces, `0x60010000` for `IUnknown`-based ones). The
//! counter moves upward past IDs that are already claimed, generated or explicit. A member
//! can additionally carry an explicit ID from its annotations, or `DISPID_VALUE` when it is
//! the type's declared default member.
//!
//! Registration is keyed by member, so a property whose getter and setter are registered
//! separately consumes two counter slots but keeps a single entry.
//!
//! After all members are registered, [`DispatchIdAllocator::normalize`] runs once:
//!
//! 1. `GetEnumerator` returning the enumerator shape gets `DISPID_NEWENUM`
//! 2. explicit IDs claimed by several members are cleared on all claimants, with one
//!    `TYPE_E_DUPLICATEID` warning per value
//! 3. a generated ID that a later member claimed explicitly moves to the next free slot
//! 4. the first member named `Value` takes `DISPID_VALUE` if no member holds ID 0 yet
//!
//! # Examples
//!
//! ```rust
//! use tlbscope::metadata::{diagnostics::Diagnostics, typesystem::ComInterfaceType};
//! use tlbscope::typelib::dispatch::{DispatchIdAllocator, DispatchMember, DISPATCH_BASE};
//!
//! let mut allocator = DispatchIdAllocator::new(ComInterfaceType::Dual);
//! allocator.register_member(DispatchMember::new(0, "Open"));
//! allocator.register_member(DispatchMember::new(1, "Close").declared(7));
//! allocator.normalize(&Diagnostics::new(), "IDocument");
//!
//! assert_eq!(allocator.id(0), Some(DISPATCH_BASE));
//! assert_eq!(allocator.id(1), Some(7));
//! ```

use crate::metadata::{
    diagnostics::{DiagnosticCategory, Diagnostics, HRESULT},
    typesystem::ComInterfaceType,
};

/// Member identifier within a dispatch interface.
pub type DispatchId = i32;

/// ID of the default member.
pub const DISPID_VALUE: DispatchId = 0;
/// ID of the enumerator factory.
pub const DISPID_NEWENUM: DispatchId = -4;
/// First generated ID on dispatch-based interfaces.
pub const DISPATCH_BASE: DispatchId = 0x6002_0000;
/// First generated ID on `IUnknown`-based interfaces.
pub const VTABLE_BASE: DispatchId = 0x6001_0000;

const ENUMERATOR_FACTORY: &str = "GetEnumerator";
const VALUE_MEMBER: &str = "Value";

/// Returns the first generated ID for an interface ABI.
#[must_use]
pub fn base_for(kind: ComInterfaceType) -> DispatchId {
    match kind {
        ComInterfaceType::IUnknown => VTABLE_BASE,
        _ => DISPATCH_BASE,
    }
}

/// A member as presented to the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchMember<'a> {
    /// Identifies the member within its interface; accessors of one property share it
    pub key: usize,
    /// Managed member name
    pub name: &'a str,
    /// Explicit ID from the member's annotations
    pub declared: Option<DispatchId>,
    /// The member returns the enumerator shape
    pub returns_enumerator: bool,
}

impl<'a> DispatchMember<'a> {
    /// Creates a member without explicit ID.
    #[must_use]
    pub fn new(key: usize, name: &'a str) -> Self {
        DispatchMember {
            key,
            name,
            declared: None,
            returns_enumerator: false,
        }
    }

    /// Sets the explicit ID.
    #[must_use]
    pub fn declared(mut self, id: DispatchId) -> Self {
        self.declared = Some(id);
        self
    }

    /// Marks the member as returning the enumerator shape.
    #[must_use]
    pub fn returns_enumerator(mut self, value: bool) -> Self {
        self.returns_enumerator = value;
        self
    }
}

/// Allocation record of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    /// Member key
    pub key: usize,
    /// Member name
    pub name: String,
    /// Counter-assigned ID
    pub generated: DispatchId,
    /// Explicit ID, if any survived normalization
    pub explicit: Option<DispatchId>,
    /// The member returns the enumerator shape
    pub returns_enumerator: bool,
}

impl DispatchEntry {
    /// Explicit ID if set, generated otherwise.
    #[must_use]
    pub fn id(&self) -> DispatchId {
        self.explicit.unwrap_or(self.generated)
    }
}

/// Allocates dispatch IDs for the members of one interface.
#[derive(Debug, Clone)]
pub struct DispatchIdAllocator {
    base: DispatchId,
    next: DispatchId,
    default_member: Option<String>,
    entries: Vec<DispatchEntry>,
}

impl DispatchIdAllocator {
    /// Creates an allocator seeded for `kind`.
    #[must_use]
    pub fn new(kind: ComInterfaceType) -> Self {
        let base = base_for(kind);
        DispatchIdAllocator {
            base,
            next: base,
            default_member: None,
            entries: Vec::new(),
        }
    }

    /// Sets the name of the type's default member, which gets `DISPID_VALUE`.
    #[must_use]
    pub fn with_default_member(mut self, name: Option<&str>) -> Self {
        self.default_member = name.map(str::to_string);
        self
    }

    /// The first generated ID.
    #[must_use]
    pub fn base(&self) -> DispatchId {
        self.base
    }

    /// Registered entries, in registration order.
    #[must_use]
    pub fn entries(&self) -> &[DispatchEntry] {
        &self.entries
    }

    /// Registers a member and returns the generated ID consumed by this call.
    ///
    /// A member already registered under the same key keeps its first entry; the slot is
    /// consumed regardless.
    pub fn register_member(&mut self, member: DispatchMember<'_>) -> DispatchId {
        let mut generated = self.skip_slot();
        while self
            .entries
            .iter()
            .any(|entry| entry.explicit == Some(generated) || entry.id() == generated)
        {
            generated = self.skip_slot();
        }

        let explicit = member.declared.or_else(|| {
            (self.default_member.as_deref() == Some(member.name)).then_some(DISPID_VALUE)
        });

        if !self.entries.iter().any(|entry| entry.key == member.key) {
            self.entries.push(DispatchEntry {
                key: member.key,
                name: member.name.to_string(),
                generated,
                explicit,
                returns_enumerator: member.returns_enumerator,
            });
        }

        generated
    }

    /// Consumes one counter slot without registering anything.
    ///
    /// Invisible members still occupy their position in the sequence.
    pub fn skip_slot(&mut self) -> DispatchId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Returns the effective ID of a registered member.
    #[must_use]
    pub fn id(&self, key: usize) -> Option<DispatchId> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(DispatchEntry::id)
    }

    /// Applies the enumerator, duplicate, collision and default-value rules.
    ///
    /// Duplicate explicit IDs are reported against `subject` and never fail.
    pub fn normalize(&mut self, diagnostics: &Diagnostics, subject: &str) {
        for entry in &mut self.entries {
            if entry.name == ENUMERATOR_FACTORY
                && entry.returns_enumerator
                && entry.explicit.is_none()
            {
                entry.explicit = Some(DISPID_NEWENUM);
            }
        }

        for index in 0..self.entries.len() {
            let Some(value) = self.entries[index].explicit else {
                continue;
            };

            let claimants = self
                .entries
                .iter()
                .filter(|entry| entry.explicit == Some(value))
                .count();
            if claimants < 2 {
                continue;
            }

            for entry in &mut self.entries {
                if entry.explicit == Some(value) {
                    entry.explicit = None;
                }
            }
            diagnostics.report(
                DiagnosticCategory::DispatchId,
                HRESULT::TYPE_E_DUPLICATEID,
                subject,
                format!(
                    "Type library exporter warning processing '{subject}'. Warning: The type had one or more duplicate DISPIDs specified. The duplicate DISPIDs were ignored."
                ),
            );
        }

        for index in 0..self.entries.len() {
            if self.entries[index].explicit.is_some() {
                continue;
            }
            let mut generated = self.entries[index].generated;
            while self
                .entries
                .iter()
                .enumerate()
                .any(|(other, entry)| other != index && entry.id() == generated)
            {
                generated = self.skip_slot();
            }
            self.entries[index].generated = generated;
        }

        let value_taken = self.entries.iter().any(|entry| entry.id() == DISPID_VALUE);
        if !value_taken {
            if let Some(entry) = self
                .entries
                .iter_mut()
                .find(|entry| entry.name == VALUE_MEMBER)
            {
                if entry.explicit.is_none() {
                    entry.explicit = Some(DISPID_VALUE);
                }
            }
        }
    }
}

use super::{FieldKind, LayoutDescriptor, LayoutField};
use crate::constants::WORD_SIZE;
use crate::errors::LayoutError;
use alloy_primitives::U256;

/// Builds a [`LayoutDescriptor`] in declaration order.
///
/// Automatic placement follows the compiler's tight packing rule:
///   - scalars fill a word from the low-order end while the remaining bytes fit them,
///     otherwise they start at offset 0 of the next slot
///   - arrays and mappings always start on a fresh slot, and so does whatever follows them
///
/// `[uint160, uint160, uint8]` therefore lands at `(0, 0)`, `(1, 0)`, `(1, 20)`.
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    fields: Vec<LayoutField>,
    /// Slot the next automatically placed field goes into
    next_slot: U256,
    /// Bytes of `next_slot` already taken by packed scalars
    used_bytes: usize,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, assigning its slot (and scalar byte offset) automatically.
    pub fn push(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let field = match kind {
            FieldKind::Scalar { ty, .. } => {
                let width = ty.byte_width();
                if self.used_bytes > 0 && self.used_bytes + width > WORD_SIZE {
                    self.advance_slot();
                }
                let field = LayoutField::new(
                    name,
                    self.next_slot,
                    FieldKind::scalar_at(ty, self.used_bytes as u8),
                );
                self.used_bytes += width;
                field
            }
            kind => {
                if self.used_bytes > 0 {
                    self.advance_slot();
                }
                let footprint = kind.slot_footprint().unwrap_or(U256::MAX);
                let field = LayoutField::new(name, self.next_slot, kind);
                self.next_slot = self.next_slot.saturating_add(footprint);
                field
            }
        };
        self.fields.push(field);
        self
    }

    /// Append a field at a slot known out-of-band.
    ///
    /// Scalars keep the byte offset declared in `kind`. Automatic placement resumes
    /// after this field if it ends beyond the current cursor.
    pub fn push_at(mut self, name: impl Into<String>, slot: U256, kind: FieldKind) -> Self {
        let end = match &kind {
            FieldKind::Scalar { ty, byte_offset } => {
                (slot, *byte_offset as usize + ty.byte_width())
            }
            other => (slot.saturating_add(other.slot_footprint().unwrap_or(U256::MAX)), 0),
        };
        if end > (self.next_slot, self.used_bytes) {
            (self.next_slot, self.used_bytes) = end;
        }
        self.fields.push(LayoutField::new(name, slot, kind));
        self
    }

    /// Validate the collected fields and produce the descriptor.
    pub fn build(self) -> Result<LayoutDescriptor, LayoutError> {
        LayoutDescriptor::from_fields(self.fields)
    }

    fn advance_slot(&mut self) {
        self.next_slot = self.next_slot.saturating_add(U256::from(1));
        self.used_bytes = 0;
    }
}

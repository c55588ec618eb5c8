//! Per-segment fault bitflags.
//!
//! Configuration faults never abort a figure: the affected segment is
//! degraded to an inert state and the flag is kept for diagnostics.

use bitflags::bitflags;

bitflags! {
    /// Faults detected on a single segment.
    ///
    /// Any flag in [`SegmentFault::INERT_MASK`] excludes the segment from
    /// mode transitions; its controller and limiter stay off.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SegmentFault: u8 {
        /// No rigid body is attached to the segment.
        const MISSING_BODY      = 0x01;
        /// Body mass is zero or negative; load factor forced to 0.
        const NON_POSITIVE_MASS = 0x02;
        /// A carried edge from this segment closes a cycle and was skipped.
        const CYCLIC_CARRY      = 0x04;
        /// Load aggregation has not produced a value for this segment.
        const LOAD_NOT_COMPUTED = 0x08;
        /// An anchor or limit reference is configured but has no rigid body.
        const MISSING_ANCHOR    = 0x10;
    }
}

impl SegmentFault {
    /// Faults that leave the segment without a usable body or reference.
    pub const INERT_MASK: Self =
        Self::from_bits_truncate(Self::MISSING_BODY.bits() | Self::MISSING_ANCHOR.bits());

    /// Returns true if the segment must be excluded from control.
    #[inline]
    pub const fn is_inert(&self) -> bool {
        self.intersects(Self::INERT_MASK)
    }
}

impl Default for SegmentFault {
    fn default() -> Self {
        Self::empty()
    }
}

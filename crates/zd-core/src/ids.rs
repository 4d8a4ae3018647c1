use core::fmt;
use core::num::NonZeroU32;

/// Position of a block in its model, assigned in insertion order.
///
/// Stored as `index + 1` in a `NonZeroU32` so `Option<BlockId>` costs
/// nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockId(NonZeroU32);

impl BlockId {
    /// `None` for `u32::MAX`, which has no successor.
    pub fn from_index(index: u32) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU32::new).map(Self)
    }

    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    pub fn as_usize(self) -> usize {
        self.index() as usize
    }
}

impl TryFrom<usize> for BlockId {
    type Error = usize;

    /// Fails with the rejected index when it does not fit.
    fn try_from(index: usize) -> Result<Self, Self::Error> {
        u32::try_from(index)
            .ok()
            .and_then(Self::from_index)
            .ok_or(index)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.index())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_zero_based_index() {
        for i in [0_u32, 1, 7, 65_535] {
            let id = BlockId::from_index(i).unwrap();
            assert_eq!(id.index(), i);
            assert_eq!(id.as_usize(), i as usize);
        }
        assert_eq!(BlockId::from_index(3).unwrap().to_string(), "#3");
    }

    #[test]
    fn overflow_is_rejected() {
        assert!(BlockId::from_index(u32::MAX).is_none());
        assert_eq!(BlockId::try_from(5_usize).map(BlockId::index), Ok(5));
        assert_eq!(BlockId::try_from(u32::MAX as usize), Err(u32::MAX as usize));
    }

    #[test]
    fn niche_keeps_option_small() {
        assert_eq!(
            core::mem::size_of::<BlockId>(),
            core::mem::size_of::<Option<BlockId>>()
        );
    }
}

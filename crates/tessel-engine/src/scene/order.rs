/// Paint layer. Higher values are painted later (on top).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct ZIndex(pub i32);

/// Stable paint-order key: `z` ascending, then insertion `seq` ascending.
///
/// Field order matters: the derived `Ord` compares `z` first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SortKey {
    pub z: ZIndex,
    pub seq: u32,
}

impl SortKey {
    #[inline]
    pub const fn new(z: ZIndex, seq: u32) -> Self {
        Self { z, seq }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn z_dominates_sequence() {
        let back = SortKey::new(ZIndex(-1), 9);
        let front = SortKey::new(ZIndex(2), 0);
        assert!(back < front);
    }

    #[test]
    fn sequence_breaks_ties() {
        assert!(SortKey::new(ZIndex(0), 1) < SortKey::new(ZIndex(0), 2));
    }
}

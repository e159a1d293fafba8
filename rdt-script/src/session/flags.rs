use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bits in one flag array.
pub const BITS_PER_ARRAY: usize = 256;
const WORDS: usize = BITS_PER_ARRAY / 32;

/// Script bit arrays, keyed by array index. Missing arrays read as all clear.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct FlagManager {
    flags: BTreeMap<u8, [u32; WORDS]>,
}

impl FlagManager {
    pub fn set_flag(&mut self, array: u8, bit: u8, on: bool) {
        let words = self.flags.entry(array).or_insert([0; WORDS]);
        let (word, mask) = Self::locate(bit);

        if on {
            words[word] |= mask;
        } else {
            words[word] &= !mask;
        }
    }

    pub fn get_flag(&self, array: u8, bit: u8) -> bool {
        let (word, mask) = Self::locate(bit);
        self.flags
            .get(&array)
            .is_some_and(|words| words[word] & mask != 0)
    }

    fn locate(bit: u8) -> (usize, u32) {
        (bit as usize / 32, 1 << (bit % 32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_independent_per_array() {
        let mut flags = FlagManager::default();
        flags.set_flag(0, 0, true);
        flags.set_flag(0, 255, true);
        flags.set_flag(1, 31, true);

        assert!(flags.get_flag(0, 0));
        assert!(flags.get_flag(0, 255));
        assert!(!flags.get_flag(0, 31));
        assert!(flags.get_flag(1, 31));
        assert!(!flags.get_flag(2, 0));

        flags.set_flag(0, 255, false);
        assert!(!flags.get_flag(0, 255));
        assert!(flags.get_flag(0, 0));
    }
}

use std::fmt;

pub const ONE_CKB: u64 = 1_00000000;

/// Shannons rendered as CKB, `{:#}` appends the unit
#[derive(Default, Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct HumanCapacity(pub u64);

impl From<u64> for HumanCapacity {
    fn from(value: u64) -> HumanCapacity {
        HumanCapacity(value)
    }
}

impl fmt::Display for HumanCapacity {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let ckb_part = self.0 / ONE_CKB;
        let shannon_part = self.0 % ONE_CKB;
        let shannon_part_string = format!("{:0>8}", shannon_part);
        let mut base = 10;
        let mut suffix_zero = 7;
        for i in 0..8 {
            if shannon_part % base > 0 {
                suffix_zero = i;
                break;
            }
            base *= 10;
        }
        let fraction = &shannon_part_string[..(8 - suffix_zero)];
        if f.alternate() {
            write!(f, "{}.{} (CKB)", ckb_part, fraction)
        } else {
            write!(f, "{}.{}", ckb_part, fraction)
        }
    }
}

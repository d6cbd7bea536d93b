use clap::ValueEnum;

use crate::error::{EepError, EepResult};

/// Modules whose EEPROM has been tested with the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// CIM module, M93C66 in 8 bit organization
    Cim,

    /// MIU module, M93C56 in 16 bit organization
    Miu,
}

/// Chip id, size and organization sent in the command line.
/// `size` counts words of `org` bits, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipProfile {
    pub chip: u8,
    pub size: u16,
    pub org: u8,
}

impl ChipProfile {
    pub const CIM: ChipProfile = ChipProfile {
        chip: 66,
        size: 512,
        org: 8,
    };

    pub const MIU: ChipProfile = ChipProfile {
        chip: 56,
        size: 128,
        org: 16,
    };

    pub fn new(chip: u8, size: u16, org: u8) -> EepResult<Self> {
        if org != 8 && org != 16 {
            return Err(EepError::Configuration(format!(
                "Unsupported organization {}, expected 8 or 16",
                org
            )));
        }
        if size == 0 {
            return Err(EepError::Configuration("Chip size can't be zero".into()));
        }

        Ok(ChipProfile { chip, size, org })
    }

    /// Number of bytes the adapter streams for a full read or expects for a full write
    pub fn byte_len(&self) -> usize {
        self.size as usize * (self.org as usize / 8)
    }
}

impl Target {
    pub fn profile(&self) -> ChipProfile {
        match self {
            Target::Cim => ChipProfile::CIM,
            Target::Miu => ChipProfile::MIU,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_byte_lengths() {
        assert_eq!(Target::Cim.profile().byte_len(), 512);
        assert_eq!(Target::Miu.profile().byte_len(), 256);
    }

    #[test]
    fn rejects_unknown_org() {
        assert!(matches!(
            ChipProfile::new(66, 512, 12),
            Err(EepError::Configuration(_))
        ));
        assert!(ChipProfile::new(46, 64, 16).is_ok());
    }
}

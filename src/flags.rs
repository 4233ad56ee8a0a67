//! Tri-state flags and the ordered flag packer
//!
//! Every iBFT structure carries one flags byte. The meaning of each bit is
//! per structure, so the packer only knows about order: the i-th flag it is
//! handed lands in bit i.

use crate::error::{IbftError, IbftResult};
use serde::{Deserialize, Serialize};

/// A flag that may not have been set yet.
///
/// `Unset` is distinct from `False` so a description that forgot a flag is
/// caught at encode time instead of silently reading as "no".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Flag {
    #[default]
    Unset,
    False,
    True,
}

impl Flag {
    /// Resolve the flag, `None` while unset.
    pub fn get(self) -> Option<bool> {
        match self {
            Flag::Unset => None,
            Flag::False => Some(false),
            Flag::True => Some(true),
        }
    }

    /// Logical negation. An unset flag stays unset.
    pub fn negate(self) -> Self {
        match self {
            Flag::Unset => Flag::Unset,
            Flag::False => Flag::True,
            Flag::True => Flag::False,
        }
    }
}

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        if value {
            Flag::True
        } else {
            Flag::False
        }
    }
}

impl From<Option<bool>> for Flag {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Flag::Unset, Flag::from)
    }
}

impl From<Flag> for Option<bool> {
    fn from(flag: Flag) -> Self {
        flag.get()
    }
}

/// Pack an ordered list of named flags into a byte, flag i in bit i.
///
/// `structure` is only used to label errors. Any unset flag fails the pack.
pub fn pack_flags(structure: &'static str, flags: &[(&'static str, Flag)]) -> IbftResult<u8> {
    if flags.len() > 8 {
        return Err(IbftError::TooManyFlags {
            structure,
            count: flags.len(),
        });
    }

    let mut packed = 0u8;
    for (bit, &(name, flag)) in flags.iter().enumerate() {
        match flag.get() {
            Some(true) => packed |= 1 << bit,
            Some(false) => {}
            None => {
                return Err(IbftError::UnsetFlag {
                    structure,
                    flag: name,
                })
            }
        }
    }

    Ok(packed)
}

//! definition of the general decoding error type

use thiserror::Error;
use crate::data::PackingError;

/**
    general object reporting an unexpected content in the data given to the decoders

    Its variant are meant to help finding the cause responsible for the problem and how to deal with it. Every variant is scoped to one read of one slave, none of them compromise the decoding of other slaves.

    - [Self::TruncatedInput] and [Self::ParseError] are fatal for the current EEPROM image: decoding stops and whatever was decoded before is kept as a partial result
    - the other variants are soft: the decoders substitute a neutral value, log the problem and go on
*/
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// the buffer is shorter than a read demands
    #[error("input truncated at byte {offset:#x}: {needed} bytes needed, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// a category is structurally invalid
    #[error("invalid category {category} at byte {offset:#x}: {reason}")]
    ParseError {
        /// category type code, with vendor bit masked
        category: u16,
        /// byte position of the category header in the EEPROM image
        offset: usize,
        reason: &'static str,
    },

    /// the header checksum stored in the EEPROM does not match its content
    #[error("EEPROM header checksum is {stored:#04x} but content gives {computed:#04x}")]
    ChecksumMismatch {
        stored: u8,
        computed: u8,
    },

    /// a string index points past the string table, the empty string is used instead
    #[error("string index {index} out of string table of {available} strings")]
    UnknownStringIndex {
        index: u8,
        available: usize,
    },

    /// no decoding is known for this register, its raw value is reported instead
    #[error("no decoding known for register {address:#06x}")]
    UnknownRegisterAddress {
        address: u16,
    },
}

/// convenient alias to simplify return annotations
pub type DecodeResult<T=()> = core::result::Result<T, DecodeError>;

impl DecodeError {
    /// true if this error stops the decoding of the current EEPROM image
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TruncatedInput{..} | Self::ParseError{..})
    }
}

impl From<PackingError> for DecodeError {
    fn from(src: PackingError) -> Self {
        match src {
            PackingError::Truncated {offset, needed, remaining}
                => DecodeError::TruncatedInput {offset, needed, remaining},
            PackingError::InvalidValue(reason)
                => DecodeError::ParseError {category: 0, offset: 0, reason},
        }
    }
}

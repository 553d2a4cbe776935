/*!
    Generic decoding of raw register words into named fields, for display.

    Each known register is described once in [REGISTERS] by the list of its bit fields. Fields repeated for each port of the slave are described once and expanded at decoding, so the 4 ports always decode the same way.

    Decoding never fails and never allocates: an unknown address gives a single raw [UNKNOWN] field, and fields lying in words missing from the input are left out.
*/

use core::fmt;
use crate::{
    catalog::FieldId,
    error::{DecodeError, DecodeResult},
    registers,
    };


/// number of ports a slave controller can have
pub const PORTS: u8 = 4;
/// maximum number of fields a register decodes to
pub const MAX_FIELDS: usize = 32;
/// maximum number of words a register spans
pub const MAX_WORDS: usize = 8;
/// key of the field returned for registers without decoding
pub const UNKNOWN: &str = "Unknown";

/// list of decoded fields of one register
pub type DecodedFields = heapless::Vec<DecodedField, MAX_FIELDS>;


/// how a bit field's raw value is interpreted
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Decode {
    /// counter or size, displayed in decimal
    Raw,
    /// address or code, displayed in hexadecimal
    Hex,
    Bool,
    /// one label per possible raw value, so `2^width` labels
    Enum(&'static [&'static str]),
}

/// whether a bit field is repeated for each port
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Repeat {
    Once,
    /// one instance per port, each one `stride` bits after the previous
    PerPort {stride: u16},
}

/// description of a bit field in a register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BitFieldSpec {
    /// catalog key of the field
    pub key: &'static str,
    /// bit position of the field (of its instance for port 0) from the register start
    pub offset: u16,
    /// bit size, at most 64
    pub width: u8,
    pub decode: Decode,
    pub repeat: Repeat,
}
impl BitFieldSpec {
    const fn new(key: &'static str, offset: u16, width: u8, decode: Decode) -> Self {
        Self {key, offset, width, decode, repeat: Repeat::Once}
    }
    const fn per_port(key: &'static str, offset: u16, width: u8, stride: u16, decode: Decode) -> Self {
        Self {key, offset, width, decode, repeat: Repeat::PerPort {stride}}
    }
    /// bit position of one instance of this field
    pub fn offset_of(&self, port: u8) -> u16 {
        match self.repeat {
            Repeat::Once => self.offset,
            Repeat::PerPort {stride} => self.offset + u16::from(port) * stride,
        }
    }
}

/// description of a register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegisterSpec {
    pub address: u16,
    pub name: &'static str,
    /// number of 16 bit words the register spans
    pub words: u8,
    /// bit fields in display order
    pub fields: &'static [BitFieldSpec],
}


/// interpretation of a field's raw bits
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Interpretation {
    Raw(u64),
    Hex(u64),
    Bool(bool),
    Label(&'static str),
}
impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(value) => write!(f, "{}", value),
            Self::Hex(value) => write!(f, "{:#x}", value),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Label(label) => write!(f, "{}", label),
        }
    }
}

/// one decoded field of a register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedField {
    pub id: FieldId,
    /// bits of the field, as found in the register
    pub raw: u64,
    pub value: Interpretation,
}



use Decode::*;

const PORT_DESCRIPTOR: Decode = Enum(&["NotImplemented", "NotConfigured", "Ebus", "Mii"]);
const DC_RANGE: Decode = Enum(&["Bit32", "Bit64"]);
const FORWARDING: Decode = Enum(&["Transmit", "Filter"]);
const LOOP_CONTROL: Decode = Enum(&["Auto", "AutoClose", "AlwaysOpen", "AlwaysClosed"]);
const LINK_STATUS: Decode = Enum(&["NoLink", "Link"]);
const LOOP_STATUS: Decode = Enum(&["Open", "Closed", "AutoClosed", "Reserved"]);
const AL_STATE: Decode = Enum(&[
    "Reserved", "Init", "PreOperational", "Bootstrap",
    "SafeOperational", "Reserved", "Reserved", "Reserved",
    "Operational", "Reserved", "Reserved", "Reserved",
    "Reserved", "Reserved", "Reserved", "Reserved",
    ]);
const SII_OWNER: Decode = Enum(&["EthercatDL", "Pdi"]);
const SII_READ_SIZE: Decode = Enum(&["Bytes4", "Bytes8"]);
const SII_ADDRESS: Decode = Enum(&["OneByte", "TwoBytes"]);

const fn at(field: usize) -> u16   {field as u16}

/// all registers with a known decoding, sorted by address
pub static REGISTERS: &[RegisterSpec] = &[
    RegisterSpec {address: at(registers::dl::information.byte), name: "DL information", words: 5, fields: &[
        BitFieldSpec::new("DlInformation.Type", 0, 8, Hex),
        BitFieldSpec::new("DlInformation.Revision", 8, 8, Raw),
        BitFieldSpec::new("DlInformation.Build", 16, 16, Raw),
        BitFieldSpec::new("DlInformation.FmmuCount", 32, 8, Raw),
        BitFieldSpec::new("DlInformation.SyncManagerCount", 40, 8, Raw),
        BitFieldSpec::new("DlInformation.RamSize", 48, 8, Raw),
        BitFieldSpec::per_port("DlInformation.PortDescriptor", 56, 2, 2, PORT_DESCRIPTOR),
        BitFieldSpec::new("DlInformation.FmmuBitNotSupported", 64, 1, Bool),
        BitFieldSpec::new("DlInformation.NoSupportReservedRegister", 65, 1, Bool),
        BitFieldSpec::new("DlInformation.DcSupported", 66, 1, Bool),
        BitFieldSpec::new("DlInformation.DcRange", 67, 1, DC_RANGE),
        BitFieldSpec::new("DlInformation.LowJitterEbus", 68, 1, Bool),
        BitFieldSpec::new("DlInformation.EnhancedLinkDetectionEbus", 69, 1, Bool),
        BitFieldSpec::new("DlInformation.EnhancedLinkDetectionMii", 70, 1, Bool),
        BitFieldSpec::new("DlInformation.SeparateFcsErrorHandling", 71, 1, Bool),
        ]},
    RegisterSpec {address: at(registers::address::fixed.byte), name: "configured station address", words: 1, fields: &[
        BitFieldSpec::new("Address.ConfiguredStationAddress", 0, 16, Hex),
        ]},
    RegisterSpec {address: at(registers::address::alias.byte), name: "configured station alias", words: 1, fields: &[
        BitFieldSpec::new("Address.ConfiguredStationAlias", 0, 16, Hex),
        ]},
    RegisterSpec {address: at(registers::dl::control.byte), name: "DL control", words: 2, fields: &[
        BitFieldSpec::new("DlControl.ForwardingRule", 0, 1, FORWARDING),
        BitFieldSpec::new("DlControl.TemporaryLoopControl", 1, 1, Bool),
        BitFieldSpec::per_port("DlControl.LoopControl", 8, 2, 2, LOOP_CONTROL),
        BitFieldSpec::new("DlControl.TransmitBufferSize", 16, 3, Raw),
        BitFieldSpec::new("DlControl.LowJitterEbus", 19, 1, Bool),
        BitFieldSpec::new("DlControl.StationAliasEnable", 24, 1, Bool),
        ]},
    RegisterSpec {address: at(registers::dl::status.byte), name: "DL status", words: 1, fields: &[
        BitFieldSpec::new("DlStatus.DlsUserOperational", 0, 1, Bool),
        BitFieldSpec::new("DlStatus.DlsUserWatchdog", 1, 1, Bool),
        BitFieldSpec::new("DlStatus.ExtendedLinkDetection", 2, 1, Bool),
        BitFieldSpec::per_port("PortStatus.LinkStatus", 4, 1, 1, LINK_STATUS),
        BitFieldSpec::per_port("PortStatus.LoopStatus", 8, 2, 2, LOOP_STATUS),
        BitFieldSpec::per_port("PortStatus.SignalDetection", 9, 1, 2, Bool),
        ]},
    RegisterSpec {address: at(registers::al::control.byte), name: "AL control", words: 1, fields: &[
        BitFieldSpec::new("AlControl.State", 0, 4, AL_STATE),
        BitFieldSpec::new("AlControl.Acknowledge", 4, 1, Bool),
        BitFieldSpec::new("AlControl.DlsUserR2", 8, 8, Hex),
        ]},
    RegisterSpec {address: at(registers::al::status.byte), name: "AL status", words: 1, fields: &[
        BitFieldSpec::new("AlStatus.State", 0, 4, AL_STATE),
        BitFieldSpec::new("AlStatus.Error", 4, 1, Bool),
        BitFieldSpec::new("AlStatus.DlsUserR4", 8, 8, Hex),
        ]},
    RegisterSpec {address: at(registers::dls_user::r5.byte), name: "DLS user R5", words: 1, fields: &[
        BitFieldSpec::new("DlsUser.R5", 0, 16, Hex),
        ]},
    RegisterSpec {address: at(registers::al::status_code.byte), name: "AL status code", words: 1, fields: &[
        BitFieldSpec::new("AlStatus.StatusCode", 0, 16, Hex),
        ]},
    RegisterSpec {address: at(registers::al::pdi.byte), name: "PDI control", words: 1, fields: &[
        BitFieldSpec::new("PdiControl.PdiType", 0, 8, Hex),
        BitFieldSpec::new("PdiControl.EmulatedAlControl", 8, 1, Bool),
        BitFieldSpec::new("PdiControl.DlsUserR9", 9, 7, Hex),
        ]},
    RegisterSpec {address: at(registers::dls_user::r8.byte), name: "DLS user R8", words: 2, fields: &[
        BitFieldSpec::new("DlsUser.R8", 0, 32, Hex),
        ]},
    RegisterSpec {address: at(registers::errors::rx.byte), name: "RX error counters", words: 4, fields: &[
        BitFieldSpec::per_port("ErrorCounter.FrameError", 0, 8, 16, Raw),
        BitFieldSpec::per_port("ErrorCounter.PhysicalError", 8, 8, 16, Raw),
        ]},
    RegisterSpec {address: at(registers::errors::forwarded.byte), name: "forwarded RX error counters", words: 2, fields: &[
        BitFieldSpec::per_port("ErrorCounter.PreviousError", 0, 8, 8, Raw),
        ]},
    RegisterSpec {address: at(registers::errors::malformat_frame.byte), name: "ECAT processing unit error counters", words: 1, fields: &[
        BitFieldSpec::new("ErrorCounter.MalformatFrame", 0, 8, Raw),
        BitFieldSpec::new("ErrorCounter.LocalProblem", 8, 8, Raw),
        ]},
    RegisterSpec {address: at(registers::errors::lost_link.byte), name: "lost link counters", words: 2, fields: &[
        BitFieldSpec::per_port("ErrorCounter.LostLink", 0, 8, 8, Raw),
        ]},
    RegisterSpec {address: at(registers::sii::access.byte), name: "SII access", words: 1, fields: &[
        BitFieldSpec::new("SiiAccess.Owner", 0, 1, SII_OWNER),
        BitFieldSpec::new("SiiAccess.ResetAccess", 1, 1, Bool),
        BitFieldSpec::new("SiiAccess.PdiAccessActive", 8, 1, Bool),
        ]},
    RegisterSpec {address: at(registers::sii::control.byte), name: "SII control", words: 1, fields: &[
        BitFieldSpec::new("SiiControl.WriteAccess", 0, 1, Bool),
        BitFieldSpec::new("SiiControl.EepromEmulation", 5, 1, Bool),
        BitFieldSpec::new("SiiControl.ReadSize", 6, 1, SII_READ_SIZE),
        BitFieldSpec::new("SiiControl.AddressAlgorithm", 7, 1, SII_ADDRESS),
        BitFieldSpec::new("SiiControl.ReadOperation", 8, 1, Bool),
        BitFieldSpec::new("SiiControl.WriteOperation", 9, 1, Bool),
        BitFieldSpec::new("SiiControl.ReloadOperation", 10, 1, Bool),
        BitFieldSpec::new("SiiControl.ChecksumError", 11, 1, Bool),
        BitFieldSpec::new("SiiControl.DeviceInfoError", 12, 1, Bool),
        BitFieldSpec::new("SiiControl.CommandError", 13, 1, Bool),
        BitFieldSpec::new("SiiControl.WriteError", 14, 1, Bool),
        BitFieldSpec::new("SiiControl.Busy", 15, 1, Bool),
        ]},
    RegisterSpec {address: at(registers::clock::received_time.byte), name: "DC receive times", words: 8, fields: &[
        BitFieldSpec::per_port("DcTime.ReceiveTime", 0, 32, 32, Raw),
        ]},
    RegisterSpec {address: at(registers::clock::system_time.byte), name: "DC system time", words: 4, fields: &[
        BitFieldSpec::new("DcTime.SystemTime", 0, 64, Raw),
        ]},
    RegisterSpec {address: at(registers::clock::system_offset.byte), name: "DC system time offset", words: 4, fields: &[
        BitFieldSpec::new("DcTime.SystemTimeOffset", 0, 64, Raw),
        ]},
    RegisterSpec {address: at(registers::clock::system_delay.byte), name: "DC system time delay", words: 2, fields: &[
        BitFieldSpec::new("DcTime.SystemTimeDelay", 0, 32, Raw),
        ]},
    RegisterSpec {address: at(registers::clock::system_difference.byte), name: "DC system time difference", words: 2, fields: &[
        BitFieldSpec::new("DcTime.SystemTimeDifference", 0, 31, Raw),
        BitFieldSpec::new("DcTime.LocalSmaller", 31, 1, Bool),
        ]},
    ];


/// description of the register at the given address
pub fn lookup(address: u16) -> DecodeResult<&'static RegisterSpec> {
    REGISTERS.binary_search_by_key(&address, |register| register.address)
        .map(|index| &REGISTERS[index])
        .map_err(|_|  DecodeError::UnknownRegisterAddress {address})
}

/**
    decode the words of the register starting at `address`

    `words` are the register content in little endian word order, as read from the slave. Fields lying past the given words are omitted. An address without known decoding gives one [UNKNOWN] field holding the first word.
*/
pub fn decode(address: u16, words: &[u16]) -> DecodedFields {
    let mut decoded = DecodedFields::new();
    let register = match lookup(address) {
        Ok(register) => register,
        Err(error) => {
            log::warn!("{}", error);
            let raw = u64::from(words.first().copied().unwrap_or(0));
            // capacity is never 0
            let _ = decoded.push(DecodedField {
                id: FieldId::new(UNKNOWN),
                raw,
                value: Interpretation::Hex(raw),
                });
            return decoded
        },
    };
    if words.len() < usize::from(register.words) {
        log::debug!("{} at {:#06x}: {} words given out of {}",
            register.name, address, words.len(), register.words);
    }
    for spec in register.fields {
        let instances = match spec.repeat {
            Repeat::Once => 1,
            Repeat::PerPort {..} => PORTS,
        };
        for port in 0 .. instances {
            let Some(raw) = extract(words, spec.offset_of(port), spec.width)
                else {continue};
            let id = match spec.repeat {
                Repeat::Once => FieldId::new(spec.key),
                Repeat::PerPort {..} => FieldId::port(spec.key, port),
            };
            if decoded.push(DecodedField {id, raw, value: interpret(spec.decode, raw)}).is_err() {
                log::warn!("{} at {:#06x} has more than {} fields", register.name, address, MAX_FIELDS);
                return decoded
            }
        }
    }
    decoded
}

/// same as [decode] but from the raw bytes of the register, as found in the slave's memory
pub fn decode_bytes(address: u16, bytes: &[u8]) -> DecodedFields {
    let words: heapless::Vec<u16, MAX_WORDS> = bytes.chunks_exact(2)
        .take(MAX_WORDS)
        .map(|pair|  u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    decode(address, &words)
}

/// bits `offset .. offset+width` of the little endian word sequence, `None` if the words do not cover them
fn extract(words: &[u16], offset: u16, width: u8) -> Option<u64> {
    let end = usize::from(offset) + usize::from(width);
    if width == 0 || width > 64 || end > words.len() * 16 {
        return None
    }
    let mut value = 0u64;
    for i in 0 .. usize::from(width) {
        let bit = usize::from(offset) + i;
        let word = words[bit / 16];
        value |= u64::from((word >> (bit % 16)) & 1) << i;
    }
    Some(value)
}

fn interpret(decode: Decode, raw: u64) -> Interpretation {
    match decode {
        Raw => Interpretation::Raw(raw),
        Hex => Interpretation::Hex(raw),
        Bool => Interpretation::Bool(raw != 0),
        Enum(labels) => Interpretation::Label(
            usize::try_from(raw).ok()
                .and_then(|index| labels.get(index))
                .copied()
                .unwrap_or("Reserved")),
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        for pair in REGISTERS.windows(2) {
            assert!(pair[0].address < pair[1].address, "{} is not sorted", pair[1].name);
        }
        for register in REGISTERS {
            assert!(usize::from(register.words) <= MAX_WORDS);
            let mut count = 0;
            for spec in register.fields {
                let last = spec.offset_of(PORTS-1) + u16::from(spec.width);
                assert!(usize::from(last) <= usize::from(register.words) * 16,
                    "{} overflows {}", spec.key, register.name);
                if let Enum(labels) = spec.decode {
                    assert_eq!(labels.len(), 1 << spec.width, "{} labels", spec.key);
                }
                count += match spec.repeat {
                    Repeat::Once => 1,
                    Repeat::PerPort {..} => usize::from(PORTS),
                };
            }
            assert!(count <= MAX_FIELDS, "{} has too many fields", register.name);
        }
    }

    #[test]
    fn extract_across_words() {
        let words = [0xbeef, 0x1234, 0x8000];
        assert_eq!(extract(&words, 0, 16), Some(0xbeef));
        assert_eq!(extract(&words, 8, 16), Some(0x34be));
        assert_eq!(extract(&words, 0, 48), Some(0x8000_1234_beef));
        assert_eq!(extract(&words, 47, 1), Some(1));
        assert_eq!(extract(&words, 40, 16), None);
    }

    #[test]
    fn missing_words_drop_fields() {
        // only the first word of the DL information
        let fields = decode(0x0000, &[0x0211]);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, Interpretation::Hex(0x11));
        assert_eq!(fields[1].value, Interpretation::Raw(2));
        assert!(decode(0x0000, &[]).is_empty());
    }

    #[test]
    fn bytes_and_words_agree() {
        let bytes = [0x0f, 0x80, 0x00, 0x00];
        assert_eq!(decode_bytes(0x0502, &bytes), decode(0x0502, &[0x800f]));
        // odd trailing byte is ignored
        assert_eq!(decode_bytes(0x0910, &bytes[.. 3]).len(), 0);
    }
}

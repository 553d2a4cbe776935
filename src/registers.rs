/*!
    addresses and typed views of the slave controller (ESC) registers a diagnostic tool reads.

    Registers are defined as [Field]s in the ESC memory, so a typed value can be extracted from a raw memory image with [Field::get]. The generic field-by-field decoding used for display is in [crate::decode], whose table refers to the addresses defined here.

    ETG.1000.4 6.1 to 6.8
*/
#![allow(non_upper_case_globals)]

use bilge::prelude::*;
use crate::data::{self, Field};

pub mod address {
    use super::*;

    /// register of the station address, aka the fixed slave address
    /// ETG.1000.4 table 32
    pub const fixed: Field<u16> = Field::simple(0x0010);
    /// slave address alias
    /// ETG.1000.4 table 32
    pub const alias: Field<u16> = Field::simple(0x0012);
}
pub mod dl {
    use super::*;

    /// ETG.1000.4 table 31, 10 bytes
    pub const information: Field<[u8; 10]> = Field::simple(0x0000);
    pub const control: Field<DlControl> = Field::simple(0x0100);
    pub const status: Field<DlStatus> = Field::simple(0x0110);
}

pub mod dls_user {
    use super::*;

    pub const r1: Field<u8> = Field::simple(0x0120);
    pub const r2: Field<u8> = Field::simple(0x0121);
    pub const r3: Field<u8> = Field::simple(0x0130);
    pub const r4: Field<u8> = Field::simple(0x0131);
    pub const r5: Field<u16> = Field::simple(0x0132);
    pub const r6: Field<u16> = Field::simple(0x0134);
    pub const r7: Field<u8> = Field::simple(0x0140);
    pub const r8: Field<u32> = Field::simple(0x0150);
}

/// AL (Application Layer) registers are mapped on the DLS user registers
pub mod al {
    use super::*;

    pub const control: Field<AlControl> = Field::simple(dls_user::r1.byte);
    pub const status: Field<AlStatus> = Field::simple(dls_user::r3.byte);
    pub const status_code: Field<u16> = Field::simple(dls_user::r6.byte);
    pub const pdi: Field<PdiControl> = Field::simple(dls_user::r7.byte);
}

pub mod errors {
    use super::*;

    /// ETG.1000.4 table 40
    pub const rx: Field<RxErrorCounters> = Field::simple(0x0300);
    /// ETG.1000.4 table 41
    pub const forwarded: Field<PortCounters> = Field::simple(0x0308);
    /// ETG.1000.4 table 42
    pub const malformat_frame: Field<u8> = Field::simple(0x030c);
    pub const local_problem: Field<u8> = Field::simple(0x030d);
    /// ETG.1000.4 table 43
    pub const lost_link: Field<PortCounters> = Field::simple(0x0310);
}

/// SII (Slave Information Interface) gives access to the slave's EEPROM
pub mod sii {
    use super::*;

    pub const access: Field<SiiAccess> = Field::simple(0x0500);
    pub const control: Field<SiiControl> = Field::simple(0x0502);
}

/// DC (Distributed Clock) registers, ETG.1000.4 table 60
pub mod clock {
    use super::*;

    /// receive time on each port, latched on a write to port 0
    pub const received_time: Field<[u8; 16]> = Field::simple(0x0900);
    pub const system_time: Field<u64> = Field::simple(0x0910);
    pub const system_offset: Field<u64> = Field::simple(0x0920);
    pub const system_delay: Field<u32> = Field::simple(0x0928);
    pub const system_difference: Field<SystemTimeDifference> = Field::simple(0x092c);
}



/// ETG.1000.4 table 33
#[bitsize(32)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq)]
pub struct DlControl {
    /// enables forwarding non-ethercat frames
    pub forwarding: Forwarding,
    /// 0:permanent setting
    /// 1: temporary use of Loop Control Settings for ~1 second
    pub temporary: bool,
    _reserved: u6,
    pub ports: [LoopControl; 4],
    /// Buffer between preparation and send. Send will be if buffer is half full (7).
    pub transmit_buffer_size: u3,
    /// set to true to activate
    pub low_jitter_ebus: bool,
    _reserved: u4,
    pub alias_enable: bool,
    _reserved: u7,
}
data::bilge_pdudata!(DlControl, u32);

#[bitsize(1)]
#[derive(FromBits, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Forwarding {
    /// EtherCAT frames are processed, non-EtherCAT frames are forwarded without modification
    Transmit = 0,
    /// EtherCAT frames are processed, non-EtherCAT frames are destroyed
    Filter = 1,
}

#[bitsize(2)]
#[derive(FromBits, Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopControl {
    /// closed at “link down”, open with “link up”
    Auto = 0,
    /// loop closed at “link down”, opened with writing 01 after “link up”
    AutoClose = 1,
    AlwaysOpen = 2,
    AlwaysClosed = 3,
}

/// ETG.1000.4 table 34
#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq)]
pub struct DlStatus {
    /// true if operational
    pub dls_user_operational: bool,
    /// true if watchdog not expired
    pub dls_user_watchdog: bool,
    /// true if activated for at least one port
    pub extended_link_detection: bool,
    _reserved: u1,
    /// indicates physical link on each port
    pub port_link_status: [bool; 4],
    /// loop state of each port, the high bit of each is also the port's signal detection
    pub port_loop_status: [LoopStatus; 4],
}
data::bilge_pdudata!(DlStatus, u16);

impl DlStatus {
    /// communication detected on the given port
    pub fn signal_detection(&self, port: usize) -> bool {
        u16::from(*self) >> (9 + 2*port) & 1 == 1
    }
}

#[bitsize(2)]
#[derive(FromBits, Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopStatus {
    Open = 0,
    Closed = 1,
    AutoClosed = 2,
    Reserved = 3,
}

/// ETG.1000.6 table 9
#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct AlControl {
    /// requested state of communication, see [AlState]
    pub state: u4,
    /// if true, parameter change of the [AlStatus::error] will be reset
    pub ack: bool,
    _reserved: u3,
}
data::bilge_pdudata!(AlControl, u8);

/// ETG.1000.6 table 12
#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct AlStatus {
    /// current state of communication, see [AlState]
    pub state: u4,
    /// true if a state change failed or the slave requested a change
    pub error: bool,
    _reserved: u3,
}
data::bilge_pdudata!(AlStatus, u8);

/**
    the operation state of one device

    ETG.1000.6 table 9
*/
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AlState {
    Init = 1,
    PreOperational = 2,
    Bootstrap = 3,
    SafeOperational = 4,
    Operational = 8,
}
impl AlState {
    /// state matching a state code, `None` for codes not defined by the standard
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Init),
            2 => Some(Self::PreOperational),
            3 => Some(Self::Bootstrap),
            4 => Some(Self::SafeOperational),
            8 => Some(Self::Operational),
            _ => None,
        }
    }
}

/// ETG.1000.6 table 13
#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct PdiControl {
    /// Type specific (see ETG.1000.3 DL information parameter)
    pub pdi: u8,
    /**
        - false: AL Management will be done by an application Controller
        - true: AL Management will be emulated (AL status follows directly AL control)
    */
    pub emulated: bool,
    /// DLS user R9
    pub r9: u7,
}
data::bilge_pdudata!(PdiControl, u16);

/// A write to one counter will reset all counters of the group
/// ETG.1000.4 table 40
#[bitsize(64)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct RxErrorCounters {
    pub port: [PortErrorCount; 4],
}
data::bilge_pdudata!(RxErrorCounters, u64);

#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct PortErrorCount {
    /// counts the occurrences of frame errors (including RX errors within frame)
    pub frame: u8,
    /// counts the occurrences of RX errors at the physical layer
    pub physical: u8,
}

/// one 8 bit counter per port, used for forwarded errors and lost links
#[bitsize(32)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct PortCounters {
    pub port: [u8; 4],
}
data::bilge_pdudata!(PortCounters, u32);

/// ETG.1000.4 table 48
#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq)]
pub struct SiiAccess {
    pub owner: SiiOwner,
    /// setting this will reset access to SII
    pub lock: bool,
    _reserved: u6,
    /// PDI access active
    pub pdi: bool,
    _reserved: u7,
}
data::bilge_pdudata!(SiiAccess, u16);

#[bitsize(1)]
#[derive(FromBits, Debug, Copy, Clone, Eq, PartialEq)]
pub enum SiiOwner {
    EthercatDL = 0,
    Pdi = 1,
}

/**
    register controling the read/write operations to Slave Information Interface (SII)

    ETG.1000.4 table 49
*/
#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq)]
pub struct SiiControl {
    /// true if SII is writable
    pub write_access: bool,
    _reserved: u4,
    /**
        - false: Normal operation (DL interfaces to SII)
        - true: DL-user emulates SII
    */
    pub eeprom_emulation: bool,
    /// number of bytes per read transaction
    pub read_size: SiiTransaction,
    /// unit of SII addresses
    pub address_unit: SiiUnit,

    /// read operation requested (parameter write) or read operation busy (parameter read)
    pub read_operation: bool,
    /// write operation requested (parameter write) or write operation busy (parameter read)
    pub write_operation: bool,
    /// reload operation requested (parameter write) or reload operation busy (parameter read)
    pub reload_operation: bool,

    /// checksum error while reading at startup
    pub checksum_error: bool,
    /// error on reading Device Information
    pub device_info_error: bool,
    /// error on last SII request
    pub command_error: bool,
    /// error on last write operation
    pub write_error: bool,

    /// operation is ongoing
    pub busy: bool,
}
data::bilge_pdudata!(SiiControl, u16);

#[bitsize(1)]
#[derive(FromBits, Debug, Copy, Clone, Eq, PartialEq)]
pub enum SiiTransaction {
    Bytes4 = 0,
    Bytes8 = 1,
}
#[bitsize(1)]
#[derive(FromBits, Debug, Copy, Clone, Eq, PartialEq)]
pub enum SiiUnit {
    Byte = 0,
    Word = 1,
}

/// ETG.1000.4 table 60
#[bitsize(32)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct SystemTimeDifference {
    /// mean difference between local copy of system time and received system time values
    pub mean: u31,
    /// true if local copy of system time smaller than received system time
    pub local_smaller: bool,
}
data::bilge_pdudata!(SystemTimeDifference, u32);



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dl_status_ports() {
        // link on ports 0 and 2, port 3 loop bits 11
        let status = dl::status.get(&{
            let mut memory = [0u8; 0x112];
            memory[0x110 .. 0x112].copy_from_slice(&0b1100_0000_0101_0001u16.to_le_bytes());
            memory
            }).unwrap();
        assert!(status.dls_user_operational());
        assert_eq!(status.port_link_status(), [true, false, true, false]);
        assert_eq!(status.port_loop_status()[0], LoopStatus::Open);
        assert_eq!(status.port_loop_status()[3], LoopStatus::Reserved);
        assert!(status.signal_detection(3));
        assert!(! status.signal_detection(0));
    }

    #[test]
    fn error_counters() {
        let mut memory = [0u8; 0x314];
        memory[0x300 .. 0x308].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        memory[0x310 .. 0x314].copy_from_slice(&[9, 10, 11, 12]);
        let rx = errors::rx.get(&memory).unwrap();
        assert_eq!(rx.port()[1].frame(), 3);
        assert_eq!(rx.port()[1].physical(), 4);
        assert_eq!(errors::lost_link.get(&memory).unwrap().port(), [9, 10, 11, 12]);
    }

    #[test]
    fn sii_registers() {
        let mut memory = [0u8; 0x504];
        memory[0x500 .. 0x504].copy_from_slice(&[0x01, 0x01, 0xc0, 0x81]);
        let access = sii::access.get(&memory).unwrap();
        assert_eq!(access.owner(), SiiOwner::Pdi);
        assert!(! access.lock());
        assert!(access.pdi());

        let control = sii::control.get(&memory).unwrap();
        assert_eq!(control.read_size(), SiiTransaction::Bytes8);
        assert_eq!(control.address_unit(), SiiUnit::Word);
        assert!(control.read_operation());
        assert!(control.busy());
        assert!(! control.checksum_error());
        assert_eq!(control, SiiControl::from(0x81c0));
    }

    #[test]
    fn al_state_codes() {
        assert_eq!(AlState::from_code(8), Some(AlState::Operational));
        assert_eq!(AlState::from_code(5), None);
        assert_eq!(AlStatus::from(0x14).state().value(), 4);
        assert!(AlStatus::from(0x14).error());
    }
}

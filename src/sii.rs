/*!
    Records of the SII category stream, as they are laid out in a slave's EEPROM after the fixed [header](crate::eeprom).

    Each category starts with a [CategoryHeader] giving its type and its size in words, followed by its payload. This module only defines the raw records, string indices are not resolved here. The assembly into a device description is done in [crate::esi].

    ETG.1000.6 5.4 tables 19 to 26
*/

use crate::data::{self, PduData, Cursor, PackingResult};
use bilge::prelude::*;


/// header for a SII category
#[bitsize(32)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq)]
pub struct CategoryHeader {
    /// Category Type as defined in ETG.1000.6 Table 19
    pub ty: u15,
    /// Vendor Specific
    pub specific: bool,
    /// Following Category Word Size x
    pub size: u16,
}
data::bilge_pdudata!(CategoryHeader, u32);

impl CategoryHeader {
    /// type of the category, the vendor specific bit is ignored
    pub fn category(&self) -> CategoryType   {CategoryType::from(self.ty().value())}
    /// byte size of the payload following this header
    pub fn payload_len(&self) -> usize   {usize::from(self.size()) * crate::eeprom::WORD}
}

/// type of category in the SII
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CategoryType {
    Nop,
    /// codes 1 to 9 are reserved for device specific categories
    DeviceSpecific(u16),
    /// String repository for other Categories structure of this category data see ETG.1000.6 Table 20
    Strings,
    /// Data Types for future use
    DataTypes,
    /// General information structure of this category data see ETG.1000.6 Table 21
    General,
    /// FMMUs to be used structure of this category data see ETG.1000.6 Table 23
    Fmmu,
    /// Sync Manager Configuration structure of this category data see ETG.1000.6 Table 24
    SyncManager,
    /// FMMU extension, ETG.2010
    FmmuExtension,
    /// Sync unit, ETG.2010
    SyncUnit,
    /// TxPDO description structure of this category data see ETG.1000.6 Table 25
    TxPdo,
    /// RxPDO description structure of this category data see ETG.1000.6 Table 25
    RxPdo,
    /// Distributed Clock for future use
    Dc,
    /// mark the end of SII categories
    End,
    /// vendor specific or future category
    Unknown(u16),
}
impl CategoryType {
    /// code of the category, as found in the 15 low bits of a category header
    pub fn code(self) -> u16 {
        match self {
            Self::Nop => 0,
            Self::DeviceSpecific(code) => code,
            Self::Strings => 10,
            Self::DataTypes => 20,
            Self::General => 30,
            Self::Fmmu => 40,
            Self::SyncManager => 41,
            Self::FmmuExtension => 42,
            Self::SyncUnit => 43,
            Self::TxPdo => 50,
            Self::RxPdo => 51,
            Self::Dc => 60,
            Self::End => 0x7fff,
            Self::Unknown(code) => code,
        }
    }
}
impl From<u16> for CategoryType {
    fn from(code: u16) -> Self {
        match code & 0x7fff {
            0 => Self::Nop,
            code @ 1 ..= 9 => Self::DeviceSpecific(code),
            10 => Self::Strings,
            20 => Self::DataTypes,
            30 => Self::General,
            40 => Self::Fmmu,
            41 => Self::SyncManager,
            42 => Self::FmmuExtension,
            43 => Self::SyncUnit,
            50 => Self::TxPdo,
            51 => Self::RxPdo,
            60 => Self::Dc,
            0x7fff => Self::End,
            code => Self::Unknown(code),
        }
    }
}



/// ETG.1000.6 table 21
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct General {
    /// Group Information (Vendor specific) - Index to STRINGS
    pub group: u8,
    /// Image Name (Vendor specific) - Index to STRINGS
    pub image: u8,
    /// Device Order Number (Vendor specific) - Index to STRINGS
    pub order: u8,
    /// Device Name Information (Vendor specific) - Index to STRINGS
    pub name: u8,
    pub coe: CoeDetails,
    pub foe: FoeDetails,
    pub eoe: EoeDetails,
    /// Number of SoE channels, reserved
    pub soe_channels: u8,
    /// Number of DS402 channels, reserved
    pub ds402_channels: u8,
    /// Sysman class, reserved
    pub sysman_class: u8,
    pub flags: GeneralFlags,
    /// EBus Current Consumption in mA, negative Values means feeding in current feed in sets the available current value to the given value
    pub ebus_current: i16,
    /// Description of Physical Ports
    pub ports: [PhysicalPort; 4],
    /// raw value of the port descriptions, one nibble per port
    pub ports_raw: u16,
    /// Element defines the ESC memory address where the Identification ID is saved if Identification Method = IdentPhyM
    pub physical_memory_address: u16,
}
impl PduData for General {
    const ID: data::TypeId = data::TypeId::CUSTOM;
    /// the category is 32 bytes long, but only the 20 first are meaningful
    const PACKED_SIZE: usize = 20;

    fn unpack(src: &[u8]) -> PackingResult<Self> {
        let mut cursor = Cursor::new(src);
        let group = cursor.unpack()?;
        let image = cursor.unpack()?;
        let order = cursor.unpack()?;
        let name = cursor.unpack()?;
        cursor.skip(1)?;
        let coe = cursor.unpack()?;
        let foe = cursor.unpack()?;
        let eoe = cursor.unpack()?;
        let soe_channels = cursor.unpack()?;
        let ds402_channels = cursor.unpack()?;
        let sysman_class = cursor.unpack()?;
        let flags = cursor.unpack()?;
        let ebus_current = cursor.unpack()?;
        // group index duplicate and reserved byte
        cursor.skip(2)?;
        let ports_raw = cursor.unpack()?;
        let physical_memory_address = cursor.unpack()?;
        Ok(Self {
            group, image, order, name,
            coe, foe, eoe,
            soe_channels, ds402_channels, sysman_class,
            flags, ebus_current,
            ports: PhysicalPort::unpack_ports(ports_raw),
            ports_raw,
            physical_memory_address,
        })
    }
}

/// ETG.1000.6 table 21
#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct CoeDetails {
    pub enable_sdo: bool,
    pub enable_sdo_info: bool,
    pub enable_pdo_assign: bool,
    pub enable_pdo_config: bool,
    pub enable_startup_upload: bool,
    pub enable_sdo_complete: bool,
    _reserved: u2,
}
data::bilge_pdudata!(CoeDetails, u8);

#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct FoeDetails {
    pub enable: bool,
    _reserved: u7,
}
data::bilge_pdudata!(FoeDetails, u8);

#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct EoeDetails {
    pub enable: bool,
    _reserved: u7,
}
data::bilge_pdudata!(EoeDetails, u8);

#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct GeneralFlags {
    pub enable_safeop: bool,
    pub enable_notlrw: bool,
    pub mbox_dll: bool,
    /// ID selector mirrored in AL Statud Code
    pub ident_alsts: bool,
    /// ID selector value mirrored in specific physical memory as deonted by the parameter “Physical Memory Address”
    pub ident_phym: bool,
    _reserved: u3,
}
data::bilge_pdudata!(GeneralFlags, u8);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PhysicalPort {
    #[default]
    Disabled,
    Mii,
    /// code 2 and every code not defined by the standard
    Reserved,
    Ebus,
    /// NOTE: Fast Hot Connect means a Port with Ethernet Physical Layer and Autonegotiation off (100Mbps fullduplex)
    FastHotconnect,
}
impl PhysicalPort {
    /// decode one port description nibble
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0xf {
            0x0 => Self::Disabled,
            0x1 => Self::Mii,
            0x3 => Self::Ebus,
            0x4 => Self::FastHotconnect,
            _ => Self::Reserved,
        }
    }
    /// decode the 4 port descriptions packed in one word, port 0 in the lowest nibble
    pub fn unpack_ports(raw: u16) -> [Self; 4] {
        core::array::from_fn(|port| Self::from_nibble((raw >> (4*port)) as u8))
    }
    pub fn label(self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Mii => "MII",
            Self::Reserved => "Reserved",
            Self::Ebus => "EBus",
            Self::FastHotconnect => "FastHotconnect",
        }
    }
}



/// usage of one FMMU channel, ETG.1000.6 table 23
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FmmuUsage {
    /// code 0, 0xff and every code not defined by the standard
    Unused,
    Outputs,
    Inputs,
    SyncManagerStatus,
}
impl From<u8> for FmmuUsage {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Outputs,
            2 => Self::Inputs,
            3 => Self::SyncManagerStatus,
            _ => Self::Unused,
        }
    }
}
impl FmmuUsage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unused => "Unused",
            Self::Outputs => "Outputs",
            Self::Inputs => "Inputs",
            Self::SyncManagerStatus => "SyncManagerStatus",
        }
    }
}



/// ETG.1000.6 table 24
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SyncManager {
    /// Origin of Data (see Physical Start Address of SyncM)
    pub address: u16,
    pub length: u16,
    /// Defines Mode of Operation (see Control Register of SyncM)
    pub control: u8,
    /// don't care
    pub status: u8,
    pub enable: SyncManagerEnable,
    /// raw type code, see [SyncManagerType]
    pub usage: u8,
}
impl PduData for SyncManager {
    const ID: data::TypeId = data::TypeId::CUSTOM;
    const PACKED_SIZE: usize = 8;

    fn unpack(src: &[u8]) -> PackingResult<Self> {
        let mut cursor = Cursor::new(src);
        Ok(Self {
            address: cursor.unpack()?,
            length: cursor.unpack()?,
            control: cursor.unpack()?,
            status: cursor.unpack()?,
            enable: cursor.unpack()?,
            usage: cursor.unpack()?,
        })
    }
}

#[bitsize(8)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct SyncManagerEnable {
    pub enable: bool,
    /// fixed content (info for config tool –SyncMan has fixed content)
    pub fixed_content: bool,
    /// virtual SyncManager (virtual SyncMan – no hardware resource used)
    pub virtual_sync_manager: bool,
    /// opOnly (SyncMan should be enabled only in OP state)
    pub oponly: bool,
    _reserved: u4,
}
data::bilge_pdudata!(SyncManagerEnable, u8);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SyncManagerType {
    /// code 0 and every code not defined by the standard
    Unused,
    MailboxOut,
    MailboxIn,
    ProcessOut,
    ProcessIn,
}
impl From<u8> for SyncManagerType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::MailboxOut,
            2 => Self::MailboxIn,
            3 => Self::ProcessOut,
            4 => Self::ProcessIn,
            _ => Self::Unused,
        }
    }
}
impl SyncManagerType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unused => "Unused",
            Self::MailboxOut => "MailboxOut",
            Self::MailboxIn => "MailboxIn",
            Self::ProcessOut => "ProcessOut",
            Self::ProcessIn => "ProcessIn",
        }
    }
}



/// header of one PDO in a TxPDO or RxPDO category, ETG.1000.6 table 25
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Pdo {
    /// index of the PDO object in the object dictionnary
    pub index: u16,
    /// number of entries following this header
    pub entries: u8,
    /// sync manager channel the PDO is assigned to
    pub sync_manager: u8,
    /// reference to DC synchronization
    pub synchronization: u8,
    /// Name of object - Index to STRINGS
    pub name: u8,
    pub flags: u16,
}
impl PduData for Pdo {
    const ID: data::TypeId = data::TypeId::CUSTOM;
    const PACKED_SIZE: usize = 8;

    fn unpack(src: &[u8]) -> PackingResult<Self> {
        let mut cursor = Cursor::new(src);
        Ok(Self {
            index: cursor.unpack()?,
            entries: cursor.unpack()?,
            sync_manager: cursor.unpack()?,
            synchronization: cursor.unpack()?,
            name: cursor.unpack()?,
            flags: cursor.unpack()?,
        })
    }
}

/// one entry of a PDO, ETG.1000.6 table 26
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PdoEntry {
    /// index of the SDO mapped
    pub index: u16,
    pub sub: u8,
    /// Name of object - Index to STRINGS
    pub name: u8,
    /// CoE data type code
    pub dtype: u8,
    pub bitlen: u8,
    /// for future use
    pub flags: u16,
}
impl PduData for PdoEntry {
    const ID: data::TypeId = data::TypeId::CUSTOM;
    const PACKED_SIZE: usize = 8;

    fn unpack(src: &[u8]) -> PackingResult<Self> {
        let mut cursor = Cursor::new(src);
        Ok(Self {
            index: cursor.unpack()?,
            sub: cursor.unpack()?,
            name: cursor.unpack()?,
            dtype: cursor.unpack()?,
            bitlen: cursor.unpack()?,
            flags: cursor.unpack()?,
        })
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_header() {
        let header = Cursor::new(&[0x1e, 0x80, 0x10, 0x00]).unpack::<CategoryHeader>().unwrap();
        assert!(header.specific());
        assert_eq!(header.category(), CategoryType::General);
        assert_eq!(header.payload_len(), 32);

        let end = CategoryHeader::from(0xffff_ffff);
        assert_eq!(end.category(), CategoryType::End);
    }

    #[test]
    fn category_codes() {
        for code in 0 .. 0x8000u16 {
            assert_eq!(CategoryType::from(code).code(), code);
        }
    }

    #[test]
    fn sync_manager_record() {
        let record = [0x00, 0x10, 0x80, 0x00, 0x26, 0x00, 0x01, 0x01];
        let sm = SyncManager::unpack(&record).unwrap();
        assert_eq!(sm.address, 0x1000);
        assert_eq!(sm.length, 0x80);
        assert_eq!(sm.control, 0x26);
        assert!(sm.enable.enable());
        assert!(! sm.enable.fixed_content());
        assert_eq!(SyncManagerType::from(sm.usage), SyncManagerType::MailboxOut);
        assert!(SyncManager::unpack(&record[.. 7]).is_err());
    }

    #[test]
    fn physical_ports() {
        assert_eq!(PhysicalPort::unpack_ports(0x0031), [
            PhysicalPort::Mii,
            PhysicalPort::Ebus,
            PhysicalPort::Disabled,
            PhysicalPort::Disabled,
            ]);
        assert_eq!(PhysicalPort::unpack_ports(0xf042)[0], PhysicalPort::Reserved);
        assert_eq!(PhysicalPort::unpack_ports(0xf042)[1], PhysicalPort::FastHotconnect);
        assert_eq!(PhysicalPort::unpack_ports(0xf042)[3], PhysicalPort::Reserved);
    }
}

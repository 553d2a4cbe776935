/*!
    This module expose the standard EEPROM header registers. registers are defined as [Field]s in the EEPROM image, which content can be extracted from a raw image with [Field::get], or all at once with [Header::parse].

    ETG.1000.6 5.4
*/
#![allow(non_upper_case_globals)]

use crate::data::{self, Field, PackingResult};
use bilge::prelude::*;
use crc::{Algorithm, Crc};


pub const WORD: usize = core::mem::size_of::<u16>();


//  ETG.1000.6 5.4 table 16

/// Initialization value for PDI Control register (0x140 - 0x141)
pub const pdi_control: Field<u16> = Field::simple(WORD*0x0000);
/// Initialization value for PDI Configuration register (0x150-0x151)
pub const pdi_config: Field<u16> = Field::simple(WORD*0x0001);
/// Sync Impulse in multiples of 10 ns
pub const sync_impulse: Field<u16> = Field::simple(WORD*0x0002);
/// intialization value for PDI Configuration register R8 most significant word (0x152-0x153)
pub const pdi_config2: Field<u16> = Field::simple(WORD*0x0003);
/// Alias Address
pub const address_alias: Field<u16> = Field::simple(WORD*0x0004);
/// low byte contains remainder of division of word 0 to word 6 as unsigned number divided by the polynomial x^8+x^2+x+1(initial value 0xFF)
pub const checksum: Field<u16> = Field::simple(WORD*0x0007);

pub mod device {
    use super::*;

    pub const vendor: Field<u32> = Field::simple(WORD*0x0008);
    pub const product: Field<u32> = Field::simple(WORD*0x000a);
    pub const revision: Field<u32> = Field::simple(WORD*0x000c);
    pub const serial_number: Field<u32> = Field::simple(WORD*0x000e);
}

pub mod mailbox {
    use super::*;

    /// mailbox recommended parameters during bootstrap state
    pub mod bootstrap {
        use super::*;
        pub mod receive {
            use super::*;

            /// Receive Mailbox Offset for Bootstrap state (master to slave)
            pub const offset: Field<u16> = Field::simple(WORD*0x0014);
            /// Receive Mailbox Size for Bootstrap state (master to slave)
            /// Standard Mailbox size and Bootstrap Mailbox can differ. A bigger Mailbox size in Bootstrap mode can be used for optimiziation
            pub const size: Field<u16> = Field::simple(WORD*0x0015);
        }
        pub mod send {
            use super::*;

            /// Send Mailbox Offset for Bootstrap state (slave to master)
            pub const offset: Field<u16> = Field::simple(WORD*0x0016);
            /// Send Mailbox Size for Bootstrap state (slave to master)
            pub const size: Field<u16> = Field::simple(WORD*0x0017);
        }
    }
    /// mailbox recommended parameters during other slave states
    pub mod standard {
        use super::*;
        pub mod receive {
            use super::*;

            /// Receive Mailbox Offset for Standard state (master to slave)
            pub const offset: Field<u16> = Field::simple(WORD*0x0018);
            /// Receive Mailbox Size for Standard state (master to slave)
            pub const size: Field<u16> = Field::simple(WORD*0x0019);
        }
        pub mod send {
            use super::*;

            /// Send Mailbox Offset for Standard state (slave to master)
            pub const offset: Field<u16> = Field::simple(WORD*0x001a);
            /// Send Mailbox Size for Standard state (slave to master)
            pub const size: Field<u16> = Field::simple(WORD*0x001b);
        }
    }
    /// Mailbox Protocols Supported as defined in ETG.1000.6 Table 18
    pub const protocols: Field<MailboxTypes> = Field::simple(WORD*0x001c);
}

/**
    size of EEPROM in [KiBit] + 1
    NOTE: KiBit means 1024 Bit.
    NOTE: size = 0 means a EEPROM size of 1 KiBit
*/
pub const eeprom_size: Field<u16> = Field::simple(WORD*0x003e);
/// This Version is 1
pub const version: Field<u16> = Field::simple(WORD*0x003f);

/// byte position of the first category, categories follow the fixed header
pub const categories: usize = WORD*0x0040;



/// ETG.1000.6 table 18
#[bitsize(16)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq, Default)]
pub struct MailboxTypes {
    /// ADS over EtherCAT (routing and parallel services)
    pub ads: bool,
    /// Ethernet over EtherCAT (tunnelling of Data Link services)
    pub ethernet: bool,
    /// CAN application protocol over EtherCAT (access to SDO)
    pub can: bool,
    /// File Access over EtherCAT
    pub file: bool,
    /// Servo Drive Profile over EtherCAT
    pub servo: bool,
    /// Vendor specific protocol over EtherCAT
    pub specific: bool,
    _reserved: u10,
}
data::bilge_pdudata!(MailboxTypes, u16);

/// offset and size of one mailbox buffer
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MailboxBuffer {
    pub offset: u16,
    pub size: u16,
}

/// fixed EEPROM header, the 64 first words of a slave's EEPROM
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    pub pdi_control: u16,
    pub pdi_config: u16,
    pub sync_impulse: u16,
    pub pdi_config2: u16,
    pub address_alias: u16,
    pub checksum: u16,
    pub vendor: u32,
    pub product: u32,
    pub revision: u32,
    pub serial_number: u32,
    pub bootstrap_receive: MailboxBuffer,
    pub bootstrap_send: MailboxBuffer,
    pub standard_receive: MailboxBuffer,
    pub standard_send: MailboxBuffer,
    pub mailbox_protocols: MailboxTypes,
    pub eeprom_size: u16,
    pub version: u16,
}
impl Header {
    /// extract the header from the begining of an EEPROM image
    pub fn parse(data: &[u8]) -> PackingResult<Self> {
        // refuse early so the reported truncation covers the whole header
        data::Field::<[u8; categories]>::simple(0).get(data)?;
        Ok(Self {
            pdi_control: pdi_control.get(data)?,
            pdi_config: pdi_config.get(data)?,
            sync_impulse: sync_impulse.get(data)?,
            pdi_config2: pdi_config2.get(data)?,
            address_alias: address_alias.get(data)?,
            checksum: checksum.get(data)?,
            vendor: device::vendor.get(data)?,
            product: device::product.get(data)?,
            revision: device::revision.get(data)?,
            serial_number: device::serial_number.get(data)?,
            bootstrap_receive: MailboxBuffer {
                offset: mailbox::bootstrap::receive::offset.get(data)?,
                size: mailbox::bootstrap::receive::size.get(data)?,
                },
            bootstrap_send: MailboxBuffer {
                offset: mailbox::bootstrap::send::offset.get(data)?,
                size: mailbox::bootstrap::send::size.get(data)?,
                },
            standard_receive: MailboxBuffer {
                offset: mailbox::standard::receive::offset.get(data)?,
                size: mailbox::standard::receive::size.get(data)?,
                },
            standard_send: MailboxBuffer {
                offset: mailbox::standard::send::offset.get(data)?,
                size: mailbox::standard::send::size.get(data)?,
                },
            mailbox_protocols: mailbox::protocols.get(data)?,
            eeprom_size: eeprom_size.get(data)?,
            version: version.get(data)?,
        })
    }

    /// EEPROM size in bytes, as declared by the header
    pub fn eeprom_bytes(&self) -> usize {
        (usize::from(self.eeprom_size) + 1) * 1024 / 8
    }
}



/// CRC-8 used by the EEPROM header, polynomial x^8+x^2+x+1, initial value 0xFF
pub const HEADER_CRC_ALGORITHM: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x07,
    init: 0xff,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xfb,
    residue: 0x00,
};
pub const HEADER_CRC: Crc<u8> = Crc::<u8>::new(&HEADER_CRC_ALGORITHM);

/// number of bytes covered by the header checksum (words 0 to 6)
pub const CHECKSUM_COVERAGE: usize = WORD*7;

/**
    compare the checksum stored in the header with the checksum of its content

    return `(stored, computed)`
*/
pub fn header_checksum(data: &[u8]) -> PackingResult<(u8, u8)> {
    let covered = Field::<[u8; CHECKSUM_COVERAGE]>::simple(0).get(data)?;
    let stored = Field::<u8>::simple(checksum.byte).get(data)?;
    Ok((stored, HEADER_CRC.checksum(&covered)))
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_of_known_headers() {
        assert_eq!(HEADER_CRC.checksum(b"123456789"), 0xfb);
        assert_eq!(HEADER_CRC.checksum(&[0; CHECKSUM_COVERAGE]), 0x30);
        assert_eq!(HEADER_CRC.checksum(&[0x80, 0x0e, 0x00, 0xcc, 0x88, 0x13, 0xff, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00]), 0xc3);
    }

    #[test]
    fn header_checksum_reads_low_byte_of_word_7() {
        let mut data = [0u8; 16];
        data[14] = 0x30;
        data[15] = 0xaa;
        assert_eq!(header_checksum(&data), Ok((0x30, 0x30)));
        assert!(header_checksum(&data[.. 14]).is_err());
    }

    #[test]
    fn header_fields() {
        let mut data = [0u8; categories];
        data[0x10 .. 0x14].copy_from_slice(&2u32.to_le_bytes());
        data[0x14 .. 0x18].copy_from_slice(&0x0000_0102u32.to_le_bytes());
        data[0x30 .. 0x32].copy_from_slice(&0x1000u16.to_le_bytes());
        data[0x32 .. 0x34].copy_from_slice(&0x0080u16.to_le_bytes());
        data[0x38 .. 0x3a].copy_from_slice(&0b1100u16.to_le_bytes());
        data[0x7c .. 0x7e].copy_from_slice(&0x000fu16.to_le_bytes());
        data[0x7e .. 0x80].copy_from_slice(&1u16.to_le_bytes());

        let header = Header::parse(&data).unwrap();
        assert_eq!(header.vendor, 2);
        assert_eq!(header.product, 0x102);
        assert_eq!(header.standard_receive, MailboxBuffer {offset: 0x1000, size: 0x80});
        assert!(header.mailbox_protocols.can());
        assert!(header.mailbox_protocols.file());
        assert!(! header.mailbox_protocols.ethernet());
        assert_eq!(header.version, 1);
        assert_eq!(header.eeprom_bytes(), 2048);

        assert!(Header::parse(&data[.. 100]).is_err());
    }
}

/*!
    Decoding of a whole slave EEPROM image into a device description tree.

    ```ignore
    let report = esi::parse(&image);
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    println!("vendor {:#x}", report.tree.info.header.vendor);
    for pdo in report.tree.tx_pdos() {
        println!("{:#x} {}", pdo.index, pdo.name);
    }
    ```

    Decoding never stops on soft problems (checksum mismatch, dangling string index), they are reported in [EsiReport::warnings]. Structural problems stop the decoding of the category stream, and what was decoded so far is still returned as a partial tree.
*/

use core::fmt;
use crate::{
    catalog::FieldId,
    data::{Cursor, PduData, TypeId},
    eeprom::{self, Header},
    error::{DecodeError, DecodeResult},
    sii::{self, CategoryHeader, CategoryType, CoeDetails, EoeDetails, FmmuUsage, FoeDetails, GeneralFlags, PhysicalPort, SyncManagerEnable, SyncManagerType},
    strings::StringTable,
    };


/// maximum number of FMMU channels, and of sync manager channels
pub const MAX_CHANNELS: usize = 16;


/// settings of the EEPROM decoding
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    /// byte position of the first category in the image
    pub categories_offset: usize,
    /// compare the header checksum with the header content
    pub verify_checksum: bool,
}
impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            categories_offset: eeprom::categories,
            verify_checksum: true,
        }
    }
}


/// result of the decoding of one EEPROM image
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EsiReport {
    /// device description, complete or partial depending on [Self::error]
    pub tree: EsiTree,
    /// soft problems met during decoding, they did not prevent building the tree
    pub warnings: Vec<DecodeError>,
    /// the problem that stopped the decoding, if any. When set, the tree only contains the categories before that point
    pub error: Option<DecodeError>,
}
impl EsiReport {
    /// true if decoding stopped before the end of the categories
    pub fn is_partial(&self) -> bool   {self.error.is_some()}
    /// true if a checksum mismatch was reported
    pub fn checksum_mismatch(&self) -> bool {
        self.warnings.iter().any(|w| matches!(w, DecodeError::ChecksumMismatch{..}))
    }
    /// the complete tree, or the error that prevented building it
    pub fn into_result(self) -> DecodeResult<EsiTree> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.tree),
        }
    }
}


/// device description decoded from an EEPROM image
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EsiTree {
    pub info: GeneralInfo,
    pub strings: StringTable,
    /// FMMU channels in channel order
    pub fmmus: Vec<Fmmu>,
    /// sync manager channels in channel order
    pub sync_managers: Vec<SyncManager>,
    /// PDOs of all PDO categories, in declaration order
    pub pdos: Vec<Pdo>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeneralInfo {
    pub header: Header,
    /// content of the General category, if present
    pub general: Option<General>,
}

/// General category with its strings resolved
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct General {
    pub group: String,
    pub image: String,
    pub order: String,
    pub name: String,
    pub coe: CoeDetails,
    pub foe: FoeDetails,
    pub eoe: EoeDetails,
    pub soe_channels: u8,
    pub ds402_channels: u8,
    pub sysman_class: u8,
    pub flags: GeneralFlags,
    /// current consumption on EBus in mA, negative means feeding current
    pub ebus_current: i16,
    pub ports: [PhysicalPort; 4],
    pub ports_raw: u16,
    pub physical_memory_address: u16,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fmmu {
    pub channel: u8,
    pub usage: FmmuUsage,
    /// usage byte as found in the EEPROM
    pub raw: u8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SyncManager {
    pub channel: u8,
    /// physical start address
    pub address: u16,
    pub length: u16,
    /// initial value of the control register
    pub control: u8,
    pub status: u8,
    pub enable: SyncManagerEnable,
    pub usage: SyncManagerType,
    /// type byte as found in the EEPROM
    pub raw_usage: u8,
}

/// direction of a PDO, relative to the slave
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PdoDirection {
    /// slave to master, declared in a TxPDO category
    Tx,
    /// master to slave, declared in a RxPDO category
    Rx,
}
impl PdoDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Tx => "TxPDO",
            Self::Rx => "RxPDO",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pdo {
    pub direction: PdoDirection,
    /// index of the PDO object in the object dictionnary
    pub index: u16,
    /// sync manager channel the PDO is assigned to
    pub sync_manager: u8,
    pub synchronization: u8,
    pub name: String,
    pub flags: u16,
    /// as many entries as the PDO header declares
    pub entries: Vec<PdoEntry>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PdoEntry {
    pub index: u16,
    pub sub: u8,
    pub name: String,
    /// CoE data type code
    pub dtype: u16,
    pub bitlen: u8,
    pub flags: u16,
}
impl PdoEntry {
    /// rust type matching the entry's data type code
    pub fn data_type(&self) -> TypeId   {TypeId::from_code(self.dtype)}
}



/// decode an EEPROM image with default options
pub fn parse(data: &[u8]) -> EsiReport {
    parse_with(data, &ParseOptions::default())
}

/**
    decode an EEPROM image

    This never fails as a whole: the report holds the tree decoded until the first structural problem, the problem itself and all the soft problems met.
*/
pub fn parse_with(data: &[u8], options: &ParseOptions) -> EsiReport {
    let mut builder = Builder::default();
    let mut warnings = Vec::new();
    let error = parse_categories(data, options, &mut builder, &mut warnings).err();
    if let Some(error) = &error {
        log::warn!("EEPROM decoding stopped: {}", error);
    }
    let tree = builder.build(&mut warnings);
    EsiReport {tree, warnings, error}
}

fn parse_categories(
        data: &[u8],
        options: &ParseOptions,
        builder: &mut Builder,
        warnings: &mut Vec<DecodeError>,
        ) -> DecodeResult {
    builder.header = Header::parse(data)?;
    if options.verify_checksum {
        let (stored, computed) = eeprom::header_checksum(data)?;
        if stored != computed {
            let warning = DecodeError::ChecksumMismatch {stored, computed};
            log::warn!("{}", warning);
            warnings.push(warning);
        }
    }

    let mut cursor = Cursor::new(data);
    cursor.skip(options.categories_offset)?;
    loop {
        let offset = cursor.offset();
        let header = cursor.unpack::<CategoryHeader>()
            .map_err(|_|  DecodeError::ParseError {
                category: cursor.remain().get(.. 2)
                    .map(|code| u16::from_le_bytes([code[0], code[1]]) & 0x7fff)
                    .unwrap_or(0),
                offset,
                reason: "category header truncated",
                })?;
        let category = header.category();
        if category == CategoryType::End {
            log::debug!("end of categories at {:#x}", offset);
            return Ok(())
        }
        let len = header.payload_len();
        if len > cursor.remaining() {
            return Err(DecodeError::ParseError {
                category: category.code(),
                offset,
                reason: "category longer than the remaining image",
                })
        }
        let mut payload = cursor.sub(len)?;
        match category {
            CategoryType::Strings
            | CategoryType::General
            | CategoryType::Fmmu
            | CategoryType::SyncManager
            | CategoryType::TxPdo
            | CategoryType::RxPdo => {
                log::debug!("category {:?} at {:#x}, {} bytes", category, offset, len);
                builder.category(category, offset, &mut payload)?;
            },
            _ => log::debug!("skipping category {:?} at {:#x}, {} bytes", category, offset, len),
        }
    }
}


/// collects raw records while walking the categories, strings are resolved at the end since the strings category can come last
#[derive(Default)]
struct Builder {
    header: Header,
    strings: StringTable,
    general: Option<sii::General>,
    fmmus: Vec<Fmmu>,
    sync_managers: Vec<SyncManager>,
    pdos: Vec<(PdoDirection, sii::Pdo, Vec<sii::PdoEntry>)>,
}
impl Builder {
    fn category(&mut self, category: CategoryType, offset: usize, payload: &mut Cursor<'_>) -> DecodeResult {
        let invalid = |reason|  DecodeError::ParseError {category: category.code(), offset, reason};
        match category {
            CategoryType::Strings => {
                self.strings = StringTable::parse(payload)?;
            },
            CategoryType::General => {
                if payload.remaining() < sii::General::PACKED_SIZE {
                    return Err(invalid("General category too short"))
                }
                let general = payload.unpack::<sii::General>()?;
                log::trace!("{:?}", general);
                self.general = Some(general);
            },
            CategoryType::Fmmu => {
                if self.fmmus.len() + payload.remaining() > MAX_CHANNELS {
                    return Err(invalid("too many FMMU channels"))
                }
                while payload.remaining() > 0 {
                    let raw = payload.read_u8()?;
                    let fmmu = Fmmu {
                        channel: self.fmmus.len() as u8,
                        usage: FmmuUsage::from(raw),
                        raw,
                        };
                    log::trace!("{:?}", fmmu);
                    self.fmmus.push(fmmu);
                }
            },
            CategoryType::SyncManager => {
                if payload.remaining() % sii::SyncManager::PACKED_SIZE != 0 {
                    return Err(invalid("SyncManager category is not a whole number of channels"))
                }
                if self.sync_managers.len() + payload.remaining() / sii::SyncManager::PACKED_SIZE > MAX_CHANNELS {
                    return Err(invalid("too many sync manager channels"))
                }
                while payload.remaining() > 0 {
                    let raw = payload.unpack::<sii::SyncManager>()?;
                    let sm = SyncManager {
                        channel: self.sync_managers.len() as u8,
                        address: raw.address,
                        length: raw.length,
                        control: raw.control,
                        status: raw.status,
                        enable: raw.enable,
                        usage: SyncManagerType::from(raw.usage),
                        raw_usage: raw.usage,
                        };
                    log::trace!("{:?}", sm);
                    self.sync_managers.push(sm);
                }
            },
            CategoryType::TxPdo | CategoryType::RxPdo => {
                let direction = match category {
                    CategoryType::TxPdo => PdoDirection::Tx,
                    _ => PdoDirection::Rx,
                };
                while payload.remaining() > 0 {
                    if payload.remaining() < sii::Pdo::PACKED_SIZE {
                        return Err(invalid("PDO header truncated"))
                    }
                    let pdo = payload.unpack::<sii::Pdo>()?;
                    log::trace!("{:?}", pdo);
                    let mut entries = Vec::with_capacity(usize::from(pdo.entries));
                    for _ in 0 .. pdo.entries {
                        entries.push(payload.unpack::<sii::PdoEntry>()?);
                    }
                    self.pdos.push((direction, pdo, entries));
                }
            },
            _ => {},
        }
        Ok(())
    }

    fn build(self, warnings: &mut Vec<DecodeError>) -> EsiTree {
        let strings = self.strings;
        let general = self.general.map(|general|  General {
            group: strings.resolve_or_empty(general.group, warnings),
            image: strings.resolve_or_empty(general.image, warnings),
            order: strings.resolve_or_empty(general.order, warnings),
            name: strings.resolve_or_empty(general.name, warnings),
            coe: general.coe,
            foe: general.foe,
            eoe: general.eoe,
            soe_channels: general.soe_channels,
            ds402_channels: general.ds402_channels,
            sysman_class: general.sysman_class,
            flags: general.flags,
            ebus_current: general.ebus_current,
            ports: general.ports,
            ports_raw: general.ports_raw,
            physical_memory_address: general.physical_memory_address,
            });
        let pdos = self.pdos.into_iter()
            .map(|(direction, pdo, entries)|  Pdo {
                direction,
                index: pdo.index,
                sync_manager: pdo.sync_manager,
                synchronization: pdo.synchronization,
                name: strings.resolve_or_empty(pdo.name, warnings),
                flags: pdo.flags,
                entries: entries.into_iter()
                    .map(|entry|  PdoEntry {
                        index: entry.index,
                        sub: entry.sub,
                        name: strings.resolve_or_empty(entry.name, warnings),
                        dtype: u16::from(entry.dtype),
                        bitlen: entry.bitlen,
                        flags: entry.flags,
                        })
                    .collect(),
                })
            .collect();
        EsiTree {
            info: GeneralInfo {header: self.header, general},
            strings,
            fmmus: self.fmmus,
            sync_managers: self.sync_managers,
            pdos,
        }
    }
}



/// value of an attribute of a tree node
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Value<'a> {
    Unsigned(u64),
    /// unsigned value best displayed in hexadecimal: addresses, identifiers, bitmasks
    Hex(u64),
    Signed(i64),
    Flag(bool),
    Text(&'a str),
    Label(&'static str),
}
impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(value) => write!(f, "{}", value),
            Self::Hex(value) => write!(f, "{:#x}", value),
            Self::Signed(value) => write!(f, "{}", value),
            Self::Flag(value) => write!(f, "{}", value),
            Self::Text(value) => write!(f, "{}", value),
            Self::Label(value) => write!(f, "{}", value),
        }
    }
}

/// one attribute of a tree node, identified by a catalog key
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EsiField<'a> {
    pub id: FieldId,
    pub value: Value<'a>,
}
impl<'a> EsiField<'a> {
    fn new(key: &'static str, value: Value<'a>) -> Self   {Self{id: FieldId::new(key), value}}
}

impl EsiTree {
    /// PDOs sent by the slave
    pub fn tx_pdos(&self) -> impl Iterator<Item=&Pdo>   {self.pdos_toward(PdoDirection::Tx)}
    /// PDOs received by the slave
    pub fn rx_pdos(&self) -> impl Iterator<Item=&Pdo>   {self.pdos_toward(PdoDirection::Rx)}
    fn pdos_toward(&self, direction: PdoDirection) -> impl Iterator<Item=&Pdo> {
        self.pdos.iter().filter(move |pdo| pdo.direction == direction)
    }

    /// attributes of every node of the tree, in tree order
    pub fn fields(&self) -> Vec<EsiField<'_>> {
        let mut fields = self.info.fields();
        for fmmu in &self.fmmus {
            fields.extend(fmmu.fields());
        }
        for sm in &self.sync_managers {
            fields.extend(sm.fields());
        }
        for (position, pdo) in self.pdos.iter().enumerate() {
            let position = position as u16;
            fields.extend(pdo.fields(position));
            for (index, entry) in pdo.entries.iter().enumerate() {
                fields.extend(entry.fields(position, index as u8));
            }
        }
        fields
    }
}

impl GeneralInfo {
    pub fn fields(&self) -> Vec<EsiField<'_>> {
        use Value::*;
        let header = &self.header;
        let mut fields = vec![
            EsiField::new("Esi.PdiControl", Hex(header.pdi_control.into())),
            EsiField::new("Esi.PdiConfiguration", Hex(header.pdi_config.into())),
            EsiField::new("Esi.SyncImpulseLen", Unsigned(header.sync_impulse.into())),
            EsiField::new("Esi.PdiConfiguration2", Hex(header.pdi_config2.into())),
            EsiField::new("Esi.AliasAddress", Hex(header.address_alias.into())),
            EsiField::new("Esi.Checksum", Hex(header.checksum.into())),
            EsiField::new("Esi.VendorId", Hex(header.vendor.into())),
            EsiField::new("Esi.ProductCode", Hex(header.product.into())),
            EsiField::new("Esi.RevisionNumber", Hex(header.revision.into())),
            EsiField::new("Esi.SerialNumber", Hex(header.serial_number.into())),
            EsiField::new("Esi.BootstrapReceiveMailboxOffset", Hex(header.bootstrap_receive.offset.into())),
            EsiField::new("Esi.BootstrapReceiveMailboxSize", Unsigned(header.bootstrap_receive.size.into())),
            EsiField::new("Esi.BootstrapSendMailboxOffset", Hex(header.bootstrap_send.offset.into())),
            EsiField::new("Esi.BootstrapSendMailboxSize", Unsigned(header.bootstrap_send.size.into())),
            EsiField::new("Esi.StandardReceiveMailboxOffset", Hex(header.standard_receive.offset.into())),
            EsiField::new("Esi.StandardReceiveMailboxSize", Unsigned(header.standard_receive.size.into())),
            EsiField::new("Esi.StandardSendMailboxOffset", Hex(header.standard_send.offset.into())),
            EsiField::new("Esi.StandardSendMailboxSize", Unsigned(header.standard_send.size.into())),
            EsiField::new("Esi.MailboxProtocol", Hex(u16::from(header.mailbox_protocols).into())),
            EsiField::new("Esi.EepromSize", Unsigned(header.eeprom_size.into())),
            EsiField::new("Esi.Version", Unsigned(header.version.into())),
            ];
        if let Some(general) = &self.general {
            fields.extend([
                EsiField::new("Esi.General.Group", Text(&general.group)),
                EsiField::new("Esi.General.Img", Text(&general.image)),
                EsiField::new("Esi.General.Order", Text(&general.order)),
                EsiField::new("Esi.General.Name", Text(&general.name)),
                EsiField::new("Esi.General.CoeDetails", Hex(u8::from(general.coe).into())),
                EsiField::new("Esi.General.FoeDetails", Hex(u8::from(general.foe).into())),
                EsiField::new("Esi.General.EoeDetails", Hex(u8::from(general.eoe).into())),
                EsiField::new("Esi.General.SoeChannels", Unsigned(general.soe_channels.into())),
                EsiField::new("Esi.General.Ds402Channels", Unsigned(general.ds402_channels.into())),
                EsiField::new("Esi.General.SysmanClass", Unsigned(general.sysman_class.into())),
                EsiField::new("Esi.General.Flags", Hex(u8::from(general.flags).into())),
                EsiField::new("Esi.General.IdentAlSts", Flag(general.flags.ident_alsts())),
                EsiField::new("Esi.General.IdentPhyM", Flag(general.flags.ident_phym())),
                EsiField::new("Esi.General.CurrentOnEbus", Signed(general.ebus_current.into())),
                ]);
            for (port, kind) in general.ports.iter().enumerate() {
                fields.push(EsiField {
                    id: FieldId::port("Esi.General.PhysicalPort", port as u8),
                    value: Label(kind.label()),
                    });
            }
            fields.push(EsiField::new("Esi.General.PhysicalMemoryAddress", Hex(general.physical_memory_address.into())));
        }
        fields
    }
}

impl Fmmu {
    pub fn fields(&self) -> Vec<EsiField<'_>> {
        vec![EsiField {
            id: FieldId::channel("Esi.Fmmu", self.channel),
            value: Value::Label(self.usage.label()),
            }]
    }
}

impl SyncManager {
    pub fn fields(&self) -> Vec<EsiField<'_>> {
        use Value::*;
        let channel = |key|  FieldId::channel(key, self.channel);
        vec![
            EsiField {id: channel("Esi.SyncM.PhysicalStartAddress"), value: Hex(self.address.into())},
            EsiField {id: channel("Esi.SyncM.Length"), value: Unsigned(self.length.into())},
            EsiField {id: channel("Esi.SyncM.ControlRegister"), value: Hex(self.control.into())},
            EsiField {id: channel("Esi.SyncM.StatusRegister"), value: Hex(self.status.into())},
            EsiField {id: channel("Esi.SyncM.EnableSyncManager"), value: Flag(self.enable.enable())},
            EsiField {id: channel("Esi.SyncM.SyncManagerType"), value: Label(self.usage.label())},
            ]
    }
}

impl Pdo {
    /// attributes of the PDO, tagged with its position in [EsiTree::pdos]
    pub fn fields(&self, position: u16) -> Vec<EsiField<'_>> {
        use Value::*;
        let pdo = |key|  FieldId::pdo(key, position);
        vec![
            EsiField {id: pdo("Esi.Pdo.Direction"), value: Label(self.direction.label())},
            EsiField {id: pdo("Esi.Pdo.Index"), value: Hex(self.index.into())},
            EsiField {id: pdo("Esi.Pdo.EntryCount"), value: Unsigned(self.entries.len() as u64)},
            EsiField {id: pdo("Esi.Pdo.SyncM"), value: Unsigned(self.sync_manager.into())},
            EsiField {id: pdo("Esi.Pdo.Sync"), value: Unsigned(self.synchronization.into())},
            EsiField {id: pdo("Esi.Pdo.Name"), value: Text(&self.name)},
            EsiField {id: pdo("Esi.Pdo.Flags"), value: Hex(self.flags.into())},
            ]
    }
}

impl PdoEntry {
    /// attributes of the entry, tagged with the PDO position and its position in this PDO
    pub fn fields(&self, pdo: u16, position: u8) -> Vec<EsiField<'_>> {
        use Value::*;
        let entry = |key|  FieldId::pdo_entry(key, pdo, position);
        vec![
            EsiField {id: entry("Esi.Pdo.Entry.Index"), value: Hex(self.index.into())},
            EsiField {id: entry("Esi.Pdo.Entry.SubIndex"), value: Unsigned(self.sub.into())},
            EsiField {id: entry("Esi.Pdo.Entry.Name"), value: Text(&self.name)},
            EsiField {id: entry("Esi.Pdo.Entry.DataType"), value: Hex(self.dtype.into())},
            EsiField {id: entry("Esi.Pdo.Entry.BitLength"), value: Unsigned(self.bitlen.into())},
            EsiField {id: entry("Esi.Pdo.Entry.Flags"), value: Hex(self.flags.into())},
            ]
    }
}

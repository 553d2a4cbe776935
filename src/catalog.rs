/*!
    Field identifiers and display labels.

    Every value the decoders emit is tagged with a [FieldId]: a stable key drawn from [KEYS], optionally completed by the port or channel it belongs to. Keys are never display text. Turning them into text for an operator is the job of a [Formatter], using any implementation of [Labels] (the built-in [English] catalog, or a locale loaded by the application into a `HashMap`).
*/

use core::fmt;
use std::collections::HashMap;
use crate::{
    decode::DecodedField,
    esi::EsiField,
    };


/// port, channel or PDO a field is repeated for
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Instance {
    /// physical port of a slave, 0 to 3
    Port(u8),
    /// FMMU or sync manager channel, 0 to 15
    Channel(u8),
    /// position of a PDO among all the PDOs of the EEPROM
    Pdo(u16),
    /// position of a PDO, and position of the entry in this PDO
    PdoEntry(u16, u8),
}

/// stable identifier of a decoded field
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldId {
    /// one of [KEYS]
    pub key: &'static str,
    pub instance: Option<Instance>,
}
impl FieldId {
    pub const fn new(key: &'static str) -> Self   {Self{key, instance: None}}
    pub const fn port(key: &'static str, port: u8) -> Self   {Self{key, instance: Some(Instance::Port(port))}}
    pub const fn channel(key: &'static str, channel: u8) -> Self   {Self{key, instance: Some(Instance::Channel(channel))}}
    pub const fn pdo(key: &'static str, pdo: u16) -> Self   {Self{key, instance: Some(Instance::Pdo(pdo))}}
    pub const fn pdo_entry(key: &'static str, pdo: u16, entry: u8) -> Self   {Self{key, instance: Some(Instance::PdoEntry(pdo, entry))}}

    /// port or channel number, if any
    pub fn index(&self) -> Option<u8> {
        match self.instance {
            Some(Instance::Port(i)) | Some(Instance::Channel(i)) => Some(i),
            _ => None,
        }
    }
}
impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instance {
            None => write!(f, "{}", self.key),
            Some(Instance::Port(i)) | Some(Instance::Channel(i)) => write!(f, "{}[{}]", self.key, i),
            Some(Instance::Pdo(pdo)) => write!(f, "{}[{}]", self.key, pdo),
            Some(Instance::PdoEntry(pdo, entry)) => write!(f, "{}[{}.{}]", self.key, pdo, entry),
        }
    }
}



/**
    closed vocabulary of keys the decoders can emit

    consumers rely on these keys to stay stable, a key must be added here (and to [English]) before the decoders can emit it
*/
pub const KEYS: &[&str] = &[
    // EEPROM header
    "Esi.PdiControl",
    "Esi.PdiConfiguration",
    "Esi.SyncImpulseLen",
    "Esi.PdiConfiguration2",
    "Esi.AliasAddress",
    "Esi.Checksum",
    "Esi.VendorId",
    "Esi.ProductCode",
    "Esi.RevisionNumber",
    "Esi.SerialNumber",
    "Esi.BootstrapReceiveMailboxOffset",
    "Esi.BootstrapReceiveMailboxSize",
    "Esi.BootstrapSendMailboxOffset",
    "Esi.BootstrapSendMailboxSize",
    "Esi.StandardReceiveMailboxOffset",
    "Esi.StandardReceiveMailboxSize",
    "Esi.StandardSendMailboxOffset",
    "Esi.StandardSendMailboxSize",
    "Esi.MailboxProtocol",
    "Esi.EepromSize",
    "Esi.Version",
    // General category
    "Esi.General.Group",
    "Esi.General.Img",
    "Esi.General.Order",
    "Esi.General.Name",
    "Esi.General.CoeDetails",
    "Esi.General.FoeDetails",
    "Esi.General.EoeDetails",
    "Esi.General.SoeChannels",
    "Esi.General.Ds402Channels",
    "Esi.General.SysmanClass",
    "Esi.General.Flags",
    "Esi.General.CurrentOnEbus",
    "Esi.General.PhysicalPort",
    "Esi.General.PhysicalMemoryAddress",
    "Esi.General.IdentAlSts",
    "Esi.General.IdentPhyM",
    // FMMU and sync manager categories
    "Esi.Fmmu",
    "Esi.SyncM.PhysicalStartAddress",
    "Esi.SyncM.Length",
    "Esi.SyncM.ControlRegister",
    "Esi.SyncM.StatusRegister",
    "Esi.SyncM.EnableSyncManager",
    "Esi.SyncM.SyncManagerType",
    // PDO categories
    "Esi.Pdo.Direction",
    "Esi.Pdo.Index",
    "Esi.Pdo.EntryCount",
    "Esi.Pdo.SyncM",
    "Esi.Pdo.Sync",
    "Esi.Pdo.Name",
    "Esi.Pdo.Flags",
    "Esi.Pdo.Entry.Index",
    "Esi.Pdo.Entry.SubIndex",
    "Esi.Pdo.Entry.Name",
    "Esi.Pdo.Entry.DataType",
    "Esi.Pdo.Entry.BitLength",
    "Esi.Pdo.Entry.Flags",
    // DL information
    "DlInformation.Type",
    "DlInformation.Revision",
    "DlInformation.Build",
    "DlInformation.FmmuCount",
    "DlInformation.SyncManagerCount",
    "DlInformation.RamSize",
    "DlInformation.PortDescriptor",
    "DlInformation.FmmuBitNotSupported",
    "DlInformation.NoSupportReservedRegister",
    "DlInformation.DcSupported",
    "DlInformation.DcRange",
    "DlInformation.LowJitterEbus",
    "DlInformation.EnhancedLinkDetectionEbus",
    "DlInformation.EnhancedLinkDetectionMii",
    "DlInformation.SeparateFcsErrorHandling",
    // station address
    "Address.ConfiguredStationAddress",
    "Address.ConfiguredStationAlias",
    // DL control and status
    "DlControl.ForwardingRule",
    "DlControl.TemporaryLoopControl",
    "DlControl.LoopControl",
    "DlControl.TransmitBufferSize",
    "DlControl.LowJitterEbus",
    "DlControl.StationAliasEnable",
    "DlStatus.DlsUserOperational",
    "DlStatus.DlsUserWatchdog",
    "DlStatus.ExtendedLinkDetection",
    "PortStatus.LinkStatus",
    "PortStatus.LoopStatus",
    "PortStatus.SignalDetection",
    // application layer and DLS user registers
    "AlControl.State",
    "AlControl.Acknowledge",
    "AlControl.DlsUserR2",
    "AlStatus.State",
    "AlStatus.Error",
    "AlStatus.DlsUserR4",
    "DlsUser.R5",
    "AlStatus.StatusCode",
    "PdiControl.PdiType",
    "PdiControl.EmulatedAlControl",
    "PdiControl.DlsUserR9",
    "DlsUser.R8",
    // error counters
    "ErrorCounter.FrameError",
    "ErrorCounter.PhysicalError",
    "ErrorCounter.PreviousError",
    "ErrorCounter.MalformatFrame",
    "ErrorCounter.LocalProblem",
    "ErrorCounter.LostLink",
    // SII interface
    "SiiAccess.Owner",
    "SiiAccess.ResetAccess",
    "SiiAccess.PdiAccessActive",
    "SiiControl.WriteAccess",
    "SiiControl.EepromEmulation",
    "SiiControl.ReadSize",
    "SiiControl.AddressAlgorithm",
    "SiiControl.ReadOperation",
    "SiiControl.WriteOperation",
    "SiiControl.ReloadOperation",
    "SiiControl.ChecksumError",
    "SiiControl.DeviceInfoError",
    "SiiControl.CommandError",
    "SiiControl.WriteError",
    "SiiControl.Busy",
    // distributed clock
    "DcTime.ReceiveTime",
    "DcTime.SystemTime",
    "DcTime.SystemTimeOffset",
    "DcTime.SystemTimeDelay",
    "DcTime.SystemTimeDifference",
    "DcTime.LocalSmaller",
    // fallback for registers without decoding
    "Unknown",
];

/// true if the key belongs to the catalog
pub fn is_known(key: &str) -> bool {
    KEYS.contains(&key)
}



/// source of display text for catalog keys
pub trait Labels {
    /// display text for a key, or `None` if this catalog has no text for it
    fn label(&self, key: &str) -> Option<&str>;
}

/// labels loaded at runtime, for instance from a translation file
impl Labels for HashMap<String, String> {
    fn label(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<L: Labels + ?Sized> Labels for &L {
    fn label(&self, key: &str) -> Option<&str>   {(**self).label(key)}
}

/// built-in english labels, covering every key in [KEYS]
#[derive(Copy, Clone, Debug, Default)]
pub struct English;

impl Labels for English {
    fn label(&self, key: &str) -> Option<&str> {
        Some(match key {
            "Esi.PdiControl" => "PDI control",
            "Esi.PdiConfiguration" => "PDI configuration",
            "Esi.SyncImpulseLen" => "Sync impulse length",
            "Esi.PdiConfiguration2" => "PDI configuration 2",
            "Esi.AliasAddress" => "Alias address",
            "Esi.Checksum" => "Checksum",
            "Esi.VendorId" => "Vendor ID",
            "Esi.ProductCode" => "Product code",
            "Esi.RevisionNumber" => "Revision number",
            "Esi.SerialNumber" => "Serial number",
            "Esi.BootstrapReceiveMailboxOffset" => "Bootstrap receive mailbox offset",
            "Esi.BootstrapReceiveMailboxSize" => "Bootstrap receive mailbox size",
            "Esi.BootstrapSendMailboxOffset" => "Bootstrap send mailbox offset",
            "Esi.BootstrapSendMailboxSize" => "Bootstrap send mailbox size",
            "Esi.StandardReceiveMailboxOffset" => "Standard receive mailbox offset",
            "Esi.StandardReceiveMailboxSize" => "Standard receive mailbox size",
            "Esi.StandardSendMailboxOffset" => "Standard send mailbox offset",
            "Esi.StandardSendMailboxSize" => "Standard send mailbox size",
            "Esi.MailboxProtocol" => "Mailbox protocol",
            "Esi.EepromSize" => "EEPROM size",
            "Esi.Version" => "Version",

            "Esi.General.Group" => "Group",
            "Esi.General.Img" => "Image",
            "Esi.General.Order" => "Order",
            "Esi.General.Name" => "Name",
            "Esi.General.CoeDetails" => "CoE details",
            "Esi.General.FoeDetails" => "FoE details",
            "Esi.General.EoeDetails" => "EoE details",
            "Esi.General.SoeChannels" => "SoE channels",
            "Esi.General.Ds402Channels" => "DS402 channels",
            "Esi.General.SysmanClass" => "Sysman class",
            "Esi.General.Flags" => "Flags",
            "Esi.General.CurrentOnEbus" => "Current on EBus (mA)",
            "Esi.General.PhysicalPort" => "Physical port",
            "Esi.General.PhysicalMemoryAddress" => "Physical memory address",
            "Esi.General.IdentAlSts" => "Identification in AL status",
            "Esi.General.IdentPhyM" => "Identification in physical memory",

            "Esi.Fmmu" => "FMMU",
            "Esi.SyncM.PhysicalStartAddress" => "Physical start address",
            "Esi.SyncM.Length" => "Length",
            "Esi.SyncM.ControlRegister" => "Control register",
            "Esi.SyncM.StatusRegister" => "Status register",
            "Esi.SyncM.EnableSyncManager" => "Enable sync manager",
            "Esi.SyncM.SyncManagerType" => "Sync manager type",

            "Esi.Pdo.Direction" => "Direction",
            "Esi.Pdo.Index" => "Index",
            "Esi.Pdo.EntryCount" => "Entry count",
            "Esi.Pdo.SyncM" => "Sync manager",
            "Esi.Pdo.Sync" => "Synchronization",
            "Esi.Pdo.Name" => "Name",
            "Esi.Pdo.Flags" => "Flags",
            "Esi.Pdo.Entry.Index" => "Index",
            "Esi.Pdo.Entry.SubIndex" => "Subindex",
            "Esi.Pdo.Entry.Name" => "Name",
            "Esi.Pdo.Entry.DataType" => "Data type",
            "Esi.Pdo.Entry.BitLength" => "Bit length",
            "Esi.Pdo.Entry.Flags" => "Flags",

            "DlInformation.Type" => "Type",
            "DlInformation.Revision" => "Revision",
            "DlInformation.Build" => "Build",
            "DlInformation.FmmuCount" => "FMMUs supported",
            "DlInformation.SyncManagerCount" => "Sync managers supported",
            "DlInformation.RamSize" => "RAM size (KiB)",
            "DlInformation.PortDescriptor" => "Port descriptor",
            "DlInformation.FmmuBitNotSupported" => "FMMU bit operation not supported",
            "DlInformation.NoSupportReservedRegister" => "No support for reserved registers",
            "DlInformation.DcSupported" => "DC supported",
            "DlInformation.DcRange" => "DC range",
            "DlInformation.LowJitterEbus" => "Low jitter EBus supported",
            "DlInformation.EnhancedLinkDetectionEbus" => "Enhanced link detection EBus",
            "DlInformation.EnhancedLinkDetectionMii" => "Enhanced link detection MII",
            "DlInformation.SeparateFcsErrorHandling" => "Separate FCS error handling",

            "Address.ConfiguredStationAddress" => "Configured station address",
            "Address.ConfiguredStationAlias" => "Configured station alias",

            "DlControl.ForwardingRule" => "Forwarding rule",
            "DlControl.TemporaryLoopControl" => "Temporary loop control",
            "DlControl.LoopControl" => "Loop control",
            "DlControl.TransmitBufferSize" => "Transmit buffer size",
            "DlControl.LowJitterEbus" => "Low jitter EBus enabled",
            "DlControl.StationAliasEnable" => "Station alias enable",
            "DlStatus.DlsUserOperational" => "DLS user operational",
            "DlStatus.DlsUserWatchdog" => "DLS user watchdog",
            "DlStatus.ExtendedLinkDetection" => "Extended link detection",
            "PortStatus.LinkStatus" => "Link status",
            "PortStatus.LoopStatus" => "Loop status",
            "PortStatus.SignalDetection" => "Signal detection",

            "AlControl.State" => "Requested state",
            "AlControl.Acknowledge" => "Acknowledge",
            "AlControl.DlsUserR2" => "DLS user R2",
            "AlStatus.State" => "Current state",
            "AlStatus.Error" => "Error",
            "AlStatus.DlsUserR4" => "DLS user R4",
            "DlsUser.R5" => "DLS user R5",
            "AlStatus.StatusCode" => "Status code",
            "PdiControl.PdiType" => "PDI type",
            "PdiControl.EmulatedAlControl" => "Emulated AL control",
            "PdiControl.DlsUserR9" => "DLS user R9",
            "DlsUser.R8" => "DLS user R8",

            "ErrorCounter.FrameError" => "Frame error counter",
            "ErrorCounter.PhysicalError" => "Physical error counter",
            "ErrorCounter.PreviousError" => "Previous error counter",
            "ErrorCounter.MalformatFrame" => "Malformat frame counter",
            "ErrorCounter.LocalProblem" => "Local problem counter",
            "ErrorCounter.LostLink" => "Lost link counter",

            "SiiAccess.Owner" => "SII owner",
            "SiiAccess.ResetAccess" => "Reset access",
            "SiiAccess.PdiAccessActive" => "PDI access active",
            "SiiControl.WriteAccess" => "SII write access",
            "SiiControl.EepromEmulation" => "EEPROM emulation",
            "SiiControl.ReadSize" => "SII read size",
            "SiiControl.AddressAlgorithm" => "SII address algorithm",
            "SiiControl.ReadOperation" => "SII read operation",
            "SiiControl.WriteOperation" => "SII write operation",
            "SiiControl.ReloadOperation" => "SII reload operation",
            "SiiControl.ChecksumError" => "SII checksum error",
            "SiiControl.DeviceInfoError" => "SII device info error",
            "SiiControl.CommandError" => "SII command error",
            "SiiControl.WriteError" => "SII write error",
            "SiiControl.Busy" => "SII busy",

            "DcTime.ReceiveTime" => "Receive time",
            "DcTime.SystemTime" => "System time",
            "DcTime.SystemTimeOffset" => "System time offset",
            "DcTime.SystemTimeDelay" => "System time delay",
            "DcTime.SystemTimeDifference" => "System time difference",
            "DcTime.LocalSmaller" => "Local time smaller",

            "Unknown" => "Unknown register",
            _ => return None,
        })
    }
}



/**
    renders decoded fields for display, using a [Labels] catalog

    keys missing from the catalog are displayed as is
*/
#[derive(Clone, Debug, Default)]
pub struct Formatter<L> {
    labels: L,
}
impl<L: Labels> Formatter<L> {
    pub fn new(labels: L) -> Self   {Self{labels}}
    pub fn labels(&self) -> &L   {&self.labels}

    /// display text of a field identifier, like `"Link status (port 2)"`
    pub fn label(&self, id: &FieldId) -> String {
        let text = self.labels.label(id.key).unwrap_or(id.key);
        match id.instance {
            None => text.to_owned(),
            Some(Instance::Port(port)) => format!("{} (port {})", text, port),
            Some(Instance::Channel(channel)) => format!("{} (channel {})", text, channel),
            Some(Instance::Pdo(pdo)) => format!("{} (PDO {})", text, pdo),
            Some(Instance::PdoEntry(pdo, entry)) => format!("{} (PDO {}, entry {})", text, pdo, entry),
        }
    }
    /// one line description of a decoded register field, like `"Loop status (port 0): Open"`
    pub fn describe(&self, field: &DecodedField) -> String {
        format!("{}: {}", self.label(&field.id), field.value)
    }
    /// one line description of an attribute of an ESI tree node
    pub fn describe_esi(&self, field: &EsiField<'_>) -> String {
        format!("{}: {}", self.label(&field.id), field.value)
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique_and_labelled() {
        for (i, key) in KEYS.iter().enumerate() {
            assert!(! KEYS[.. i].contains(key), "duplicated key {}", key);
            assert!(English.label(key).is_some(), "no english label for {}", key);
        }
    }

    #[test]
    fn field_id_display() {
        assert_eq!(FieldId::new("DcTime.SystemTime").to_string(), "DcTime.SystemTime");
        assert_eq!(FieldId::port("PortStatus.LinkStatus", 3).to_string(), "PortStatus.LinkStatus[3]");
        assert_eq!(FieldId::channel("Esi.Fmmu", 1).to_string(), "Esi.Fmmu[1]");
        assert_eq!(FieldId::pdo("Esi.Pdo.Index", 2).to_string(), "Esi.Pdo.Index[2]");
        assert_eq!(FieldId::pdo_entry("Esi.Pdo.Entry.Name", 2, 0).to_string(), "Esi.Pdo.Entry.Name[2.0]");
        assert_eq!(FieldId::pdo("Esi.Pdo.Index", 2).index(), None);
    }

    #[test]
    fn formatter_labels() {
        let english = Formatter::new(English);
        assert_eq!(english.label(&FieldId::port("PortStatus.LoopStatus", 2)), "Loop status (port 2)");
        assert_eq!(english.label(&FieldId::channel("Esi.SyncM.Length", 0)), "Length (channel 0)");
        assert_eq!(english.label(&FieldId::pdo("Esi.Pdo.Index", 1)), "Index (PDO 1)");
        assert_eq!(english.label(&FieldId::pdo_entry("Esi.Pdo.Entry.Name", 1, 3)), "Name (PDO 1, entry 3)");

        let mut locale = HashMap::new();
        locale.insert("SiiControl.Busy".to_owned(), "SII occupé".to_owned());
        let custom = Formatter::new(locale);
        assert_eq!(custom.label(&FieldId::new("SiiControl.Busy")), "SII occupé");
        // missing labels fall back to the key
        assert_eq!(custom.label(&FieldId::new("DcTime.SystemTime")), "DcTime.SystemTime");
    }
}

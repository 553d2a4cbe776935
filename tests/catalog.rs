mod common;

use std::collections::HashMap;
use common::{Image, init_logging};
use etherscope::{
    English, FieldId, Formatter, Labels,
    catalog::{self, KEYS},
    decode::{self, REGISTERS},
    esi,
    sii::CategoryType,
    };


/// image using every category the tree holds
fn full_image() -> Vec<u8> {
    let mut general = [0u8; 32];
    general[3] = 1;
    general[16] = 0x31;
    let mut tx = common::pdo(0x1a00, 1, 3, 1);
    tx.extend(common::pdo_entry(0x6000, 1, 1, 0x01, 1));
    let mut rx = common::pdo(0x1600, 1, 2, 0);
    rx.extend(common::pdo_entry(0x7000, 1, 0, 0x07, 32));

    Image::new()
        .set_u32(0x10, 2)
        .category(CategoryType::Strings.code(), &common::strings(&["Terminal"]))
        .category(CategoryType::General.code(), &general)
        .category(CategoryType::Fmmu.code(), &[1, 2, 3, 0])
        .category(CategoryType::SyncManager.code(), &common::sync_manager(0x1000, 0x80, 0x26, 0x01, 1))
        .category(CategoryType::TxPdo.code(), &tx)
        .category(CategoryType::RxPdo.code(), &rx)
        .end()
        .build()
}

#[test]
fn register_keys_are_cataloged() {
    init_logging();
    for register in REGISTERS {
        let words = vec![0xa5a5u16; usize::from(register.words)];
        for field in decode::decode(register.address, &words) {
            assert!(catalog::is_known(field.id.key), "{} of {} is not cataloged", field.id, register.name);
        }
    }
    let unknown = decode::decode(0x0f00, &[1]);
    assert!(KEYS.contains(&unknown[0].id.key));
}

#[test]
fn esi_keys_are_cataloged() {
    init_logging();
    let report = esi::parse(&full_image());
    assert!(report.error.is_none());
    assert!(report.warnings.is_empty());

    let fields = report.tree.fields();
    assert!(fields.iter().any(|field| field.id.key == "Esi.Pdo.Entry.Name"));
    for field in &fields {
        assert!(catalog::is_known(field.id.key), "{} is not cataloged", field.id);
    }
}

#[test]
fn english_descriptions() {
    init_logging();
    let formatter = Formatter::new(English);

    let fields = decode::decode(0x0110, &[0x0010]);
    let lines: Vec<String> = fields.iter().map(|field| formatter.describe(field)).collect();
    assert!(lines.contains(&"Link status (port 0): Link".to_owned()), "{:?}", lines);
    assert!(lines.contains(&"Loop status (port 3): Open".to_owned()), "{:?}", lines);

    let tree = esi::parse(&full_image()).into_result().unwrap();
    let lines: Vec<String> = tree.fields().iter().map(|field| formatter.describe_esi(field)).collect();
    assert!(lines.contains(&format!("{}: 0x2", English.label("Esi.VendorId").unwrap())), "{:?}", lines);
    assert!(lines.iter().any(|line| line.ends_with("(channel 2): SyncManagerStatus")), "{:?}", lines);
}

#[test]
fn application_labels() {
    let mut locale = HashMap::new();
    locale.insert("PortStatus.LinkStatus".to_owned(), "Liaison".to_owned());
    let formatter = Formatter::new(&locale);
    assert_eq!(formatter.label(&FieldId::port("PortStatus.LinkStatus", 1)), "Liaison (port 1)");
    assert_eq!(formatter.label(&FieldId::new("SiiControl.Busy")), "SiiControl.Busy");
    assert_eq!(formatter.labels().label("SiiControl.Busy"), None);
}

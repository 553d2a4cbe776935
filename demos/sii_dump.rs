use std::error::Error;
use etherscope::{
    esi,
    catalog::{English, Formatter},
    };

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let path = std::env::args().nth(1)
        .ok_or("usage: sii_dump <eeprom image>")?;
    let image = std::fs::read(&path)?;

    let report = esi::parse(&image);
    let tree = &report.tree;
    println!("{:#?}", tree.info);

    for fmmu in &tree.fmmus {
        println!("fmmu {}: {:?}", fmmu.channel, fmmu.usage);
    }
    for sm in &tree.sync_managers {
        println!("sync manager {}: {:?} at {:#x}, {} bytes", sm.channel, sm.usage, sm.address, sm.length);
    }
    for pdo in &tree.pdos {
        println!("{} {:#x} {:?} on sync manager {}", pdo.direction.label(), pdo.index, pdo.name, pdo.sync_manager);
        for entry in &pdo.entries {
            println!("    {:#x}:{} {:?}  {} bits {:?}", entry.index, entry.sub, entry.name, entry.bitlen, entry.data_type());
        }
    }

    println!();
    let formatter = Formatter::new(English);
    for field in tree.fields() {
        println!("{}", formatter.describe_esi(&field));
    }

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    if let Some(error) = &report.error {
        println!("decoding stopped: {}", error);
    }
    Ok(())
}

//! synthetic EEPROM images for tests
#![allow(dead_code)]

/// byte size of the fixed EEPROM header
pub const HEADER: usize = 128;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// bitwise CRC-8 with polynomial x^8+x^2+x+1 and initial value 0xff, as the header checksum
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0xffu8;
    for &byte in data {
        crc ^= byte;
        for _ in 0 .. 8 {
            crc = if crc & 0x80 != 0 {(crc << 1) ^ 0x07} else {crc << 1};
        }
    }
    crc
}

/// EEPROM image under construction, starting with a blank header
pub struct Image {
    data: Vec<u8>,
}
impl Image {
    pub fn new() -> Self {
        let mut image = Self {data: vec![0; HEADER]};
        // version
        image.set_u16(0x7e, 1);
        image
    }
    pub fn set_u16(&mut self, byte: usize, value: u16) -> &mut Self {
        self.data[byte .. byte+2].copy_from_slice(&value.to_le_bytes());
        self
    }
    pub fn set_u32(&mut self, byte: usize, value: u32) -> &mut Self {
        self.data[byte .. byte+4].copy_from_slice(&value.to_le_bytes());
        self
    }
    /// append a category, padding its payload to a whole number of words
    pub fn category(&mut self, code: u16, payload: &[u8]) -> &mut Self {
        let words = (payload.len() + 1) / 2;
        self.category_header(code, words as u16);
        self.data.extend_from_slice(payload);
        if payload.len() % 2 != 0 {
            self.data.push(0);
        }
        self
    }
    /// append a category header alone, declaring any size
    pub fn category_header(&mut self, code: u16, words: u16) -> &mut Self {
        self.data.extend_from_slice(&code.to_le_bytes());
        self.data.extend_from_slice(&words.to_le_bytes());
        self
    }
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }
    /// append the end of categories marker
    pub fn end(&mut self) -> &mut Self {
        self.bytes(&[0xff; 4])
    }
    /// final image, with a correct header checksum
    pub fn build(&mut self) -> Vec<u8> {
        let mut data = self.data.clone();
        data[14] = crc8(&data[.. 14]);
        data
    }
}

/// payload of a strings category
pub fn strings(list: &[&str]) -> Vec<u8> {
    let mut payload = vec![list.len() as u8];
    for text in list {
        payload.push(text.len() as u8);
        payload.extend_from_slice(text.as_bytes());
    }
    payload
}

pub fn sync_manager(address: u16, length: u16, control: u8, enable: u8, usage: u8) -> [u8; 8] {
    let [a0, a1] = address.to_le_bytes();
    let [l0, l1] = length.to_le_bytes();
    [a0, a1, l0, l1, control, 0, enable, usage]
}

/// header of a PDO, to be followed by `entries` entries
pub fn pdo(index: u16, entries: u8, sync_manager: u8, name: u8) -> Vec<u8> {
    let mut record = index.to_le_bytes().to_vec();
    record.extend_from_slice(&[entries, sync_manager, 0, name, 0, 0]);
    record
}

pub fn pdo_entry(index: u16, sub: u8, name: u8, dtype: u8, bitlen: u8) -> [u8; 8] {
    let [i0, i1] = index.to_le_bytes();
    [i0, i1, sub, name, dtype, bitlen, 0, 0]
}

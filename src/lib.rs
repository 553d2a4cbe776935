/*!
    Decoders turning raw data read from EtherCAT slaves into structured, labeled values for diagnostic tools.

    - [esi] decodes a slave's EEPROM image (SII categories) into an [EsiTree]
    - [decode] decodes raw ESC register words into named bit fields
    - [catalog] gives the stable identifiers of every decoded value and their display labels

    Reading the data from the bus is not part of this crate, the decoders only work on buffers given by the caller. They are pure functions and can run concurrently on any number of slaves.
*/

pub mod data;
pub mod error;
pub mod eeprom;
pub mod sii;
pub mod strings;
pub mod esi;
pub mod registers;
pub mod decode;
pub mod catalog;

pub use crate::data::{PduData, Field, Cursor};
pub use crate::error::{DecodeError, DecodeResult};
pub use crate::strings::StringTable;
pub use crate::esi::{EsiTree, EsiReport, ParseOptions};
pub use crate::decode::{decode, decode_bytes, DecodedField, Interpretation};
pub use crate::catalog::{FieldId, Formatter, Labels, English};

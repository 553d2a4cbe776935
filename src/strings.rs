/*!
    String repository of a slave's EEPROM (ETG.1000.6 table 20)

    Other categories refer to strings by a 1-based `u8` index into this table, index 0 means "no string".
*/

use crate::{
    data::{Cursor, PackingResult},
    error::{DecodeError, DecodeResult},
    };

/// strings declared in the `Strings` category, in declaration order
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTable {
    strings: Vec<String>,
}

impl StringTable {
    pub fn new() -> Self   {Self::default()}

    /**
        decode a `Strings` category payload: a count byte followed by as many length-prefixed byte strings

        NUL bytes some slaves leave in their strings are removed, bytes that are not valid UTF-8 are replaced
    */
    pub fn parse(payload: &mut Cursor<'_>) -> PackingResult<Self> {
        let count = payload.read_u8()?;
        let mut strings = Vec::with_capacity(usize::from(count));
        for i in 0 .. count {
            let len = payload.read_u8()?;
            let raw = payload.read(usize::from(len))?;
            let text = String::from_utf8_lossy(raw).replace('\0', "");
            log::trace!("string {}: {:?}", i+1, text);
            strings.push(text);
        }
        Ok(Self {strings})
    }

    pub fn len(&self) -> usize   {self.strings.len()}
    pub fn is_empty(&self) -> bool   {self.strings.is_empty()}
    /// strings in declaration order, the first one has index 1
    pub fn iter(&self) -> impl Iterator<Item=&str>   {self.strings.iter().map(String::as_str)}

    /**
        string referenced by a 1-based index

        index 0 always gives the empty string
    */
    pub fn resolve(&self, index: u8) -> DecodeResult<&str> {
        if index == 0 {
            return Ok("")
        }
        self.strings.get(usize::from(index) - 1)
            .map(String::as_str)
            .ok_or(DecodeError::UnknownStringIndex {index, available: self.strings.len()})
    }

    /// same as [Self::resolve] but gives an empty string for unknown indices, reporting them in `warnings`
    pub fn resolve_or_empty(&self, index: u8, warnings: &mut Vec<DecodeError>) -> String {
        match self.resolve(index) {
            Ok(text) => text.to_owned(),
            Err(error) => {
                log::warn!("{}", error);
                warnings.push(error);
                String::new()
            },
        }
    }
}

impl<S: Into<String>> FromIterator<S> for StringTable {
    fn from_iter<I: IntoIterator<Item=S>>(iter: I) -> Self {
        Self {strings: iter.into_iter().map(Into::into).collect()}
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PackingError;

    #[test]
    fn parse_and_resolve() {
        let payload = b"\x02\x0aSSC_Device\x04LED\0";
        let table = StringTable::parse(&mut Cursor::new(payload)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(0), Ok(""));
        assert_eq!(table.resolve(1), Ok("SSC_Device"));
        assert_eq!(table.resolve(2), Ok("LED"));
        assert_eq!(table.resolve(3), Err(DecodeError::UnknownStringIndex {index: 3, available: 2}));
    }

    #[test]
    fn missing_index_gives_empty_string() {
        let table: StringTable = ["a"].into_iter().collect();
        let mut warnings = Vec::new();
        assert_eq!(table.resolve_or_empty(1, &mut warnings), "a");
        assert_eq!(table.resolve_or_empty(0, &mut warnings), "");
        assert!(warnings.is_empty());
        assert_eq!(table.resolve_or_empty(200, &mut warnings), "");
        assert_eq!(warnings, [DecodeError::UnknownStringIndex {index: 200, available: 1}]);
    }

    #[test]
    fn truncated_string() {
        let payload = b"\x01\x05abc";
        assert_eq!(
            StringTable::parse(&mut Cursor::new(payload)),
            Err(PackingError::Truncated {offset: 2, needed: 5, remaining: 3}),
            );
    }
}

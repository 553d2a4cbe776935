#[cfg(test)]
mod tests {
    use etherscope::{DecodeError, data::PackingError};

    #[test]
    fn display_decode_error_fmt() {
        let truncated = DecodeError::TruncatedInput {offset: 0x84, needed: 8, remaining: 2};
        let parse = DecodeError::ParseError {category: 41, offset: 0x80, reason: "too many sync manager channels"};
        let checksum = DecodeError::ChecksumMismatch {stored: 0x12, computed: 0xc3};
        let string = DecodeError::UnknownStringIndex {index: 9, available: 1};
        let register = DecodeError::UnknownRegisterAddress {address: 0xabc};

        assert_eq!(truncated.to_string(), "input truncated at byte 0x84: 8 bytes needed, 2 remaining");
        assert_eq!(parse.to_string(), "invalid category 41 at byte 0x80: too many sync manager channels");
        assert_eq!(checksum.to_string(), "EEPROM header checksum is 0x12 but content gives 0xc3");
        assert_eq!(string.to_string(), "string index 9 out of string table of 1 strings");
        assert_eq!(register.to_string(), "no decoding known for register 0x0abc");

        dbg!(&truncated, &parse, &checksum, &string, &register);
    }

    #[test]
    fn fatal_errors() {
        assert!(DecodeError::TruncatedInput {offset: 0, needed: 1, remaining: 0}.is_fatal());
        assert!(DecodeError::ParseError {category: 0, offset: 0, reason: ""}.is_fatal());
        assert!(! DecodeError::ChecksumMismatch {stored: 0, computed: 1}.is_fatal());
        assert!(! DecodeError::UnknownStringIndex {index: 2, available: 1}.is_fatal());
        assert!(! DecodeError::UnknownRegisterAddress {address: 0}.is_fatal());
    }

    #[test]
    fn from_packing_error() {
        let error: DecodeError = PackingError::Truncated {offset: 3, needed: 4, remaining: 1}.into();
        assert_eq!(error, DecodeError::TruncatedInput {offset: 3, needed: 4, remaining: 1});

        // errors box like any std error
        let boxed: Box<dyn std::error::Error> = Box::new(error);
        assert!(boxed.to_string().starts_with("input truncated"));
    }
}

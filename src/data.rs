//! Traits and impls used to read data from raw EEPROM images and register snapshots.

use core::{
	marker::PhantomData,
	fmt,
	};

/**
	trait for data types than can be unpacked from a little-endian byte sequence
*/
pub trait PduData: Sized {
    const ID: TypeId;
    /// number of bytes used by the packed value
    const PACKED_SIZE: usize;

    fn unpack(src: &[u8]) -> PackingResult<Self>;

    fn packed_size() -> usize  {Self::PACKED_SIZE}
    fn packed_bitsize() -> usize {Self::PACKED_SIZE*8}
}

/// errors raised when extracting values from bytes
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PackingError {
    /// less bytes were available than the read demanded
    Truncated {
        /// byte position of the read in the original buffer
        offset: usize,
        /// bytes the read needed
        needed: usize,
        /// bytes that were left
        remaining: usize,
    },
    InvalidValue(&'static str),
}

pub type PackingResult<T> = Result<T, PackingError>;

/** dtype identifiers associated to dtypes allowing to dynamically check the type of a [PduData] implementor

	It is only convering the common useful types and not all the possible implementors of [PduData]
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TypeId {
	/// default value of the enum, used in case the matching [PduData] does not fit in any of these integers
	CUSTOM,
	VOID, BOOL,
	I8, I16, I32, I64,
	U8, U16, U32, U64,
	F32, F64,
}
impl TypeId {
    /**
        type matching a CoE data type code (ETG.1000.6 table 64), as used by the `dataType` field of SII PDO entries

        codes without a plain rust counterpart (strings, bit strings, padding ...) give [Self::CUSTOM], code 0 gives [Self::VOID]
    */
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0000 => Self::VOID,
            0x0001 => Self::BOOL,
            0x0002 => Self::I8,
            0x0003 => Self::I16,
            0x0004 => Self::I32,
            0x0005 => Self::U8,
            0x0006 => Self::U16,
            0x0007 => Self::U32,
            0x0008 => Self::F32,
            0x0011 => Self::F64,
            0x0015 => Self::I64,
            0x001b => Self::U64,
            _ => Self::CUSTOM,
        }
    }
}

impl<const N: usize> PduData for [u8; N] {
	const ID: TypeId = TypeId::CUSTOM;
	const PACKED_SIZE: usize = N;

	fn unpack(src: &[u8]) -> PackingResult<Self>  {
        let bytes = src.get(.. N)
            .ok_or(PackingError::Truncated {offset: 0, needed: N, remaining: src.len()})?;
		Self::try_from(bytes).map_err(|_|  PackingError::InvalidValue("slice length mismatch"))
	}
}

impl PduData for bool {
	const ID: TypeId = TypeId::BOOL;
	const PACKED_SIZE: usize = 1;

	fn unpack(src: &[u8]) -> PackingResult<Self>  {
        match src.first() {
            Some(byte) => Ok(byte & 0b1 == 0b1),
            None => Err(PackingError::Truncated {offset: 0, needed: 1, remaining: 0}),
        }
	}
}

/**
    macro implementing [PduData] for a byte-exact struct generated with `bilge`, given its backing integer

    with feature `serde`, the struct is also serialized as its backing integer
*/
macro_rules! bilge_pdudata {
    ($t: ty, $id: ty) => {
        impl crate::data::PduData for $t {
            const ID: crate::data::TypeId = crate::data::TypeId::CUSTOM;
            const PACKED_SIZE: usize = core::mem::size_of::<$id>();

            fn unpack(src: &[u8]) -> crate::data::PackingResult<Self> {
                <$id as crate::data::PduData>::unpack(src).map(Self::from)
            }
        }
        #[cfg(feature = "serde")]
        impl serde::Serialize for $t {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u64(<$id>::from(*self).into())
            }
        }
    };
}
pub(crate) use bilge_pdudata;

/// macro implementing [PduData] for numeric types
macro_rules! num_pdudata {
	($t: ty, $id: ident) => { impl crate::data::PduData for $t {
			const ID: crate::data::TypeId = crate::data::TypeId::$id;
            const PACKED_SIZE: usize = core::mem::size_of::<$t>();

			fn unpack(src: &[u8]) -> crate::data::PackingResult<Self> {
                let bytes = <[u8; core::mem::size_of::<$t>()] as crate::data::PduData>::unpack(src)?;
				Ok(Self::from_le_bytes(bytes))
			}
		}};
}

num_pdudata!(u8, U8);
num_pdudata!(u16, U16);
num_pdudata!(u32, U32);
num_pdudata!(u64, U64);
num_pdudata!(i8, I8);
num_pdudata!(i16, I16);
num_pdudata!(i32, I32);
num_pdudata!(i64, I64);
num_pdudata!(f32, F32);
num_pdudata!(f64, F64);



/**
	locate some data in a byte image by its byte position and length, which must be extracted to type `T` to be processed in rust

	It acts like a getter of a value in a byte sequence. One can think of it as an offset to a data location because it does not actually point the data but only its offset in the byte sequence, it also contains its length to dynamically check memory bounds.
*/
#[derive(Default, Eq, Hash)]
pub struct Field<T: PduData> {
    /// this is only here to mark that T is actually used
	extracted: PhantomData<T>,
	/// start byte index of the object
	pub byte: usize,
	/// byte length of the object
	pub len: usize,
}
impl<T: PduData> Field<T>
{
	/// build a Field from its byte offset and byte length
	pub const fn new(byte: usize, len: usize) -> Self {
		Self{extracted: PhantomData, byte, len}
	}
	/// build a Field from its byte offset, infering its length from the data nominal size
	pub const fn simple(byte: usize) -> Self {
        Self{extracted: PhantomData, byte, len: T::PACKED_SIZE}
	}
	/// byte index right after the field
	pub const fn end(&self) -> usize  {self.byte + self.len}

	/// extract the value pointed by the field in the given byte array
	pub fn get(&self, data: &[u8]) -> PackingResult<T>   {
		let bytes = data.get(self.byte .. self.end())
            .ok_or(PackingError::Truncated {
                offset: self.byte,
                needed: self.len,
                remaining: data.len().saturating_sub(self.byte),
                })?;
		T::unpack(bytes)
	}
}
impl<T: PduData> fmt::Debug for Field<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Field{{0x{:x}, {}}}", self.byte, self.len)
	}
}
// [Clone] and [Copy] must be implemented manually to allow copying a field pointing to a type which does not implement this operation
impl<T: PduData> Clone for Field<T> {
    fn clone(&self) -> Self   {Self::new(self.byte, self.len)}
}
impl<T: PduData> Copy for Field<T> {}
impl<T: PduData> PartialEq for Field<T> {
    fn eq(&self, other: &Self) -> bool {
        self.byte == other.byte && self.len == other.len
    }
}



/** helper to read sequencial data from a byte slice

    It is close to what [std::io::Cursor] is doing, but this struct returns slices without copying the data, and checks the remaining length before every read so it never panics on short input. It is also meant to work with [PduData]

    A cursor can be narrowed to a sub-range with [Self::sub], positions reported in errors stay relative to the original buffer.
*/
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
    /// offset of `data` in the buffer the first cursor was created on
    base: usize,
}
impl<'a> Cursor<'a> {
    /// create a new cursor starting at position zero in the given slice
    pub fn new(data: &'a [u8]) -> Self   {Self{data, position: 0, base: 0}}
    /// current position in the read slice
    ///
    /// bytes before this position are considered read, and bytes after are coming for use in next read calls
    pub fn position(&self) -> usize   {self.position}
    /// current position in the original buffer
    pub fn offset(&self) -> usize   {self.base + self.position}
    /// number of bytes left to read
    pub fn remaining(&self) -> usize   {self.data.len() - self.position}
    /// return all the remaining bytes after current position, but does not advance the cursor
    pub fn remain(&self) -> &'a [u8] {
        &self.data[self.position ..]
    }

    fn check(&self, needed: usize) -> PackingResult<()> {
        if needed > self.remaining() {
            return Err(PackingError::Truncated {
                offset: self.offset(),
                needed,
                remaining: self.remaining(),
                })
        }
        Ok(())
    }

    /// read the next coming bytes with a [PduData] value, and increment the position
    pub fn unpack<T: PduData>(&mut self) -> PackingResult<T> {
        let bytes = self.read(T::PACKED_SIZE)?;
        T::unpack(bytes)
    }
    /// read the next coming `size` bytes and increment the position
    pub fn read(&mut self, size: usize) -> PackingResult<&'a [u8]> {
        self.check(size)?;
        let start = self.position;
        self.position += size;
        Ok(&self.data[start .. self.position])
    }
    pub fn read_u8(&mut self) -> PackingResult<u8>   {self.unpack()}
    pub fn read_u16(&mut self) -> PackingResult<u16>   {self.unpack()}
    pub fn read_u32(&mut self) -> PackingResult<u32>   {self.unpack()}
    /// advance the position without reading
    pub fn skip(&mut self, size: usize) -> PackingResult<()> {
        self.read(size).map(|_| ())
    }
    /// return a cursor on the next `size` bytes and increment the position past them
    pub fn sub(&mut self, size: usize) -> PackingResult<Cursor<'a>> {
        let base = self.offset();
        let data = self.read(size)?;
        Ok(Cursor {data, position: 0, base})
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u8(), Ok(0x01));
        assert_eq!(cursor.read_u16(), Ok(0x0302));
        assert_eq!(cursor.read_u32(), Ok(0x07060504));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn cursor_refuses_short_reads() {
        let data = [0xaa, 0xbb, 0xcc];
        let mut cursor = Cursor::new(&data);
        cursor.skip(2).unwrap();
        assert_eq!(cursor.read_u16(), Err(PackingError::Truncated {offset: 2, needed: 2, remaining: 1}));
        // a failed read leaves the position untouched
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.skip(2), Err(PackingError::Truncated {offset: 2, needed: 2, remaining: 1}));
        assert_eq!(cursor.read_u8(), Ok(0xcc));
    }

    #[test]
    fn sub_cursor_keeps_absolute_offsets() {
        let data = [0u8; 10];
        let mut cursor = Cursor::new(&data);
        cursor.skip(4).unwrap();
        let mut sub = cursor.sub(3).unwrap();
        assert_eq!(cursor.offset(), 7);
        assert_eq!(sub.offset(), 4);
        sub.skip(1).unwrap();
        assert_eq!(sub.read_u32(), Err(PackingError::Truncated {offset: 5, needed: 4, remaining: 2}));
    }

    #[test]
    fn field_checks_bounds() {
        let data = [0x34, 0x12, 0x00];
        assert_eq!(Field::<u16>::simple(0).get(&data), Ok(0x1234));
        assert_eq!(Field::<u16>::simple(2).get(&data),
            Err(PackingError::Truncated {offset: 2, needed: 2, remaining: 1}));
        assert_eq!(Field::<u32>::simple(8).get(&data),
            Err(PackingError::Truncated {offset: 8, needed: 4, remaining: 0}));
    }
}

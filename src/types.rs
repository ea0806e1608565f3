//! Types that describe what an entry is, independent of how it is encoded.
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::result::DateTimeRangeError;
#[cfg(feature = "time")]
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, error::ComponentRange};

pub(crate) mod ffi {
    pub const S_IFMT: u32 = 0o0170000;
    pub const S_IFDIR: u32 = 0o0040000;
    pub const S_IFREG: u32 = 0o0100000;
    pub const S_IFLNK: u32 = 0o0120000;
}

/// MS-DOS attribute bits stored in the low byte of the external attributes.
pub(crate) mod dos {
    pub const READ_ONLY: u32 = 0x01;
    pub const DIRECTORY: u32 = 0x10;
}

pub const DEFAULT_FILE_PERMISSIONS: u16 = 0o644;
pub const DEFAULT_DIRECTORY_PERMISSIONS: u16 = 0o755;

/// Version of the format this crate writes in the low byte of "version made by".
pub const DEFAULT_VERSION: u8 = 46;

/// Originating system, from the high byte of "version made by".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum System {
    Dos = 0,
    Unix = 3,
    Osx = 19,
    Unused = 20,
    #[num_enum(default)]
    Unknown = 255,
}

impl System {
    /// Whether the high 16 bits of the external attributes hold a POSIX mode.
    pub const fn stores_unix_mode(self) -> bool {
        matches!(self, System::Unix | System::Osx)
    }
}

/// What kind of filesystem object an entry describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    File,
    Directory,
    Symlink,
}

impl EntryType {
    /// Decodes the `S_IFMT` bits of a POSIX mode; anything but a regular file, directory or
    /// symlink has no entry type.
    pub const fn from_mode(mode: u32) -> Option<Self> {
        match mode & ffi::S_IFMT {
            ffi::S_IFREG => Some(EntryType::File),
            ffi::S_IFDIR => Some(EntryType::Directory),
            ffi::S_IFLNK => Some(EntryType::Symlink),
            _ => None,
        }
    }

    pub const fn mode_bits(self) -> u32 {
        match self {
            EntryType::File => ffi::S_IFREG,
            EntryType::Directory => ffi::S_IFDIR,
            EntryType::Symlink => ffi::S_IFLNK,
        }
    }

    pub const fn default_permissions(self) -> u16 {
        match self {
            EntryType::File => DEFAULT_FILE_PERMISSIONS,
            EntryType::Directory | EntryType::Symlink => DEFAULT_DIRECTORY_PERMISSIONS,
        }
    }
}

/// Compression method field. Only the methods ZIP tools commonly produce are named; the codecs
/// themselves live outside this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    Stored,
    Deflated,
    Unsupported(u16),
}

impl CompressionMethod {
    pub const fn from_u16(val: u16) -> Self {
        match val {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflated,
            v => CompressionMethod::Unsupported(v),
        }
    }

    pub const fn to_u16(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflated => 8,
            CompressionMethod::Unsupported(v) => v,
        }
    }
}

/// Encodes an entry's type and permissions into the external attributes field the way
/// `system` expects to find them.
pub const fn external_file_attributes(
    system: System,
    entry_type: EntryType,
    permissions: u16,
) -> u32 {
    match system {
        System::Unix | System::Osx => {
            (entry_type.mode_bits() | (permissions as u32 & 0o7777)) << 16
        }
        System::Dos => {
            let mut attributes = match entry_type {
                EntryType::Directory => dos::DIRECTORY,
                _ => 0,
            };
            if permissions & 0o222 == 0 {
                attributes |= dos::READ_ONLY;
            }
            attributes
        }
        System::Unused | System::Unknown => 0,
    }
}

/// Representation of a moment in time.
///
/// Zip files use an old format from DOS to store timestamps,
/// with its own set of peculiarities.
/// For example, it has a resolution of 2 seconds!
///
/// # Warning
///
/// There is no timezone associated with a [`DateTime`], and values read from an archive are
/// not validated, so treat them as user-facing descriptions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Default for DateTime {
    /// Constructs an 'default' datetime of 1980-01-01 00:00:00
    fn default() -> DateTime {
        DateTime {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl DateTime {
    /// Converts an msdos (u16, u16) pair to a DateTime object
    pub const fn from_msdos(datepart: u16, timepart: u16) -> DateTime {
        DateTime {
            year: (datepart >> 9) + 1980,
            month: ((datepart >> 5) & 0x0f) as u8,
            day: (datepart & 0x1f) as u8,
            hour: (timepart >> 11) as u8,
            minute: ((timepart >> 5) & 0x3f) as u8,
            second: ((timepart & 0x1f) << 1) as u8,
        }
    }

    /// Constructs a DateTime from a specific date and time
    ///
    /// The bounds are:
    /// * year: [1980, 2107]
    /// * month: [1, 12]
    /// * day: [1, 31]
    /// * hour: [0, 23]
    /// * minute: [0, 59]
    /// * second: [0, 60]
    pub fn from_date_and_time(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<DateTime, DateTimeRangeError> {
        let in_range = (1980..=2107).contains(&year)
            && (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour <= 23
            && minute <= 59
            && second <= 60;
        if !in_range {
            return Err(DateTimeRangeError);
        }
        Ok(DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Gets the time portion of this datetime in the msdos representation
    pub const fn timepart(&self) -> u16 {
        ((self.second as u16) >> 1) | ((self.minute as u16) << 5) | ((self.hour as u16) << 11)
    }

    /// Gets the date portion of this datetime in the msdos representation
    pub const fn datepart(&self) -> u16 {
        (self.day as u16) | ((self.month as u16) << 5) | ((self.year - 1980) << 9)
    }

    pub const fn year(&self) -> u16 {
        self.year
    }

    /// 1 = january. Values read from an archive may be out of range.
    pub const fn month(&self) -> u8 {
        self.month
    }

    pub const fn day(&self) -> u8 {
        self.day
    }

    pub const fn hour(&self) -> u8 {
        self.hour
    }

    pub const fn minute(&self) -> u8 {
        self.minute
    }

    pub const fn second(&self) -> u8 {
        self.second
    }

    #[cfg(feature = "time")]
    /// Converts the DateTime to a OffsetDateTime structure
    pub fn to_time(&self) -> Result<OffsetDateTime, ComponentRange> {
        let date =
            Date::from_calendar_date(i32::from(self.year), Month::try_from(self.month)?, self.day)?;
        let time = Time::from_hms(self.hour, self.minute, self.second)?;
        Ok(PrimitiveDateTime::new(date, time).assume_utc())
    }
}

#[cfg(feature = "time")]
impl TryFrom<OffsetDateTime> for DateTime {
    type Error = DateTimeRangeError;

    fn try_from(dt: OffsetDateTime) -> Result<Self, Self::Error> {
        DateTime::from_date_and_time(
            dt.year().try_into()?,
            dt.month().into(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }
}

/// Values only known once the payload has been compressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawValues {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

/// Metadata a caller supplies when synthesizing headers for a new entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryOptions {
    pub(crate) compression_method: CompressionMethod,
    pub(crate) last_modified_time: DateTime,
    pub(crate) entry_type: EntryType,
    pub(crate) permissions: Option<u16>,
    pub(crate) system: System,
    pub(crate) uses_data_descriptor: bool,
    pub(crate) large_file: bool,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            compression_method: CompressionMethod::Deflated,
            last_modified_time: DateTime::default(),
            entry_type: EntryType::File,
            permissions: None,
            system: System::Unix,
            uses_data_descriptor: false,
            large_file: false,
        }
    }
}

impl EntryOptions {
    #[must_use]
    pub const fn compression_method(mut self, method: CompressionMethod) -> Self {
        self.compression_method = method;
        self
    }

    #[must_use]
    pub const fn last_modified_time(mut self, mod_time: DateTime) -> Self {
        self.last_modified_time = mod_time;
        self
    }

    #[must_use]
    pub const fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    /// Permission bits (`0o7777` mask). Defaults depend on the entry type.
    #[must_use]
    pub const fn unix_permissions(mut self, mode: u16) -> Self {
        self.permissions = Some(mode & 0o7777);
        self
    }

    /// System recorded in "version made by"; decides how attributes are encoded.
    #[must_use]
    pub const fn system(mut self, system: System) -> Self {
        self.system = system;
        self
    }

    /// CRC and sizes will follow the payload in a data descriptor.
    #[must_use]
    pub const fn data_descriptor(mut self, uses_data_descriptor: bool) -> Self {
        self.uses_data_descriptor = uses_data_descriptor;
        self
    }

    /// Reserve a ZIP64 record in the local header even if the sizes aren't known to need it.
    #[must_use]
    pub const fn large_file(mut self, large: bool) -> Self {
        self.large_file = large;
        self
    }

    pub const fn permissions(&self) -> u16 {
        match self.permissions {
            Some(permissions) => permissions,
            None => self.entry_type.default_permissions(),
        }
    }

    pub const fn external_file_attributes(&self) -> u32 {
        external_file_attributes(self.system, self.entry_type, self.permissions())
    }
}

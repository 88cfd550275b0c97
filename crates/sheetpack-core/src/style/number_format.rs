//! Number format types

/// Number format of a cell style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (id 0)
    #[default]
    General,

    /// Built-in format by id (1..=163)
    BuiltIn(u32),

    /// Custom format code; assigned an id from 164 when written
    Custom(String),
}

impl NumberFormat {
    /// First id available to custom formats
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// Map a `numFmtId` read from a file, given the code it declared (if any)
    pub fn from_id(id: u32, code: Option<&str>) -> Self {
        match (id, code) {
            (0, _) => NumberFormat::General,
            (_, Some(code)) if id >= Self::FIRST_CUSTOM_ID => NumberFormat::Custom(code.to_string()),
            (_, _) => NumberFormat::BuiltIn(id),
        }
    }

    /// The built-in id, if this is not a custom format
    pub fn builtin_id(&self) -> Option<u32> {
        match self {
            NumberFormat::General => Some(0),
            NumberFormat::BuiltIn(id) => Some(*id),
            NumberFormat::Custom(_) => None,
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, NumberFormat::General)
    }
}

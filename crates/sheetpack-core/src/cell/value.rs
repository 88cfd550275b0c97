//! Cell value types

use std::fmt;
use std::str::FromStr;

use crate::cell::CellRef;
use crate::error::{Error, Result};
use crate::sst::{SharedStringItem, SharedStringTable};
use crate::MAX_CELL_CHARS;

/// The value held by a cell
///
/// Every consumer matches on all seven variants; there is no catch-all.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No value
    #[default]
    Empty,

    /// Numeric value (dates are numbers too)
    Number(f64),

    /// A string stored in the shared string table
    SharedString(SharedString),

    /// A string stored directly in the cell
    InlineString(String),

    /// Boolean value
    Bool(bool),

    /// Formula with an optional cached result
    Formula(Formula),

    /// Error value (#DIV/0!, #N/A, ...)
    Error(CellError),
}

/// A shared string cell's payload
///
/// Writers accept either form; an [`SharedString::Item`] is interned on write.
/// Readers produce items unless raw cell values were requested.
#[derive(Debug, Clone, PartialEq)]
pub enum SharedString {
    /// Index into the shared string table
    Index(u32),
    /// The string itself
    Item(SharedStringItem),
}

/// Formula text plus the last calculated value, if known
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Formula {
    /// Formula text without the leading `=`
    pub expr: String,
    /// Cached result
    pub cached: Option<Box<CellValue>>,
}

impl Formula {
    pub fn new<S: Into<String>>(expr: S) -> Self {
        let expr = expr.into();
        let expr = match expr.strip_prefix('=') {
            Some(rest) => rest.to_string(),
            None => expr,
        };
        Self { expr, cached: None }
    }

    pub fn with_cached(mut self, value: CellValue) -> Self {
        self.cached = Some(Box::new(value));
        self
    }
}

impl CellValue {
    /// A plain shared string
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::SharedString(SharedString::Item(SharedStringItem::plain(s)))
    }

    /// An inline string, bypassing the shared string table
    pub fn inline<S: Into<String>>(s: S) -> Self {
        CellValue::InlineString(s.into())
    }

    /// A formula without a cached value
    pub fn formula<S: Into<String>>(expr: S) -> Self {
        CellValue::Formula(Formula::new(expr))
    }

    /// Parse a textual numeric payload
    pub fn parse_number(s: &str) -> Result<Self> {
        let n: f64 = s
            .trim()
            .parse()
            .map_err(|_| Error::invalid_value("?", format!("'{}' is not a number", s)))?;
        if !n.is_finite() {
            return Err(Error::invalid_value("?", format!("'{}' is not finite", s)));
        }
        Ok(CellValue::Number(n))
    }

    /// Name of the variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Number(_) => "number",
            CellValue::SharedString(_) => "shared string",
            CellValue::InlineString(_) => "inline string",
            CellValue::Bool(_) => "boolean",
            CellValue::Formula(_) => "formula",
            CellValue::Error(_) => "error",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text of a resolved shared string or an inline string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::SharedString(SharedString::Item(item)) => Some(&item.text),
            CellValue::InlineString(s) => Some(s),
            _ => None,
        }
    }

    /// Check the payload against its variant
    ///
    /// Shared string indices must resolve in `sst`. Text must fit in a cell,
    /// numbers must be finite, and a formula's cached value must be a plain
    /// scalar.
    pub fn validate(&self, cell: CellRef, sst: &SharedStringTable) -> Result<()> {
        match self {
            CellValue::Empty | CellValue::Bool(_) | CellValue::Error(_) => Ok(()),
            CellValue::Number(n) => {
                if n.is_finite() {
                    Ok(())
                } else {
                    Err(Error::invalid_value(cell, format!("{} is not finite", n)))
                }
            }
            CellValue::SharedString(SharedString::Index(idx)) => sst.resolve(*idx).map(|_| ()),
            CellValue::SharedString(SharedString::Item(item)) => check_len(cell, &item.text),
            CellValue::InlineString(s) => check_len(cell, s),
            CellValue::Formula(f) => {
                if f.expr.trim().is_empty() {
                    return Err(Error::invalid_value(cell, "empty formula"));
                }
                match f.cached.as_deref() {
                    None => Ok(()),
                    Some(CellValue::Formula(_)) | Some(CellValue::SharedString(_)) => Err(
                        Error::invalid_value(cell, "formula cached value must be a scalar"),
                    ),
                    Some(other) => other.validate(cell, sst),
                }
            }
        }
    }
}

fn check_len(cell: CellRef, s: &str) -> Result<()> {
    let n = s.chars().count();
    if n > MAX_CELL_CHARS {
        return Err(Error::invalid_value(
            cell,
            format!("{} characters exceeds the limit of {}", n, MAX_CELL_CHARS),
        ));
    }
    Ok(())
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// Excel error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// #GETTING_DATA - External data is loading
    GettingData,
    /// #SPILL! - Dynamic array cannot spill
    Spill,
    /// #CALC! - Calculation error
    Calc,
}

impl CellError {
    const ALL: [CellError; 10] = [
        CellError::Null,
        CellError::Div0,
        CellError::Value,
        CellError::Ref,
        CellError::Name,
        CellError::Num,
        CellError::Na,
        CellError::GettingData,
        CellError::Spill,
        CellError::Calc,
    ];

    /// The literal written into the sheet
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::GettingData => "#GETTING_DATA",
            CellError::Spill => "#SPILL!",
            CellError::Calc => "#CALC!",
        }
    }
}

impl FromStr for CellError {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_value("?", format!("unknown error literal '{}'", s)))
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

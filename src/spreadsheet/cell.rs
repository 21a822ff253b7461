use crate::spreadsheet::reference::index_to_reference;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;

const MILLISECONDS_PER_DAY: f64 = 86_400_000f64;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// Converts Excel error codes to human-readable error strings.
pub(crate) fn to_error_value(value: u8) -> &'static str {
    match value {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        0x2B => "#GETTING_DATA",
        _ => "#ERROR!",
    }
}

/// Represents a single cell in a spreadsheet with position, type, and value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Raw cell value; a shared string index for `SharedString` cells
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts cell value to boolean (1 = true, other = false).
    pub(crate) fn to_boolean(&self) -> bool {
        self.value == "1" || self.value.eq_ignore_ascii_case("true")
    }

    /// Converts cell value to double-precision floating point.
    pub(crate) fn to_double(&self) -> Result<f64, String> {
        self.value.trim().parse::<f64>().map_err(|_| format!("parse '{}' to double failed", self.value))
    }

    /// Converts the raw cell into a table value.
    ///
    /// Booleans become `1`/`0` only when the whole column holds booleans; elsewhere
    /// they read as `true`/`false` text. Date and time cells become ISO text, error
    /// cells keep their literal.
    pub(crate) fn to_value(&self, shared_strings: &[String], is_boolean_column: bool) -> Result<Value, String> {
        match self.kind {
            CellType::Empty => Ok(Value::Empty),
            CellType::Boolean if is_boolean_column => Ok(Value::Number(if self.to_boolean() { 1.0 } else { 0.0 })),
            CellType::Number => self.to_double().map(Value::Number),
            CellType::SharedString => {
                let index = self.value.parse::<usize>()
                    .map_err(|_| format!("invalid shared string index '{}'", self.value))?;
                shared_strings.get(index)
                    .map(|string| Value::text(string))
                    .ok_or_else(|| format!("shared string index '{}' out of range", index))
            }
            _ => Ok(Value::text(self.to_string())),
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let number = || self.value.trim().parse::<f64>().ok();
        let formatted = match self.kind {
            CellType::Boolean => Some(if self.to_boolean() { "true" } else { "false" }.to_owned()),
            CellType::NumberDateTime1900 => number().and_then(|value| to_datetime_string(value, false)),
            CellType::NumberDateTime1904 => number().and_then(|value| to_datetime_string(value, true)),
            CellType::NumberDate1900 => number().and_then(|value| to_date_string(value, false)),
            CellType::NumberDate1904 => number().and_then(|value| to_date_string(value, true)),
            CellType::NumberTime1900 | CellType::NumberTime1904 => number().and_then(to_time_string),
            CellType::IsoDateTime => Some(self.value.replace('T', " ")),
            _ => None,
        };
        // Serial numbers outside chrono's range keep their raw value
        write!(f, "{}", formatted.as_deref().unwrap_or(&self.value))
    }
}

/// Converts an Excel serial number to a timestamp.
/// The 1900 system counts the nonexistent 1900-02-29, so serials before it are shifted by one day.
fn to_datetime(value: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !value.is_finite() {
        return None;
    }
    let total = (value * MILLISECONDS_PER_DAY).round() as i64;
    let mut days = total.div_euclid(MILLISECONDS_PER_DAY as i64);
    let milliseconds = total.rem_euclid(MILLISECONDS_PER_DAY as i64);
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        if days < 60 {
            days += 1;
        }
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let date = epoch.checked_add_signed(Duration::try_days(days)?)?;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        (milliseconds / 1_000) as u32,
        (milliseconds % 1_000) as u32 * 1_000_000,
    )?;
    Some(date.and_time(time))
}

/// Converts Excel numeric date to ISO date string.
fn to_date_string(value: f64, is_1904: bool) -> Option<String> {
    to_datetime(value.trunc(), is_1904).map(|datetime| datetime.format("%Y-%m-%d").to_string())
}

/// Converts Excel numeric time to ISO time string; durations past a day keep counting hours.
fn to_time_string(value: f64) -> Option<String> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let mut hours = (value * MILLISECONDS_PER_DAY).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    Some(if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    })
}

/// Converts Excel numeric datetime to ISO datetime string.
fn to_datetime_string(value: f64, is_1904: bool) -> Option<String> {
    to_datetime(value, is_1904).map(|datetime| {
        if datetime.and_utc().timestamp_subsec_millis() > 0 {
            datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
        } else {
            datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        }
    })
}

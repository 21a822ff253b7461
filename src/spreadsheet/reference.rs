//! A1-style cell references.

/// Converts 0-based coordinates into a reference such as `B2`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Converts a 0-based column index into its letters (0 = A, 25 = Z, 26 = AA).
pub(crate) fn index_to_col(col: usize) -> String {
    let mut letters = Vec::<u8>::new();
    let mut n = col;
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Parses a reference such as `B2` or `$B$2` into 0-based `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (col, row) = reference.split_at(split);
    Some((row_to_index(row)?, col_to_index(col)?))
}

/// Parses column letters into a 0-based index.
pub(crate) fn col_to_index(col: &str) -> Option<usize> {
    if col.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for letter in col.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let digit = (letter.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

/// Parses a 1-based row number into a 0-based index.
pub(crate) fn row_to_index(row: &str) -> Option<usize> {
    row.parse::<usize>().ok()?.checked_sub(1)
}

use std::cmp::Ordering;

use serde::Serialize;

use super::Column;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortState {
    /// State after a header is activated: a new column starts ascending,
    /// the current column flips direction.
    pub fn activate(current: Option<SortState>, column: Column) -> SortState {
        match current {
            Some(state) if state.column == column => SortState {
                column,
                direction: state.direction.toggled(),
            },
            _ => SortState {
                column,
                direction: SortDirection::Ascending,
            },
        }
    }
}

/// Sort key class of a cell. Blank cells sort first, then numbers, then
/// text, so a column mixing both still gets a total order.
#[derive(Clone, Copy, Debug)]
enum CellKey {
    Blank,
    Number(f64),
    Text,
}

impl CellKey {
    fn of(cell: &str) -> Self {
        if cell.is_empty() {
            return Self::Blank;
        }
        match cell.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Blank => 0,
            Self::Number(_) => 1,
            Self::Text => 2,
        }
    }
}

/// Numeric order when both cells parse as numbers, natural case-insensitive
/// order when both are text. Blank cells come first and numbers before text.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    let (ta, tb) = (a.trim(), b.trim());
    let (ka, kb) = (CellKey::of(ta), CellKey::of(tb));
    match (ka, kb) {
        (CellKey::Number(na), CellKey::Number(nb)) => na.total_cmp(&nb),
        (CellKey::Text, CellKey::Text) => natural_cmp(ta, tb),
        _ => ka.rank().cmp(&kb.rank()),
    }
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().flat_map(char::to_lowercase).peekable();
    let mut bi = b.chars().flat_map(char::to_lowercase).peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let da = take_digits(&mut ai);
                let db = take_digits(&mut bi);
                let ord = cmp_digit_runs(&da, &db);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(it: &mut std::iter::Peekable<impl Iterator<Item = char>>) -> String {
    let mut out = String::new();
    while let Some(c) = it.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        out.push(c);
        it.next();
    }
    out
}

fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

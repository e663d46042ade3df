//! Data-editor puzzle
//!
//! The player is shown a small table of hex values and walks it row by row,
//! choosing whether to edit one cell per row. Which edits are required
//! depends on each row's contents and on the edit made to the row before it;
//! see [`data_correct`].

use super::{BadInput, ProgramHost, PuzzleProgram};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Penalty for submitting incorrect edits
const FREEZE_MS: u64 = 5 * 1000;

const MIN_ROWS: usize = 3;
/// Exclusive upper bound on the row count
const MAX_ROWS: usize = 5;
const COLUMNS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditState {
    QueryRow,
    EnterCol,
    EnterVal,
    Finished,
}

/// Where the table for the next attempt comes from
#[derive(Debug)]
enum DataSource {
    Random(StdRng),
    Fixed(Vec<Vec<u8>>),
}

#[derive(Debug)]
pub struct DataEditor {
    source: DataSource,
    completed: bool,
    row: usize,
    col: usize,
    state: EditState,
    /// Table as generated
    start_data: Vec<Vec<u8>>,
    /// Table with the player's edits
    end_data: Vec<Vec<u8>>,
}

impl DataEditor {
    pub fn new() -> Self {
        Self::with_source(DataSource::Random(StdRng::from_entropy()))
    }

    /// Editor whose tables come from a seeded generator.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_source(DataSource::Random(StdRng::seed_from_u64(seed)))
    }

    /// Editor that presents the same table on every start.
    pub fn with_data(data: Vec<Vec<u8>>) -> Self {
        Self::with_source(DataSource::Fixed(data))
    }

    fn with_source(source: DataSource) -> Self {
        Self {
            source,
            completed: false,
            row: 0,
            col: 0,
            state: EditState::QueryRow,
            start_data: Vec::new(),
            end_data: Vec::new(),
        }
    }

    /// The table as generated for the current attempt
    pub fn data(&self) -> &[Vec<u8>] {
        &self.start_data
    }

    /// The table including the player's edits so far
    pub fn edited_data(&self) -> &[Vec<u8>] {
        &self.end_data
    }

    /// Row currently being queried
    pub fn row(&self) -> usize {
        self.row
    }

    fn generate_data(&mut self) -> Vec<Vec<u8>> {
        match &mut self.source {
            DataSource::Random(rng) => {
                let rows = rng.gen_range(MIN_ROWS..MAX_ROWS);
                (0..rows)
                    .map(|_| (0..COLUMNS).map(|_| rng.gen_range(0..0x10)).collect())
                    .collect()
            }
            DataSource::Fixed(data) => data.clone(),
        }
    }

    fn output_data(&self, host: &mut dyn ProgramHost) {
        let col_count = self.start_data.first().map_or(0, Vec::len);

        let indices: Vec<String> = (0..col_count).map(|i| format!("{:4}", i)).collect();
        host.output(vec![
            String::new(),
            format!("   | {}", indices.join("  ")),
            "-".repeat(5 + 6 * col_count),
        ]);

        let mut rows: Vec<String> = self
            .start_data
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let values: Vec<String> = row.iter().map(|v| format!("{:#04x}", v)).collect();
                format!("{:2} | {}", idx, values.join("  "))
            })
            .collect();
        rows.push(String::new());
        host.output(rows);
    }

    /// Finish once every row has been visited, judging the edits.
    fn check_finished(&mut self, host: &mut dyn ProgramHost) {
        if self.row < self.start_data.len() {
            return;
        }

        self.state = EditState::Finished;
        if data_correct(&self.start_data, &self.end_data) {
            tracing::debug!("data editor edits accepted");
            self.completed = true;
        } else {
            tracing::debug!("data editor edits rejected");
            host.output(vec![format!(
                "{}corruption detected in system file, repairing!",
                self.failure_prefix()
            )]);
            host.freeze(FREEZE_MS);
        }
    }
}

/// Column index typed by the player. Integers too long for `i64` are
/// still numbers, just out of range.
fn parse_column(text: &str) -> Result<i64, BadInput> {
    text.parse().map_err(|_| {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            BadInput::new("Column out of range")
        } else {
            BadInput::new("Not a number")
        }
    })
}

impl Default for DataEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl PuzzleProgram for DataEditor {
    fn label(&self) -> &str {
        "software lock"
    }

    fn help(&self) -> &str {
        "Modify raw software data."
    }

    fn prompt(&self) -> Option<String> {
        match self.state {
            EditState::QueryRow => Some(format!("Edit line {}? (y/n)", self.row)),
            EditState::EnterCol => Some("Edit col num: ".to_string()),
            EditState::EnterVal => Some(format!(
                "Change {:#04x} to (leave empty to cancel): ",
                self.start_data[self.row][self.col]
            )),
            EditState::Finished => None,
        }
    }

    fn start(&mut self, host: &mut dyn ProgramHost) {
        self.row = 0;
        self.col = 0;
        self.state = EditState::QueryRow;
        self.start_data = self.generate_data();
        self.end_data = self.start_data.clone();
        self.output_data(host);
        // An empty table has nothing to edit
        self.check_finished(host);
    }

    fn text_input(&mut self, line: &str, host: &mut dyn ProgramHost) -> Result<(), BadInput> {
        let line = line.trim_start().to_lowercase();

        match self.state {
            EditState::QueryRow => {
                if line.starts_with('y') {
                    self.state = EditState::EnterCol;
                } else {
                    self.row += 1;
                }
            }
            EditState::EnterCol => {
                let col = parse_column(line.trim_end())?;
                let cols = self.start_data[self.row].len();
                if col < 0 || col as usize >= cols {
                    return Err(BadInput::new("Column out of range"));
                }

                self.col = col as usize;
                self.state = EditState::EnterVal;
            }
            EditState::EnterVal => {
                let value = line.trim_end();
                if value.is_empty() {
                    // Cancelled; ask about the same row again
                    self.state = EditState::QueryRow;
                } else {
                    let digits = value.strip_prefix("0x").unwrap_or(value);
                    let parsed = u8::from_str_radix(digits, 16)
                        .map_err(|_| BadInput::new("Not a number"))?;

                    self.end_data[self.row][self.col] = parsed;
                    self.row += 1;
                    self.state = EditState::QueryRow;
                }
            }
            EditState::Finished => return Ok(()),
        }

        self.check_finished(host);
        Ok(())
    }

    fn completed(&self) -> bool {
        self.completed
    }

    fn exited(&self) -> bool {
        self.state == EditState::Finished
    }
}

/// The single edit made to a row
#[derive(Debug, Clone, Copy)]
struct RowEdit {
    col: usize,
    old: u8,
    new: u8,
}

/// Judge the player's edits against the rules for each row.
///
/// Rows are walked in order. Which rule applies to a row depends on whether
/// the previous row was edited:
///
/// - First row, or previous row unedited:
///   1. first value `v` below 7: cell `v` must become 0;
///   2. else if the row holds a 0: that cell must become 0xF;
///   3. else if more than three odd-indexed cells exist: cell 1 must be
///      decremented by one;
///   4. else the row must not be edited.
/// - Last row (previous row edited): its final cell must equal the number of
///   edited rows so far, and no other cell may change.
/// - Middle row, previous row edited:
///   1. last value `v` below 7: cell `v` must hold the previous edit's old
///      value;
///   2. else if the row holds 0xF: that cell must hold the previous edit's
///      column;
///   3. else if the row holds the previous edit's new value: that cell must
///      become 0;
///   4. else the row must not be edited.
///
/// A value-selected cell rule only applies when the value names an existing
/// column. Editing a row that must not be edited fails the whole attempt.
pub fn data_correct(start_data: &[Vec<u8>], end_data: &[Vec<u8>]) -> bool {
    let mut previous: Option<RowEdit> = None;
    let mut edits: usize = 0;

    for (idx, (start, end)) in start_data.iter().zip(end_data).enumerate() {
        let mut expect_edit = true;

        match previous {
            None => {
                let first = start.first().copied().map(usize::from);
                if let Some(col) = first.filter(|&v| v < 7 && v < start.len()) {
                    if end[col] != 0 {
                        return false;
                    }
                } else if let Some(zero) = start.iter().position(|&v| v == 0) {
                    if end[zero] != 0xF {
                        return false;
                    }
                } else {
                    let odd_indexed: Vec<usize> = (1..start.len()).step_by(2).collect();
                    if odd_indexed.len() > 3 {
                        let col = odd_indexed[0];
                        if i16::from(end[col]) != i16::from(start[col]) - 1 {
                            return false;
                        }
                    } else {
                        expect_edit = false;
                    }
                }
            }
            Some(_) if idx + 1 == start_data.len() => {
                let (Some((last, rest)), Some((_, start_rest))) =
                    (end.split_last(), start.split_last())
                else {
                    return false;
                };
                if usize::from(*last) != edits || rest != start_rest {
                    return false;
                }
            }
            Some(prev) => {
                let last = start.last().copied().map(usize::from);
                if let Some(col) = last.filter(|&v| v < 7 && v < start.len()) {
                    if end[col] != prev.old {
                        return false;
                    }
                } else if let Some(pos) = start.iter().position(|&v| v == 0xF) {
                    if usize::from(end[pos]) != prev.col {
                        return false;
                    }
                } else if let Some(pos) = start.iter().position(|&v| v == prev.new) {
                    if end[pos] != 0 {
                        return false;
                    }
                } else {
                    expect_edit = false;
                }
            }
        }

        previous = start
            .iter()
            .zip(end)
            .position(|(s, e)| s != e)
            .map(|col| RowEdit {
                col,
                old: start[col],
                new: end[col],
            });
        if previous.is_some() {
            edits += 1;
            if !expect_edit {
                return false;
            }
        }
    }

    true
}

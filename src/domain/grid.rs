/// Terminal grid generator.
///
/// Builds the two noise columns shown on the breach screen and splices the
/// session's words into them at random, non-overlapping positions. An
/// embedded word is wrapped in `MARK_START` / `MARK_END` control characters
/// so the presentation layer can locate it without scanning for word text;
/// stripping the marks restores the fixed row width.
///
/// Placement is retry-based and lossy: a word that cannot find a free slot
/// is dropped from the display. The secret is the exception. It is placed
/// before anything else and falls back to an exhaustive slot scan, so a
/// session is never generated without its answer on screen.

use rand::seq::SliceRandom;
use rand::Rng;

/// Invisible delimiters around an embedded word.
pub const MARK_START: char = '\u{2}';
pub const MARK_END: char = '\u{3}';

/// Punctuation alphabet the noise cells are drawn from.
const NOISE: &[u8] = br#"!@#$%^&*+-/\|;:'".,?<>[]{}()=_"#;

/// Default geometry: two columns, 17 rows of 12 characters.
pub const GRID_COLS: usize = 12;
pub const GRID_ROWS: usize = 17;

/// Random placement attempts per word before it is dropped.
const PLACE_RETRIES: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Column {
    Left,
    Right,
}

/// One word embedded in the grid, addressed by its undelimited offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedWord {
    pub word: String,
    pub column: Column,
    pub row: usize,
    pub start: usize,
}

#[derive(Clone, Debug)]
pub struct TerminalGrid {
    /// Delimited rows of the left column.
    pub left: Vec<String>,
    /// Delimited rows of the right column.
    pub right: Vec<String>,
    placed: Vec<PlacedWord>,
}

impl TerminalGrid {
    /// Embed `words` into two fresh noise columns. The first half of the
    /// word list (rounded up) goes left, the remainder right.
    pub fn generate(
        words: &[String],
        secret: &str,
        cols: usize,
        rows: usize,
        rng: &mut impl Rng,
    ) -> TerminalGrid {
        let half = (words.len() + 1) / 2;
        let (left_words, right_words) = words.split_at(half.min(words.len()));

        let mut left = ColumnBuilder::new(cols, rows, rng);
        let mut right = ColumnBuilder::new(cols, rows, rng);
        left.place_all(left_words, secret, rng);
        right.place_all(right_words, secret, rng);

        let mut placed = Vec::new();
        placed.extend(left.placements(Column::Left));
        placed.extend(right.placements(Column::Right));
        placed.sort_by(|a, b| {
            (a.column, a.row, a.start).cmp(&(b.column, b.row, b.start))
        });

        TerminalGrid {
            left: left.finish(),
            right: right.finish(),
            placed,
        }
    }

    /// Embedded words in display order (left column first, then by row).
    pub fn targets(&self) -> &[PlacedWord] {
        &self.placed
    }
}

/// Split a delimited row into `(text, is_word)` runs for rendering.
pub fn segments(row: &str) -> Vec<(String, bool)> {
    let mut out = Vec::new();
    let mut run = String::new();
    let mut in_word = false;
    for ch in row.chars() {
        match ch {
            MARK_START | MARK_END => {
                if !run.is_empty() {
                    out.push((std::mem::take(&mut run), in_word));
                }
                in_word = ch == MARK_START;
            }
            c => run.push(c),
        }
    }
    if !run.is_empty() {
        out.push((run, in_word));
    }
    out
}

// ── Column builder ──

struct ColumnBuilder {
    cols: usize,
    noise: Vec<Vec<char>>,
    /// Accepted spans per row as (start, end-exclusive), in placement order.
    spans: Vec<Vec<(usize, usize)>>,
    words: Vec<(String, usize, usize)>, // (word, row, start)
}

impl ColumnBuilder {
    fn new(cols: usize, rows: usize, rng: &mut impl Rng) -> ColumnBuilder {
        let noise = (0..rows)
            .map(|_| {
                (0..cols)
                    .map(|_| NOISE[rng.gen_range(0..NOISE.len())] as char)
                    .collect()
            })
            .collect();
        ColumnBuilder {
            cols,
            noise,
            spans: vec![Vec::new(); rows],
            words: Vec::new(),
        }
    }

    fn place_all(&mut self, list: &[String], secret: &str, rng: &mut impl Rng) {
        // Secret goes first: a crowded grid can never squeeze it out.
        if let Some(s) = list.iter().find(|w| w.as_str() == secret) {
            if !self.try_place(s, rng) {
                self.force_place(s, rng);
            }
        }
        for word in list.iter().filter(|w| w.as_str() != secret) {
            self.try_place(word, rng);
        }
    }

    /// Does a span of `len` starting at `start` keep a one-cell buffer from
    /// every accepted span on that row?
    fn fits(&self, row: usize, start: usize, len: usize) -> bool {
        self.spans[row]
            .iter()
            .all(|&(a, b)| start + len + 1 <= a || b + 1 <= start)
    }

    fn accept(&mut self, word: &str, row: usize, start: usize) {
        self.spans[row].push((start, start + word.chars().count()));
        self.words.push((word.to_string(), row, start));
    }

    fn try_place(&mut self, word: &str, rng: &mut impl Rng) -> bool {
        let len = word.chars().count();
        if len == 0 || len > self.cols || self.noise.is_empty() {
            return false;
        }
        for _ in 0..PLACE_RETRIES {
            let row = rng.gen_range(0..self.noise.len());
            let start = rng.gen_range(0..=self.cols - len);
            if self.fits(row, start, len) {
                self.accept(word, row, start);
                return true;
            }
        }
        false
    }

    /// Exhaustive fallback: scan every slot in random order and take the
    /// first that fits. Only fails when the column genuinely has no room.
    fn force_place(&mut self, word: &str, rng: &mut impl Rng) -> bool {
        let len = word.chars().count();
        if len == 0 || len > self.cols {
            return false;
        }
        let mut slots: Vec<(usize, usize)> = (0..self.noise.len())
            .flat_map(|row| (0..=self.cols - len).map(move |start| (row, start)))
            .collect();
        slots.shuffle(rng);
        for (row, start) in slots {
            if self.fits(row, start, len) {
                self.accept(word, row, start);
                return true;
            }
        }
        false
    }

    fn placements(&self, column: Column) -> Vec<PlacedWord> {
        self.words
            .iter()
            .map(|(word, row, start)| PlacedWord {
                word: word.clone(),
                column,
                row: *row,
                start: *start,
            })
            .collect()
    }

    /// Compose the delimited row strings: noise everywhere except the
    /// accepted spans, which carry the word text wrapped in marks.
    fn finish(self) -> Vec<String> {
        let mut by_row: Vec<Vec<(usize, &str)>> = vec![Vec::new(); self.noise.len()];
        for (word, row, start) in &self.words {
            by_row[*row].push((*start, word.as_str()));
        }
        for row in &mut by_row {
            row.sort_by_key(|&(start, _)| start);
        }

        self.noise
            .iter()
            .enumerate()
            .map(|(y, noise_row)| {
                let mut out = String::with_capacity(self.cols + 8);
                let mut x = 0;
                for &(start, word) in &by_row[y] {
                    while x < start {
                        out.push(noise_row[x]);
                        x += 1;
                    }
                    out.push(MARK_START);
                    out.push_str(word);
                    out.push(MARK_END);
                    x += word.chars().count();
                }
                while x < self.cols {
                    out.push(noise_row[x]);
                    x += 1;
                }
                out
            })
            .collect()
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bank(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn strip(row: &str) -> String {
        row.chars()
            .filter(|&c| c != MARK_START && c != MARK_END)
            .collect()
    }

    fn twelve() -> Vec<String> {
        bank(&[
            "VAULT", "STEAM", "PIPES", "CARGO", "ALARM", "GUARD", "POWER",
            "RELAY", "SIREN", "CRANE", "TRACK", "LEVER",
        ])
    }

    #[test]
    fn stripped_rows_keep_fixed_width() {
        let mut rng = StdRng::seed_from_u64(11);
        let grid = TerminalGrid::generate(&twelve(), "VAULT", GRID_COLS, GRID_ROWS, &mut rng);
        assert_eq!(grid.left.len(), GRID_ROWS);
        assert_eq!(grid.right.len(), GRID_ROWS);
        for row in grid.left.iter().chain(&grid.right) {
            assert_eq!(strip(row).chars().count(), GRID_COLS);
        }
    }

    #[test]
    fn placed_words_are_readable_at_their_offsets() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = TerminalGrid::generate(&twelve(), "GUARD", GRID_COLS, GRID_ROWS, &mut rng);
            for p in grid.targets() {
                let rows = match p.column {
                    Column::Left => &grid.left,
                    Column::Right => &grid.right,
                };
                let flat = strip(&rows[p.row]);
                let slice: String = flat
                    .chars()
                    .skip(p.start)
                    .take(p.word.chars().count())
                    .collect();
                assert_eq!(slice, p.word);
            }
        }
    }

    #[test]
    fn spans_never_touch_within_one_cell() {
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = TerminalGrid::generate(&twelve(), "VAULT", GRID_COLS, GRID_ROWS, &mut rng);
            for column in [Column::Left, Column::Right] {
                for row in 0..GRID_ROWS {
                    let mut spans: Vec<(usize, usize)> = grid
                        .targets()
                        .iter()
                        .filter(|p| p.column == column && p.row == row)
                        .map(|p| (p.start, p.start + p.word.chars().count()))
                        .collect();
                    spans.sort();
                    for pair in spans.windows(2) {
                        assert!(
                            pair[0].1 + 1 <= pair[1].0,
                            "seed {seed}: spans {:?} lack a buffer cell",
                            pair
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn secret_survives_a_cramped_grid() {
        // Two rows of 12 cells cannot hold five 10-char words; most drop,
        // but the secret must always make it in.
        let words = bank(&[
            "GENERATORS", "HYDRAULICS", "MECHANISMS", "PERIMETERS", "FOUNDATION",
        ]);
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = TerminalGrid::generate(&words, "MECHANISMS", 12, 2, &mut rng);
            assert!(grid.targets().iter().any(|p| p.word == "MECHANISMS"));
            assert!(grid.targets().len() < words.len(), "seed {seed}: nothing was dropped");
        }
    }

    #[test]
    fn partition_splits_front_half_left() {
        let mut rng = StdRng::seed_from_u64(2);
        let words = bank(&["VAULT", "STEAM", "PIPES"]);
        let grid = TerminalGrid::generate(&words, "VAULT", GRID_COLS, GRID_ROWS, &mut rng);
        for p in grid.targets() {
            let expect = if p.word == "PIPES" { Column::Right } else { Column::Left };
            assert_eq!(p.column, expect, "{} landed in the wrong column", p.word);
        }
    }

    #[test]
    fn segments_reconstruct_the_row() {
        let mut rng = StdRng::seed_from_u64(9);
        let grid = TerminalGrid::generate(&twelve(), "VAULT", GRID_COLS, GRID_ROWS, &mut rng);
        for row in grid.left.iter().chain(&grid.right) {
            let segs = segments(row);
            let rebuilt: String = segs.iter().map(|(text, _)| text.as_str()).collect();
            assert_eq!(rebuilt, strip(row));
            for (text, is_word) in &segs {
                if *is_word {
                    assert!(grid.targets().iter().any(|p| &p.word == text));
                }
            }
        }
    }
}

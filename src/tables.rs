//! Fixed Scrabble letter tables (spec §6). Kept as plain arrays rather than
//! a generated lookup since 26-27 linear comparisons never shows up in a
//! profile.

pub const LETTER_SCORES: [(char, u32); 26] = [
    ('a', 1),
    ('b', 3),
    ('c', 3),
    ('d', 2),
    ('e', 1),
    ('f', 4),
    ('g', 2),
    ('h', 4),
    ('i', 1),
    ('j', 8),
    ('k', 5),
    ('l', 1),
    ('m', 3),
    ('n', 1),
    ('o', 1),
    ('p', 3),
    ('q', 10),
    ('r', 1),
    ('s', 1),
    ('t', 1),
    ('u', 1),
    ('v', 4),
    ('w', 4),
    ('x', 8),
    ('y', 4),
    ('z', 10),
];

// `e` at frequency 1 matches the inherited source table exactly; it is
// almost certainly a transcription bug (standard Scrabble ships ~12 Es) but
// spec.md calls out that the table here is specified as-is.
pub const LETTER_FREQUENCIES: [(char, u32); 27] = [
    ('a', 9),
    ('b', 2),
    ('c', 2),
    ('d', 4),
    ('e', 1),
    ('f', 2),
    ('g', 3),
    ('h', 2),
    ('i', 9),
    ('j', 1),
    ('k', 1),
    ('l', 4),
    ('m', 2),
    ('n', 6),
    ('o', 8),
    ('p', 2),
    ('q', 1),
    ('r', 6),
    ('s', 4),
    ('t', 6),
    ('u', 4),
    ('v', 2),
    ('w', 2),
    ('x', 1),
    ('y', 2),
    ('z', 1),
    ('_', 2),
];

pub fn letter_score(letter: char) -> u32 {
    LETTER_SCORES
        .iter()
        .find(|&&(l, _)| l == letter)
        .map(|&(_, score)| score)
        .unwrap_or(0)
}

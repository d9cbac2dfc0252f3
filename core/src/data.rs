use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use serde_json::{Map, Value};
use std::io::{self, BufRead};
use std::{fs::File, path::Path};
use thiserror::Error;

use crate::structs::Dictionary;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read dictionary: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse dictionary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Relative frequency of each letter in English text, `a` to `z`.
pub const LETTER_FREQUENCIES: [(char, f64); 26] = [
    ('a', 0.0817),
    ('b', 0.0149),
    ('c', 0.0278),
    ('d', 0.0425),
    ('e', 0.127),
    ('f', 0.0223),
    ('g', 0.0202),
    ('h', 0.0609),
    ('i', 0.0697),
    ('j', 0.0015),
    ('k', 0.0077),
    ('l', 0.0403),
    ('m', 0.0241),
    ('n', 0.0675),
    ('o', 0.0751),
    ('p', 0.0193),
    ('q', 0.0010),
    ('r', 0.0599),
    ('s', 0.0633),
    ('t', 0.0906),
    ('u', 0.0276),
    ('v', 0.0098),
    ('w', 0.0236),
    ('x', 0.0015),
    ('y', 0.0197),
    ('z', 0.0007),
];

/// Plain word list, one word per line.
pub fn load_words<P>(filename: P) -> Result<Dictionary, DataError>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    let words = io::BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<_>>>()?;

    let dictionary = Dictionary::new(words);
    log::debug!("Loaded {} words", dictionary.len());
    Ok(dictionary)
}

pub fn parse_words<'a, I>(lines: I) -> Dictionary
where
    I: Iterator<Item = &'a str>,
{
    Dictionary::new(lines)
}

/// A JSON array of objects keyed by word, e.g. `[{"aa": 1, "ab": 1}, {"ba": 1}]`.
/// The values are ignored.
pub fn load_json<P>(filename: P) -> Result<Dictionary, DataError>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    let groups: Vec<Map<String, Value>> = serde_json::from_reader(io::BufReader::new(file))?;

    let dictionary = Dictionary::new(groups.iter().flat_map(Map::keys));
    log::debug!("Loaded {} words", dictionary.len());
    Ok(dictionary)
}

pub fn parse_json(source: &str) -> Result<Dictionary, DataError> {
    let groups: Vec<Map<String, Value>> = serde_json::from_str(source)?;
    Ok(Dictionary::new(groups.iter().flat_map(Map::keys)))
}

/// Draws `4 * side_size` letters independently, weighted by English letter
/// frequency. Letters may repeat.
pub fn sample_letters<R: Rng>(side_size: usize, rng: &mut R) -> Vec<char> {
    let weights = LETTER_FREQUENCIES.iter().map(|&(_, weight)| weight);
    let distribution = match WeightedIndex::new(weights) {
        Ok(distribution) => distribution,
        Err(_) => unreachable!("letter frequencies are positive"),
    };

    (0..side_size * 4)
        .map(|_| LETTER_FREQUENCIES[distribution.sample(rng)].0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Board;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn parses_word_lines() {
        let dictionary = parse_words("teen\nTea\n\n  ten  \nt-shirt\ncafé\nteen".lines());
        assert_eq!(dictionary.len(), 3);
        assert_eq!(dictionary.words_starting_with('t'), &["tea", "teen", "ten"]);
    }

    #[test]
    fn parses_json_groups() {
        let source = r#"[
            {"aardvark": 1, "Abacus": {"pos": "noun"}, "a-frame": 1},
            {"baker": null, "b2b": 1},
            {}
        ]"#;
        let dictionary = parse_json(source).unwrap();
        assert_eq!(dictionary.len(), 3);
        assert_eq!(dictionary.words_starting_with('a'), &["aardvark", "abacus"]);
        assert!(dictionary.contains("baker"));
        assert!(!dictionary.contains("b2b"));
    }

    #[rstest]
    #[case("{\"teen\": 1}")]
    #[case("[\"teen\"]")]
    #[case("[{\"teen\": 1}")]
    fn rejects_malformed_json(#[case] source: &str) {
        assert!(matches!(parse_json(source), Err(DataError::Json(_))));
    }

    #[test]
    fn loads_files() {
        let dir = std::env::temp_dir();
        let txt = dir.join(format!("letter-boxed-words-{}.txt", std::process::id()));
        let json = dir.join(format!("letter-boxed-words-{}.json", std::process::id()));
        File::create(&txt)
            .unwrap()
            .write_all(b"teen\ntea\n")
            .unwrap();
        File::create(&json)
            .unwrap()
            .write_all(br#"[{"teen": 1}, {"hen": 1}]"#)
            .unwrap();

        let from_txt = load_words(&txt).unwrap();
        let from_json = load_json(&json).unwrap();
        std::fs::remove_file(&txt).unwrap();
        std::fs::remove_file(&json).unwrap();

        assert_eq!(from_txt.len(), 2);
        assert!(from_json.contains("hen"));
        assert!(matches!(load_words(&txt), Err(DataError::Io(_))));
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    fn samples_full_boards(#[case] side_size: usize) {
        let mut rng = StdRng::seed_from_u64(69420);
        let letters = sample_letters(side_size, &mut rng);
        assert_eq!(letters.len(), side_size * 4);
        assert!(letters.iter().all(char::is_ascii_lowercase));
        let board = Board::new(letters).unwrap();
        assert_eq!(board.side_size(), side_size);
    }

    #[test]
    fn sampling_follows_frequencies() {
        let mut rng = StdRng::seed_from_u64(7);
        let letters = sample_letters(2_500, &mut rng);
        let count = |c| letters.iter().filter(|&&l| l == c).count();
        assert!(count('e') > count('z'));
        assert!(count('t') > count('q'));
    }
}

//! Loads the dictionary of legal words from a plain-text file: one
//! candidate per line, only lines matching `^[a-z]+$` after trimming are
//! accepted, duplicates collapse.

use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]+$").unwrap())
}

pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    pub fn from_words<I: IntoIterator<Item = String>>(words: I) -> Self {
        WordList {
            words: words.into_iter().collect(),
        }
    }

    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut words = HashSet::new();
        for line in content.lines() {
            let candidate = line.trim();
            if word_re().is_match(candidate) {
                words.insert(candidate.to_string());
            }
        }
        Ok(WordList { words })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.words.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_only_lowercase_alpha_lines() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("scrabble-wordlist-test-{}.txt", std::process::id()));
        tokio::fs::write(&path, "cat\nDog\n123\nmixed1\n  pear  \napple\ncat\n")
            .await
            .unwrap();

        let words = WordList::load(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(words.len(), 3);
        assert!(words.contains("cat"));
        assert!(words.contains("pear"));
        assert!(words.contains("apple"));
        assert!(!words.contains("Dog"));
        assert!(!words.contains("123"));
        assert!(!words.contains("mixed1"));
    }
}

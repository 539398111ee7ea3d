use crate::error::IngestError;
use crate::models::{Document, Metadata, CHUNK_INDEX_KEY};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Paragraphs, lines, sentences, phrases, words, characters.
pub const DEFAULT_SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", ", ", " ", ""];

/// Settings for [`RecursiveTextSplitter`]. Sizes are measured in characters.
///
/// With `keep_separator` set, a separator stays in the text as the prefix of
/// the part that follows it, so concatenating the chunks (minus their overlap)
/// gives back the input. Without it the separator is only re-inserted between
/// parts that end up in the same chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
    pub keep_separator: bool,
    pub is_separator_regex: bool,
    pub add_chunk_index: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            keep_separator: true,
            is_separator_regex: false,
            add_chunk_index: false,
        }
    }
}

impl SplitterConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keep_separator(mut self, keep_separator: bool) -> Self {
        self.keep_separator = keep_separator;
        self
    }

    pub fn with_separator_regex(mut self, is_separator_regex: bool) -> Self {
        self.is_separator_regex = is_separator_regex;
        self
    }

    /// Adds a `chunk_index` key (position within the source text) to each chunk.
    pub fn with_chunk_index(mut self, add_chunk_index: bool) -> Self {
        self.add_chunk_index = add_chunk_index;
        self
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Separator {
    /// The empty separator: every character is its own part.
    Characters,
    Pattern(Regex),
}

impl Separator {
    fn compile(raw: &str, is_regex: bool) -> Result<Self, IngestError> {
        if raw.is_empty() {
            return Ok(Self::Characters);
        }

        let pattern = if is_regex {
            Regex::new(raw)?
        } else {
            Regex::new(&regex::escape(raw))?
        };
        Ok(Self::Pattern(pattern))
    }
}

/// A piece of text still waiting to be split, plus the separators it may use.
#[derive(Debug, Clone, Copy)]
struct Span<'a> {
    joiner: &'a str,
    text: &'a str,
    next_separator: usize,
}

/// A piece no longer than `chunk_size`. `joiner` is the dropped separator that
/// preceded it (always empty when separators are kept).
#[derive(Debug, Clone, Copy)]
struct Leaf<'a> {
    joiner: &'a str,
    text: &'a str,
    len: usize,
}

/// A merged chunk; its first `overlap` characters repeat the previous chunk's tail.
#[derive(Debug, Clone, PartialEq)]
struct Chunk {
    text: String,
    overlap: usize,
}

/// Splits text into overlapping chunks, trying coarse separators before fine ones.
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    config: SplitterConfig,
    separators: Vec<Separator>,
}

impl RecursiveTextSplitter {
    pub fn new(config: SplitterConfig) -> Result<Self, IngestError> {
        config.validate()?;
        let separators = config
            .separators
            .iter()
            .map(|raw| Separator::compile(raw, config.is_separator_regex))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { config, separators })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Chunk texts only. Each is at most `chunk_size` characters long.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.chunk(text).into_iter().map(|chunk| chunk.text).collect()
    }

    /// Splits `text` into documents that each own a copy of `metadata`.
    pub fn split(&self, text: &str, metadata: &Metadata) -> Vec<Document> {
        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let mut chunk_metadata = metadata.clone();
                if self.config.add_chunk_index {
                    chunk_metadata.insert(CHUNK_INDEX_KEY.to_string(), Value::from(index));
                }
                Document::new(content, chunk_metadata)
            })
            .collect()
    }

    /// Splits every document on its own; chunks never cross document boundaries.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|document| self.split(&document.content, &document.metadata))
            .collect()
    }

    fn chunk(&self, text: &str) -> Vec<Chunk> {
        self.merge(&self.leaves(text))
    }

    /// Breaks `text` into leaves, left to right, using a work-list instead of recursion.
    fn leaves<'a>(&self, text: &'a str) -> Vec<Leaf<'a>> {
        let chunk_size = self.config.chunk_size;
        let mut leaves = Vec::new();
        let mut pending = vec![Span {
            joiner: "",
            text,
            next_separator: 0,
        }];

        while let Some(span) = pending.pop() {
            if span.text.is_empty() {
                continue;
            }

            let len = span.text.chars().count();
            if len <= chunk_size {
                leaves.push(Leaf {
                    joiner: span.joiner,
                    text: span.text,
                    len,
                });
                continue;
            }

            match self.split_span(span) {
                // Reversed so the leftmost part is popped first.
                Some(parts) => pending.extend(parts.into_iter().rev()),
                None => slice_by_chars(span, chunk_size, &mut leaves),
            }
        }

        leaves
    }

    /// Splits at every match of the first separator that occurs in the span.
    /// `None` once the separator list is exhausted.
    fn split_span<'a>(&self, span: Span<'a>) -> Option<Vec<Span<'a>>> {
        for (index, separator) in self.separators.iter().enumerate().skip(span.next_separator) {
            let next_separator = index + 1;
            let pattern = match separator {
                Separator::Characters => {
                    let Span { joiner, text, .. } = span;
                    let parts = text
                        .char_indices()
                        .map(move |(offset, ch)| Span {
                            joiner: if offset == 0 { joiner } else { "" },
                            text: &text[offset..offset + ch.len_utf8()],
                            next_separator,
                        })
                        .collect();
                    return Some(parts);
                }
                Separator::Pattern(pattern) => pattern,
            };

            let matches = pattern
                .find_iter(span.text)
                .filter(|found| found.start() < found.end())
                .collect::<Vec<_>>();
            if matches.is_empty() {
                continue;
            }

            let mut parts = Vec::with_capacity(matches.len() + 1);
            let mut joiner = span.joiner;
            let mut start = 0;
            for found in matches {
                parts.push(Span {
                    joiner,
                    text: &span.text[start..found.start()],
                    next_separator,
                });
                if self.config.keep_separator {
                    joiner = "";
                    start = found.start();
                } else {
                    joiner = found.as_str();
                    start = found.end();
                }
            }
            parts.push(Span {
                joiner,
                text: &span.text[start..],
                next_separator,
            });

            return Some(parts);
        }

        None
    }

    /// Greedily packs leaves into chunks of at most `chunk_size` characters,
    /// seeding each new chunk with the tail of the previous one.
    fn merge(&self, leaves: &[Leaf<'_>]) -> Vec<Chunk> {
        let chunk_size = self.config.chunk_size;
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;
        let mut current_overlap = 0usize;

        for leaf in leaves {
            let joiner_len = leaf.joiner.chars().count();

            if current_len > 0 && current_len + joiner_len + leaf.len > chunk_size {
                let room = chunk_size.saturating_sub(joiner_len + leaf.len);
                let overlap = self.config.chunk_overlap.min(current_len).min(room);
                let seed = tail_chars(&current, overlap).to_string();

                chunks.push(Chunk {
                    text: std::mem::replace(&mut current, seed),
                    overlap: current_overlap,
                });
                current_len = overlap;
                current_overlap = overlap;
            }

            if current_len > 0 {
                current.push_str(leaf.joiner);
                current_len += joiner_len;
            }
            current.push_str(leaf.text);
            current_len += leaf.len;
        }

        if current_len > 0 {
            chunks.push(Chunk {
                text: current,
                overlap: current_overlap,
            });
        }

        chunks
    }
}

/// Last resort when no separator matches: cut at exact `chunk_size` boundaries.
fn slice_by_chars<'a>(span: Span<'a>, chunk_size: usize, leaves: &mut Vec<Leaf<'a>>) {
    let mut joiner = span.joiner;
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in span.text.char_indices() {
        if count == chunk_size {
            leaves.push(Leaf {
                joiner,
                text: &span.text[start..offset],
                len: count,
            });
            joiner = "";
            start = offset;
            count = 0;
        }
        count += 1;
    }

    if count > 0 {
        leaves.push(Leaf {
            joiner,
            text: &span.text[start..],
            len: count,
        });
    }
}

fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }

    match text.char_indices().rev().nth(count - 1) {
        Some((offset, _)) => &text[offset..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn splitter(config: SplitterConfig) -> RecursiveTextSplitter {
        RecursiveTextSplitter::new(config).expect("valid splitter config")
    }

    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut text = String::new();
        for chunk in chunks {
            let offset = chunk
                .text
                .char_indices()
                .nth(chunk.overlap)
                .map(|(offset, _)| offset)
                .unwrap_or(chunk.text.len());
            text.push_str(&chunk.text[offset..]);
        }
        text
    }

    #[test]
    fn paragraphs_then_words_with_character_overlap() {
        let splitter = splitter(
            SplitterConfig::new(20, 5).with_separators(["\n\n", " ", ""]),
        );

        let chunks = splitter.split_text("Para one.\n\nPara two is a bit longer than ten chars.");

        assert_eq!(
            chunks,
            vec![
                "Para one.\n\nPara two",
                "a two is a bit",
                "a bit longer than",
                " than ten chars.",
            ]
        );
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 20));
        assert!(chunks[1].starts_with(tail_chars(&chunks[0], 5)));
    }

    #[test]
    fn separator_priority_prefers_paragraphs() {
        let splitter = splitter(SplitterConfig::new(8, 0));

        let text = "aa aa\n\nbb bb\n\ncc cc";
        let chunks = splitter.split_text(text);

        assert_eq!(chunks, vec!["aa aa", "\n\nbb bb", "\n\ncc cc"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn character_fallback_applies_overlap_windows() {
        let splitter = splitter(SplitterConfig::new(4, 1));

        let chunks = splitter.split_text("abcdefghij");

        assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn exhausted_separators_slice_at_chunk_size() {
        let splitter = splitter(SplitterConfig::new(4, 0).with_separators(["\n"]));

        let chunks = splitter.split_text("abcdefghij");

        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn no_separators_at_all_still_terminates() {
        let splitter = splitter(SplitterConfig::new(3, 1).with_separators(Vec::<String>::new()));

        let chunks = splitter.split_text("abcdefg");

        assert_eq!(chunks, vec!["abc", "def", "fg"]);
    }

    #[test]
    fn multibyte_characters_are_never_cut() {
        let splitter = splitter(SplitterConfig::new(3, 0));

        let text = "a🙂b🙂c🙂";
        let chunks = splitter.split_text(text);

        assert_eq!(chunks, vec!["a🙂b", "🙂c🙂"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn dropped_separators_rejoin_inside_a_chunk() {
        let splitter = splitter(
            SplitterConfig::new(7, 0)
                .with_separators(["|"])
                .with_keep_separator(false),
        );

        let chunks = splitter.split_text("one|two|three");

        assert_eq!(chunks, vec!["one|two", "three"]);
    }

    #[test]
    fn regex_separators_keep_the_matched_text() {
        let splitter = splitter(
            SplitterConfig::new(10, 0)
                .with_separators([r"\d+\. "])
                .with_separator_regex(true),
        );

        let chunks = splitter.split_text("1. alpha 2. beta 3. gamma");

        assert_eq!(chunks, vec!["1. alpha ", "2. beta ", "3. gamma"]);
    }

    #[test]
    fn literal_separators_are_not_patterns() {
        let splitter = splitter(SplitterConfig::new(4, 0).with_separators([".", ""]));

        let chunks = splitter.split_text("ab.cd.ef");

        assert_eq!(chunks, vec!["ab", ".cd", ".ef"]);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = splitter(SplitterConfig::default());

        assert_eq!(splitter.split_text("tiny"), vec!["tiny"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let splitter = splitter(SplitterConfig::new(10, 2));

        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split("", &Metadata::new()).is_empty());
    }

    #[test]
    fn chunks_reconstruct_the_input_and_overlap_consecutively() {
        let texts = [
            "The quick brown fox jumps over the lazy dog.\n\nIt was not amused, \
             and it said so, loudly.\nThen it slept.",
            "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu",
            "no-separators-in-this-long-token-at-all-just-dashes-and-letters",
            "Zeile eins. Zeile zwei, mit Komma.\nÜberlänge: äöüßäöüßäöüßäöüß",
        ];
        let configs = [(10, 0), (10, 3), (16, 8), (25, 5), (7, 6)];

        for text in texts {
            for (size, overlap) in configs {
                let splitter = splitter(SplitterConfig::new(size, overlap));
                let chunks = splitter.chunk(text);

                assert_eq!(reconstruct(&chunks), text, "size={size} overlap={overlap}");
                for chunk in &chunks {
                    assert!(chunk.text.chars().count() <= size);
                    assert!(chunk.overlap <= overlap);
                }
                for pair in chunks.windows(2) {
                    let shared = pair[1].overlap;
                    let head: String = pair[1].text.chars().take(shared).collect();
                    assert_eq!(tail_chars(&pair[0].text, shared), head);
                }
            }
        }
    }

    #[test]
    fn each_chunk_owns_its_metadata() {
        let splitter = splitter(SplitterConfig::new(5, 0));
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), json!("unit-test.txt"));

        let mut chunks = splitter.split("one two three", &metadata);
        assert!(chunks.len() > 1);

        chunks[0]
            .metadata
            .insert("source".to_string(), json!("mutated"));

        assert_eq!(chunks[1].metadata.get("source"), Some(&json!("unit-test.txt")));
        assert_eq!(metadata.get("source"), Some(&json!("unit-test.txt")));
        assert!(chunks.iter().skip(1).all(|chunk| chunk.metadata == metadata));
    }

    #[test]
    fn chunk_index_is_added_only_on_request() {
        let plain = splitter(SplitterConfig::new(5, 0));
        let indexed = splitter(SplitterConfig::new(5, 0).with_chunk_index(true));

        let without = plain.split("one two three", &Metadata::new());
        let with = indexed.split("one two three", &Metadata::new());

        assert!(without.iter().all(|chunk| chunk.metadata.is_empty()));
        for (index, chunk) in with.iter().enumerate() {
            assert_eq!(chunk.metadata.get(CHUNK_INDEX_KEY), Some(&json!(index)));
        }
    }

    #[test]
    fn split_documents_never_merges_across_sources() {
        let splitter = splitter(SplitterConfig::new(12, 4));
        let mut first_meta = Metadata::new();
        first_meta.insert("source".to_string(), json!("a.txt"));
        let mut second_meta = Metadata::new();
        second_meta.insert("source".to_string(), json!("b.txt"));

        let documents = vec![
            Document::new("ab", first_meta),
            Document::new("cd ef gh ij kl", second_meta),
        ];
        let chunks = splitter.split_documents(&documents);

        assert_eq!(chunks[0].content, "ab");
        assert_eq!(chunks[0].source(), Some("a.txt"));
        assert!(chunks[1..].iter().all(|chunk| chunk.source() == Some("b.txt")));
        assert!(!chunks[1].content.contains("ab"));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let error = RecursiveTextSplitter::new(SplitterConfig::new(0, 0)).unwrap_err();

        assert!(matches!(error, IngestError::InvalidConfig(_)));
    }

    #[test]
    fn overlap_not_smaller_than_size_is_rejected() {
        let equal = RecursiveTextSplitter::new(SplitterConfig::new(10, 10)).unwrap_err();
        let larger = RecursiveTextSplitter::new(SplitterConfig::new(10, 11)).unwrap_err();

        assert!(equal.is_config_error());
        assert!(larger.is_config_error());
    }

    #[test]
    fn invalid_regex_separator_is_rejected() {
        let config = SplitterConfig::new(10, 0)
            .with_separators(["("])
            .with_separator_regex(true);

        let error = RecursiveTextSplitter::new(config).unwrap_err();

        assert!(matches!(error, IngestError::RegexError(_)));
        assert!(error.is_config_error());
    }
}

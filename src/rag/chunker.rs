//! Deterministic text chunking.
//!
//! Splits a document into chunks by greedily packing paragraphs up to the
//! chunk size, falling back to sentence-level packing for paragraphs that
//! are larger than a whole chunk. All lengths and offsets are counted in
//! characters, not bytes, so multibyte text chunks the same as ASCII.

use crate::types::TextChunk;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default overlap in characters. Reserved for a sliding-window strategy;
/// the current packer does not produce overlapping chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

pub struct TextChunker {
    chunk_size: usize,
    #[allow(dead_code)]
    chunk_overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `text` into chunks for `document_id`.
    ///
    /// Chunk ids are `{document_id}-chunk-{n}` with `n` counting from 0 in
    /// document order. Offsets index into the normalized text and are
    /// approximate: paragraph trimming is not accounted for, and every
    /// sentence chunk inherits its paragraph's start offset.
    pub fn chunk(&self, text: &str, document_id: &str) -> Vec<TextChunk> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut chunks: Vec<TextChunk> = Vec::new();
        let mut current = String::new();
        let mut current_start = 0usize;
        let mut text_index = 0usize;

        for paragraph in normalized.split("\n\n") {
            let trimmed = paragraph.trim();
            let trimmed_len = char_len(trimmed);

            // The +2 accounts for the paragraph separator, and is applied
            // even when the chunk is still empty.
            if char_len(&current) + trimmed_len + 2 <= self.chunk_size {
                if current.is_empty() {
                    current.push_str(trimmed);
                    current_start = text_index;
                } else {
                    current.push_str("\n\n");
                    current.push_str(trimmed);
                }
            } else {
                if !current.is_empty() {
                    push_chunk(&mut chunks, document_id, &current, current_start);
                }

                if trimmed_len > self.chunk_size {
                    // Oversize paragraph: pack sentence by sentence. Every
                    // chunk emitted here keeps the paragraph's start offset.
                    current.clear();
                    current_start = text_index;

                    for sentence in split_sentences(trimmed) {
                        let sentence_len = char_len(&sentence);
                        if char_len(&current) + sentence_len + 1 <= self.chunk_size {
                            if current.is_empty() {
                                current = sentence;
                            } else {
                                current.push(' ');
                                current.push_str(&sentence);
                            }
                        } else {
                            if !current.is_empty() {
                                push_chunk(&mut chunks, document_id, &current, current_start);
                            }
                            current = sentence;
                            current_start = text_index;
                        }
                    }
                    // Leftover sentences stay in `current` and may be packed
                    // together with the next paragraph.
                } else {
                    current = trimmed.to_string();
                    current_start = text_index;
                }
            }

            // Advance by the untrimmed paragraph plus its separator.
            text_index += char_len(paragraph) + 2;
        }

        if !current.is_empty() {
            push_chunk(&mut chunks, document_id, &current, current_start);
        }

        chunks
    }
}

fn push_chunk(chunks: &mut Vec<TextChunk>, document_id: &str, content: &str, start: usize) {
    chunks.push(TextChunk {
        id: format!("{}-chunk-{}", document_id, chunks.len()),
        document_id: document_id.to_string(),
        content: content.to_string(),
        start_index: start,
        end_index: start + char_len(content),
    });
}

/// Normalize line endings to `\n`, collapse runs of three or more newlines
/// down to a blank line, and trim surrounding whitespace.
fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut newline_run = 0usize;
    for c in unified.chars() {
        if c == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(c);
            }
        } else {
            newline_run = 0;
            out.push(c);
        }
    }

    out.trim().to_string()
}

/// Split a paragraph at whitespace that follows `.`, `!` or `?`.
///
/// The terminator stays with its sentence and the whitespace run between
/// sentences is consumed.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if matches!(c, '.' | '!' | '?')
            && chars.get(i + 1).is_some_and(|next| next.is_whitespace())
        {
            sentences.push(chars[start..=i].iter().collect());
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }

    if start < chars.len() {
        sentences.push(chars[start..].iter().collect());
    }

    sentences
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunker = TextChunker::default();
        assert!(chunker.chunk("", "d1").is_empty());
        assert!(chunker.chunk("   \n\n  \n", "d1").is_empty());
    }

    #[test]
    fn test_short_paragraphs_pack_into_one_chunk() {
        let chunker = TextChunker::default();
        let chunks = chunker.chunk("Para one.\n\nPara two.", "d1");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Para one.\n\nPara two.");
        assert_eq!(chunks[0].id, "d1-chunk-0");
        assert_eq!(chunks[0].start_index, 0);
        assert_eq!(chunks[0].end_index, chunks[0].content.chars().count());
    }

    #[test]
    fn test_chunk_ids_are_sequential() {
        let chunker = TextChunker::new(20, 0);
        let chunks = chunker.chunk("First paragraph here.\n\nSecond paragraph here.", "doc");

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("doc-chunk-{}", i));
            assert_eq!(chunk.document_id, "doc");
        }
    }

    #[test]
    fn test_paragraph_boundary_starts_new_chunk() {
        // Two paragraphs that cannot share a chunk under size 30.
        let text = "Alpha beta gamma delta epsilon.\n\nZeta eta theta iota kappa.";
        let chunker = TextChunker::new(30, 0);
        let chunks = chunker.chunk(text, "d1");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "Alpha beta gamma delta epsilon.");
        assert_eq!(chunks[1].content, "Zeta eta theta iota kappa.");
        // Second chunk starts after the first paragraph and its separator.
        assert_eq!(chunks[1].start_index, 33);
    }

    #[test]
    fn test_oversize_paragraph_splits_on_sentences() {
        let text = "One sentence here. Two sentence here. Three sentence here.";
        let chunker = TextChunker::new(40, 0);
        let chunks = chunker.chunk(text, "d1");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "One sentence here. Two sentence here.");
        assert_eq!(chunks[1].content, "Three sentence here.");
        // Sentence chunks inherit the paragraph's start offset.
        assert_eq!(chunks[0].start_index, 0);
        assert_eq!(chunks[1].start_index, 0);
    }

    #[test]
    fn test_leftover_sentences_pack_with_next_paragraph() {
        // The oversize paragraph leaves "Tail." in the working chunk, and
        // the following short paragraph joins it instead of starting fresh.
        let text = "One sentence here. Two sentence here. Tail.\n\nNext para.";
        let chunker = TextChunker::new(40, 0);
        let chunks = chunker.chunk(text, "d1");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "One sentence here. Two sentence here.");
        assert_eq!(chunks[1].content, "Tail.\n\nNext para.");
    }

    #[test]
    fn test_crlf_and_blank_line_normalization() {
        let chunker = TextChunker::default();
        let chunks = chunker.chunk("Para one.\r\n\r\n\r\n\r\nPara two.\r", "d1");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Para one.\n\nPara two.");
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        // Each Hangul syllable is 3 bytes but 1 character.
        let text = "한글 문서.\n\n두번째 문단.";
        let chunker = TextChunker::new(8, 0);
        let chunks = chunker.chunk(text, "d1");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].end_index, 6);
        assert_eq!(chunks[1].start_index, 8);
    }

    #[test]
    fn test_determinism() {
        let text = "First paragraph with words. More sentences here!\n\nSecond paragraph.";
        let chunker = TextChunker::default();
        assert_eq!(chunker.chunk(text, "d1"), chunker.chunk(text, "d1"));
    }

    #[rstest]
    #[case("One. Two. Three.", vec!["One.", "Two.", "Three."])]
    #[case("No terminator at all", vec!["No terminator at all"])]
    #[case("Wait!! Really? Yes.", vec!["Wait!!", "Really?", "Yes."])]
    #[case("Spaced.   Out.", vec!["Spaced.", "Out."])]
    #[case("v1.2 is out. Next.", vec!["v1.2 is out.", "Next."])]
    fn test_split_sentences(#[case] input: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_sentences(input), expected);
    }
}

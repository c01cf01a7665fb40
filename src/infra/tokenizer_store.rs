// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Builds, saves, and loads the word-level tokenizer the burn
// engine uses to turn a query into bag-of-words features.
//
// The tokenizer JSON is written by hand in HuggingFace format
// and parsed back with Tokenizer::from_str. This sidesteps the
// trainer/ModelWrapper type mismatch in tokenizers 0.15.
//
// Vocabulary layout (ids are contiguous so they double as
// feature indices):
//   0     [PAD]
//   1     [UNK]   ← any word never seen during training
//   2..   corpus words, most frequent first, ties alphabetical
//
// Corpus words are counted after the tokenizer's own normalizer
// and pre-tokenizer, so every stored word is in the form encode()
// looks up ("Café" is counted as "cafe").
//
// Reference: tokenizers crate documentation (WordLevel model)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use tokenizers::{
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer,
    Tokenizer,
};

pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

const FILE_NAME: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(FILE_NAME)
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow::anyhow!("Cannot write tokenizer to '{}': {}", path.display(), e))
    }
}

/// Words of `text` in exactly the form `tokenizer` looks them up:
/// its own normalizer (lower-casing, accent stripping) and
/// pre-tokenizer are applied.
pub fn pre_tokenize(tokenizer: &Tokenizer, text: &str) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    if let Some(normalizer) = tokenizer.get_normalizer() {
        normalizer
            .normalize(&mut normalized)
            .map_err(|e| anyhow::anyhow!("Normalisation error: {e}"))?;
    }

    let mut pieces = PreTokenizedString::from(normalized);
    if let Some(pre_tokenizer) = tokenizer.get_pre_tokenizer() {
        pre_tokenizer
            .pre_tokenize(&mut pieces)
            .map_err(|e| anyhow::anyhow!("Pre-tokenisation error: {e}"))?;
    }

    Ok(pieces
        .get_splits(OffsetReferential::Normalized, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word.to_string())
        .collect())
}

/// Build a word-level tokenizer from `texts`, keeping at most
/// `max_words` corpus words.
pub fn build_word_level<'a, I>(texts: I, max_words: usize) -> Result<Tokenizer>
where
    I: IntoIterator<Item = &'a str>,
{
    // ── Step 1: Specials-only tokenizer, used for its text pipeline ─────────
    let base = from_vocab(special_vocab())?;

    // ── Step 2: Word frequencies in lookup form ──────────────────────────────
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in pre_tokenize(&base, text)? {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(String, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.truncate(max_words);

    // ── Step 3: Vocab JSON with special tokens first ─────────────────────────
    let mut vocab   = special_vocab();
    let mut next_id = UNK_ID + 1;
    for (word, _) in &words {
        vocab[word.as_str()] = serde_json::json!(next_id);
        next_id += 1;
    }

    tracing::debug!("Tokenizer built with {} entries", next_id);
    from_vocab(vocab)
}

fn special_vocab() -> serde_json::Value {
    serde_json::json!({
        "[PAD]": PAD_ID,
        "[UNK]": UNK_ID,
    })
}

/// Full tokenizer in HuggingFace format around `vocab`.
fn from_vocab(vocab: serde_json::Value) -> Result<Tokenizer> {
    let tokenizer_json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": PAD_ID, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": UNK_ID, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": {
            "type": "BertNormalizer",
            "clean_text": true,
            "handle_chinese_chars": true,
            "strip_accents": null,
            "lowercase": true
        },
        "pre_tokenizer": {
            "type": "Whitespace"
        },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    });

    Tokenizer::from_str(&tokenizer_json.to_string())
        .map_err(|e| anyhow::anyhow!("Cannot build tokenizer: {e}"))
}

//! Configuration file representation

use crate::arch::z80::RepeatCeilings;
use crate::codemap::CodeMapFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::{fs, io};

/// Characters treated as text when no other set is configured.
pub const DEFAULT_TEXT_CHARS: &str = concat!(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijklmnopqrstuvwxyz",
    "0123456789",
    " !\"$%&'()*+,-./:;<=>?"
);

/// Parse an opcode class written in hexadecimal, with or without a `$` or
/// `0x` prefix.
pub fn parse_class(key: &str) -> Option<u32> {
    let key = key.trim();
    let digits = key
        .strip_prefix("0x")
        .or_else(|| key.strip_prefix('$'))
        .unwrap_or(key);

    u32::from_str_radix(digits, 16).ok()
}

/// In-memory representation of the classification settings.
///
/// Typically read from a JSON file. Every setting is optional; missing ones
/// take their defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// Every byte counted as a text character.
    text_chars: String,

    /// Shortest run of text recognised inside data.
    text_min_length_data: usize,

    /// Shortest run of text recognised inside code.
    text_min_length_code: usize,

    /// If present, a run of text must contain one of these words.
    dictionary: Option<Vec<String>>,

    /// Per opcode class overrides of the built-in repeat ceilings. Keys are
    /// hexadecimal classes.
    repeat_ceilings: BTreeMap<String, i32>,

    /// Code map format to use instead of detecting one.
    code_map_format: Option<CodeMapFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            text_chars: DEFAULT_TEXT_CHARS.to_string(),
            text_min_length_data: 3,
            text_min_length_code: 12,
            dictionary: None,
            repeat_ceilings: BTreeMap::new(),
            code_map_format: None,
        }
    }
}

impl Config {
    pub fn read(filename: &Path) -> io::Result<Self> {
        let config_file = fs::File::open(filename)?;
        let config: Self = serde_json::from_reader(config_file)?;

        config.validated()
    }

    pub fn from_json(text: &str) -> io::Result<Self> {
        let config: Self = serde_json::from_str(text)?;

        config.validated()
    }

    fn validated(mut self) -> io::Result<Self> {
        for key in self.repeat_ceilings.keys() {
            if parse_class(key).is_none() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid opcode class {} in RepeatCeilings", key),
                ));
            }
        }

        if let Some(words) = self.dictionary.take() {
            self = self.with_dictionary(words);
        }

        Ok(self)
    }

    pub fn is_text_byte(&self, byte: u8) -> bool {
        byte.is_ascii() && self.text_chars.contains(byte as char)
    }

    pub fn text_min_length_data(&self) -> usize {
        self.text_min_length_data
    }

    pub fn text_min_length_code(&self) -> usize {
        self.text_min_length_code
    }

    /// The configured dictionary, already lower-cased.
    pub fn dictionary(&self) -> Option<&[String]> {
        self.dictionary.as_deref()
    }

    /// The built-in repeat ceilings, with any configured overrides applied.
    pub fn repeat_ceilings(&self) -> RepeatCeilings {
        RepeatCeilings::default().with_overrides(
            self.repeat_ceilings
                .iter()
                .filter_map(|(key, ceiling)| parse_class(key).map(|class| (class, *ceiling))),
        )
    }

    pub fn code_map_format(&self) -> Option<CodeMapFormat> {
        self.code_map_format
    }

    pub fn with_text_chars(mut self, chars: &str) -> Self {
        self.text_chars = chars.to_string();
        self
    }

    pub fn with_text_min_length_data(mut self, length: usize) -> Self {
        self.text_min_length_data = length;
        self
    }

    pub fn with_text_min_length_code(mut self, length: usize) -> Self {
        self.text_min_length_code = length;
        self
    }

    pub fn with_dictionary<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dictionary = Some(
            words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        );
        self
    }

    pub fn with_repeat_ceiling(mut self, class: u32, ceiling: i32) -> Self {
        self.repeat_ceilings.insert(format!("{:X}", class), ceiling);
        self
    }

    pub fn with_code_map_format(mut self, format: CodeMapFormat) -> Self {
        self.code_map_format = Some(format);
        self
    }
}

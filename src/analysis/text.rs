//! Scanning for text and zero fill

use crate::memory::Image;
use crate::project::Config;

/// Whether text is being sought inside data or inside code.
///
/// The two use separate minimum lengths.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextContext {
    Data,
    Code,
}

/// Find the runs of text within `[start, end)`.
///
/// A run is a maximal sequence of bytes in the configured text character set,
/// at least as long as the minimum length for `context`. If a dictionary is
/// configured, a run must also contain one of its words (case-insensitively).
///
/// Yields half-open `(start, end)` spans in ascending order.
pub fn find_text(
    image: &Image,
    config: &Config,
    start: u32,
    end: u32,
    context: TextContext,
) -> Vec<(u32, u32)> {
    let min_length = match context {
        TextContext::Data => config.text_min_length_data(),
        TextContext::Code => config.text_min_length_code(),
    };

    let mut spans = Vec::new();
    let mut run_start = None;

    for addr in start..end {
        if config.is_text_byte(image.read(addr)) {
            run_start.get_or_insert(addr);
        } else if let Some(run) = run_start.take() {
            push_if_text(image, config, &mut spans, run, addr, min_length);
        }
    }

    if let Some(run) = run_start {
        push_if_text(image, config, &mut spans, run, end, min_length);
    }

    spans
}

fn push_if_text(
    image: &Image,
    config: &Config,
    spans: &mut Vec<(u32, u32)>,
    start: u32,
    end: u32,
    min_length: usize,
) {
    if ((end - start) as usize) < min_length {
        return;
    }

    if let Some(words) = config.dictionary() {
        let text: String = image
            .slice(start, end)
            .iter()
            .map(|b| *b as char)
            .collect::<String>()
            .to_lowercase();

        if !words.iter().any(|word| text.contains(word.as_str())) {
            return;
        }
    }

    spans.push((start, end));
}

/// Determine if every byte in `[start, end)` is zero.
pub fn is_zero_fill(image: &Image, start: u32, end: u32) -> bool {
    image
        .slice(start, end)
        .iter()
        .map(|b| *b as u32)
        .sum::<u32>()
        == 0
}

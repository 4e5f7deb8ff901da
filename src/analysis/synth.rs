//! Choosing between traced and heuristic classification

use crate::analysis::{heuristic, traced, Tag, TagMap};
use crate::arch::Decoder;
use crate::codemap;
use crate::memory::Image;
use crate::project::Config;
use std::path::Path;

/// Classify `[start, end)` of an image into code and data.
///
/// If `code_map` names an execution trace, it seeds the classification;
/// otherwise static heuristics alone are used. Either way, the map returned
/// covers `[start, end]` and carries no unknown blocks.
pub fn synthesize<D>(
    image: &Image,
    decoder: &D,
    config: &Config,
    start: u32,
    end: u32,
    code_map: Option<&Path>,
) -> codemap::Result<TagMap>
where
    D: Decoder,
{
    if start >= end {
        log::warn!("Empty range ${:04X}-${:04X}, nothing to classify", start, end);

        let mut map = TagMap::new();
        map.insert(end, Tag::End);

        return Ok(map);
    }

    let map = match code_map {
        Some(path) => {
            log::info!(
                "Classifying ${:04X}-${:04X} using code map {}",
                start,
                end,
                path.display()
            );

            let addresses = codemap::read_addresses(path, start, end, config.code_map_format())?;
            let blocks = codemap::code_blocks(image, decoder, &addresses, end);

            traced::generate(image, decoder, config, start, end, &blocks)
        }
        None => {
            log::info!("Classifying ${:04X}-${:04X} heuristically", start, end);

            heuristic::generate(image, decoder, config, start, end)
        }
    };

    log::info!("Classified into {} blocks", map.len() - 1);

    Ok(map)
}

//! Concrete extraction and generation engines.
//!
//! - `split` - regex-filtered splitting extractor
//! - `command` - generator that shells out to an external CSS tool
//! - `scan` - source discovery for the initial scan and one-shot builds

mod command;
mod scan;
mod split;

pub use command::{CommandGenerator, parse_layers};
pub use scan::{Source, collect_sources, is_html, read_sources};
pub use split::{SplitExtractor, split_code};

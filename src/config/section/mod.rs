//! Configuration sections of `unodev.toml`.

mod serve;
mod style;

pub use serve::{ResolvedServe, ServeConfig};
pub use style::StyleConfig;

//! CLI command implementations

pub mod build;
pub mod layers;

pub use build::execute as build;
pub use layers::execute as layers;

use crate::layer::LayerTypes;

/// Compact "build,launch,cache" rendering of layer flags
pub(crate) fn format_types(types: &LayerTypes) -> String {
    let flags: Vec<&str> = [
        (types.build, "build"),
        (types.launch, "launch"),
        (types.cache, "cache"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(",")
    }
}

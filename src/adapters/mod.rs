// Adapters layer: concrete codecs, security schemes and handler helpers that
// plug into the registries.

pub mod codecs;
pub mod handlers;
pub mod security;

// Domain layer: request/response shapes, erased models and the capability
// traits that handlers, codecs and security schemes implement.

pub mod http;
pub mod model;
pub mod ports;

// Domain layer: notice records, search queries and the ports the pipeline talks through.

pub mod model;
pub mod ports;

// Pipeline processing: markup extraction, aggregation, canonicalization, and assembly

pub mod aggregate;
pub mod assemble;
pub mod markup;
pub mod metadata;
pub mod normalize;
pub mod structural;
pub mod textual;

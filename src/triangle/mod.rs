//! Loss development triangles, CSV loading and sample datasets

mod data;
pub mod loader;
pub mod samples;

pub use data::{Triangle, TriangleKind};
pub use loader::{load_triangle, load_triangle_from_reader, CsvLayout};
pub use samples::SampleDataset;

pub mod concurrent_reader;
pub mod gazetteer_reader;
pub mod property_reader;

pub use concurrent_reader::{CleansingInputs, ConcurrentReader};
pub use gazetteer_reader::GazetteerReader;
pub use property_reader::PropertyReader;

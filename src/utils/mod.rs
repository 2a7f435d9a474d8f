pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use coordinates::{round_to_precision, scaled_coordinate};
pub use filename::{format_from_extension, generate_default_output_filename};
pub use progress::ProgressReporter;

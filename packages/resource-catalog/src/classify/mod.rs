//! Path classification.
//!
//! The bucket has no reliable catalog of its own, so program, type and
//! category are read off the folder layout:
//!
//! ```text
//! <ProgramFolder>/<...>/<forms|protocols|resources|training>/<category...>/<file>
//! <Patient Handouts|Clinical Guidelines|Medical Billing>/<category...>/<file>
//! programs/<slug>/<...>/<file>                         (legacy layout)
//! ```

pub mod path;
pub mod prettify;
pub mod program;

pub use path::{classify, classify_segments, Classification};
pub use prettify::{join_category, prettify_segment};
pub use program::{program_for_folder, program_for_name, program_info, ProgramInfo, PROGRAMS};

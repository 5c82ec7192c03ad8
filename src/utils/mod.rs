pub use self::logger::*;
pub use self::timer::*;
pub use self::writer::*;

pub mod logger;
pub mod timer;
pub mod writer;

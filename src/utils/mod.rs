pub mod debug;

pub use self::debug::logger;

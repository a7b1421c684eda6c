pub use self::fst::*;

mod fst;

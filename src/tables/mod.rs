pub use self::chisq_test::*;

mod chisq_test;

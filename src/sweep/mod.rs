pub use self::{driver::*, results::*};

mod driver;
mod results;

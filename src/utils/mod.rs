mod overflow_que;
mod seq;
mod swnd;

pub use overflow_que::*;
pub use seq::*;
pub use swnd::*;

mod readpair;

pub use readpair::*;

use std::fmt;

use crate::command::Commands;

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match self {
            Commands::Count(_) => "Count",
        };
        write!(f, "{}", cmd)
    }
}

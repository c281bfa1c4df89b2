use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File at {:?} not found.", path)]
    FileNotFound { path: std::path::PathBuf },

    #[error("File at {:?} is invalid{}.", path, Error::format_msg_as_detail(msg))]
    FileNotValid {
        path: std::path::PathBuf,
        msg: Option<String>,
    },

    #[error("Failed parsing {}{}", context, Error::format_msg_as_detail(msg))]
    ParseError {
        context: String,
        msg: Option<String>,
    },

    #[error("Invalid tag library: {msg}")]
    InvalidTagLibrary { msg: String },

    #[error("Invalid read layout: {msg}")]
    InvalidLayout { msg: String },

    #[error("Read 1 and read 2 are out of sync at record {record}; one file ended early")]
    UnpairedRead { record: u64 },

    #[error(
        "Count {count} for feature '{feature}' in cell '{cell}' exceeds the maximum of {max} for the configured count width"
    )]
    CountOverflow {
        feature: String,
        cell: String,
        count: u64,
        max: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[cold]
    pub fn file_not_found<P: AsRef<std::path::Path>>(path: P) -> Self {
        Error::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn file_not_valid<P: AsRef<std::path::Path>, M: Into<String>>(
        path: P,
        msg: Option<M>,
    ) -> Self {
        Error::FileNotValid {
            path: path.as_ref().to_path_buf(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn parse_error<C: Into<String>, M: Into<String>>(context: C, msg: Option<M>) -> Self {
        Error::ParseError {
            context: context.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn invalid_tag_library<M: Into<String>>(msg: M) -> Self {
        Error::InvalidTagLibrary { msg: msg.into() }
    }

    #[cold]
    pub fn invalid_layout<M: Into<String>>(msg: M) -> Self {
        Error::InvalidLayout { msg: msg.into() }
    }

    #[cold]
    pub fn count_overflow<F: Into<String>>(feature: F, cell: &[u8], count: u64, max: u64) -> Self {
        Error::CountOverflow {
            feature: feature.into(),
            cell: String::from_utf8_lossy(cell).into_owned(),
            count,
            max,
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}

use thiserror::Error;

/// Fatal errors. Anything that ends up here aborts the run with a nonzero exit code.
/// Per-read outcomes (missing linker, unknown barcode, bad UMI) are never errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("File at {:?} not found.", path)]
    FileNotFound { path: std::path::PathBuf },

    #[error("File at {:?} is invalid{}.", path, Error::format_msg_as_detail(msg))]
    FileNotValid {
        path: std::path::PathBuf,
        msg: Option<String>,
    },

    #[error(
        "Barcode {:?} on line {} of {:?} is invalid; only A, C, G and T are allowed",
        barcode,
        line,
        path
    )]
    InvalidBarcode {
        path: std::path::PathBuf,
        line: u64,
        barcode: String,
    },

    #[error(
        "Barcode whitelist {:?} contains {} twice (entries {} and {})",
        path,
        barcode,
        first,
        second
    )]
    DuplicateBarcode {
        path: std::path::PathBuf,
        barcode: String,
        first: usize,
        second: usize,
    },

    #[error("Barcode whitelist {:?} is empty", path)]
    EmptyWhitelist { path: std::path::PathBuf },

    #[error("Invalid read layout: {}", msg)]
    InvalidLayout { msg: String },

    #[error(
        "Paired input is out of sync: {:?} ended after {} records while {:?} has more. Use --allow-unpaired to stop at the shorter file instead",
        exhausted,
        records,
        remaining
    )]
    UnpairedInput {
        exhausted: std::path::PathBuf,
        remaining: std::path::PathBuf,
        records: u64,
    },

    #[error("Output directory {:?} is not writable{}", path, Error::format_msg_as_detail(msg))]
    OutputNotWritable {
        path: std::path::PathBuf,
        msg: Option<String>,
    },

    #[error(
        "Utility '{}' failed on execute \'{}\'{}",
        utility,
        cmd,
        Error::format_msg_as_detail(msg)
    )]
    UtilityExecutionError {
        utility: String,
        cmd: String,
        msg: Option<String>,
    },

    #[error(
        "Failed trying to execute utility '{utility}'. Make sure it is in your $PATH and you have execution permissions."
    )]
    UtilityNotExecutable { utility: String },
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
    pub fn invalid_barcode<P: AsRef<std::path::Path>, B: Into<String>>(
        path: P,
        line: u64,
        barcode: B,
    ) -> Self {
        Error::InvalidBarcode {
            path: path.as_ref().to_path_buf(),
            line,
            barcode: barcode.into(),
        }
    }

    #[cold]
    pub fn duplicate_barcode<P: AsRef<std::path::Path>, B: Into<String>>(
        path: P,
        barcode: B,
        first: usize,
        second: usize,
    ) -> Self {
        Error::DuplicateBarcode {
            path: path.as_ref().to_path_buf(),
            barcode: barcode.into(),
            first,
            second,
        }
    }

    #[cold]
    pub fn empty_whitelist<P: AsRef<std::path::Path>>(path: P) -> Self {
        Error::EmptyWhitelist {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn invalid_layout<M: Into<String>>(msg: M) -> Self {
        Error::InvalidLayout { msg: msg.into() }
    }

    #[cold]
    pub fn unpaired_input<P: AsRef<std::path::Path>, Q: AsRef<std::path::Path>>(
        exhausted: P,
        remaining: Q,
        records: u64,
    ) -> Self {
        Error::UnpairedInput {
            exhausted: exhausted.as_ref().to_path_buf(),
            remaining: remaining.as_ref().to_path_buf(),
            records,
        }
    }

    #[cold]
    pub fn output_not_writable<P: AsRef<std::path::Path>, M: Into<String>>(
        path: P,
        msg: Option<M>,
    ) -> Self {
        Error::OutputNotWritable {
            path: path.as_ref().to_path_buf(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn utility_execution_error<U: Into<String>, C: Into<String>, M: Into<String>>(
        utility: U,
        cmd: C,
        msg: Option<M>,
    ) -> Self {
        Error::UtilityExecutionError {
            utility: utility.into(),
            cmd: cmd.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn utility_not_executable<U: Into<String>>(utility: U) -> Self {
        Error::UtilityNotExecutable {
            utility: utility.into(),
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}

use std::fmt;

/// What extracting one archive entry will do to the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionDecision {
    Create,
    Overwrite,
    /// Destination is a directory: nothing is written or staged.
    SkipDirectory,
}

impl ExtractionDecision {
    /// Decide from the current state of the destination path.
    pub fn probe(is_file: bool, is_dir: bool) -> Self {
        if is_dir {
            ExtractionDecision::SkipDirectory
        } else if is_file {
            ExtractionDecision::Overwrite
        } else {
            ExtractionDecision::Create
        }
    }

    pub fn writes_bytes(self) -> bool {
        !matches!(self, ExtractionDecision::SkipDirectory)
    }
}

impl fmt::Display for ExtractionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionDecision::Create => write!(f, "create"),
            ExtractionDecision::Overwrite => write!(f, "overwrite"),
            ExtractionDecision::SkipDirectory => write!(f, "directory"),
        }
    }
}

use std::fmt;

/// Errors surfaced by the filtering pipeline and its discovery boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `--output` carried a value other than `""`, `category` or `resource`.
    #[error("--output {0} is not available")]
    InvalidOutput(String),

    /// `--sort-by` carried a value other than `""` or `resource`.
    #[error("--sort-by accepts only resource")]
    InvalidSortBy(String),

    /// The API server could not be reached or a discovery request failed.
    #[error(transparent)]
    Kube(#[from] kube::Error),

    /// A category was requested by name but no resource belongs to it.
    #[error("the server doesn't have an API category \"{0}\"")]
    CategoryNotFound(String),

    /// One or more rows of the table could not be written.
    #[error("{0}")]
    Render(Aggregate),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A collection of write errors reported together once rendering finishes.
#[derive(Debug, Default)]
pub struct Aggregate(Vec<std::io::Error>);

impl Aggregate {
    pub fn push(&mut self, err: std::io::Error) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Render(self))
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => Ok(()),
            [single] => write!(f, "{single}"),
            errs => {
                let messages = errs.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "[{}]", messages.join(", "))
            }
        }
    }
}

use std::path::Path;

mod readers;
mod writers;

pub(crate) use readers::*;
pub(crate) use writers::*;

/// Checks that all the provided paths are distinct from each other. Each path
/// is paired with the name of its option, for the error message.
///
/// ## Errors
///
/// If any two paths are equal, the returned message names both options.
pub(crate) fn check_distinct_files<'a, P>(paths: &[(&'a str, Option<P>)]) -> Result<(), String>
where
    P: AsRef<Path>, {
    let present = paths
        .iter()
        .filter_map(|(option, path)| path.as_ref().map(|p| (*option, p.as_ref())))
        .collect::<Vec<_>>();

    for (i, (option1, path1)) in present.iter().enumerate() {
        if let Some((option2, _)) = present[i + 1..].iter().find(|(_, path2)| path1 == path2) {
            return Err(format!(
                "`{option1}` and `{option2}` name the same file: {path}",
                path = path1.display()
            ));
        }
    }
    Ok(())
}

/// Checks whether a file is a [gzip
/// file](https://www.rfc-editor.org/rfc/rfc1952#page-5).
///
/// This is currently done naively by seeing if it ends with a `gz` extension.
#[inline]
pub(crate) fn is_gz<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().extension().is_some_and(|ext| ext == "gz")
}

/// A trait unifying readers/writers that can be created from filenames.
pub(crate) trait FromFilename
where
    Self: Sized, {
    /// Creates the reader/writer from the path.
    fn from_filename<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>;
}

pub(crate) trait MapFailedWriteExt<T> {
    fn map_failed_write<P: AsRef<Path>>(self, path: P) -> std::io::Result<T>;
}

impl<T> MapFailedWriteExt<T> for std::io::Result<T> {
    fn map_failed_write<P: AsRef<Path>>(self, path: P) -> std::io::Result<T> {
        self.map_err(|e| {
            std::io::Error::other(format!(
                "Failed to open {path} for writing due to the error:\n{e}",
                path = path.as_ref().display()
            ))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_gz() {
        assert!(is_gz("trinity.fasta.gz"));
        assert!(!is_gz("trinity.fasta"));
        assert!(!is_gz("gz"));
    }

    #[test]
    fn test_check_distinct_files() {
        let transcripts = PathBuf::from("Trinity.fasta");
        let output = PathBuf::from("Trinity.trimmed.fasta");

        assert!(
            check_distinct_files(&[
                ("--transcripts", Some(&transcripts)),
                ("--output", Some(&output)),
                ("--ledger-out", None),
            ])
            .is_ok()
        );

        let err = check_distinct_files(&[
            ("--transcripts", Some(&transcripts)),
            ("--ledger-out", None),
            ("--output", Some(&transcripts)),
        ])
        .unwrap_err();
        assert!(err.contains("`--transcripts` and `--output`"));
    }
}

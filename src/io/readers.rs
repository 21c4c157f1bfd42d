use crate::io::{FromFilename, is_gz};
use flate2::read::MultiGzDecoder;
use std::{fs::File, io::Read, path::Path};
use zoe::{data::err::ResultWithErrorContext, define_whichever};

define_whichever! {
   /// An enum for the different input types [`File`] and a gzip compressed
   /// file.
   ///
   /// For the [`Zipped`] variant, unzipping is performed lazily as the data
   /// is read.
   ///
   /// To construct this, use [`from_filename`]. The [`Zipped`] variant is
   /// chosen if the file has extension `gz`.
   ///
   /// [`from_filename`]: FromFilename::from_filename
   /// [`Zipped`]: ReadFileZip::Zipped
    pub(crate) enum ReadFileZip {
        /// A regular uncompressed file.
        File(File),
        /// A gzip compressed file, using lazy decoding.
        Zipped(MultiGzDecoder<File>),
    }

    impl Read for ReadFileZip {}
}

impl FromFilename for ReadFileZip {
    /// Opens a [`ReadFileZip`] from a path.
    ///
    /// The file is determined to be zipped if it ends in `.gz`.
    ///
    /// ## Errors
    ///
    /// Any IO errors when opening the file are propagated with the path as
    /// context.
    fn from_filename<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>, {
        let file = File::open(&path).with_file_context("Failed to open the input file", &path)?;

        if is_gz(path) {
            Ok(Self::Zipped(MultiGzDecoder::new(file)))
        } else {
            Ok(Self::File(file))
        }
    }
}

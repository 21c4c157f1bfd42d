use crate::io::{FromFilename, MapFailedWriteExt, is_gz};
use flate2::{Compression, write::GzEncoder};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use zoe::define_whichever;

define_whichever! {
    /// An enum for the acceptable output types. A [`BufWriter`] is used for
    /// both variants.
    #[derive(Debug)]
    pub(crate) enum WriteFileZip {
        /// A writer for a regular uncompressed file.
        File(BufWriter<File>),
        /// A writer for a gzip compressed file.
        Zipped(GzEncoder<BufWriter<File>>),
    }

    impl Write for WriteFileZip {}
}

impl WriteFileZip {
    /// Flushes all buffered data, writing the gzip trailer for the
    /// [`Zipped`] variant.
    ///
    /// ## Errors
    ///
    /// Any IO errors while flushing are propagated.
    ///
    /// [`Zipped`]: WriteFileZip::Zipped
    pub fn close(self) -> std::io::Result<()> {
        match self {
            WriteFileZip::File(mut writer) => writer.flush(),
            WriteFileZip::Zipped(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl FromFilename for WriteFileZip {
    fn from_filename<P>(path: P) -> std::io::Result<Self>
    where
        P: AsRef<Path>, {
        let file = File::create(&path).map_failed_write(&path)?;
        let bufwriter = BufWriter::new(file);

        let writer = if is_gz(path) {
            Self::Zipped(GzEncoder::new(bufwriter, Compression::default()))
        } else {
            Self::File(bufwriter)
        };

        Ok(writer)
    }
}

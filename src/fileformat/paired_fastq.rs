use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use log::{debug, warn};
use seq_io::fastq::Reader as FastqReader;
use seq_io::fastq::RefRecord;

use super::{detect_fq_format, DetectedFileformat};
use crate::runtime::Error;

///////////////////////////////
/// How gzip input is opened
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Decompression {
    /// `gzip -dcf` subprocess per gzip input file; plain FASTQ is read directly
    #[default]
    Pipe,
    /// In-process decompression
    Inline,
}

enum NextRecord<'a> {
    Record(RefRecord<'a>),
    End,
    Truncated,
}

///////////////////////////////
/// One FASTQ input, possibly fed by a decompressor subprocess
pub struct FastqSource {
    path: PathBuf,
    reader: FastqReader<Box<dyn Read>>,
    child: Option<Child>,
}

impl FastqSource {
    pub fn open(path: &Path, decompression: Decompression) -> Result<FastqSource, Error> {
        let file = File::open(path).map_err(|_| Error::file_not_found(path))?;
        let (reader, child): (Box<dyn Read>, Option<Child>) = match decompression {
            Decompression::Pipe if detect_fq_format(path) == DetectedFileformat::FASTQ => {
                debug!("Reading uncompressed {}", path.display());
                (Box::new(file), None)
            }
            Decompression::Pipe => {
                drop(file);
                let mut cmd = Command::new("gzip");
                cmd.arg("-dcf").arg(path);
                let mut child = cmd
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .spawn()
                    .map_err(|_| Error::utility_not_executable("gzip"))?;
                let stdout = child.stdout.take().ok_or_else(|| {
                    Error::utility_execution_error(
                        "gzip",
                        format!("gzip -dcf {}", path.display()),
                        Some("no stdout"),
                    )
                })?;
                debug!("Decompressing {} with gzip subprocess", path.display());
                (Box::new(stdout), Some(child))
            }
            Decompression::Inline => {
                let is_empty = file
                    .metadata()
                    .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?
                    .len()
                    == 0;
                if is_empty {
                    (Box::new(io::empty()), None)
                } else {
                    let (reader, compression) = niffler::get_reader(Box::new(file))
                        .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;
                    debug!(
                        "Opened file {} with compression {:?}",
                        path.display(),
                        compression
                    );
                    let reader: Box<dyn Read> = reader;
                    (reader, None)
                }
            }
        };

        Ok(FastqSource {
            path: path.to_path_buf(),
            reader: FastqReader::new(reader),
            child,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn next_record(&mut self) -> Result<NextRecord<'_>, Error> {
        match self.reader.next() {
            None => match decompressor_failure(&mut self.child) {
                Some(status) => {
                    warn!(
                        "gzip for {} exited early ({}); treating the input as truncated",
                        self.path.display(),
                        status
                    );
                    Ok(NextRecord::Truncated)
                }
                None => Ok(NextRecord::End),
            },
            Some(Ok(record)) => Ok(NextRecord::Record(record)),
            Some(Err(seq_io::fastq::Error::UnexpectedEnd { .. })) => Ok(NextRecord::Truncated),
            Some(Err(e)) => Err(Error::file_not_valid(&self.path, Some(e.to_string()))),
        }
    }
}

/// Exit status of a decompressor that failed. Only called once its output is exhausted,
/// so waiting does not block on a running process
fn decompressor_failure(child: &mut Option<Child>) -> Option<ExitStatus> {
    let child = child.as_mut()?;
    match child.wait() {
        Ok(status) if !status.success() => Some(status),
        _ => None,
    }
}

impl Drop for FastqSource {
    fn drop(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => debug!("gzip for {} exited: {}", self.path.display(), status),
            _ => {
                // Reading stopped early (e.g. --max-reads); the decompressor is not needed anymore
                let _ = child.kill();
                let _ = child.wait();
                debug!("Stopped gzip for {}", self.path.display());
            }
        }
    }
}

///////////////////////////////
/// One read pair: the barcode read (read 1) and the mRNA read (read 2)
pub struct ReadPairRecord<'a> {
    pub barcode_read: RefRecord<'a>,
    pub mrna_read: RefRecord<'a>,
}

///////////////////////////////
/// Reads the barcode and mRNA FASTQ files in lockstep
pub struct PairedFastqReader {
    barcode: FastqSource,
    mrna: FastqSource,
    path_barcode_read: PathBuf,
    path_mrna_read: PathBuf,
    allow_unpaired: bool,
    num_read: u64,
}

impl PairedFastqReader {
    pub fn open(
        path_barcode_read: &Path,
        path_mrna_read: &Path,
        decompression: Decompression,
        allow_unpaired: bool,
    ) -> Result<PairedFastqReader, Error> {
        Ok(PairedFastqReader {
            barcode: FastqSource::open(path_barcode_read, decompression)?,
            mrna: FastqSource::open(path_mrna_read, decompression)?,
            path_barcode_read: path_barcode_read.to_path_buf(),
            path_mrna_read: path_mrna_read.to_path_buf(),
            allow_unpaired,
            num_read: 0,
        })
    }

    pub fn num_read(&self) -> u64 {
        self.num_read
    }

    ///////////////////////////////
    /// Next pair, or None once the input is done.
    ///
    /// A record cut off by a premature end of stream ends the input. A file running out
    /// while the other still has a record is an error, unless unpaired input is allowed
    pub fn next_pair(&mut self) -> Result<Option<ReadPairRecord<'_>>, Error> {
        let barcode = self.barcode.next_record()?;
        let mrna = self.mrna.next_record()?;

        match (barcode, mrna) {
            (NextRecord::Record(barcode_read), NextRecord::Record(mrna_read)) => {
                self.num_read += 1;
                Ok(Some(ReadPairRecord {
                    barcode_read,
                    mrna_read,
                }))
            }
            (NextRecord::End, NextRecord::End) => Ok(None),
            (NextRecord::Truncated, _) | (_, NextRecord::Truncated) => {
                warn!(
                    "Input ended prematurely after {} read pairs; stopping",
                    self.num_read
                );
                Ok(None)
            }
            (NextRecord::End, NextRecord::Record(_)) => unpaired(
                &self.path_barcode_read,
                &self.path_mrna_read,
                self.num_read,
                self.allow_unpaired,
            ),
            (NextRecord::Record(_), NextRecord::End) => unpaired(
                &self.path_mrna_read,
                &self.path_barcode_read,
                self.num_read,
                self.allow_unpaired,
            ),
        }
    }
}

fn unpaired<'a>(
    exhausted: &Path,
    remaining: &Path,
    num_read: u64,
    allow_unpaired: bool,
) -> Result<Option<ReadPairRecord<'a>>, Error> {
    if allow_unpaired {
        warn!(
            "{} ended after {} records while {} has more; stopping",
            exhausted.display(),
            num_read,
            remaining.display()
        );
        Ok(None)
    } else {
        Err(Error::unpaired_input(exhausted, remaining, num_read))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seq_io::fastq::Record;
    use std::io::Write;

    fn write_fastq(path: &Path, records: &[(&str, &str)]) {
        let mut f = File::create(path).unwrap();
        for (name, seq) in records {
            writeln!(f, "@{}\n{}\n+\n{}", name, seq, "I".repeat(seq.len())).unwrap();
        }
    }

    #[test]
    fn test_lockstep() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        let r2 = dir.path().join("r2.fastq");
        write_fastq(&r1, &[("a", "ACGT"), ("b", "GGGG")]);
        write_fastq(&r2, &[("a", "TTTT"), ("b", "CCCC")]);

        let mut reader = PairedFastqReader::open(&r1, &r2, Decompression::Inline, false).unwrap();
        let mut heads = Vec::new();
        while let Some(pair) = reader.next_pair().unwrap() {
            heads.push((
                pair.barcode_read.head().to_vec(),
                pair.mrna_read.seq().to_vec(),
            ));
        }
        assert_eq!(heads.len(), 2);
        assert_eq!(heads[1], (b"b".to_vec(), b"CCCC".to_vec()));
        assert_eq!(reader.num_read(), 2);
    }

    #[test]
    fn test_unpaired_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        let r2 = dir.path().join("r2.fastq");
        write_fastq(&r1, &[("a", "ACGT"), ("b", "GGGG")]);
        write_fastq(&r2, &[("a", "TTTT")]);

        let mut reader = PairedFastqReader::open(&r1, &r2, Decompression::Inline, false).unwrap();
        assert!(reader.next_pair().unwrap().is_some());
        match reader.next_pair() {
            Err(Error::UnpairedInput {
                exhausted, records, ..
            }) => {
                assert_eq!(exhausted, r2);
                assert_eq!(records, 1);
            }
            _ => panic!("expected unpaired input error"),
        }
    }

    #[test]
    fn test_unpaired_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        let r2 = dir.path().join("r2.fastq");
        write_fastq(&r1, &[("a", "ACGT")]);
        write_fastq(&r2, &[("a", "TTTT"), ("b", "CCCC")]);

        let mut reader = PairedFastqReader::open(&r1, &r2, Decompression::Inline, true).unwrap();
        assert!(reader.next_pair().unwrap().is_some());
        assert!(reader.next_pair().unwrap().is_none());
    }

    #[test]
    fn test_truncated_record_stops_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        let r2 = dir.path().join("r2.fastq");
        write_fastq(&r1, &[("a", "ACGT"), ("b", "GGGG")]);
        std::fs::write(&r2, "@a\nTTTT\n+\nIIII\n@b\nCC").unwrap();

        let mut reader = PairedFastqReader::open(&r1, &r2, Decompression::Inline, false).unwrap();
        assert!(reader.next_pair().unwrap().is_some());
        assert!(reader.next_pair().unwrap().is_none());
    }

    fn gz_bytes(records: &[(&str, &str)]) -> Vec<u8> {
        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        for (name, seq) in records {
            writeln!(gz, "@{}\n{}\n+\n{}", name, seq, "I".repeat(seq.len())).unwrap();
        }
        gz.finish().unwrap()
    }

    #[test]
    fn test_plain_fastq_is_read_without_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        write_fastq(&r1, &[("a", "ACGT")]);

        let source = FastqSource::open(&r1, Decompression::Pipe).unwrap();
        assert!(source.child.is_none());
    }

    #[test]
    fn test_failing_gzip_stops_cleanly() {
        if crate::utils::check_gzip().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq.gz");
        let r2 = dir.path().join("r2.fastq.gz");
        std::fs::write(&r1, gz_bytes(&[("a", "ACGT"), ("b", "GGGG")])).unwrap();

        // a good member followed by one whose deflate data is broken
        let mut content = gz_bytes(&[("a", "TTTT")]);
        let mut broken = gz_bytes(&[("b", "CCCC")]);
        broken[10] = 0xff;
        content.extend_from_slice(&broken);
        std::fs::write(&r2, content).unwrap();

        let mut reader = PairedFastqReader::open(&r1, &r2, Decompression::Pipe, false).unwrap();
        assert!(reader.next_pair().unwrap().is_some());
        assert!(reader.next_pair().unwrap().is_none());
        assert_eq!(reader.num_read(), 1);
    }

    #[test]
    fn test_unpaired_through_gzip_is_an_error() {
        if crate::utils::check_gzip().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq.gz");
        let r2 = dir.path().join("r2.fastq.gz");
        std::fs::write(&r1, gz_bytes(&[("a", "ACGT"), ("b", "GGGG")])).unwrap();
        std::fs::write(&r2, gz_bytes(&[("a", "TTTT")])).unwrap();

        let mut reader = PairedFastqReader::open(&r1, &r2, Decompression::Pipe, false).unwrap();
        assert!(reader.next_pair().unwrap().is_some());
        assert!(matches!(
            reader.next_pair(),
            Err(Error::UnpairedInput { .. })
        ));
    }

    #[test]
    fn test_empty_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("r1.fastq");
        let r2 = dir.path().join("r2.fastq");
        File::create(&r1).unwrap();
        File::create(&r2).unwrap();

        let mut reader = PairedFastqReader::open(&r1, &r2, Decompression::Inline, false).unwrap();
        assert!(reader.next_pair().unwrap().is_none());
    }
}

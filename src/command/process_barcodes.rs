mod aggregator;
mod stats;

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::{error, info};
use seq_io::fastq::Record as FastqRecord;

pub use aggregator::Aggregator;
pub use stats::RunStatistics;

use crate::barcode::indrop::{DEFAULT_BARCODE2_LEN, DEFAULT_LINKER_OFFSETS, DEFAULT_MIN_READ_LEN};
use crate::barcode::{Chemistry, IndropChemistry, IndropLayout, ReadClass, W1_LINKER};
use crate::fileformat::{
    detect_fq_format, verify_input_fq_file, Decompression, DetectedFileformat, PairedFastqReader,
};
use crate::runtime::{setup_global_logger, Error, LogLevel, LogMode};
use crate::umi::DEFAULT_UMI_LEN;
use crate::utils::check_gzip;

pub const PROCESSED_READS_FILE: &str = "processed_reads.fastq";
pub const BARCODE_COUNTS_FILE: &str = "barcode_counts.tsv";
pub const LOG_FILE: &str = "log.txt";
pub const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Two-letter single-dash flags and the long options they stand for
pub const SHORT_FLAG_ALIASES: [(&str, &str); 4] = [
    ("-rb", "--barcode-read-file"),
    ("-rm", "--mrna-read-file"),
    ("-b1", "--barcode1-file"),
    ("-b2", "--barcode2-file"),
];

///////////////////////////////
/// clap only knows single-letter short flags. Rewrite `-rb`, `-rm`, `-b1` and `-b2` into
/// their long options; anything after `--` is left alone
pub fn expand_short_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut options_ended = false;
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if options_ended {
                return arg;
            }
            if arg == "--" {
                options_ended = true;
                return arg;
            }
            SHORT_FLAG_ALIASES
                .iter()
                .find(|(short, _)| arg == *short)
                .map(|(_, long)| OsString::from(long))
                .unwrap_or(arg)
        })
        .collect()
}

#[derive(Args)]
pub struct ProcessBarcodesCMD {
    // gzip FASTQ with the barcode read (read 1)
    #[arg(long = "barcode-read-file", visible_alias = "rb", value_parser)]
    pub path_barcode_read: PathBuf,

    // gzip FASTQ with the mRNA read (read 2)
    #[arg(long = "mrna-read-file", visible_alias = "rm", value_parser)]
    pub path_mrna_read: PathBuf,

    // Whitelist for barcode 1, one barcode per line
    #[arg(long = "barcode1-file", visible_alias = "b1", value_parser)]
    pub path_barcode1: PathBuf,

    // Whitelist for barcode 2, one barcode per line
    #[arg(long = "barcode2-file", visible_alias = "b2", value_parser)]
    pub path_barcode2: PathBuf,

    // Output directory, created if absent
    #[arg(short = 'o', long = "output-dir", value_parser)]
    pub path_output_dir: PathBuf,

    // Stop after this many read pairs; 0 reads everything
    #[arg(short = 'm', long = "max-reads", value_parser, default_value_t = 0)]
    pub max_reads: u64,

    #[arg(long = "linker", value_parser, default_value = W1_LINKER)]
    pub linker: String,

    // Candidate linker offsets, i.e. the possible barcode 1 lengths
    #[arg(long = "linker-offsets", value_delimiter = ',', default_values_t = DEFAULT_LINKER_OFFSETS)]
    pub linker_offsets: Vec<usize>,

    #[arg(long = "barcode2-len", value_parser, default_value_t = DEFAULT_BARCODE2_LEN)]
    pub barcode2_len: usize,

    #[arg(long = "umi-len", value_parser, default_value_t = DEFAULT_UMI_LEN)]
    pub umi_len: usize,

    // Barcode reads shorter than this are not scanned for the linker
    #[arg(long = "min-read-len", value_parser, default_value_t = DEFAULT_MIN_READ_LEN)]
    pub min_read_len: usize,

    #[arg(long = "decompression", value_enum, default_value_t = Decompression::Pipe)]
    pub decompression: Decompression,

    // Stop at the end of the shorter input instead of failing
    #[arg(long = "allow-unpaired")]
    pub allow_unpaired: bool,

    #[arg(long = "log-level", value_parser, default_value = "info")]
    pub log_level: LogLevel,

    // both, path, terminal or discard
    #[arg(long = "log-mode", value_parser, default_value = "both")]
    pub log_mode: LogMode,
}
impl ProcessBarcodesCMD {
    /// Run the commandline option.
    /// Takes the paired inDrop FASTQ files, resolves barcodes and UMIs, and writes the
    /// relabeled mRNA reads along with a barcode count matrix
    pub fn try_execute(&mut self) -> Result<()> {
        fs::create_dir_all(&self.path_output_dir)
            .map_err(|e| Error::output_not_writable(&self.path_output_dir, Some(e.to_string())))?;
        setup_global_logger(
            self.log_level,
            self.log_mode,
            &self.path_output_dir.join(LOG_FILE),
        )?;

        let result = self.params().and_then(|params| params.run());
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("{}", e);
                Err(e)
            }
        }
    }

    fn params(&self) -> Result<ProcessBarcodes> {
        let layout = IndropLayout {
            linker: self.linker.to_ascii_uppercase().into_bytes(),
            linker_offsets: self.linker_offsets.clone(),
            barcode2_len: self.barcode2_len,
            umi_len: self.umi_len,
            min_read_len: self.min_read_len,
        }
        .validate()?;

        Ok(ProcessBarcodes {
            path_barcode_read: self.path_barcode_read.clone(),
            path_mrna_read: self.path_mrna_read.clone(),
            path_barcode1: self.path_barcode1.clone(),
            path_barcode2: self.path_barcode2.clone(),
            path_output_dir: self.path_output_dir.clone(),
            max_reads: self.max_reads,
            layout,
            decompression: self.decompression,
            allow_unpaired: self.allow_unpaired,
        })
    }
}

///////////////////////////////
/// Parameters for one barcode processing run
#[derive(Clone, Debug)]
pub struct ProcessBarcodes {
    pub path_barcode_read: PathBuf,
    pub path_mrna_read: PathBuf,
    pub path_barcode1: PathBuf,
    pub path_barcode2: PathBuf,
    pub path_output_dir: PathBuf,
    /// 0 means no limit
    pub max_reads: u64,
    pub layout: IndropLayout,
    pub decompression: Decompression,
    pub allow_unpaired: bool,
}

impl ProcessBarcodes {
    pub fn path_processed_reads(&self) -> PathBuf {
        self.path_output_dir.join(PROCESSED_READS_FILE)
    }

    pub fn path_barcode_counts(&self) -> PathBuf {
        self.path_output_dir.join(BARCODE_COUNTS_FILE)
    }

    ///////////////////////////////
    /// Check the inputs, build the barcode indices, and process every read pair
    pub fn run(&self) -> Result<RunStatistics> {
        verify_input_fq_file(&self.path_barcode_read)?;
        verify_input_fq_file(&self.path_mrna_read)?;
        let any_gzip = [&self.path_barcode_read, &self.path_mrna_read]
            .iter()
            .any(|p| detect_fq_format(p) == DetectedFileformat::GzipFASTQ);
        if self.decompression == Decompression::Pipe && any_gzip {
            check_gzip()?;
        }

        info!("Barcode reads: {}", self.path_barcode_read.display());
        info!("mRNA reads: {}", self.path_mrna_read.display());
        let chemistry =
            IndropChemistry::from_files(self.layout.clone(), &self.path_barcode1, &self.path_barcode2)?;

        self.process(&chemistry)
    }

    ///////////////////////////////
    /// The main loop. Read pairs are classified in input order; accepted ones are counted
    /// and written out, everything else only shows up in the statistics
    pub fn process(&self, chemistry: &impl Chemistry) -> Result<RunStatistics> {
        let mut reader = PairedFastqReader::open(
            &self.path_barcode_read,
            &self.path_mrna_read,
            self.decompression,
            self.allow_unpaired,
        )?;

        let path_processed_reads = self.path_processed_reads();
        let file_out = File::create(&path_processed_reads)
            .map_err(|e| Error::output_not_writable(&self.path_output_dir, Some(e.to_string())))?;
        let mut aggregator = Aggregator::new(
            chemistry.barcode1_names(),
            chemistry.barcode2_names(),
            file_out,
        );

        let mut stats = RunStatistics::default();
        while self.max_reads == 0 || stats.total < self.max_reads {
            let Some(pair) = reader.next_pair()? else {
                break;
            };

            let class = chemistry.classify(pair.barcode_read.seq());
            stats.record(&class);
            if let ReadClass::Accepted(read) = class {
                let mrna = &pair.mrna_read;
                aggregator.accept(&read, mrna.head(), mrna.seq(), mrna.qual())?;
            }

            if stats.total % PROGRESS_INTERVAL == 0 {
                info!(
                    "Processed {} read pairs, {} accepted",
                    stats.total, stats.accepted
                );
            }
        }
        if self.max_reads > 0 && stats.total == self.max_reads {
            info!("Stopped after --max-reads {}", self.max_reads);
        }

        aggregator.finish(&self.path_barcode_counts())?;
        stats.log_summary();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        cmd: ProcessBarcodesCMD,
    }

    #[test]
    fn test_parse_short_aliases() {
        let cli = TestCli::try_parse_from([
            "indrop", "--rb", "r1.fastq.gz", "--rm", "r2.fastq.gz", "--b1", "bc1.txt", "--b2",
            "bc2.txt", "-o", "out", "-m", "100",
        ])
        .unwrap();
        let cmd = cli.cmd;
        assert_eq!(cmd.path_barcode_read, PathBuf::from("r1.fastq.gz"));
        assert_eq!(cmd.path_barcode2, PathBuf::from("bc2.txt"));
        assert_eq!(cmd.max_reads, 100);
        assert_eq!(cmd.linker, W1_LINKER);
        assert_eq!(cmd.linker_offsets, vec![8, 9, 10, 11]);
        assert_eq!(cmd.decompression, Decompression::Pipe);
        assert_eq!(cmd.log_mode, LogMode::Both);
        assert!(!cmd.allow_unpaired);
    }

    #[test]
    fn test_parse_two_letter_flags() {
        let args = expand_short_flags([
            "indrop", "-rb", "r1.fastq.gz", "-rm", "r2.fastq.gz", "-b1", "bc1.txt", "-b2",
            "bc2.txt", "-o", "out",
        ]);
        let cli = TestCli::try_parse_from(args).unwrap();
        assert_eq!(cli.cmd.path_barcode_read, PathBuf::from("r1.fastq.gz"));
        assert_eq!(cli.cmd.path_mrna_read, PathBuf::from("r2.fastq.gz"));
        assert_eq!(cli.cmd.path_barcode1, PathBuf::from("bc1.txt"));
        assert_eq!(cli.cmd.path_barcode2, PathBuf::from("bc2.txt"));
    }

    #[test]
    fn test_expand_short_flags_leaves_values_alone() {
        let args = expand_short_flags(["indrop", "-o", "-rbx", "--", "-b1"]);
        assert_eq!(
            args,
            vec![
                OsString::from("indrop"),
                OsString::from("-o"),
                OsString::from("-rbx"),
                OsString::from("--"),
                OsString::from("-b1"),
            ]
        );
    }

    #[test]
    fn test_parse_layout_options() {
        let cli = TestCli::try_parse_from([
            "indrop",
            "--barcode-read-file",
            "r1.fq",
            "--mrna-read-file",
            "r2.fq",
            "--barcode1-file",
            "bc1.txt",
            "--barcode2-file",
            "bc2.txt",
            "--output-dir",
            "out",
            "--linker-offsets",
            "9,10",
            "--umi-len",
            "8",
            "--min-read-len",
            "60",
            "--decompression",
            "inline",
            "--allow-unpaired",
        ])
        .unwrap();
        let params = cli.cmd.params().unwrap();
        assert_eq!(params.max_reads, 0);
        assert_eq!(params.layout.linker_offsets, vec![9, 10]);
        assert_eq!(params.layout.umi_len, 8);
        assert_eq!(params.decompression, Decompression::Inline);
        assert!(params.allow_unpaired);
        assert_eq!(
            params.path_processed_reads(),
            PathBuf::from("out").join(PROCESSED_READS_FILE)
        );
    }

    #[test]
    fn test_invalid_layout_is_rejected() {
        let cli = TestCli::try_parse_from([
            "indrop", "--rb", "r1.fq", "--rm", "r2.fq", "--b1", "bc1.txt", "--b2", "bc2.txt",
            "-o", "out", "--linker", "GAGTNATT",
        ])
        .unwrap();
        assert!(cli.cmd.params().is_err());
    }
}

use std::fs;
use std::path::Path;

use anyhow::Context;
use log::debug;

///////////////////////////////
/// Dense count matrix over (barcode 1, barcode 2).
/// Rows and columns are labeled with the whitelist sequences, in whitelist order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountMatrix {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    counts: Vec<u64>,
}

impl CountMatrix {
    pub fn new(rows: Vec<String>, cols: Vec<String>) -> CountMatrix {
        let counts = vec![0; rows.len() * cols.len()];
        CountMatrix { rows, cols, counts }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.cols.len()
    }

    #[inline(always)]
    pub fn inc(&mut self, row: usize, col: usize) {
        let i = self.offset(row, col);
        self.counts[i] += 1;
    }

    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.counts[self.offset(row, col)]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn row(&self, row: usize) -> &[u64] {
        let from = row * self.cols.len();
        &self.counts[from..(from + self.cols.len())]
    }

    #[inline(always)]
    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows.len() && col < self.cols.len(),
            "count matrix index ({row}, {col}) out of range"
        );
        row * self.cols.len() + col
    }

    ///////////////////////////////
    /// Write as a tab separated table. The first row holds the column labels after an
    /// empty corner cell; each further row starts with its label.
    ///
    /// The table goes to `<path>.tmp` first and is renamed into place once complete
    pub fn write_tsv(&self, path: &Path) -> anyhow::Result<()> {
        let mut path_tmp = path.as_os_str().to_owned();
        path_tmp.push(".tmp");
        let path_tmp = std::path::PathBuf::from(path_tmp);

        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(b'\t')
                .from_path(&path_tmp)
                .with_context(|| format!("Could not open {} for writing", path_tmp.display()))?;

            writer.write_field("")?;
            for col in self.cols.iter() {
                writer.write_field(col)?;
            }
            writer.write_record(None::<&[u8]>)?;

            for (i, name) in self.rows.iter().enumerate() {
                writer.write_field(name)?;
                for cnt in self.row(i) {
                    writer.write_field(cnt.to_string())?;
                }
                writer.write_record(None::<&[u8]>)?;
            }
            writer.flush()?;
        }

        fs::rename(&path_tmp, path).with_context(|| {
            format!(
                "Could not move {} to {}",
                path_tmp.display(),
                path.display()
            )
        })?;
        debug!(
            "Wrote {}x{} count matrix to {}",
            self.num_rows(),
            self.num_cols(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts() {
        let mut mat = CountMatrix::new(names(&["A", "C", "G"]), names(&["T", "TT"]));
        mat.inc(2, 1);
        mat.inc(2, 1);
        mat.inc(0, 0);
        assert_eq!(mat.get(2, 1), 2);
        assert_eq!(mat.get(1, 1), 0);
        assert_eq!(mat.row(2), &[0, 2]);
        assert_eq!(mat.total(), 3);
    }

    #[test]
    fn test_write_tsv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.tsv");

        let mut mat = CountMatrix::new(names(&["AAAA", "CCCC"]), names(&["GG", "TT", "AC"]));
        mat.inc(1, 2);
        mat.write_tsv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(header[1..], ["GG", "TT", "AC"]);
        assert_eq!(lines[1], "AAAA\t0\t0\t0");
        assert_eq!(lines[2], "CCCC\t0\t0\t1");
        assert!(!dir.path().join("counts.tsv.tmp").exists());
    }
}

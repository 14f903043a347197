use std::io::{self, BufWriter, Write};

///////////////////////////////
/// Read name of a processed read: `{barcode1}-{barcode2}_{umi}_{original name}`,
/// barcode indices padded to 3 digits and the UMI number to 4
pub fn make_processed_readname(
    barcode1: usize,
    barcode2: usize,
    umi: u32,
    original_head: &[u8],
) -> Vec<u8> {
    let mut name = format!("{:03}-{:03}_{:04}_", barcode1, barcode2, umi).into_bytes();
    name.extend_from_slice(original_head);
    name
}

///////////////////////////////
/// Output of accepted reads, in arrival order
pub struct ProcessedFastqWriter<W: Write> {
    writer: BufWriter<W>,
    n_written: u64,
}

impl<W: Write> ProcessedFastqWriter<W> {
    pub fn new(writer: W) -> ProcessedFastqWriter<W> {
        ProcessedFastqWriter {
            writer: BufWriter::new(writer),
            n_written: 0,
        }
    }

    pub fn write_read(
        &mut self,
        barcode1: usize,
        barcode2: usize,
        umi: u32,
        head: &[u8],
        seq: &[u8],
        qual: &[u8],
    ) -> io::Result<()> {
        let w = &mut self.writer;
        w.write_all(b"@")?;
        w.write_all(&make_processed_readname(barcode1, barcode2, umi, head))?;
        w.write_all(b"\n")?;
        w.write_all(seq)?;
        w.write_all(b"\n+\n")?;
        w.write_all(qual)?;
        w.write_all(b"\n")?;
        self.n_written += 1;
        Ok(())
    }

    pub fn num_written(&self) -> u64 {
        self.n_written
    }

    //absolutely have to call this before dropping, for bufwriter
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

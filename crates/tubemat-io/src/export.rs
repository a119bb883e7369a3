//! CSV export of measurement results for plotting tools.
//!
//! One row per bin. Unreliable bins are kept with their status and NaN
//! values so the frequency axis stays complete.

use std::io::{BufWriter, Write};
use std::path::Path;

use tubemat_core::MeasurementRecord;

use crate::{Error, Result};

/// Column names of the exported table.
pub const CSV_HEADER: &str = "frequency_hz,status,condition,h21_abs,h31_abs,h41_abs,\
min_coherence,transmission_loss_db,absorption,reflection_re,reflection_im,\
impedance_re,impedance_im";

/// Write `record` as CSV to any writer.
pub fn write_csv<W: Write>(record: &MeasurementRecord, mut out: W) -> std::io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;

    let tf = &record.transfer_functions;
    let props = &record.properties;
    for i in 0..record.len() {
        let r = props.reflection[i];
        let z = props.impedance[i];
        writeln!(
            out,
            "{},{},{:.4},{:.6},{:.6},{:.6},{:.4},{:.4},{:.6},{:.6},{:.6},{:.6},{:.6}",
            record.frequencies.frequency(i),
            props.status[i],
            record.matrix.condition[i],
            tf.h21[i].norm(),
            tf.h31[i].norm(),
            tf.h41[i].norm(),
            tf.min_coherence(i),
            props.transmission_loss_db[i],
            props.absorption[i],
            r.re,
            r.im,
            z.re,
            z.im,
        )?;
    }
    out.flush()
}

/// Export `record` to a CSV file.
pub fn export_csv(record: &MeasurementRecord, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| Error::file(path, e))?;
    write_csv(record, BufWriter::new(file)).map_err(|e| Error::file(path, e))
}

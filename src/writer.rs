use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::FilenameStyle;
use crate::error::{ExportError, Result};
use crate::extract::{Row, Scalar};

const BOM: &str = "\u{feff}";

pub fn output_filename(style: FilenameStyle, year: u16, now: NaiveDateTime) -> String {
    match style {
        FilenameStyle::Fixed => format!("jogos_brasileirao_{}.csv", year),
        FilenameStyle::Timestamped => {
            format!("brasileirao_{}_{}.csv", year, now.format("%Y%m%d_%H%M%S"))
        }
    }
}

/// Writes `rows` under a header row to `path`, creating parent directories.
///
/// The data goes to a `.tmp` sibling first and is renamed into place, so `path` is
/// either the complete export or untouched. The header is written even with no rows.
pub fn write_csv<R: Row>(rows: &[R], path: &Path, bom: bool) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("csv.tmp");

    let written = (|| -> Result<()> {
        let mut file = BufWriter::new(File::create(&tmp)?);
        if bom {
            file.write_all(BOM.as_bytes())?;
        }
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.write_record(R::HEADERS)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        let mut file = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
        file.flush()?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(path.to_path_buf())
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::io::Cursor<Vec<u8>>>> {
    let mut bytes = fs::read(path)?;
    if bytes.starts_with(BOM.as_bytes()) {
        bytes.drain(..BOM.len());
    }
    Ok(csv::Reader::from_reader(std::io::Cursor::new(bytes)))
}

/// Header row of an exported file, BOM stripped.
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut rdr = open_reader(path)?;
    Ok(rdr.headers()?.iter().map(str::to_owned).collect())
}

/// Reads back a file produced by [`write_csv`] for the same row type.
pub fn read_rows<R: Row>(path: &Path) -> Result<Vec<R>> {
    let mut rdr = open_reader(path)?;
    let headers = rdr.headers()?.clone();
    if !headers.iter().eq(R::HEADERS.iter().copied()) {
        return Err(ExportError::UnexpectedShape(format!(
            "{} has headers {:?}, expected {:?}",
            path.display(),
            headers,
            R::HEADERS
        )));
    }

    let mut rows = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let cells = record?.iter().map(Scalar::from_cell).collect();
        let row = R::from_cells(cells).ok_or_else(|| {
            ExportError::UnexpectedShape(format!("{}: row {} is short", path.display(), index + 1))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `service_times.csv`
//! - `occupancy.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OccupancyRow, OutputResult, ServiceRow};

/// Writes service times and occupancy samples to two CSV files.
pub struct CsvWriter {
    services:  Writer<File>,
    occupancy: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create the output directory if needed, open both files and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut services = Writer::from_path(dir.join("service_times.csv"))?;
        services.write_record(["vehicle", "kind", "at_min", "wait_min", "service_min"])?;

        let mut occupancy = Writer::from_path(dir.join("occupancy.csv"))?;
        occupancy.write_record(["at_min", "level", "occupied", "capacity", "ratio"])?;

        Ok(Self {
            services,
            occupancy,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_service(&mut self, row: &ServiceRow) -> OutputResult<()> {
        self.services.write_record(&[
            row.vehicle.to_string(),
            row.kind.to_string(),
            format!("{:.2}", row.at_min),
            format!("{:.2}", row.wait_min),
            format!("{:.2}", row.service_min),
        ])?;
        Ok(())
    }

    fn write_occupancy(&mut self, rows: &[OccupancyRow]) -> OutputResult<()> {
        for row in rows {
            self.occupancy.write_record(&[
                format!("{:.2}", row.at_min),
                row.level.to_string(),
                row.occupied.to_string(),
                row.capacity.to_string(),
                format!("{:.4}", row.ratio()),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.services.flush()?;
        self.occupancy.flush()?;
        Ok(())
    }
}

//! NetCDF output for simulation snapshots.
//!
//! The file has an unlimited `t` axis and `z`, `x` axes at global extent,
//! four field variables {dens, uwnd, wwnd, theta} dimensioned (t, z, x),
//! and a 1-D `t` coordinate holding the elapsed model time of each record.
//! The file is created lazily on the first write and kept open so later
//! records append at the next time index.

use std::path::{Path, PathBuf};

use super::{OutputError, OutputSink, Snapshot};

/// Variables appended at every output event, in file order.
#[cfg(feature = "netcdf")]
const FIELD_NAMES: [&str; 4] = ["dens", "uwnd", "wwnd", "theta"];

/// Appends snapshots to a NetCDF file.
///
/// Without the `netcdf` cargo feature every write fails with
/// [`OutputError::FeatureDisabled`]; the type itself always exists so
/// callers can be compiled unconditionally.
pub struct NetcdfWriter {
    path: PathBuf,
    nx_glob: usize,
    nz_glob: usize,
    num_out: usize,
    #[cfg(feature = "netcdf")]
    file: Option<netcdf::FileMut>,
}

impl NetcdfWriter {
    /// Create a writer targeting `path` for a global grid.
    pub fn new(path: impl AsRef<Path>, nx_glob: usize, nz_glob: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            nx_glob,
            nz_glob,
            num_out: 0,
            #[cfg(feature = "netcdf")]
            file: None,
        }
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.num_out
    }

    fn check_shape(&self, snapshot: &Snapshot) -> Result<(), OutputError> {
        if snapshot.nx != self.nx_glob || snapshot.nz != self.nz_glob {
            return Err(OutputError::InvalidData(format!(
                "snapshot is {}x{}, writer expects {}x{}",
                snapshot.nx, snapshot.nz, self.nx_glob, self.nz_glob
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "netcdf")]
impl NetcdfWriter {
    fn ensure_file(&mut self) -> Result<&mut netcdf::FileMut, OutputError> {
        if self.file.is_none() {
            let mut file = netcdf::create(&self.path)?;
            file.add_unlimited_dimension("t")?;
            file.add_dimension("z", self.nz_glob)?;
            file.add_dimension("x", self.nx_glob)?;
            file.add_variable::<f64>("t", &["t"])?;
            for name in FIELD_NAMES {
                file.add_variable::<f64>(name, &["t", "z", "x"])?;
            }
            file.add_attribute("source", "stratus-rs")?;
            file.add_attribute(
                "history",
                format!("created {}", chrono::Utc::now().to_rfc3339()),
            )?;
            self.file = Some(file);
        }
        Ok(self.file.as_mut().expect("file was just created"))
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), OutputError> {
        let record = self.num_out;
        let (nx, nz) = (self.nx_glob, self.nz_glob);
        let file = self.ensure_file()?;

        let fields = [
            &snapshot.dens,
            &snapshot.uwnd,
            &snapshot.wwnd,
            &snapshot.theta,
        ];
        for (name, data) in FIELD_NAMES.iter().zip(fields) {
            let mut var = file
                .variable_mut(name)
                .ok_or_else(|| OutputError::InvalidData(format!("missing variable {name}")))?;
            var.put_values(data, [record..record + 1, 0..nz, 0..nx])?;
        }
        let mut tvar = file
            .variable_mut("t")
            .ok_or_else(|| OutputError::InvalidData("missing variable t".to_string()))?;
        tvar.put_values(&[snapshot.etime], [record..record + 1])?;

        self.num_out += 1;
        Ok(())
    }
}

impl OutputSink for NetcdfWriter {
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), OutputError> {
        self.check_shape(snapshot)?;
        #[cfg(feature = "netcdf")]
        {
            self.write_snapshot(snapshot)
        }
        #[cfg(not(feature = "netcdf"))]
        {
            Err(OutputError::FeatureDisabled)
        }
    }
}

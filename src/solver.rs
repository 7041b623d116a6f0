//! Thin layer over `highs-sys`. Rows are collected as triplets, compressed
//! column-wise through `sprs` and passed to HiGHS as an LP, or as a MIP
//! when some column is integer.

use std::ffi::{c_void, CString};
use std::ops::{Bound, RangeBounds};
use std::os::raw::c_int;

use highs_sys::*;
use sprs::TriMat;

/// Model status reported by HiGHS after a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighsModelStatus {
    NotSet,
    Optimal,
    Infeasible,
    UnboundedOrInfeasible,
    Unbounded,
    ReachedTimeLimit,
    ReachedIterationLimit,
    /// Load, presolve, solve or postsolve failures and anything unrecognized
    Other(c_int),
}

impl From<c_int> for HighsModelStatus {
    fn from(value: c_int) -> Self {
        match value {
            MODEL_STATUS_NOTSET => Self::NotSet,
            MODEL_STATUS_OPTIMAL => Self::Optimal,
            MODEL_STATUS_INFEASIBLE => Self::Infeasible,
            MODEL_STATUS_UNBOUNDED_OR_INFEASIBLE => Self::UnboundedOrInfeasible,
            MODEL_STATUS_UNBOUNDED => Self::Unbounded,
            MODEL_STATUS_REACHED_TIME_LIMIT => Self::ReachedTimeLimit,
            MODEL_STATUS_REACHED_ITERATION_LIMIT => Self::ReachedIterationLimit,
            n => Self::Other(n),
        }
    }
}

/// Failure of a HiGHS call, carrying the function name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighsStatus(pub String);

fn check(status: c_int, call: &str) -> Result<(), HighsStatus> {
    match status {
        STATUS_OK => Ok(()),
        STATUS_WARNING => {
            tracing::warn!("HiGHS warning from {}", call);
            Ok(())
        }
        _ => Err(HighsStatus(call.to_string())),
    }
}

fn to_highs_int(n: usize) -> Result<HighsInt, HighsStatus> {
    HighsInt::try_from(n).map_err(|_| HighsStatus(format!("{} overflows HighsInt", n)))
}

fn interval<B: RangeBounds<f64>>(bounds: &B) -> (f64, f64) {
    let lower = match bounds.start_bound() {
        Bound::Included(v) | Bound::Excluded(v) => *v,
        Bound::Unbounded => f64::NEG_INFINITY,
    };
    let upper = match bounds.end_bound() {
        Bound::Included(v) | Bound::Excluded(v) => *v,
        Bound::Unbounded => f64::INFINITY,
    };
    (lower, upper)
}

/// A linear problem under construction
#[derive(Debug, Clone, Default)]
pub struct Problem {
    pub num_col: usize,
    pub num_row: usize,
    col_cost: Vec<f64>,
    col_lower: Vec<f64>,
    col_upper: Vec<f64>,
    integrality: Vec<HighsInt>,
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
    entries: Vec<(usize, usize, f64)>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column<B: RangeBounds<f64>>(&mut self, cost: f64, bounds: B) -> usize {
        self.push_column(cost, &bounds, 0)
    }

    pub fn add_integer_column<B: RangeBounds<f64>>(
        &mut self,
        cost: f64,
        bounds: B,
    ) -> usize {
        self.push_column(cost, &bounds, 1)
    }

    fn push_column<B: RangeBounds<f64>>(
        &mut self,
        cost: f64,
        bounds: &B,
        integrality: HighsInt,
    ) -> usize {
        let (lower, upper) = interval(bounds);
        self.col_cost.push(cost);
        self.col_lower.push(lower);
        self.col_upper.push(upper);
        self.integrality.push(integrality);
        self.num_col += 1;
        self.num_col - 1
    }

    /// Adds `lower <= sum(factor * x[col]) <= upper` and returns its row
    pub fn add_row<B: RangeBounds<f64>>(
        &mut self,
        bounds: B,
        factors: &[(usize, f64)],
    ) -> Result<usize, HighsStatus> {
        let row = self.num_row;
        for &(col, factor) in factors {
            if col >= self.num_col {
                return Err(HighsStatus(format!("row {} refers to column {}", row, col)));
            }
            self.entries.push((row, col, factor));
        }
        let (lower, upper) = interval(&bounds);
        self.row_lower.push(lower);
        self.row_upper.push(upper);
        self.num_row += 1;
        Ok(row)
    }

    pub fn num_nz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_mip(&self) -> bool {
        self.integrality.iter().any(|i| *i != 0)
    }

    /// Column-wise start, index and value arrays
    fn compressed_columns(
        &self,
    ) -> Result<(Vec<HighsInt>, Vec<HighsInt>, Vec<f64>), HighsStatus> {
        let mut triplets =
            TriMat::with_capacity((self.num_row, self.num_col), self.entries.len());
        for &(row, col, value) in self.entries.iter() {
            triplets.add_triplet(row, col, value);
        }
        let csc = triplets.to_csc::<usize>();
        let mut start = Vec::with_capacity(self.num_col + 1);
        let mut index = Vec::with_capacity(csc.nnz());
        let mut value = Vec::with_capacity(csc.nnz());
        for column in csc.outer_iterator() {
            start.push(to_highs_int(index.len())?);
            for (row, v) in column.iter() {
                index.push(to_highs_int(row)?);
                value.push(*v);
            }
        }
        Ok((start, index, value))
    }

    /// Loads the problem into a fresh HiGHS instance as a minimization,
    /// without solving it
    pub fn try_minimise(self) -> Result<Model, HighsStatus> {
        Model::load(&self)
    }
}

/// Primal values of a solved model
#[derive(Debug, Clone)]
pub struct Solution {
    pub colvalue: Vec<f64>,
}

/// A loaded HiGHS instance, destroyed on drop
#[derive(Debug)]
pub struct Model {
    ptr: *mut c_void,
}

impl Drop for Model {
    fn drop(&mut self) {
        unsafe { Highs_destroy(self.ptr) }
    }
}

impl Model {
    fn load(problem: &Problem) -> Result<Self, HighsStatus> {
        let mut model = Model {
            ptr: unsafe { Highs_create() },
        };
        model.set_bool_option("output_flag", false)?;
        model.set_bool_option("log_to_console", false)?;

        let (start, index, value) = problem.compressed_columns()?;
        let num_col = to_highs_int(problem.num_col)?;
        let num_row = to_highs_int(problem.num_row)?;
        let num_nz = to_highs_int(value.len())?;
        let status = unsafe {
            if problem.is_mip() {
                Highs_passMip(
                    model.ptr,
                    num_col,
                    num_row,
                    num_nz,
                    MATRIX_FORMAT_COLUMN_WISE,
                    OBJECTIVE_SENSE_MINIMIZE,
                    0.0,
                    problem.col_cost.as_ptr(),
                    problem.col_lower.as_ptr(),
                    problem.col_upper.as_ptr(),
                    problem.row_lower.as_ptr(),
                    problem.row_upper.as_ptr(),
                    start.as_ptr(),
                    index.as_ptr(),
                    value.as_ptr(),
                    problem.integrality.as_ptr(),
                )
            } else {
                Highs_passLp(
                    model.ptr,
                    num_col,
                    num_row,
                    num_nz,
                    MATRIX_FORMAT_COLUMN_WISE,
                    OBJECTIVE_SENSE_MINIMIZE,
                    0.0,
                    problem.col_cost.as_ptr(),
                    problem.col_lower.as_ptr(),
                    problem.col_upper.as_ptr(),
                    problem.row_lower.as_ptr(),
                    problem.row_upper.as_ptr(),
                    start.as_ptr(),
                    index.as_ptr(),
                    value.as_ptr(),
                )
            }
        };
        check(status, "Highs_passModel")?;
        Ok(model)
    }

    fn option_name(option: &str) -> Result<CString, HighsStatus> {
        CString::new(option).map_err(|_| HighsStatus(format!("bad option {}", option)))
    }

    pub fn set_bool_option(&mut self, option: &str, value: bool) -> Result<(), HighsStatus> {
        let name = Self::option_name(option)?;
        let status =
            unsafe { Highs_setBoolOptionValue(self.ptr, name.as_ptr(), value as HighsInt) };
        check(status, "Highs_setBoolOptionValue")
    }

    pub fn set_double_option(&mut self, option: &str, value: f64) -> Result<(), HighsStatus> {
        let name = Self::option_name(option)?;
        let status = unsafe { Highs_setDoubleOptionValue(self.ptr, name.as_ptr(), value) };
        check(status, "Highs_setDoubleOptionValue")
    }

    pub fn set_string_option(&mut self, option: &str, value: &str) -> Result<(), HighsStatus> {
        let name = Self::option_name(option)?;
        let value = Self::option_name(value)?;
        let status =
            unsafe { Highs_setStringOptionValue(self.ptr, name.as_ptr(), value.as_ptr()) };
        check(status, "Highs_setStringOptionValue")
    }

    pub fn try_solve(&mut self) -> Result<(), HighsStatus> {
        check(unsafe { Highs_run(self.ptr) }, "Highs_run")
    }

    pub fn status(&self) -> HighsModelStatus {
        HighsModelStatus::from(unsafe { Highs_getModelStatus(self.ptr) })
    }

    pub fn get_solution(&self) -> Result<Solution, HighsStatus> {
        let num_col = usize::try_from(unsafe { Highs_getNumCols(self.ptr) })
            .map_err(|_| HighsStatus("Highs_getNumCols".to_string()))?;
        let num_row = usize::try_from(unsafe { Highs_getNumRows(self.ptr) })
            .map_err(|_| HighsStatus("Highs_getNumRows".to_string()))?;
        let mut colvalue = vec![0.0; num_col];
        let mut coldual = vec![0.0; num_col];
        let mut rowvalue = vec![0.0; num_row];
        let mut rowdual = vec![0.0; num_row];
        let status = unsafe {
            Highs_getSolution(
                self.ptr,
                colvalue.as_mut_ptr(),
                coldual.as_mut_ptr(),
                rowvalue.as_mut_ptr(),
                rowdual.as_mut_ptr(),
            )
        };
        check(status, "Highs_getSolution")?;
        Ok(Solution { colvalue })
    }

    pub fn get_objective_value(&self) -> f64 {
        unsafe { Highs_getObjectiveValue(self.ptr) }
    }
}

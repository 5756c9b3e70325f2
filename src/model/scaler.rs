//! Per-feature standardization: `(x - mean) / std`, population deviation.

use crate::error::{ProcwatchError, Result};
use crate::features::check_columns;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    /// Standard deviation, 1.0 where a feature was constant
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on `data`, whose columns are named by `feature_names` in order.
    pub fn fit(feature_names: Vec<String>, data: ArrayView2<f64>) -> Result<Self> {
        if data.ncols() != feature_names.len() {
            return Err(ProcwatchError::schema_mismatch(
                &feature_names,
                &[format!("{} unnamed columns", data.ncols())],
            ));
        }
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| ProcwatchError::EmptyDataset("cannot fit scaler on zero rows".into()))?
            .to_vec();
        let scale = data
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&s| if s.is_finite() && s > 0.0 { s } else { 1.0 })
            .collect();
        Ok(Self {
            feature_names,
            mean,
            scale,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Exact ordered match against the columns this scaler was fit on.
    pub fn check_columns<S: AsRef<str>>(&self, found: &[S]) -> Result<()> {
        check_columns(&self.feature_names, found)
    }

    /// Standardize `data`; `columns` names its columns and must match the fit exactly.
    pub fn transform<S: AsRef<str>>(&self, columns: &[S], data: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_columns(columns)?;
        if data.ncols() != self.feature_names.len() {
            return Err(ProcwatchError::schema_mismatch(
                &self.feature_names,
                &[format!("{} data columns", data.ncols())],
            ));
        }
        Ok(Array2::from_shape_fn(data.dim(), |(i, j)| {
            (data[[i, j]] - self.mean[j]) / self.scale[j]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names() -> Vec<String> {
        vec!["a".into(), "b".into()]
    }

    #[test]
    fn standardizes_with_population_std() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let s = StandardScaler::fit(names(), x.view()).unwrap();
        assert_eq!(s.mean(), &[2.0, 5.0]);
        // constant column keeps scale 1
        assert_eq!(s.scale(), &[1.0, 1.0]);
        let t = s.transform(&names(), x.view()).unwrap();
        assert_eq!(t, array![[-1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn rejects_reordered_columns() {
        let x = array![[1.0, 5.0], [3.0, 7.0]];
        let s = StandardScaler::fit(names(), x.view()).unwrap();
        let err = s.transform(&["b", "a"], x.view()).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn empty_fit_is_an_error() {
        let x = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            StandardScaler::fit(names(), x.view()),
            Err(ProcwatchError::EmptyDataset(_))
        ));
    }
}

use serde::{Deserialize, Serialize};
use simple_error::{SimpleError, SimpleResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    num_rows: usize,
    num_cols: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct RawTimeSeries {
    num_rows: usize,
    num_cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = SimpleError;

    fn try_from(raw: RawTimeSeries) -> Result<Self, Self::Error> {
        let expected_len = raw.num_rows.checked_mul(raw.num_cols);

        if expected_len != Some(raw.data.len()) {
            return Err(SimpleError::new(format!(
                "time series of shape {} x {} has {} entries",
                raw.num_rows,
                raw.num_cols,
                raw.data.len()
            )));
        }

        Ok(Self {
            num_rows: raw.num_rows,
            num_cols: raw.num_cols,
            data: raw.data,
        })
    }
}

impl TimeSeries {
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            data: vec![0.0; num_rows * num_cols],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> SimpleResult<Self> {
        let num_rows = rows.len();
        let num_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(num_rows * num_cols);

        for (k, row) in rows.into_iter().enumerate() {
            if row.len() != num_cols {
                return Err(SimpleError::new(format!(
                    "row {} has {} columns, expected {}",
                    k,
                    row.len(),
                    num_cols
                )));
            }
            data.extend(row);
        }

        Ok(Self {
            num_rows,
            num_cols,
            data,
        })
    }

    pub fn from_fn(
        num_rows: usize,
        num_cols: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> Self {
        let mut data = Vec::with_capacity(num_rows * num_cols);

        for k in 0..num_rows {
            for col in 0..num_cols {
                data.push(f(k, col));
            }
        }

        Self {
            num_rows,
            num_cols,
            data,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn get(&self, k: usize, col: usize) -> f64 {
        self.row(k)[col]
    }

    pub fn row(&self, k: usize) -> &[f64] {
        &self.data[k * self.num_cols..(k + 1) * self.num_cols]
    }

    pub fn row_mut(&mut self, k: usize) -> &mut [f64] {
        &mut self.data[k * self.num_cols..(k + 1) * self.num_cols]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.num_rows).map(move |k| self.get(k, col))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_util::assert_approx_eq_slice;
    use itertools::assert_equal;

    #[test]
    fn rows_and_columns() {
        let sut =
            TimeSeries::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();

        assert_eq!(sut.num_rows(), 3);
        assert_eq!(sut.num_cols(), 2);
        assert_approx_eq_slice(sut.row(1), &[3.0, 4.0]);
        assert_equal(sut.column(1), [2.0, 4.0, 6.0]);
        assert_eq!(sut.get(2, 0), 5.0);
    }

    #[test]
    fn ragged_rows_rejected() {
        let result = TimeSeries::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert_eq!(
            result.unwrap_err().as_str(),
            "row 1 has 1 columns, expected 2"
        );
    }

    #[test]
    fn zero_width_rows() {
        let mut sut = TimeSeries::zeros(4, 0);

        assert_eq!(sut.num_rows(), 4);
        assert!(sut.row(3).is_empty());
        assert!(sut.row_mut(2).is_empty());
    }

    #[test]
    fn deserialize_checks_shape() {
        let sut: TimeSeries =
            serde_json::from_str(r#"{"num_rows":2,"num_cols":1,"data":[0.5,1.5]}"#).unwrap();
        assert_eq!(sut, TimeSeries::from_rows(vec![vec![0.5], vec![1.5]]).unwrap());

        let result = serde_json::from_str::<TimeSeries>(r#"{"num_rows":3,"num_cols":1,"data":[]}"#);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("time series of shape 3 x 1 has 0 entries"));

        let huge = format!(r#"{{"num_rows":{},"num_cols":2,"data":[]}}"#, usize::MAX);
        assert!(serde_json::from_str::<TimeSeries>(&huge).is_err());
    }

    #[test]
    fn from_fn_and_row_mut() {
        let mut sut = TimeSeries::from_fn(2, 3, |k, col| (10 * k + col) as f64);
        assert_approx_eq_slice(sut.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);

        sut.row_mut(0).copy_from_slice(&[7.0, 8.0, 9.0]);
        assert_approx_eq_slice(sut.row(0), &[7.0, 8.0, 9.0]);
    }
}

//! The black-box function being plotted.

use error_stack::Report;
use num_complex::Complex64;

use crate::GraphError;

/// Arguments handed to the evaluator for one grid point.
///
/// `z` is `x + y·i`; the scalars are passed as well so a function may use
/// either representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvalInputs {
    pub z: Complex64,
    /// Row value (imaginary part of `z`).
    pub y: f64,
    /// Column value (real part of `z`).
    pub x: f64,
}

impl EvalInputs {
    pub fn new(row: f64, col: f64) -> Self {
        Self {
            z: Complex64::new(col, row),
            y: row,
            x: col,
        }
    }
}

/// What an evaluator may return.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EvalOutput {
    /// A bare real number, read as `re + 0i`.
    Real(f64),
    /// A complex value whose imaginary part may be absent.
    Complex { re: f64, im: Option<f64> },
}

impl EvalOutput {
    /// `(re, im)` with a missing imaginary part read as 0.
    pub fn parts(self) -> (f64, f64) {
        match self {
            EvalOutput::Real(re) => (re, 0.0),
            EvalOutput::Complex { re, im } => (re, im.unwrap_or(0.0)),
        }
    }
}

impl From<f64> for EvalOutput {
    fn from(value: f64) -> Self {
        EvalOutput::Real(value)
    }
}

impl From<Complex64> for EvalOutput {
    fn from(value: Complex64) -> Self {
        EvalOutput::Complex {
            re: value.re,
            im: Some(value.im),
        }
    }
}

impl From<(f64, f64)> for EvalOutput {
    fn from((re, im): (f64, f64)) -> Self {
        EvalOutput::Complex { re, im: Some(im) }
    }
}

/// A compiled function that can be sampled over the grid.
///
/// Implementations must be pure: the same inputs give the same output.
pub trait Evaluator {
    fn evaluate(&self, inputs: &EvalInputs) -> crate::Result<EvalOutput>;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&self, inputs: &EvalInputs) -> crate::Result<EvalOutput> {
        (**self).evaluate(inputs)
    }
}

/// Wraps an infallible closure.
pub struct FnEvaluator<F>(pub F);

impl<F, T> Evaluator for FnEvaluator<F>
where
    F: Fn(&EvalInputs) -> T,
    T: Into<EvalOutput>,
{
    fn evaluate(&self, inputs: &EvalInputs) -> crate::Result<EvalOutput> {
        Ok((self.0)(inputs).into())
    }
}

/// Wraps a closure that can fail with a message.
pub struct TryFnEvaluator<F>(pub F);

impl<F, T, E> Evaluator for TryFnEvaluator<F>
where
    F: Fn(&EvalInputs) -> Result<T, E>,
    T: Into<EvalOutput>,
    E: std::fmt::Display,
{
    fn evaluate(&self, inputs: &EvalInputs) -> crate::Result<EvalOutput> {
        (self.0)(inputs)
            .map(Into::into)
            .map_err(|e| Report::new(GraphError::Evaluation).attach(e.to_string()))
    }
}

/// `f(z)` for an infallible closure over the complex input.
pub fn from_complex_fn<F>(f: F) -> FnEvaluator<impl Fn(&EvalInputs) -> Complex64>
where
    F: Fn(Complex64) -> Complex64,
{
    FnEvaluator(move |inputs: &EvalInputs| f(inputs.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_put_row_on_the_imaginary_axis() {
        let i = EvalInputs::new(3.0, -2.0);
        assert_eq!(i.z, Complex64::new(-2.0, 3.0));
        assert_eq!(i.y, 3.0);
        assert_eq!(i.x, -2.0);
    }

    #[test]
    fn missing_imaginary_reads_as_zero() {
        assert_eq!(EvalOutput::Real(4.0).parts(), (4.0, 0.0));
        assert_eq!(EvalOutput::Complex { re: 1.0, im: None }.parts(), (1.0, 0.0));
        assert_eq!(
            EvalOutput::Complex {
                re: 1.0,
                im: Some(-2.5)
            }
            .parts(),
            (1.0, -2.5)
        );
    }

    #[test]
    fn closures_become_evaluators() {
        let square = from_complex_fn(|z| z * z);
        let out = square.evaluate(&EvalInputs::new(1.0, 1.0)).unwrap();
        assert_eq!(out.parts(), (0.0, 2.0));

        let real = FnEvaluator(|i: &EvalInputs| i.x + i.y);
        assert_eq!(real.evaluate(&EvalInputs::new(2.0, 3.0)).unwrap(), EvalOutput::Real(5.0));
    }

    #[test]
    fn failing_closure_reports_evaluation_error() {
        let f = TryFnEvaluator(|i: &EvalInputs| {
            if i.x == 0.0 {
                Err("division by zero")
            } else {
                Ok(1.0 / i.x)
            }
        });
        let err = f.evaluate(&EvalInputs::new(0.0, 0.0)).unwrap_err();
        assert_eq!(*err.current_context(), GraphError::Evaluation);
        assert!(f.evaluate(&EvalInputs::new(0.0, 2.0)).is_ok());
    }
}

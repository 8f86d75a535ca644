use crate::interface::{
    ConvolveMode, KernelSource, Operation, SampleKind, Signal, SignalSet, StepSpec,
};
use crate::math::{ConvolutionHelper, FftHelper, MatrixHelper, StatsHelper};
use crate::prelude::{PipelineError, PipelineResult, ProcessingStage};
use crate::processing::adapter::InputAdapter;
use crate::processing::resolver::ExecutionPlan;
use crate::telemetry::LogManager;
use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Applies a resolved plan to a working set, adding one signal per step.
pub struct TransformStage<'a> {
    plan: &'a ExecutionPlan<'a>,
    logger: LogManager,
}

impl<'a> TransformStage<'a> {
    pub fn new(plan: &'a ExecutionPlan<'a>) -> Self {
        Self {
            plan,
            logger: LogManager::new("fieldcore::transform"),
        }
    }
}

impl ProcessingStage<SignalSet> for TransformStage<'_> {
    type Output = SignalSet;

    fn name(&self) -> &'static str {
        "transform"
    }

    fn execute(&self, mut signals: SignalSet) -> PipelineResult<SignalSet> {
        for step in self.plan.steps() {
            let output = evaluate(step, &signals)?;
            if self.logger.detail_enabled() {
                self.logger.detail(&format!(
                    "step `{}` ({}) -> {} {:?} samples, rms {:.4}",
                    step.name,
                    step.op.label(),
                    output.len(),
                    output.kind(),
                    StatsHelper::rms(output.samples())
                ));
            }
            signals.insert(step.name.clone(), output);
        }
        Ok(signals)
    }
}

/// Evaluates one step against signals that already hold all of its dependencies.
pub fn evaluate(step: &StepSpec, signals: &SignalSet) -> PipelineResult<Signal> {
    step.validate()?;
    let inputs = step
        .inputs()
        .into_iter()
        .map(|name| signals.require(name))
        .collect::<PipelineResult<Vec<&Signal>>>()?;
    let first = inputs[0];

    let result = match &step.op {
        Operation::Magnitude => Ok(magnitude(first)),
        Operation::Phase => phase(first),
        Operation::Fourier => Ok(fourier(first)),
        Operation::InverseFourier => Ok(inverse_fourier(first)),
        Operation::Convolve { kernel, mode } => {
            let literal;
            let kernel = match kernel {
                KernelSource::Values(values) => {
                    literal = InputAdapter::adapt_real(values)?;
                    &literal
                }
                KernelSource::Signal(name) => signals.require(name)?,
            };
            convolve(first, kernel, *mode)
        }
        Operation::Compose { weights } => compose(&inputs, weights.as_deref()),
        Operation::Scale { factor } => Ok(scale(first, *factor)),
        Operation::Multiply => multiply(inputs[0], inputs[1]),
        Operation::Phasor {
            amplitude,
            frequency,
        } => phasor(first, *amplitude, *frequency),
        Operation::Polar => polar(inputs[0], inputs[1]),
    };
    result
        .and_then(ensure_finite)
        .map_err(|err| err.in_step(&step.name))
}

/// Rejects output that overflowed to `inf` or `NaN`.
fn ensure_finite(signal: Signal) -> PipelineResult<Signal> {
    match signal.samples().iter().position(|c| !c.is_finite()) {
        Some(index) => Err(PipelineError::InvalidInput(format!(
            "produced non-finite samples (first at {index})"
        ))),
        None => Ok(signal),
    }
}

/// Elementwise absolute value.
pub fn magnitude(signal: &Signal) -> Signal {
    Signal::from_real(signal.magnitudes())
}

/// Elementwise angle in `(-pi, pi]`; undefined for real signals.
pub fn phase(signal: &Signal) -> PipelineResult<Signal> {
    if signal.is_real() {
        return Err(PipelineError::UnsupportedOperation(
            "phase is undefined for a real-valued signal".into(),
        ));
    }
    Ok(Signal::from_real(signal.samples().mapv(|c| c.arg())))
}

pub fn fourier(signal: &Signal) -> Signal {
    let helper = FftHelper::new(signal.len());
    let spectrum = helper.forward(&signal.to_vec());
    Signal::from_parts(Array1::from(spectrum), SampleKind::Complex)
}

/// Normalised inverse of [`fourier`].
pub fn inverse_fourier(signal: &Signal) -> Signal {
    let helper = FftHelper::new(signal.len());
    let samples = helper.inverse(&signal.to_vec());
    Signal::from_parts(Array1::from(samples), SampleKind::Complex)
}

pub fn convolve(signal: &Signal, kernel: &Signal, mode: ConvolveMode) -> PipelineResult<Signal> {
    let samples = ConvolutionHelper::convolve(signal.samples(), kernel.samples(), mode)?;
    Ok(Signal::from_parts(
        samples,
        SampleKind::combine([signal.kind(), kernel.kind()]),
    ))
}

/// Weighted elementwise average; equal weights when `weights` is `None`.
pub fn compose(layers: &[&Signal], weights: Option<&[f64]>) -> PipelineResult<Signal> {
    let Some(first) = layers.first() else {
        return Err(PipelineError::InvalidSpec(
            "compose needs at least one signal".into(),
        ));
    };
    let width = first.len();
    if let Some(layer) = layers.iter().find(|layer| layer.len() != width) {
        return Err(PipelineError::ShapeMismatch(format!(
            "compose operands have lengths {width} and {}",
            layer.len()
        )));
    }

    let weights = match weights {
        Some(weights) if weights.len() != layers.len() => {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} weights for {} signals",
                weights.len(),
                layers.len()
            )));
        }
        Some(weights) => Array1::from(weights.to_vec()),
        None => Array1::from_elem(layers.len(), 1.0),
    };
    let total = weights.sum();
    if !total.is_finite() || total == 0.0 {
        return Err(PipelineError::InvalidSpec(
            "compose weights must have a finite, non-zero sum".into(),
        ));
    }

    let stacked = Array2::from_shape_fn((layers.len(), width), |(row, col)| {
        layers[row].samples()[col]
    });
    let averaged = MatrixHelper::weighted_rows(stacked.view(), weights.view());
    Ok(Signal::from_parts(
        averaged,
        SampleKind::combine(layers.iter().map(|layer| layer.kind())),
    ))
}

pub fn scale(signal: &Signal, factor: f64) -> Signal {
    Signal::from_parts(signal.samples().mapv(|c| c * factor), signal.kind())
}

/// Elementwise product of two equal-length signals.
pub fn multiply(lhs: &Signal, rhs: &Signal) -> PipelineResult<Signal> {
    ensure_same_length("multiply", lhs, rhs)?;
    let samples: Array1<Complex64> = lhs
        .samples()
        .iter()
        .zip(rhs.samples().iter())
        .map(|(a, b)| a * b)
        .collect();
    Ok(Signal::from_parts(
        samples,
        SampleKind::combine([lhs.kind(), rhs.kind()]),
    ))
}

/// `amplitude * exp(i * frequency * x)` for every sample of a real signal.
pub fn phasor(signal: &Signal, amplitude: f64, frequency: f64) -> PipelineResult<Signal> {
    if !signal.is_real() {
        return Err(PipelineError::UnsupportedOperation(
            "phasor expects a real-valued signal".into(),
        ));
    }
    let samples = signal
        .samples()
        .mapv(|c| Complex64::from_polar(amplitude, frequency * c.re));
    Ok(Signal::from_parts(samples, SampleKind::Complex))
}

/// Builds `m * exp(i * theta)` from a modulus signal and an angle signal.
pub fn polar(modulus: &Signal, angle: &Signal) -> PipelineResult<Signal> {
    if !modulus.is_real() || !angle.is_real() {
        return Err(PipelineError::UnsupportedOperation(
            "polar expects real-valued modulus and angle signals".into(),
        ));
    }
    ensure_same_length("polar", modulus, angle)?;
    let samples: Array1<Complex64> = modulus
        .samples()
        .iter()
        .zip(angle.samples().iter())
        .map(|(m, theta)| Complex64::from_polar(m.re, theta.re))
        .collect();
    Ok(Signal::from_parts(samples, SampleKind::Complex))
}

fn ensure_same_length(op: &str, lhs: &Signal, rhs: &Signal) -> PipelineResult<()> {
    if lhs.len() != rhs.len() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{op} operands have lengths {} and {}",
            lhs.len(),
            rhs.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::PRIMARY_INPUT;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn real(values: &[f64]) -> Signal {
        InputAdapter::adapt_real(values).unwrap()
    }

    fn complex(values: &[(f64, f64)]) -> Signal {
        let samples: Vec<Complex64> = values.iter().map(|&(re, im)| Complex64::new(re, im)).collect();
        InputAdapter::adapt_complex(&samples).unwrap()
    }

    #[test]
    fn magnitude_of_alternating_signal() {
        let out = magnitude(&real(&[1.0, -1.0, 1.0, -1.0]));
        assert!(out.is_real());
        assert_eq!(out.real_parts(), vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn phase_requires_complex_input() {
        let err = phase(&real(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedOperation(_)));

        let out = phase(&complex(&[(0.0, 1.0), (-1.0, 0.0)])).unwrap();
        assert_abs_diff_eq!(out.real_parts()[0], FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(out.real_parts()[1], PI, epsilon = 1e-12);
    }

    #[test]
    fn fourier_keeps_length_and_dc_bin() {
        let out = fourier(&real(&[1.0, 2.0, 3.0]));
        assert_eq!(out.len(), 3);
        assert_eq!(out.kind(), SampleKind::Complex);
        assert_abs_diff_eq!(out.samples()[0].re, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn convolve_with_unit_kernel_is_identity() {
        let signal = real(&[0.5, -2.0, 3.25]);
        let out = convolve(&signal, &real(&[1.0]), ConvolveMode::Same).unwrap();
        assert_eq!(out, signal);
    }

    #[test]
    fn compose_of_identical_signals_is_identity() {
        let signal = real(&[1.0, -3.0, 7.5]);
        let out = compose(&[&signal, &signal], Some(&[0.5, 0.5][..])).unwrap();
        assert_eq!(out, signal);
    }

    #[test]
    fn compose_rejects_length_mismatch() {
        let a = real(&[1.0, 2.0]);
        let b = real(&[1.0, 2.0, 3.0]);
        let err = compose(&[&a, &b], None).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch(_)));
    }

    #[test]
    fn compose_mixes_kinds_into_complex() {
        let a = real(&[2.0]);
        let b = complex(&[(0.0, 2.0)]);
        let out = compose(&[&a, &b], None).unwrap();
        assert_eq!(out.kind(), SampleKind::Complex);
        assert_eq!(out.samples()[0], Complex64::new(1.0, 1.0));
    }

    #[test]
    fn multiply_and_scale_follow_operand_kinds() {
        let a = real(&[1.0, 2.0]);
        let b = real(&[3.0, -1.0]);
        let product = multiply(&a, &b).unwrap();
        assert!(product.is_real());
        assert_eq!(product.real_parts(), vec![3.0, -2.0]);
        assert_eq!(scale(&product, 0.5).real_parts(), vec![1.5, -1.0]);

        let c = real(&[1.0]);
        assert!(matches!(multiply(&a, &c), Err(PipelineError::ShapeMismatch(_))));
    }

    #[test]
    fn phasor_and_polar_build_unit_circle_samples() {
        let out = phasor(&real(&[0.0, 0.25]), 2.0, -2.0 * PI).unwrap();
        assert_abs_diff_eq!(out.samples()[0].re, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out.samples()[1].im, -2.0, epsilon = 1e-12);
        assert!(phasor(&out, 1.0, 1.0).is_err());

        let rebuilt = polar(&real(&[2.0]), &real(&[FRAC_PI_2])).unwrap();
        assert_abs_diff_eq!(rebuilt.samples()[0].im, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rebuilt.samples()[0].re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn evaluate_resolves_kernel_references() {
        let mut signals = SignalSet::new();
        signals.insert(PRIMARY_INPUT, real(&[1.0, 2.0, 3.0]));
        signals.insert("taps", real(&[4.0, 5.0]));
        let step = StepSpec::new(
            "coupled",
            Operation::Convolve {
                kernel: KernelSource::Signal("taps".into()),
                mode: ConvolveMode::Full,
            },
        );
        let out = evaluate(&step, &signals).unwrap();
        assert_eq!(out.real_parts(), vec![4.0, 13.0, 22.0, 15.0]);
    }

    #[test]
    fn evaluate_names_the_failing_step() {
        let mut signals = SignalSet::new();
        signals.insert(PRIMARY_INPUT, real(&[1.0, 2.0, 3.0]));
        let step = StepSpec::new(
            "wide",
            Operation::Convolve {
                kernel: KernelSource::Values(vec![4.0, 5.0, 6.0, 7.0]),
                mode: ConvolveMode::Same,
            },
        );
        let err = evaluate(&step, &signals).unwrap_err();
        assert_eq!(
            err,
            PipelineError::ShapeMismatch(
                "step `wide`: kernel length 4 exceeds signal length 3".into()
            )
        );
    }

    #[test]
    fn evaluate_rejects_overflowing_output() {
        let mut signals = SignalSet::new();
        signals.insert(PRIMARY_INPUT, real(&[1e10, 2e10]));
        let step = StepSpec::new("big", Operation::Scale { factor: 1e300 });
        let err = evaluate(&step, &signals).unwrap_err();
        assert_eq!(
            err,
            PipelineError::InvalidInput(
                "step `big`: produced non-finite samples (first at 0)".into()
            )
        );
    }

    #[test]
    fn compose_accepts_tiny_weights() {
        let signal = real(&[2.0, -6.0]);
        let out = compose(&[&signal, &signal], Some(&[1e-17, 1e-17][..])).unwrap();
        assert_eq!(out, signal);
        assert!(matches!(
            compose(&[&signal, &signal], Some(&[1.0, -1.0][..])),
            Err(PipelineError::InvalidSpec(_))
        ));
    }
}
